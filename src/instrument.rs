//! Metrics hooks for stage execution, active with the `metrics` feature.

use crate::stage::Termination;

#[cfg(feature = "metrics")]
const ITEMS_EMITTED: &str = "streamrelay_items_emitted_total";
#[cfg(feature = "metrics")]
const STAGES_FINISHED: &str = "streamrelay_stages_finished_total";

pub(crate) fn item_emitted(stage: &str) {
    #[cfg(feature = "metrics")]
    metrics::counter!(ITEMS_EMITTED, "stage" => stage.to_owned()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = stage;
}

pub(crate) fn stage_finished(stage: &str, termination: &Termination) {
    #[cfg(feature = "metrics")]
    metrics::counter!(
        STAGES_FINISHED,
        "stage" => stage.to_owned(),
        "termination" => termination.label()
    )
    .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = (stage, termination);
}
