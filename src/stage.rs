//! Stage execution.
//!
//! Every stage reads from at most one transport and writes to at most one.
//! The runners here drive a [`Source`], [`Processor`] or [`Sink`] until its
//! input closes (or, for a source, until generation is exhausted), then close
//! their output exactly once. Closing is what propagates shutdown downstream;
//! nothing ever flows back upstream except a dropped receiver, which the
//! writer above observes as [`Termination::Disconnected`].

use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::channel::{channel, Receiver, Sender};
use crate::core::{Error, Processor, Result, Sink, Source};
use crate::instrument;

/// Why a stage stopped running.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Input closed (or the source ran out of items).
    Exhausted,
    /// The stage gave up on an item it could not transform.
    Stopped { reason: String },
    /// The downstream reader went away.
    Disconnected,
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Termination::Exhausted => "exhausted",
            Termination::Stopped { .. } => "stopped",
            Termination::Disconnected => "disconnected",
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Termination::Exhausted)
    }
}

/// What a finished stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageReport {
    pub name: String,
    /// Items taken from the input transport.
    pub received: u64,
    /// Items handed to the output transport (or accepted by the sink).
    pub emitted: u64,
    pub termination: Termination,
}

/// Spawn a source stage; it starts generating immediately.
pub fn spawn_source<S>(
    name: impl Into<String>,
    source: S,
) -> (Receiver<S::Item>, JoinHandle<Result<StageReport>>)
where
    S: Source + Send + 'static,
{
    let (tx, rx) = channel();
    let handle = tokio::spawn(run_source(name.into(), source, tx));
    (rx, handle)
}

/// Spawn a transform stage reading from `input`.
pub fn spawn_processor<P>(
    name: impl Into<String>,
    input: Receiver<P::Input>,
    processor: P,
) -> (Receiver<P::Output>, JoinHandle<Result<StageReport>>)
where
    P: Processor + Send + 'static,
{
    let (tx, rx) = channel();
    let handle = tokio::spawn(run_processor(name.into(), input, processor, tx));
    (rx, handle)
}

/// Drive a source into `output` until it is exhausted.
pub async fn run_source<S>(
    name: String,
    mut source: S,
    mut output: Sender<S::Item>,
) -> Result<StageReport>
where
    S: Source + Send,
{
    debug!(stage = %name, "source started");

    let termination = loop {
        match source.produce().await {
            Ok(Some(item)) => {
                if output.send(item).await.is_err() {
                    break Termination::Disconnected;
                }
                trace!(stage = %name, emitted = output.sent(), "item handed off");
                instrument::item_emitted(&name);
            }
            Ok(None) => break Termination::Exhausted,
            Err(e) if e.is_contract_violation() => return Err(abort(&name, output, e)),
            Err(e) => break stopped(&name, e),
        }
    };

    let emitted = output.sent();
    output.close();
    Ok(finished(StageReport {
        name,
        received: 0,
        emitted,
        termination,
    }))
}

/// Drive a processor from `input` into `output` until `input` closes.
pub async fn run_processor<P>(
    name: String,
    mut input: Receiver<P::Input>,
    mut processor: P,
    mut output: Sender<P::Output>,
) -> Result<StageReport>
where
    P: Processor + Send,
{
    debug!(stage = %name, "processor started");

    let termination = loop {
        let Some(item) = input.recv().await else {
            break Termination::Exhausted;
        };
        match processor.process(item).await {
            Ok(out) => {
                if output.send(out).await.is_err() {
                    break Termination::Disconnected;
                }
                trace!(stage = %name, emitted = output.sent(), "item handed off");
                instrument::item_emitted(&name);
            }
            Err(e) if e.is_contract_violation() => return Err(abort(&name, output, e)),
            Err(e) => break stopped(&name, e),
        }
    };

    let emitted = output.sent();
    output.close();
    Ok(finished(StageReport {
        name,
        received: input.received(),
        emitted,
        termination,
    }))
}

/// Feed every item of `input` to `sink` in the calling task.
///
/// Returns once `input` has closed and the sink has been finished. If the
/// sink rejects an item the input is dropped, which unblocks the writer
/// above and lets the shutdown cascade back down from there.
pub async fn drain<C>(
    name: String,
    mut input: Receiver<C::Item>,
    mut sink: C,
) -> Result<StageReport>
where
    C: Sink + Send,
{
    debug!(stage = %name, "sink started");

    let mut written = 0;
    let mut termination = loop {
        let Some(item) = input.recv().await else {
            break Termination::Exhausted;
        };
        match sink.write(item).await {
            Ok(()) => {
                written += 1;
                instrument::item_emitted(&name);
            }
            Err(e) if e.is_contract_violation() => {
                error!(stage = %name, error = %e, "contract violation, aborting stage");
                return Err(e);
            }
            Err(e) => break stopped(&name, e),
        }
    };
    let received = input.received();
    drop(input);

    if termination.is_exhausted() {
        if let Err(e) = sink.finish().await {
            termination = stopped(&name, e);
        }
    }

    Ok(finished(StageReport {
        name,
        received,
        emitted: written,
        termination,
    }))
}

fn stopped(name: &str, e: Error) -> Termination {
    warn!(stage = %name, error = %e, "stage stopped early");
    Termination::Stopped {
        reason: e.to_string(),
    }
}

fn abort<T>(name: &str, output: Sender<T>, e: Error) -> Error {
    error!(stage = %name, error = %e, "contract violation, aborting stage");
    output.close();
    e
}

fn finished(report: StageReport) -> StageReport {
    debug!(
        stage = %report.name,
        received = report.received,
        emitted = report.emitted,
        termination = report.termination.label(),
        "stage finished"
    );
    instrument::stage_finished(&report.name, &report.termination);
    report
}
