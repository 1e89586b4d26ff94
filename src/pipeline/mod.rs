//! Pipeline composition.
//!
//! A [`Pipeline`] is a linear chain of stages wired output-to-input. Every
//! stage is spawned the moment it is added, so by the time the chain is
//! fully built all of its stages are already running and blocked on their
//! transports. Running the sink in the caller drains the chain; shutdown then
//! flows from the source to the sink purely through channel closure.
//!
//! Building a pipeline spawns tokio tasks, so it must happen inside a tokio
//! runtime.

use crate::channel::{channel, Receiver};
use crate::core::{BoxProcessor, Error, Processor, Result, Sink, Source};
use crate::item::Book;
use crate::sinks::{CollectSink, FnSink};
use crate::sources::BookSource;
use crate::stage::{drain, run_processor, run_source, StageReport, Termination};
use crate::supervisor::Supervisor;

/// Configuration for pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Prefix for stage names (`{name}.{index}`)
    pub name: String,
    /// Whether a stage that stopped on a failed transform fails the run
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            fail_fast: false,
        }
    }
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set whether to fail on a stopped stage
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    fn stage_name(&self, index: usize) -> String {
        format!("{}.{}", self.name, index)
    }
}

/// Outcome of a fully drained pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineReport {
    pub name: String,
    /// Items accepted by the sink
    pub delivered: u64,
    /// One report per stage, source first, sink last
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Whether every stage ran until its input was exhausted.
    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.termination.is_exhausted())
    }

    /// The first stage that gave up on an item, if any.
    pub fn stopped_stage(&self) -> Option<&StageReport> {
        self.stages
            .iter()
            .find(|s| matches!(s.termination, Termination::Stopped { .. }))
    }
}

/// A running chain of stages whose tail yields items of type `T`.
pub struct Pipeline<T> {
    config: PipelineConfig,
    stream: Receiver<T>,
    stages: Supervisor<StageReport>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Start a pipeline from `source` with the default configuration
    pub fn new<S>(source: S) -> Self
    where
        S: Source<Item = T> + Send + 'static,
    {
        Self::with_config(source, PipelineConfig::default())
    }

    /// Start a pipeline from `source`
    pub fn with_config<S>(source: S, config: PipelineConfig) -> Self
    where
        S: Source<Item = T> + Send + 'static,
    {
        let mut stages = Supervisor::new();
        let name = config.stage_name(0);
        let (tx, rx) = channel();
        stages.spawn(name.clone(), run_source(name, source, tx));
        Self {
            config,
            stream: rx,
            stages,
        }
    }

    /// Set whether to fail on a stopped stage
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Append a stage transforming each item with `processor`.
    pub fn via<P>(self, processor: P) -> Pipeline<P::Output>
    where
        P: Processor<Input = T> + Send + 'static,
    {
        let Pipeline {
            config,
            stream,
            mut stages,
        } = self;
        let name = config.stage_name(stages.len());
        let (tx, rx) = channel();
        stages.spawn(name.clone(), run_processor(name, stream, processor, tx));
        Pipeline {
            config,
            stream: rx,
            stages,
        }
    }

    /// Append several same-typed stages in order.
    pub fn through<I>(self, processors: I) -> Self
    where
        I: IntoIterator<Item = BoxProcessor<T, T>>,
    {
        processors
            .into_iter()
            .fold(self, |pipeline, processor| pipeline.via(processor))
    }

    /// Number of stages spawned so far, source included.
    pub fn depth(&self) -> usize {
        self.stages.len()
    }

    /// Split into the tail stream and the supervisor of the running stages.
    pub fn into_parts(self) -> (Receiver<T>, Supervisor<StageReport>) {
        (self.stream, self.stages)
    }

    /// Drain the pipeline into `sink` and wait for every stage to finish.
    pub async fn sink<C>(self, sink: C) -> Result<PipelineReport>
    where
        C: Sink<Item = T> + Send,
    {
        let Pipeline {
            config,
            stream,
            stages,
        } = self;

        let drained = drain(config.stage_name(stages.len()), stream, sink).await;
        let joined = stages.join().await;

        let (mut reports, sink_report) = match (joined, drained) {
            (Ok(reports), Ok(sink_report)) => (reports, sink_report),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
            (Err(upstream), Err(sink)) => return Err(Error::Multiple(vec![upstream, sink])),
        };
        let delivered = sink_report.emitted;
        reports.push(sink_report);

        let report = PipelineReport {
            name: config.name,
            delivered,
            stages: reports,
        };

        if config.fail_fast {
            if let Some(stage) = report.stopped_stage() {
                if let Termination::Stopped { reason } = &stage.termination {
                    return Err(Error::Stage {
                        stage: stage.name.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Drain the pipeline, handing every item to `f`.
    pub async fn for_each<F>(self, f: F) -> Result<PipelineReport>
    where
        F: FnMut(T) + Send,
    {
        self.sink(FnSink::new(f)).await
    }

    /// Drain the pipeline into a vector.
    pub async fn collect(self) -> Result<Vec<T>> {
        let sink = CollectSink::new();
        self.sink(sink.clone()).await?;
        Ok(sink.into_items().await)
    }
}

/// Start a source of `count` numbered books.
pub fn build_source(count: usize) -> Pipeline<Book> {
    Pipeline::with_config(BookSource::new(count), PipelineConfig::new("books"))
}

/// Append `stages` to `source` in order.
pub fn build_pipeline<T: Send + 'static>(
    source: Pipeline<T>,
    stages: Vec<BoxProcessor<T, T>>,
) -> Pipeline<T> {
    source.through(stages)
}

/// Consume `stream` until it closes, returning how many items were seen.
///
/// A closed stream does not mean the upstream stages succeeded: a stage that
/// aborts on a contract violation (such as a failed [`Narrow`] downcast)
/// closes its output like any other. When `stream` comes from
/// [`Pipeline::into_parts`], join the returned supervisor afterwards to
/// observe that error; [`Pipeline::sink`] does this for you.
///
/// [`Narrow`]: crate::processors::Narrow
pub async fn run_sink<T, F>(mut stream: Receiver<T>, mut on_item: F) -> u64
where
    F: FnMut(T),
{
    while let Some(item) = stream.recv().await {
        on_item(item);
    }
    stream.received()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Printable;
    use crate::processors::{MapProcessor, Narrow, RelayProcessor, TryMapProcessor, Widen};
    use crate::sinks::CountSink;
    use crate::sources::IterSource;
    use crate::util::{sink_from_fn, source_from_fn};

    struct Flyer;

    impl Printable for Flyer {
        fn print(&self) -> String {
            "flyer".to_string()
        }
    }

    fn drying_source(items: u32) -> impl Source<Item = u32> + Send + 'static {
        let mut calls = 0u32;
        source_from_fn(move || {
            calls += 1;
            let next = if calls <= items {
                Ok(Some(calls))
            } else {
                Err(Error::custom("source dried up"))
            };
            async move { next }
        })
    }

    #[tokio::test]
    async fn test_stage_names_and_depth() {
        let pipeline = Pipeline::with_config(IterSource::new(0..3), PipelineConfig::new("nums"))
            .via(RelayProcessor::new())
            .via(MapProcessor::new(|x: i32| x + 1));
        assert_eq!(pipeline.depth(), 3);

        let report = pipeline.for_each(|_| {}).await.unwrap();
        let names: Vec<_> = report.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["nums.0", "nums.1", "nums.2", "nums.3"]);
        assert_eq!(report.delivered, 3);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_collect() {
        let items = Pipeline::new(IterSource::new(vec!["a", "b", "c"]))
            .via(MapProcessor::new(str::to_uppercase))
            .collect()
            .await
            .unwrap();
        assert_eq!(items, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_fail_fast_reports_stopped_stage() {
        let result = Pipeline::with_config(
            IterSource::new(1..10),
            PipelineConfig::new("strict").fail_fast(true),
        )
        .via(TryMapProcessor::new(|x: i32| {
            if x < 4 {
                Ok(x)
            } else {
                Err(Error::custom("too big"))
            }
        }))
        .for_each(|_| {})
        .await;

        match result {
            Err(Error::Stage { stage, reason }) => {
                assert_eq!(stage, "strict.1");
                assert_eq!(reason, "too big");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lenient_run_reports_stopped_stage() {
        let report = Pipeline::new(IterSource::new(1..10))
            .via(TryMapProcessor::new(|x: i32| {
                if x < 4 {
                    Ok(x)
                } else {
                    Err(Error::custom("too big"))
                }
            }))
            .for_each(|_| {})
            .await
            .unwrap();

        assert_eq!(report.delivered, 3);
        assert!(!report.is_complete());
        assert_eq!(report.stopped_stage().unwrap().name, "pipeline.1");
    }

    #[tokio::test]
    async fn test_run_sink_on_raw_stream() {
        let (stream, stages) = build_source(3).into_parts();
        let mut authors = Vec::new();
        let seen = run_sink(stream, |book| authors.push(book.author)).await;

        assert_eq!(seen, 3);
        assert_eq!(authors, vec!["Author-0", "Author-1", "Author-2"]);
        assert_eq!(stages.join().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_ends_stream_cleanly() {
        let report = Pipeline::new(drying_source(2))
            .via(RelayProcessor::new())
            .via(RelayProcessor::new())
            .sink(CountSink::new())
            .await
            .unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(
            report.stages[0].termination,
            Termination::Stopped {
                reason: "source dried up".into()
            }
        );
        assert_eq!(report.stopped_stage().unwrap().name, "pipeline.0");
        for stage in &report.stages[1..] {
            assert!(stage.termination.is_exhausted(), "stage {}", stage.name);
        }
    }

    #[tokio::test]
    async fn test_fail_fast_on_built_pipeline() {
        let result = Pipeline::new(drying_source(2))
            .fail_fast(true)
            .via(RelayProcessor::new())
            .sink(CountSink::new())
            .await;

        match result {
            Err(Error::Stage { stage, reason }) => {
                assert_eq!(stage, "pipeline.0");
                assert_eq!(reason, "source dried up");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sink_contract_violation_fails_the_run() {
        let result = Pipeline::new(IterSource::new(0..10))
            .via(RelayProcessor::new())
            .sink(sink_from_fn(|_: i32| async {
                Err::<(), _>(Error::Downcast {
                    expected: "Book",
                    found: "Flyer",
                })
            }))
            .await;

        let err = result.unwrap_err();
        assert!(err.is_contract_violation(), "{err}");
    }

    #[tokio::test]
    async fn test_run_sink_needs_join_to_see_abort() {
        let (stream, stages) = Pipeline::new(IterSource::new(vec![Flyer, Flyer]))
            .via(Widen::<Flyer>::new())
            .via(Narrow::<Book>::new())
            .into_parts();

        // The aborted stage closes its output, so the stream just ends.
        let seen = run_sink(stream, |_| {}).await;
        assert_eq!(seen, 0);

        let err = stages.join().await.unwrap_err();
        assert!(err.is_contract_violation(), "{err}");
    }
}
