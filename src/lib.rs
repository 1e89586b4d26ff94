//! # Concurrent staged pipelines over rendezvous channels
//!
//! This crate wires independently running stages into a linear chain. Stages
//! talk only through unbuffered, single-writer transports; closing a
//! transport is how end-of-stream travels from the source down to the sink.
//!
//! ## Core Concepts
//!
//! - **Transport**: a rendezvous channel; `send` returns once the reader took the item
//! - **Source**: generates items until exhausted
//! - **Processor**: maps each item to exactly one output item
//! - **Sink**: consumes the tail of the chain in the calling task
//! - **Pipeline**: spawns stages as they are added and drains them into a sink
//! - **Supervisor**: a join barrier over concurrently started tasks
//!
//! ## Example
//!
//! ```rust
//! use streamrelay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let report = build_source(2)
//!         .via(Widen::<Book>::new())
//!         .via(PrintRelay::new())
//!         .via(Narrow::<Book>::new())
//!         .for_each(|book| println!("Saving book for author: {}", book.author))
//!         .await?;
//!
//!     assert_eq!(report.delivered, 2);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod core;
pub mod item;
pub mod pipeline;
pub mod processors;
pub mod sinks;
pub mod sources;
pub mod stage;
pub mod supervisor;
pub mod util;

mod instrument;

// Re-export commonly used items
pub mod prelude {
    pub use crate::channel::{channel, Receiver, Sender};
    pub use crate::core::{BoxProcessor, Error, Processor, Result, Sink, Source};
    pub use crate::item::{Book, Printable, PrintableItem};
    pub use crate::pipeline::{
        build_pipeline, build_source, run_sink, Pipeline, PipelineConfig, PipelineReport,
    };
    pub use crate::processors::{
        InspectProcessor, MapProcessor, Narrow, PrintRelay, RelayProcessor, TryMapProcessor,
        Widen,
    };
    pub use crate::sinks::{CollectSink, CountSink, FileSink, FnSink, PrintSink};
    pub use crate::sources::{BookSource, IterSource, RangeSource, StreamSource};
    pub use crate::stage::{StageReport, Termination};
    pub use crate::supervisor::{BoxTask, DoneToken, Supervisor, WaitGroup};
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
