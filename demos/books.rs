//! Books flow through a widen/print/narrow chain and are saved by author.

use streamrelay::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== Book Pipeline ===");

    let report = build_source(2)
        .via(Widen::<Book>::new())
        .via(PrintRelay::new())
        .via(Narrow::<Book>::new())
        .via(MapProcessor::new(|book: Book| book.author))
        .sink(PrintSink::with_prefix("Saving book for author:"))
        .await?;

    println!(
        "Delivered {} books through {} stages",
        report.delivered,
        report.stages.len()
    );
    Ok(())
}
