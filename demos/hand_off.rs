//! A timed generator hands counts to a printer over a rendezvous channel.

use std::time::Duration;
use streamrelay::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let (mut counts, printer_input) = channel::<i64>();

    let mut supervisor = Supervisor::new();
    supervisor.spawn("printer", async move {
        run_sink(printer_input, |count| print!("{} ", count)).await;
        Ok(())
    });
    supervisor.spawn("count-up", async move {
        let mut source = RangeSource::new(0..10).with_delay(Duration::from_millis(100));
        while let Some(count) = source.produce().await? {
            counts.send(count).await?;
        }
        counts.close();
        Ok::<(), Error>(())
    });

    supervisor.join().await?;
    println!();
    Ok(())
}
