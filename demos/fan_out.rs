//! Two counters run concurrently and a wait group joins them.
//!
//! The "A" and "B" lines interleave differently from run to run.

use std::time::Duration;
use streamrelay::supervisor::WaitGroup;
use tokio::time::sleep;

async fn print_count_up(prefix: &str) {
    for i in 0..10 {
        print!("{}-{} ", prefix, i);
        sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::main]
async fn main() {
    let group = WaitGroup::new();

    for prefix in ["A", "B"] {
        let token = group.token();
        tokio::spawn(async move {
            print_count_up(prefix).await;
            token.done();
        });
    }

    group.wait().await;
    println!();
}
