//! Replay a recorded history file to stdout.
//!
//! Usage: trace-replay <history.jsonl> [speed]

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracesim::playback::ReplayEventsObserver;
use tracesim::session::HistoryReplaySession;
use tracesim::ReplayEvent;

struct StdoutObserver;

impl ReplayEventsObserver for StdoutObserver {
    fn replay_events(&self, events: &[ReplayEvent]) {
        for event in events {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(err) => eprintln!("failed to encode event: {}", err),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: trace-replay <history.jsonl> [speed]");
    };
    let speed: f64 = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("speed must be a number")?
        .unwrap_or(1.0);

    let session = HistoryReplaySession::open(&path)
        .await
        .with_context(|| format!("failed to open {}", path))?;
    session.register_observer(Arc::new(StdoutObserver));
    session.playback_speed(speed).await?;
    session.play().await;

    tokio::signal::ctrl_c().await?;
    session.finish().await;
    Ok(())
}
