//! Run command implementation

use super::render_snapshot;
use crate::config::Config;
use crate::ticker::{Ticker, TokioScheduler};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured tick interval
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Exit after this many snapshots
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Print snapshots as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let scheduler = TokioScheduler::current()?;
        let ticker = Ticker::from_config(config, Arc::new(scheduler))?;
        let interval = self
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.ticker.interval());

        let (mut rx, subscription) = ticker.subscribe_channel(64);
        ticker.start(interval);

        let mut printed = 0u64;
        loop {
            tokio::select! {
                snapshot = rx.recv() => {
                    let Some(snapshot) = snapshot else { break };
                    print!("{}", render_snapshot(&snapshot, self.json)?);
                    if self.json {
                        println!();
                    }
                    printed += 1;
                    if self.ticks.is_some_and(|limit| printed >= limit) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        ticker.stop();
        subscription.unsubscribe();
        tracing::info!(snapshots = printed, "Ticker finished");
        Ok(())
    }
}
