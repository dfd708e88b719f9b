//! Snapshot command implementation

use super::render_snapshot;
use crate::config::Config;
use crate::ticker::{Ticker, TokioScheduler};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl SnapshotArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let ticker = Ticker::from_config(config, Arc::new(TokioScheduler::current()?))?;
        let snapshot = ticker.current_prices();
        println!("{}", render_snapshot(&snapshot, self.json)?.trim_end());
        Ok(())
    }
}
