//! CLI interface for commodity-ticker
//!
//! Provides subcommands for:
//! - `run`: Start the ticker and print every snapshot
//! - `snapshot`: Print the seeded snapshot once
//! - `chat`: Send one message to the chat desk
//! - `config`: Show effective configuration

mod chat;
mod run;
mod snapshot;

pub use chat::ChatArgs;
pub use run::RunArgs;
pub use snapshot::SnapshotArgs;

use crate::ticker::{Direction, Snapshot};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "commodity-ticker")]
#[command(about = "Simulated commodity price ticker with a streaming chat desk")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the ticker and print snapshots
    Run(RunArgs),
    /// Print the current snapshot without ticking
    Snapshot(SnapshotArgs),
    /// Ask the intelligence desk a question
    Chat(ChatArgs),
    /// Show configuration
    Config,
}

/// Render a snapshot as an aligned table or a JSON line
pub fn render_snapshot(snapshot: &Snapshot, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(snapshot)?);
    }

    let mut out = format!("#{} @ {}\n", snapshot.seq, snapshot.as_of.format("%H:%M:%S"));
    for quote in snapshot.iter() {
        let arrow = match quote.direction() {
            Direction::Up => '▲',
            Direction::Down => '▼',
        };
        out.push_str(&format!(
            "  {:<6} {:<14} {:>10} {} {:+.2}%\n",
            quote.symbol, quote.name, quote.price, arrow, quote.change
        ));
    }
    Ok(out)
}
