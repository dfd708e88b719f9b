//! Chat command implementation

use crate::chat::{ChatDesk, GeminiBackend};
use crate::config::Config;
use clap::Args;
use std::io::Write;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

impl ChatArgs {
    pub fn message(&self) -> String {
        self.words.join(" ")
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let backend = GeminiBackend::from_config(&config.chat)?;
        let mut desk = ChatDesk::from_config(Arc::new(backend), &config.chat);

        if let Some(welcome) = desk.messages().first() {
            println!("{}\n", welcome.text);
        }

        let mut shown = String::new();
        let mut stdout = std::io::stdout();
        desk.send(&self.message(), |reply| {
            // apology replaces partial output rather than extending it
            let fresh = match reply.text.strip_prefix(shown.as_str()) {
                Some(rest) => rest.to_string(),
                None => format!("\n{}", reply.text),
            };
            if let Err(e) = write!(stdout, "{}", fresh).and_then(|_| stdout.flush()) {
                tracing::debug!(error = %e, "Failed to write chat reply to stdout");
            }
            shown = reply.text.clone();
        })
        .await;
        println!();

        Ok(())
    }
}
