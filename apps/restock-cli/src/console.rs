//! # Console
//!
//! The terminal side of a run: where sales lines come from and where progress
//! messages go.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pipeline ──next_line(prompt)──► StdinSource ──► stdin (or Ctrl+C)     │
//! │     │                                                                   │
//! │     └──stage_started / input_rejected / ...──► ConsoleEvents ──► tty   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--json` the human-readable messages move to stderr so stdout carries
//! only the run summary.

use async_trait::async_trait;
use restock_core::{
    ForecastRecord, InputSource, PipelineEvents, SalesRecord, Stage, SurplusRecord,
    ValidationError,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Which stream operator-facing text goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    fn say(&self, text: &str) {
        // A closed terminal is not worth failing the run over
        let _ = match self {
            Channel::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            Channel::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(text.as_bytes()).and_then(|_| err.flush())
            }
        };
    }
}

// =============================================================================
// Input
// =============================================================================

/// Reads sales lines from stdin.
///
/// End of input (Ctrl+D) and Ctrl+C both count as cancellation.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
    channel: Channel,
}

impl StdinSource {
    pub fn new(channel: Channel) -> Self {
        StdinSource {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            channel,
        }
    }
}

#[async_trait]
impl InputSource for StdinSource {
    async fn next_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        self.channel.say(prompt);
        self.channel.say("\nEnter your data here: ");

        tokio::select! {
            line = self.lines.next_line() => line,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                debug!("Ctrl+C while waiting for input");
                self.channel.say("\n");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Prints run progress in the operator's terms.
pub struct ConsoleEvents {
    channel: Channel,
}

impl ConsoleEvents {
    pub fn new(channel: Channel) -> Self {
        ConsoleEvents { channel }
    }
}

impl PipelineEvents for ConsoleEvents {
    fn input_rejected(&self, _attempt: u32, error: &ValidationError) {
        self.channel
            .say(&format!("Invalid data: {}, please try again.\n\n", error));
    }

    fn input_accepted(&self, _sales: &SalesRecord) {
        self.channel.say("Data is valid\n");
    }

    fn stage_started(&self, stage: Stage) {
        if let Some(table) = stage.target_table() {
            self.channel.say(&format!("Updating {} table...\n", table));
            return;
        }
        match stage {
            Stage::ComputingSurplus => self.channel.say("Calculating surplus data...\n"),
            Stage::ComputingForecast => self.channel.say("Calculating stock data...\n"),
            _ => {}
        }
    }

    fn stage_completed(&self, stage: Stage) {
        if let Some(table) = stage.target_table() {
            self.channel
                .say(&format!("{} table updated successfully\n\n", table));
        }
    }

    fn surplus_computed(&self, surplus: &SurplusRecord) {
        self.channel.say(&format!("Surplus: {}\n", surplus));
    }

    fn forecast_computed(&self, forecast: &ForecastRecord) {
        self.channel
            .say(&format!("Recommended stock for next market: {}\n", forecast));
    }
}
