//! Ticker types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticker errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickerError {
    /// Symbol is not part of the configured instrument set
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
}

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Stopped,
    Running,
}

/// Sign of a price change, consumed by renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Non-negative changes are `Up`
    pub fn of(change: f64) -> Self {
        if change >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// One formatted record in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub name: String,
    /// Display string, already formatted for the instrument
    pub price: String,
    /// Percent change versus the previous tick, rounded to 2dp
    pub change: f64,
}

impl PriceQuote {
    pub fn direction(&self) -> Direction {
        Direction::of(self.change)
    }
}

/// Immutable, ordered view of every instrument after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks applied to the state this snapshot was taken from
    pub seq: u64,
    /// Time of the tick that produced the underlying state
    pub as_of: DateTime<Utc>,
    pub quotes: Vec<PriceQuote>,
}

impl Snapshot {
    /// Find the quote for a symbol
    pub fn quote(&self, symbol: &str) -> Option<&PriceQuote> {
        self.quotes.iter().find(|q| q.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        self.quotes.iter()
    }
}
