//! Instrument definitions
//!
//! Static identity and price bounds for every tracked series

mod defaults;

pub use defaults::default_instruments;

use serde::{Deserialize, Serialize};

/// Display class used when rendering a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFormat {
    /// Thousands separators, two decimals ("2,341.50")
    Grouped,
    /// Two decimals, no grouping ("78.45")
    #[default]
    Plain,
}

/// Simulation bounds for an instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    /// Seed price before the first tick
    pub base: f64,
    /// Lowest price the simulation may reach
    pub min: f64,
    /// Highest price the simulation may reach
    pub max: f64,
}

impl PriceBounds {
    pub fn new(base: f64, min: f64, max: f64) -> Self {
        Self { base, min, max }
    }

    /// Constrain a price to `[min, max]`
    pub fn clamp(&self, price: f64) -> f64 {
        price.max(self.min).min(self.max)
    }

    /// Whether a price lies within the bounds
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// A tracked price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique ticker symbol (e.g., "CL=F")
    pub symbol: String,
    /// Human-readable name
    pub name: String,
    #[serde(flatten)]
    pub bounds: PriceBounds,
    #[serde(default)]
    pub format: PriceFormat,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        bounds: PriceBounds,
        format: PriceFormat,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            bounds,
            format,
        }
    }
}
