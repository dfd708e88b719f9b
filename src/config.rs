//! Configuration types for commodity-ticker

use crate::instrument::{default_instruments, Instrument};
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticker: TickerConfig::default(),
            instruments: default_instruments(),
            chat: ChatConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Ticker driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Milliseconds between ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum relative move per tick (0.02 = ±2%)
    #[serde(default = "default_max_fluctuation")]
    pub max_fluctuation: f64,

    /// Fixed RNG seed; omitted means OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_max_fluctuation() -> f64 {
    crate::ticker::DEFAULT_MAX_FLUCTUATION
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            max_fluctuation: crate::ticker::DEFAULT_MAX_FLUCTUATION,
            seed: None,
        }
    }
}

impl TickerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Hosted chat backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Environment variables checked, in order, for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Vec<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// First message shown before the user has said anything
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Reply substituted when streaming fails
    #[serde(default = "default_apology_message")]
    pub apology_message: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_api_key_env() -> Vec<String> {
    vec!["GEMINI_API_KEY".to_string(), "API_KEY".to_string()]
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_system_instruction() -> String {
    "You are the chief investment strategist for a firm that connects buyers and \
     sellers of fuel and energy commodities and supports institutions in private \
     capital markets. Be sophisticated, concise and professional. Offer insight on \
     market trends, risk management and geopolitical impacts on commodities. Present \
     views as strategic analysis, never as certain financial advice."
        .to_string()
}
fn default_welcome_message() -> String {
    "Welcome to the Intelligence Desk. I am monitoring global energy and commodity \
     markets. How can I assist with your strategic analysis today?"
        .to_string()
}
fn default_apology_message() -> String {
    "I apologize, but I am currently unable to access the real-time market stream. \
     Please try again momentarily."
        .to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            system_instruction: default_system_instruction(),
            welcome_message: default_welcome_message(),
            apology_message: default_apology_message(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ChatConfig {
    /// First non-empty API key found in the configured environment variables
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Port for the Prometheus scrape endpoint; omitted disables it
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No instruments configured")]
    NoInstruments,
    #[error("Duplicate instrument symbol: {0}")]
    DuplicateSymbol(String),
    #[error("Instrument {symbol} has min {min} above max {max}")]
    InvertedBounds { symbol: String, min: f64, max: f64 },
    #[error("Instrument {symbol} base {base} outside [{min}, {max}]")]
    BaseOutOfBounds {
        symbol: String,
        base: f64,
        min: f64,
        max: f64,
    },
    #[error("Instrument {0} has a non-finite price bound")]
    NonFinite(String),
    #[error("Tick interval must be positive")]
    ZeroInterval,
    #[error("Fluctuation must be finite and in [0, 1): {0}")]
    InvalidFluctuation(f64),
}

/// Check an instrument set: non-empty, unique symbols, finite ordered bounds
/// with the base inside them
pub fn validate_instruments(instruments: &[Instrument]) -> Result<(), ConfigError> {
    if instruments.is_empty() {
        return Err(ConfigError::NoInstruments);
    }

    let mut seen = HashSet::new();
    for instrument in instruments {
        let symbol = &instrument.symbol;
        let b = instrument.bounds;
        if !seen.insert(symbol.as_str()) {
            return Err(ConfigError::DuplicateSymbol(symbol.clone()));
        }
        if !(b.base.is_finite() && b.min.is_finite() && b.max.is_finite()) {
            return Err(ConfigError::NonFinite(symbol.clone()));
        }
        if b.min > b.max {
            return Err(ConfigError::InvertedBounds {
                symbol: symbol.clone(),
                min: b.min,
                max: b.max,
            });
        }
        if !b.contains(b.base) {
            return Err(ConfigError::BaseOutOfBounds {
                symbol: symbol.clone(),
                base: b.base,
                min: b.min,
                max: b.max,
            });
        }
    }

    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ticker settings and instrument bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        let fluctuation = self.ticker.max_fluctuation;
        if !fluctuation.is_finite() || !(0.0..1.0).contains(&fluctuation) {
            return Err(ConfigError::InvalidFluctuation(fluctuation));
        }
        validate_instruments(&self.instruments)
    }
}
