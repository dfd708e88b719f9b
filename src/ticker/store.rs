//! Authoritative current/previous price per instrument

use super::TickerError;
use crate::config::{validate_instruments, ConfigError};
use crate::instrument::Instrument;
use std::collections::HashMap;

/// Mutable price pair for one instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceState {
    pub current: f64,
    pub previous: f64,
}

/// Price store keyed by symbol, iterated in configuration order
#[derive(Debug, Clone)]
pub struct PriceStore {
    instruments: Vec<Instrument>,
    states: Vec<PriceState>,
    index: HashMap<String, usize>,
}

impl PriceStore {
    /// Seed every instrument at its base price with `previous == current`
    ///
    /// Rejects an empty set, duplicate symbols and bounds that do not
    /// contain their base.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self, ConfigError> {
        validate_instruments(&instruments)?;

        let states = instruments
            .iter()
            .map(|i| PriceState {
                current: i.bounds.base,
                previous: i.bounds.base,
            })
            .collect();
        let index = instruments
            .iter()
            .enumerate()
            .map(|(pos, i)| (i.symbol.clone(), pos))
            .collect();

        Ok(Self {
            instruments,
            states,
            index,
        })
    }

    fn position(&self, symbol: &str) -> Result<usize, TickerError> {
        self.index
            .get(symbol)
            .copied()
            .ok_or_else(|| TickerError::UnknownInstrument(symbol.to_string()))
    }

    /// Current price for a symbol
    pub fn get(&self, symbol: &str) -> Result<f64, TickerError> {
        Ok(self.states[self.position(symbol)?].current)
    }

    /// Price as of the preceding tick
    pub fn previous(&self, symbol: &str) -> Result<f64, TickerError> {
        Ok(self.states[self.position(symbol)?].previous)
    }

    /// Shift `current` into `previous` and store the clamped new price
    ///
    /// Returns the state after the update.
    pub fn advance(&mut self, symbol: &str, new_price: f64) -> Result<PriceState, TickerError> {
        let pos = self.position(symbol)?;
        Ok(self.advance_at(pos, new_price))
    }

    pub(crate) fn current_at(&self, pos: usize) -> f64 {
        self.states[pos].current
    }

    pub(crate) fn advance_at(&mut self, pos: usize, new_price: f64) -> PriceState {
        let bounds = self.instruments[pos].bounds;
        let state = &mut self.states[pos];
        state.previous = state.current;
        state.current = bounds.clamp(new_price);
        *state
    }

    /// Overwrite a state outright, skipping clamping
    #[cfg(test)]
    pub(crate) fn set(&mut self, symbol: &str, state: PriceState) -> Result<(), TickerError> {
        let pos = self.position(symbol)?;
        self.states[pos] = state;
        Ok(())
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Instruments paired with their state, in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&Instrument, &PriceState)> {
        self.instruments.iter().zip(self.states.iter())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
