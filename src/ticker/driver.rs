//! Ticker driver
//!
//! Owns the price store, the generator and the repeating schedule. Every tick
//! advances all instruments under one lock and then delivers a single
//! snapshot to the registry. Ticks are serialized end to end: a tick started
//! on another thread waits until the previous snapshot has reached every
//! observer.

use super::format::{format_price, percent_change, round_change};
use super::generator::{FluctuationGenerator, UniformDelta};
use super::registry::{SubscriberRegistry, Subscription};
use super::scheduler::{Scheduler, TaskHandle};
use super::store::PriceStore;
use super::{PriceQuote, Snapshot, TickerError, TickerState};
use crate::config::{Config, ConfigError};
use crate::instrument::Instrument;
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, OnceLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Shortest interval accepted by [`Ticker::start`]
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Core {
    store: PriceStore,
    generator: FluctuationGenerator,
    seq: u64,
    as_of: DateTime<Utc>,
}

impl Core {
    fn advance_all(&mut self) {
        for pos in 0..self.store.len() {
            let current = self.store.current_at(pos);
            let raw = self.generator.next(current);
            self.store.advance_at(pos, raw);
        }
        self.seq += 1;
        self.as_of = Utc::now();
    }

    fn snapshot(&self) -> Snapshot {
        let quotes = self
            .store
            .iter()
            .map(|(instrument, state)| PriceQuote {
                symbol: instrument.symbol.clone(),
                name: instrument.name.clone(),
                price: format_price(state.current, instrument.format),
                change: round_change(percent_change(state.current, state.previous)),
            })
            .collect();

        Snapshot {
            seq: self.seq,
            as_of: self.as_of,
            quotes,
        }
    }
}

struct Schedule {
    handle: Box<dyn TaskHandle>,
    interval: Duration,
}

struct Inner {
    /// Held across compute and delivery; reentrant so observers may tick
    tick_guard: ReentrantMutex<()>,
    core: Mutex<Core>,
    registry: SubscriberRegistry,
    scheduler: Arc<dyn Scheduler>,
    schedule: Mutex<Option<Schedule>>,
}

impl Inner {
    fn tick(&self) -> Snapshot {
        let _serial = self.tick_guard.lock();
        let started = Instant::now();
        let snapshot = {
            let mut core = self.core.lock();
            core.advance_all();
            core.snapshot()
        };

        let delivery = self.registry.broadcast(&snapshot);
        telemetry::increment_counter(CounterMetric::Ticks);
        telemetry::record_latency(LatencyMetric::Tick, started.elapsed());
        tracing::trace!(
            seq = snapshot.seq,
            delivered = delivery.delivered,
            panicked = delivery.panicked,
            "Tick delivered"
        );

        snapshot
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(schedule) = self.schedule.get_mut().take() {
            schedule.handle.cancel();
        }
    }
}

/// Simulated price feed with an explicit start/stop lifecycle
///
/// Cloning yields another handle to the same feed.
#[derive(Clone)]
pub struct Ticker {
    inner: Arc<Inner>,
}

impl Ticker {
    /// Create a stopped ticker seeded at each instrument's base price
    ///
    /// Fails when the instrument set is empty, repeats a symbol or carries
    /// bounds that do not contain their base.
    pub fn new(
        instruments: Vec<Instrument>,
        generator: FluctuationGenerator,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        let core = Core {
            store: PriceStore::new(instruments)?,
            generator,
            seq: 0,
            as_of: Utc::now(),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                tick_guard: ReentrantMutex::new(()),
                core: Mutex::new(core),
                registry: SubscriberRegistry::new(),
                scheduler,
                schedule: Mutex::new(None),
            }),
        })
    }

    /// Build a ticker from validated configuration
    ///
    /// A configured seed makes the price path reproducible.
    pub fn from_config(
        config: &Config,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let max = config.ticker.max_fluctuation;
        let generator = match config.ticker.seed {
            Some(seed) => FluctuationGenerator::new(UniformDelta::seeded(seed, max)),
            None => FluctuationGenerator::new(UniformDelta::from_entropy(max)),
        };
        Self::new(config.instruments.clone(), generator, scheduler)
    }

    /// Start ticking every `interval`
    ///
    /// Restarts the schedule if already running. One tick runs immediately so
    /// a fresh snapshot is available without waiting for the first interval.
    pub fn start(&self, interval: Duration) {
        let interval = if interval < MIN_INTERVAL {
            tracing::warn!(?interval, "Interval too short, using minimum");
            MIN_INTERVAL
        } else {
            interval
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule_repeating(
            interval,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.tick();
                }
            }),
        );

        let previous = self
            .inner
            .schedule
            .lock()
            .replace(Schedule { handle, interval });
        if let Some(previous) = previous {
            previous.handle.cancel();
            tracing::info!(interval_ms = interval.as_millis() as u64, "Ticker restarted");
        } else {
            tracing::info!(interval_ms = interval.as_millis() as u64, "Ticker started");
        }

        self.inner.tick();
    }

    /// Cancel the schedule; no-op when already stopped
    pub fn stop(&self) {
        let previous = self.inner.schedule.lock().take();
        if let Some(schedule) = previous {
            schedule.handle.cancel();
            tracing::info!("Ticker stopped");
        }
    }

    pub fn state(&self) -> TickerState {
        if self.inner.schedule.lock().is_some() {
            TickerState::Running
        } else {
            TickerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TickerState::Running
    }

    /// Interval of the active schedule, if running
    pub fn interval(&self) -> Option<Duration> {
        self.inner.schedule.lock().as_ref().map(|s| s.interval)
    }

    /// Run one full update cycle now and broadcast it
    pub fn tick(&self) -> Snapshot {
        self.inner.tick()
    }

    /// Snapshot of the current state without advancing it
    pub fn current_prices(&self) -> Snapshot {
        self.inner.core.lock().snapshot()
    }

    /// Raw current price for a symbol
    pub fn price(&self, symbol: &str) -> Result<f64, TickerError> {
        self.inner.core.lock().store.get(symbol)
    }

    /// Raw price as of the preceding tick
    pub fn previous_price(&self, symbol: &str) -> Result<f64, TickerError> {
        self.inner.core.lock().store.previous(symbol)
    }

    pub fn instruments(&self) -> Vec<Instrument> {
        self.inner.core.lock().store.instruments().to_vec()
    }

    /// Register an observer called with every broadcast snapshot
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.inner.registry.subscribe(observer)
    }

    /// Receive snapshots over a bounded channel
    ///
    /// Delivery never waits on the receiver: when the channel is full the
    /// snapshot is dropped for that receiver. Once the receiver is dropped the
    /// subscription removes itself on the next tick.
    pub fn subscribe_channel(&self, capacity: usize) -> (mpsc::Receiver<Snapshot>, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let own: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());
        let slot = own.clone();

        let subscription = self.subscribe(move |snapshot| {
            match tx.try_send(snapshot.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(seq = snapshot.seq, "Snapshot channel full, dropping");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if let Some(sub) = slot.get() {
                        sub.unsubscribe();
                    }
                }
            }
        });
        let _ = own.set(subscription.clone());

        (rx, subscription)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
