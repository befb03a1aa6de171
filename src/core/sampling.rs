//! Per-level log sampling for high-volume scenarios
//!
//! Each configured level gets its own counter. The first `initial` entries in
//! a window always pass, after that only one in every `thereafter` does.
//! Every `tick` the counters go back to zero so the warm-up window opens again.
//! Levels that are not listed in the configuration are never sampled.
//!
//! # Example
//!
//! ```
//! use rust_logger_core::{LogLevel, Sampler, SamplingConfig};
//! use std::time::Duration;
//!
//! let sampler = Sampler::new(SamplingConfig {
//!     enabled: true,
//!     initial: 2,
//!     thereafter: 5,
//!     tick: Duration::ZERO,
//!     levels: vec![LogLevel::Debug],
//! });
//!
//! let kept: Vec<u64> = (1..=12)
//!     .filter(|_| !sampler.should_drop(LogLevel::Debug))
//!     .collect();
//! assert_eq!(kept, vec![1, 2, 7, 12]);
//! ```

use super::config::duration_ms;
use super::log_level::LogLevel;
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for log sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub enabled: bool,

    /// Entries per window that always pass
    pub initial: u64,

    /// After `initial`, keep one of every `thereafter` entries
    ///
    /// Zero keeps nothing past the warm-up window.
    pub thereafter: u64,

    /// Counter reset period; zero disables the reset
    #[serde(rename = "tick_ms", with = "duration_ms")]
    pub tick: Duration,

    /// Levels subject to sampling
    pub levels: Vec<LogLevel>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            initial: 100,
            thereafter: 100,
            tick: Duration::from_secs(1),
            levels: Vec::new(),
        }
    }
}

impl SamplingConfig {
    /// Enabled config with the given window for the listed levels
    pub fn new(initial: u64, thereafter: u64, levels: Vec<LogLevel>) -> Self {
        Self {
            enabled: true,
            initial,
            thereafter,
            levels,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

/// Metrics for sampling observability
///
/// ```
/// use rust_logger_core::SamplerMetrics;
///
/// let metrics = SamplerMetrics::new();
/// assert_eq!(metrics.sampled_count(), 0);
/// assert_eq!(metrics.dropped_count(), 0);
/// ```
#[derive(Debug)]
pub struct SamplerMetrics {
    /// Entries that passed sampling
    sampled_count: AtomicU64,

    /// Entries dropped by sampling
    dropped_count: AtomicU64,

    /// Entries seen on sampled levels
    total_count: AtomicU64,

    /// Completed counter resets
    resets: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            total_count: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_sampled(&self) {
        self.sampled_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of sampled-level entries that passed
    ///
    /// Returns 1.0 if no entries have been seen yet.
    pub fn effective_sample_rate(&self) -> f64 {
        let sampled = self.sampled_count() as f64;
        let total = self.total_count() as f64;

        if total == 0.0 {
            1.0
        } else {
            sampled / total
        }
    }
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter for one sampled level
#[derive(Debug, Default)]
struct LevelCounter {
    count: Mutex<u64>,
}

/// Counters are created once and never added or removed, so the map itself
/// needs no lock; each level has its own mutex.
type Counters = HashMap<LogLevel, LevelCounter>;

fn reset_counters(counters: &Counters) {
    for counter in counters.values() {
        *counter.count.lock() = 0;
    }
}

/// Per-level volume sampler
pub struct Sampler {
    initial: u64,
    thereafter: u64,
    tick: Duration,
    counters: Arc<Counters>,
    metrics: Arc<SamplerMetrics>,
    ticker: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl Sampler {
    /// Create a sampler and start its reset ticker when `tick` is non-zero
    pub fn new(config: SamplingConfig) -> Self {
        let counters: Arc<Counters> = Arc::new(
            config
                .levels
                .iter()
                .map(|level| (*level, LevelCounter::default()))
                .collect(),
        );
        let metrics = Arc::new(SamplerMetrics::new());

        let ticker = if config.tick.is_zero() || counters.is_empty() {
            None
        } else {
            Some(Self::spawn_ticker(
                config.tick,
                Arc::clone(&counters),
                Arc::clone(&metrics),
            ))
        };

        Self {
            initial: config.initial,
            thereafter: config.thereafter,
            tick: config.tick,
            counters,
            metrics,
            ticker: Mutex::new(ticker),
        }
    }

    fn spawn_ticker(
        period: Duration,
        counters: Arc<Counters>,
        metrics: Arc<SamplerMetrics>,
    ) -> (Sender<()>, JoinHandle<()>) {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::spawn(move || {
            let ticker = tick(period);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        reset_counters(&counters);
                        metrics.record_reset();
                    }
                    // Disconnect of the stop sender ends the loop
                    recv(stop_rx) -> _ => break,
                }
            }
        });
        (stop_tx, handle)
    }

    /// Decide whether an entry at `level` should be dropped
    pub fn should_drop(&self, level: LogLevel) -> bool {
        let Some(counter) = self.counters.get(&level) else {
            return false;
        };

        let count = {
            let mut count = counter.count.lock();
            *count = count.saturating_add(1);
            *count
        };

        let dropped = if count <= self.initial {
            false
        } else if self.thereafter == 0 {
            true
        } else {
            (count - self.initial) % self.thereafter != 0
        };

        if dropped {
            self.metrics.record_dropped();
        } else {
            self.metrics.record_sampled();
        }
        dropped
    }

    /// Whether `level` has a counter
    pub fn is_sampled_level(&self, level: LogLevel) -> bool {
        self.counters.contains_key(&level)
    }

    /// Current window count for `level`
    pub fn count(&self, level: LogLevel) -> Option<u64> {
        self.counters.get(&level).map(|c| *c.count.lock())
    }

    /// Reset every counter, reopening the warm-up window
    pub fn reset(&self) {
        reset_counters(&self.counters);
        self.metrics.record_reset();
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Stop the reset ticker; later calls do nothing
    pub fn close(&self) {
        let ticker = self.ticker.lock().take();
        if let Some((stop_tx, handle)) = ticker {
            drop(stop_tx);
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Sampler reset thread panicked");
            }
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut levels: Vec<_> = self.counters.keys().copied().collect();
        levels.sort();
        f.debug_struct("Sampler")
            .field("initial", &self.initial)
            .field("thereafter", &self.thereafter)
            .field("tick", &self.tick)
            .field("levels", &levels)
            .field("metrics", &self.metrics)
            .finish()
    }
}
