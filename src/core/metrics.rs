//! Logger metrics for observability
//!
//! Counters shared by the logger, its async processor and the dispatch
//! path. All counters are relaxed atomics; a `clone()` is a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_logger_core::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries written successfully by the provider
    total_logged: AtomicU64,

    /// Entries the provider failed to write
    provider_errors: AtomicU64,

    /// Entries discarded because the queue was full
    dropped_count: AtomicU64,

    /// Number of times the queue was found full
    queue_full_events: AtomicU64,

    /// Entries handled on the caller's thread because the queue was full
    sync_fallbacks: AtomicU64,

    /// Entries cancelled by middleware
    cancelled: AtomicU64,

    /// Hook failures, including hook panics
    hook_errors: AtomicU64,

    /// Panics caught while handling an entry
    handler_panics: AtomicU64,

    /// Calls made after the logger was closed
    rejected_after_close: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            provider_errors: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            sync_fallbacks: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            hook_errors: AtomicU64::new(0),
            handler_panics: AtomicU64::new(0),
            rejected_after_close: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn provider_errors(&self) -> u64 {
        self.provider_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sync_fallbacks(&self) -> u64 {
        self.sync_fallbacks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn hook_errors(&self) -> u64 {
        self.hook_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn handler_panics(&self) -> u64 {
        self.handler_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_after_close(&self) -> u64 {
        self.rejected_after_close.load(Ordering::Relaxed)
    }

    /// Each `record_*` returns the previous value
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_provider_error(&self) -> u64 {
        self.provider_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sync_fallback(&self) -> u64 {
        self.sync_fallbacks.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_cancelled(&self) -> u64 {
        self.cancelled.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_hook_error(&self) -> u64 {
        self.hook_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_handler_panic(&self) -> u64 {
        self.handler_panics.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected_after_close(&self) -> u64 {
        self.rejected_after_close.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no logs have been processed.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.provider_errors.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.sync_fallbacks.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);
        self.hook_errors.store(0, Ordering::Relaxed);
        self.handler_panics.store(0, Ordering::Relaxed);
        self.rejected_after_close.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            provider_errors: AtomicU64::new(self.provider_errors()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            sync_fallbacks: AtomicU64::new(self.sync_fallbacks()),
            cancelled: AtomicU64::new(self.cancelled()),
            hook_errors: AtomicU64::new(self.hook_errors()),
            handler_panics: AtomicU64::new(self.handler_panics()),
            rejected_after_close: AtomicU64::new(self.rejected_after_close()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.total_logged(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
        assert_eq!(metrics.sync_fallbacks(), 0);
        assert_eq!(metrics.handler_panics(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_logged();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_dropped();
        metrics.record_logged();
        metrics.record_hook_error();
        metrics.record_cancelled();
        metrics.record_rejected_after_close();

        metrics.reset();

        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.total_logged(), 0);
        assert_eq!(metrics.hook_errors(), 0);
        assert_eq!(metrics.cancelled(), 0);
        assert_eq!(metrics.rejected_after_close(), 0);
    }

    #[test]
    fn test_rejected_after_close_is_not_a_drop() {
        let metrics = LoggerMetrics::new();
        metrics.record_logged();
        metrics.record_rejected_after_close();

        assert_eq!(metrics.rejected_after_close(), 1);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.drop_rate(), 0.0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_sync_fallback();

        let snapshot = metrics.clone();
        metrics.record_sync_fallback();

        assert_eq!(metrics.sync_fallbacks(), 2);
        assert_eq!(snapshot.sync_fallbacks(), 1);
    }
}
