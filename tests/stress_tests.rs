//! Stress tests for the async pipeline under load
//!
//! These tests verify:
//! - Nothing is lost when a full queue falls back to synchronous writes
//! - Dropping on a full queue never panics or deadlocks
//! - Close drains every queued entry, even when called concurrently
//! - Thread safety under concurrent high-volume logging

use parking_lot::Mutex;
use rust_logger_core::prelude::*;
use rust_logger_core::ProcessorState;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Provider that sleeps on every write
struct SlowProvider {
    delay: Duration,
    written: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl SlowProvider {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            written: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.written.lock().len()
    }
}

impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn configure(&self, _config: &ProviderConfig) -> Result<()> {
        Ok(())
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.written.lock().push(entry.message.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_full_queue_without_drop_loses_nothing() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(1)));
    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(4, 1))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    for i in 0..200 {
        logger.info(format!("msg {}", i), &[]);
    }
    logger.close().expect("Failed to close");

    assert_eq!(provider.count(), 200);
    assert!(logger.metrics().queue_full_events() > 0);
    assert_eq!(
        logger.metrics().sync_fallbacks(),
        logger.metrics().queue_full_events()
    );
    assert_eq!(logger.metrics().dropped_count(), 0);

    let unique: HashSet<_> = provider.written.lock().iter().cloned().collect();
    assert_eq!(unique.len(), 200);
}

#[test]
fn test_full_queue_with_drop_sheds_load() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(2)));
    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(4, 1).with_drop_on_full(true))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    for i in 0..500 {
        logger.info(format!("msg {}", i), &[]);
    }
    logger.close().expect("Failed to close");

    let dropped = logger.metrics().dropped_count() as usize;
    assert!(dropped > 0, "a 4-slot queue behind a slow provider must shed load");
    assert_eq!(provider.count() + dropped, 500);
    assert_eq!(logger.metrics().sync_fallbacks(), 0);
}

#[test]
fn test_concurrent_producers() {
    let provider = Arc::new(SlowProvider::new(Duration::ZERO));
    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(256, 4))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let logger = logger.with_fields(&[Field::new("thread", t)]);
            thread::spawn(move || {
                for i in 0..500 {
                    logger.info(format!("t{} m{}", t, i), &[]);
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().expect("producer panicked");
    }

    logger.flush().expect("Failed to flush");
    assert_eq!(provider.count(), 4000);
    logger.close().expect("Failed to close");
    assert_eq!(provider.count(), 4000);
}

#[test]
fn test_concurrent_close_is_idempotent() {
    let provider = Arc::new(SlowProvider::new(Duration::from_micros(200)));
    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(1024, 2))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    for i in 0..300 {
        logger.info(format!("msg {}", i), &[]);
    }

    let closers: Vec<_> = (0..3)
        .map(|_| {
            let logger = logger.clone();
            thread::spawn(move || logger.close())
        })
        .collect();
    for handle in closers {
        handle.join().expect("closer panicked").expect("close failed");
    }

    assert_eq!(provider.closes.load(Ordering::SeqCst), 1);
    assert_eq!(provider.count(), 300);
    assert_eq!(logger.processor_state(), Some(ProcessorState::Closed));
}

#[test]
fn test_logging_races_close() {
    let provider = Arc::new(SlowProvider::new(Duration::ZERO));
    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(64, 2))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    let producer = {
        let logger = logger.clone();
        thread::spawn(move || {
            for i in 0..5000 {
                logger.info(format!("msg {}", i), &[]);
            }
        })
    };
    thread::sleep(Duration::from_millis(1));
    logger.close().expect("Failed to close");
    producer.join().expect("producer panicked");

    // Every call either reached the provider or was rejected after close
    let rejected = logger.metrics().rejected_after_close() as usize;
    assert_eq!(provider.count() + rejected, 5000);
    assert_eq!(logger.metrics().dropped_count(), 0);
}

#[test]
fn test_sampler_under_contention() {
    let provider = Arc::new(SlowProvider::new(Duration::ZERO));
    let logger = CoreLogger::builder()
        .sampling(SamplingConfig::new(10, 10, vec![LogLevel::Info]).with_tick(Duration::ZERO))
        .provider(Arc::clone(&provider))
        .build()
        .expect("Failed to build logger");

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let logger = logger.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    logger.info("sampled", &[]);
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().expect("producer panicked");
    }

    // 1000 calls: the first 10 pass, then one of every 10 of the remaining 990
    assert_eq!(provider.count(), 10 + 99);
    let metrics = logger.sampler_metrics().unwrap();
    assert_eq!(metrics.total_count(), 1000);
}
