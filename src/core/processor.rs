//! Asynchronous entry processing
//!
//! A bounded `crossbeam_channel` queue feeds a fixed pool of worker threads.
//! Producers never block on a full queue: the entry is either discarded
//! (`drop_on_full`) or handled on the producer's thread.
//!
//! The processor counts entries in flight (queued or being handled) so that
//! [`AsyncProcessor::flush`] can wait on a condition variable until the
//! workers have caught up, instead of polling the queue length.

use super::config::AsyncConfig;
use super::error::{panic_message, LoggerError, Result};
use super::log_entry::LogEntry;
use super::metrics::LoggerMetrics;
use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Receives entries taken off the queue
///
/// Called concurrently from every worker thread, and from producer threads
/// when an entry is handled synchronously.
pub trait EntryHandler: Send + Sync {
    fn handle(&self, entry: &LogEntry);

    /// Called after the queue drains on flush, periodically, and on close
    fn flush(&self) {}
}

impl<F> EntryHandler for F
where
    F: Fn(&LogEntry) + Send + Sync,
{
    fn handle(&self, entry: &LogEntry) {
        self(entry)
    }
}

/// Processor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Created,
    Running,
    Closing,
    Closed,
}

/// What [`AsyncProcessor::process`] did with an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Enqueued for a worker
    Queued,
    /// Handled on the calling thread
    Synchronous,
    /// Discarded because the queue was full
    Dropped,
}

struct Shared {
    state: RwLock<ProcessorState>,
    handler: Arc<dyn EntryHandler>,
    metrics: Arc<LoggerMetrics>,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn handle(&self, entry: &LogEntry) {
        let result = catch_unwind(AssertUnwindSafe(|| self.handler.handle(entry)));
        if let Err(payload) = result {
            self.metrics.record_handler_panic();
            eprintln!(
                "[LOGGER CRITICAL] Entry handler panicked: {}. Worker continues.",
                panic_message(payload.as_ref())
            );
        }
    }

    fn flush_handler(&self) {
        let result = catch_unwind(AssertUnwindSafe(|| self.handler.flush()));
        if let Err(payload) = result {
            eprintln!(
                "[LOGGER CRITICAL] Entry handler panicked during flush: {}",
                panic_message(payload.as_ref())
            );
        }
    }

    fn begin(&self) {
        *self.in_flight.lock() += 1;
    }

    fn finish(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }

    /// Handle a dequeued entry and release its in-flight slot
    fn complete(&self, entry: &LogEntry) {
        self.handle(entry);
        self.finish();
    }

    /// Block until nothing is in flight; `false` if `timeout` elapsed first
    fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let mut in_flight = self.in_flight.lock();
        match timeout {
            None => {
                while *in_flight > 0 {
                    self.idle.wait(&mut in_flight);
                }
                true
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *in_flight > 0 {
                    if self.idle.wait_until(&mut in_flight, deadline).timed_out() {
                        return *in_flight == 0;
                    }
                }
                true
            }
        }
    }
}

/// Bounded queue with a fixed worker pool
///
/// # Example
///
/// ```
/// use rust_logger_core::core::processor::{AsyncProcessor, ProcessOutcome};
/// use rust_logger_core::{AsyncConfig, LogEntry, LogLevel, LoggerMetrics};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// let processor = AsyncProcessor::new(
///     &AsyncConfig::new(64, 2),
///     Arc::new(move |_: &LogEntry| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }),
///     Arc::new(LoggerMetrics::new()),
/// )
/// .unwrap();
///
/// let outcome = processor.process(&LogEntry::new(LogLevel::Info, "queued"));
/// assert_ne!(outcome, ProcessOutcome::Dropped);
///
/// processor.close();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct AsyncProcessor {
    shared: Arc<Shared>,
    sender: Sender<LogEntry>,
    receiver: Receiver<LogEntry>,
    stop: Mutex<Option<Sender<()>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    buffer_size: usize,
    workers: usize,
    flush_interval: Duration,
    drop_on_full: bool,
}

impl AsyncProcessor {
    /// Create the queue and start the workers and periodic flusher
    pub fn new(
        config: &AsyncConfig,
        handler: Arc<dyn EntryHandler>,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let buffer_size = config.effective_buffer_size();
        let workers = config.effective_workers();
        let (sender, receiver) = bounded(buffer_size);
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let processor = Self {
            shared: Arc::new(Shared {
                state: RwLock::new(ProcessorState::Created),
                handler,
                metrics,
                in_flight: Mutex::new(0),
                idle: Condvar::new(),
            }),
            sender,
            receiver,
            stop: Mutex::new(Some(stop_tx)),
            threads: Mutex::new(Vec::with_capacity(workers + 1)),
            buffer_size,
            workers,
            flush_interval: config.flush_interval,
            drop_on_full: config.drop_on_full,
        };

        {
            let mut threads = processor.threads.lock();
            for id in 0..workers {
                let shared = Arc::clone(&processor.shared);
                let queue = processor.receiver.clone();
                let stop = stop_rx.clone();
                let handle = thread::Builder::new()
                    .name(format!("logger-worker-{}", id))
                    .spawn(move || run_worker(&shared, &queue, &stop))
                    .map_err(|e| {
                        LoggerError::io_operation("spawning worker", format!("worker {}", id), e)
                    })?;
                threads.push(handle);
            }

            if !processor.flush_interval.is_zero() {
                let shared = Arc::clone(&processor.shared);
                let interval = processor.flush_interval;
                let handle = thread::Builder::new()
                    .name("logger-flusher".to_string())
                    .spawn(move || run_flusher(&shared, interval, &stop_rx))
                    .map_err(|e| LoggerError::io_operation("spawning flusher", "flusher", e))?;
                threads.push(handle);
            }
        }

        *processor.shared.state.write() = ProcessorState::Running;
        Ok(processor)
    }

    /// Queue a copy of `entry`, falling back per the overflow setting
    pub fn process(&self, entry: &LogEntry) -> ProcessOutcome {
        self.enqueue(entry.clone())
    }

    /// Queue an owned entry, falling back per the overflow setting
    ///
    /// Fatal and Panic entries are never dropped; a full queue writes them on
    /// the caller's thread regardless of `drop_on_full`.
    pub fn enqueue(&self, entry: LogEntry) -> ProcessOutcome {
        let entry = {
            // Held across the send so close() cannot start draining mid-enqueue
            let state = self.shared.state.read();
            if *state != ProcessorState::Running {
                drop(state);
                self.shared.handle(&entry);
                return ProcessOutcome::Synchronous;
            }
            self.shared.begin();
            match self.sender.try_send(entry) {
                Ok(()) => return ProcessOutcome::Queued,
                Err(TrySendError::Full(entry)) | Err(TrySendError::Disconnected(entry)) => {
                    self.shared.finish();
                    entry
                }
            }
        };

        self.shared.metrics.record_queue_full();
        if self.drop_on_full && !entry.level.is_terminal() {
            self.alert_and_drop();
            ProcessOutcome::Dropped
        } else {
            self.shared.metrics.record_sync_fallback();
            self.shared.handle(&entry);
            ProcessOutcome::Synchronous
        }
    }

    fn alert_and_drop(&self) {
        let dropped = self.shared.metrics.record_dropped() + 1;
        if dropped == 1 || dropped % 1000 == 0 {
            eprintln!(
                "[LOGGER WARNING] Queue full, {} logs dropped. \
                 Consider increasing buffer_size or disabling drop_on_full.",
                dropped
            );
        }
    }

    /// Wait for the queue to drain, then flush the handler
    pub fn flush(&self) {
        self.shared.wait_idle(None);
        self.shared.flush_handler();
    }

    /// Like [`flush`](Self::flush) with a bounded wait
    ///
    /// Returns `false` if entries were still in flight when `timeout` elapsed;
    /// the handler is flushed either way.
    pub fn flush_timeout(&self, timeout: Duration) -> bool {
        let drained = self.shared.wait_idle(Some(timeout));
        self.shared.flush_handler();
        drained
    }

    /// Stop the workers after they drain the queue
    ///
    /// Only a running processor is closed; other calls return immediately.
    pub fn close(&self) {
        {
            let mut state = self.shared.state.write();
            if *state != ProcessorState::Running {
                return;
            }
            *state = ProcessorState::Closing;
        }

        drop(self.stop.lock().take());
        let threads = std::mem::take(&mut *self.threads.lock());
        for handle in threads {
            let name = handle.thread().name().unwrap_or("logger thread").to_string();
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] {} panicked during shutdown", name);
            }
        }

        // Anything a worker did not get to
        while let Ok(entry) = self.receiver.try_recv() {
            self.shared.complete(&entry);
        }
        self.shared.flush_handler();

        *self.shared.state.write() = ProcessorState::Closed;
    }

    pub fn state(&self) -> ProcessorState {
        *self.shared.state.read()
    }

    /// Entries currently queued
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    /// Entries queued or being handled
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.lock()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn drop_on_full(&self) -> bool {
        self.drop_on_full
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }
}

impl Drop for AsyncProcessor {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AsyncProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncProcessor")
            .field("state", &self.state())
            .field("buffer_size", &self.buffer_size)
            .field("workers", &self.workers)
            .field("flush_interval", &self.flush_interval)
            .field("drop_on_full", &self.drop_on_full)
            .field("queue_len", &self.queue_len())
            .finish()
    }
}

fn run_worker(shared: &Shared, queue: &Receiver<LogEntry>, stop: &Receiver<()>) {
    loop {
        select! {
            recv(queue) -> msg => match msg {
                Ok(entry) => shared.complete(&entry),
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        }
    }

    while let Ok(entry) = queue.try_recv() {
        shared.complete(&entry);
    }
}

fn run_flusher(shared: &Shared, interval: Duration, stop: &Receiver<()>) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => {
                shared.wait_idle(Some(interval));
                shared.flush_handler();
            }
            recv(stop) -> _ => break,
        }
    }
}
