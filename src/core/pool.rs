//! Object pools for log entries and render buffers
//!
//! Both pools are free lists backed by a bounded `crossbeam_channel`, so
//! `acquire` and release never block: an empty pool allocates a fresh
//! object and a full pool simply lets the returned object drop.
//!
//! Pooled objects are handed out as guards ([`PooledEntry`], [`PooledBuffer`])
//! that give the object back on drop. A pooled entry is owned by the caller
//! that acquired it; anything that outlives the call (the async queue) must
//! take an owned copy with [`PooledEntry::to_owned_entry`].

use super::log_entry::LogEntry;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default number of idle entries retained
pub const DEFAULT_ENTRY_POOL_SIZE: usize = 1024;

/// Default pre-sized field capacity of a freshly allocated entry
pub const DEFAULT_FIELD_CAPACITY: usize = 16;

/// Default number of idle buffers retained
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 256;

/// Default initial buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Buffers that grew beyond this are not retained
pub const MAX_RETAINED_BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Default)]
struct PoolCounters {
    acquired: AtomicU64,
    allocated: AtomicU64,
}

/// Pool of reusable [`LogEntry`] values
#[derive(Debug)]
pub struct EntryPool {
    free_tx: Sender<LogEntry>,
    free_rx: Receiver<LogEntry>,
    field_capacity: usize,
    counters: PoolCounters,
}

impl EntryPool {
    pub fn new(max_idle: usize, field_capacity: usize) -> Self {
        let (free_tx, free_rx) = bounded(max_idle.max(1));
        Self {
            free_tx,
            free_rx,
            field_capacity,
            counters: PoolCounters::default(),
        }
    }

    /// Take an entry from the pool, allocating one if the pool is empty
    pub fn acquire(&self) -> PooledEntry<'_> {
        self.counters.acquired.fetch_add(1, Ordering::Relaxed);
        let entry = self.free_rx.try_recv().unwrap_or_else(|_| {
            self.counters.allocated.fetch_add(1, Ordering::Relaxed);
            LogEntry {
                fields: Vec::with_capacity(self.field_capacity),
                ..Default::default()
            }
        });
        PooledEntry { entry, pool: self }
    }

    fn release(&self, mut entry: LogEntry) {
        entry.reset();
        // A full free list means enough idle entries already exist
        let _ = self.free_tx.try_send(entry);
    }

    /// Number of `acquire` calls so far
    pub fn acquired_count(&self) -> u64 {
        self.counters.acquired.load(Ordering::Relaxed)
    }

    /// Number of entries allocated because the pool was empty
    pub fn allocated_count(&self) -> u64 {
        self.counters.allocated.load(Ordering::Relaxed)
    }

    /// Number of idle entries currently held
    pub fn idle_count(&self) -> usize {
        self.free_rx.len()
    }
}

impl Default for EntryPool {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_POOL_SIZE, DEFAULT_FIELD_CAPACITY)
    }
}

/// Caller-owned entry borrowed from an [`EntryPool`]
pub struct PooledEntry<'a> {
    entry: LogEntry,
    pool: &'a EntryPool,
}

impl PooledEntry<'_> {
    /// Deep copy for hand-off beyond the current call
    pub fn to_owned_entry(&self) -> LogEntry {
        self.entry.clone()
    }
}

impl Deref for PooledEntry<'_> {
    type Target = LogEntry;

    fn deref(&self) -> &LogEntry {
        &self.entry
    }
}

impl DerefMut for PooledEntry<'_> {
    fn deref_mut(&mut self) -> &mut LogEntry {
        &mut self.entry
    }
}

impl Drop for PooledEntry<'_> {
    fn drop(&mut self) {
        let entry = std::mem::take(&mut self.entry);
        self.pool.release(entry);
    }
}

/// Pool of reusable byte buffers for the rendering path
#[derive(Debug)]
pub struct BufferPool {
    free_tx: Sender<Vec<u8>>,
    free_rx: Receiver<Vec<u8>>,
    initial_capacity: usize,
    counters: PoolCounters,
}

impl BufferPool {
    pub fn new(max_idle: usize, initial_capacity: usize) -> Self {
        let (free_tx, free_rx) = bounded(max_idle.max(1));
        Self {
            free_tx,
            free_rx,
            initial_capacity,
            counters: PoolCounters::default(),
        }
    }

    pub fn acquire(&self) -> PooledBuffer<'_> {
        self.counters.acquired.fetch_add(1, Ordering::Relaxed);
        let buffer = self.free_rx.try_recv().unwrap_or_else(|_| {
            self.counters.allocated.fetch_add(1, Ordering::Relaxed);
            Vec::with_capacity(self.initial_capacity)
        });
        PooledBuffer { buffer, pool: self }
    }

    fn release(&self, mut buffer: Vec<u8>) {
        if buffer.capacity() > MAX_RETAINED_BUFFER_CAPACITY {
            return;
        }
        buffer.clear();
        let _ = self.free_tx.try_send(buffer);
    }

    pub fn acquired_count(&self) -> u64 {
        self.counters.acquired.load(Ordering::Relaxed)
    }

    pub fn allocated_count(&self) -> u64 {
        self.counters.allocated.load(Ordering::Relaxed)
    }

    pub fn idle_count(&self) -> usize {
        self.free_rx.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_SIZE, DEFAULT_BUFFER_CAPACITY)
    }
}

/// Byte buffer borrowed from a [`BufferPool`]
pub struct PooledBuffer<'a> {
    buffer: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.pool.release(buffer);
    }
}

/// Entry and buffer pools shared by one logging pipeline
#[derive(Debug)]
pub struct ObjectPools {
    pub entries: EntryPool,
    pub buffers: Arc<BufferPool>,
}

impl ObjectPools {
    pub fn new(entries: EntryPool, buffers: Arc<BufferPool>) -> Self {
        Self { entries, buffers }
    }
}

impl Default for ObjectPools {
    fn default() -> Self {
        Self::new(EntryPool::default(), Arc::new(BufferPool::default()))
    }
}
