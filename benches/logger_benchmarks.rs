//! Criterion benchmarks for rust_logger_core

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_logger_core::core::pool::{BufferPool, EntryPool};
use rust_logger_core::core::sampling::Sampler;
use rust_logger_core::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Provider that discards everything, so benchmarks measure the pipeline
struct NullProvider;

impl Provider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }

    fn configure(&self, _config: &ProviderConfig) -> Result<()> {
        Ok(())
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        black_box(entry);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn sync_logger(level: LogLevel) -> CoreLogger {
    CoreLogger::builder()
        .level(level)
        .provider(NullProvider)
        .build()
        .expect("Failed to build logger")
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = sync_logger(LogLevel::Trace);
    let fields = [Field::new("user", "alice"), Field::new("attempt", 3)];

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("Info message"), &[]));
    });

    group.bench_function("info_with_fields", |b| {
        b.iter(|| logger.info(black_box("Info message"), black_box(&fields)));
    });

    let with_context = logger.with_context(
        &Context::new()
            .with_value("trace_id", "4bf92f3577b34da6")
            .with_value("user_id", "u-42"),
    );
    group.bench_function("info_with_context", |b| {
        b.iter(|| with_context.info(black_box("Info message"), &[]));
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    for (name, drop_on_full) in [("sync_fallback", false), ("drop_on_full", true)] {
        let logger = CoreLogger::builder()
            .async_mode(AsyncConfig::new(8192, 2).with_drop_on_full(drop_on_full))
            .provider(NullProvider)
            .build()
            .expect("Failed to build logger");

        group.bench_function(name, |b| {
            b.iter(|| logger.info(black_box("Async message"), &[]));
        });
        logger.close().expect("Failed to close");
    }

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");
    let threads = 4;
    let per_thread = 1000;
    group.throughput(Throughput::Elements((threads * per_thread) as u64));

    let logger = CoreLogger::builder()
        .async_mode(AsyncConfig::new(8192, 4))
        .provider(NullProvider)
        .build()
        .expect("Failed to build logger");

    group.bench_function("4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let logger = logger.clone();
                    thread::spawn(move || {
                        for _ in 0..per_thread {
                            logger.info("Concurrent message", &[]);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("producer panicked");
            }
            logger.flush().expect("Failed to flush");
        });
    });

    group.finish();
}

// ============================================================================
// Filtering and Sampling Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = sync_logger(LogLevel::Error);

    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("Filtered message"), &[]));
    });

    group.bench_function("is_level_enabled", |b| {
        b.iter(|| black_box(logger.is_level_enabled(black_box(LogLevel::Debug))));
    });

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    group.throughput(Throughput::Elements(1));

    let sampler = Sampler::new(
        SamplingConfig::new(100, 100, vec![LogLevel::Debug, LogLevel::Info])
            .with_tick(Duration::ZERO),
    );
    group.bench_function("should_drop_sampled_level", |b| {
        b.iter(|| black_box(sampler.should_drop(black_box(LogLevel::Info))));
    });
    group.bench_function("should_drop_unsampled_level", |b| {
        b.iter(|| black_box(sampler.should_drop(black_box(LogLevel::Error))));
    });

    let logger = CoreLogger::builder()
        .sampling(SamplingConfig::new(10, 100, vec![LogLevel::Info]))
        .provider(NullProvider)
        .build()
        .expect("Failed to build logger");
    group.bench_function("sampled_logger", |b| {
        b.iter(|| logger.info(black_box("Sampled message"), &[]));
    });

    group.finish();
}

// ============================================================================
// Pool and Rendering Benchmarks
// ============================================================================

fn bench_pools(c: &mut Criterion) {
    let mut group = c.benchmark_group("pools");
    group.throughput(Throughput::Elements(1));

    let entries = EntryPool::default();
    group.bench_function("entry_acquire_release", |b| {
        b.iter(|| {
            let mut entry = entries.acquire();
            entry.message.push_str("pooled");
            black_box(&entry);
        });
    });

    group.bench_function("entry_allocate", |b| {
        b.iter(|| black_box(LogEntry::new(LogLevel::Info, "allocated")));
    });

    let buffers = Arc::new(BufferPool::default());
    group.bench_function("buffer_acquire_release", |b| {
        b.iter(|| {
            let mut buffer = buffers.acquire();
            buffer.extend_from_slice(b"rendered");
            black_box(&buffer);
        });
    });

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "Request processed")
        .with_field(Field::new("user", "alice"))
        .with_field(Field::new("latency_ms", 42))
        .with_field(Field::new("cached", false));
    let timestamp = TimestampFormat::Iso8601;

    for (name, format) in [
        ("text", OutputFormat::Text),
        ("json", OutputFormat::Json),
        ("logfmt", OutputFormat::Logfmt),
    ] {
        let mut out = Vec::with_capacity(256);
        group.bench_function(name, |b| {
            b.iter(|| {
                out.clear();
                format
                    .render(black_box(&entry), &timestamp, &mut out)
                    .expect("render failed");
                black_box(&out);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sync_logging,
    bench_async_logging,
    bench_concurrent_logging,
    bench_level_filtering,
    bench_sampling,
    bench_pools,
    bench_rendering,
);

criterion_main!(benches);
