//! Benchmark for the aliveness status cache
//!
//! Every storage operation goes through the EMA update and every storage
//! selection through a cache read, so both stay on the hot path.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use multi_storage::stats::cache::{
    AliveMap, AlivenessCache, CacheConfig, EmaParams, Key, SharedFile, SharedMemory, StatusCache,
    StorageStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const STORAGES: usize = 8;

fn names() -> Vec<String> {
    (0..STORAGES).map(|i| format!("failover_{i}")).collect()
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn memory_cache(runtime: &Runtime, file: Option<Arc<SharedFile>>) -> AlivenessCache {
    let keys: HashMap<String, Key> = names()
        .into_iter()
        .map(|name| {
            let key = Key::new(name.clone(), format!("{:064x}", name.len()));
            (name, key)
        })
        .collect();
    let cache = AlivenessCache::new(keys, CacheConfig::default(), Arc::new(SharedMemory::new()), file)
        .expect("valid cache config");

    let check: AliveMap = names().into_iter().map(|name| (name, true)).collect();
    runtime
        .block_on(cache.apply_explicit_check_result(&check, Utc::now(), &names()))
        .expect("apply check result");
    cache
}

fn bench_ema_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_cache");
    group.throughput(Throughput::Elements(1));

    group.bench_function("ema_update", |b| {
        let params = EmaParams::default();
        let mut status = StorageStatus::default();
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            status = status.apply_operation_result(
                black_box(&params),
                counter % 7 != 0,
                1000.0,
                Utc::now(),
            );
        });
    });

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_cache");
    group.throughput(Throughput::Elements(STORAGES as u64));

    group.bench_function("read_relevant_memory", |b| {
        let runtime = runtime();
        let cache = memory_cache(&runtime, None);
        let names = names();
        b.iter(|| {
            let _ = runtime.block_on(cache.read(black_box(&names)));
        });
    });

    group.finish();
}

fn bench_operation_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_cache");
    group.throughput(Throughput::Elements(1));

    group.bench_function("operation_report_memory", |b| {
        let cache = memory_cache(&runtime(), None);
        let mut counter = 0usize;
        b.iter(|| {
            counter += 1;
            let name = format!("failover_{}", counter % STORAGES);
            cache.apply_operation_result(black_box(&name), true, 1000.0);
        });
    });

    group.bench_function("operation_report_with_file", |b| {
        let temp = TempDir::new().expect("temp dir");
        let file = Arc::new(SharedFile::new(temp.path().join("status_cache")));
        let cache = memory_cache(&runtime(), Some(file));
        let mut counter = 0usize;
        b.iter(|| {
            counter += 1;
            let name = format!("failover_{}", counter % STORAGES);
            cache.apply_operation_result(black_box(&name), true, 1000.0);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ema_update,
    bench_read,
    bench_operation_reports,
);
criterion_main!(benches);
