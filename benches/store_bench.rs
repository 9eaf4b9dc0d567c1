// Benchmark for record store reads and writes
// Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use itemvault::BcryptHasher;
use itemvault::store::RecordStore;
use std::sync::Arc;

fn bench_create_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = RecordStore::new(Arc::new(BcryptHasher::fast()));
    c.bench_function("create_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.create_item("bench", "title", "description").await.unwrap();
            });
        });
    });
}

fn bench_list_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = RecordStore::new(Arc::new(BcryptHasher::fast()));
    rt.block_on(async {
        for i in 0..10_000 {
            store.create_item("bench", &format!("item {}", i), "").await.unwrap();
        }
    });
    c.bench_function("list_items (10k)", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = store.list_items().await;
                assert_eq!(items.len(), 10_000);
            });
        });
    });
}

criterion_group!(benches, bench_create_item, bench_list_items);
criterion_main!(benches);
