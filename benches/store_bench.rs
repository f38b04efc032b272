use std::hint::black_box;
use std::sync::Arc;

use bookmarker::naming::{build_storage_path, StorageOwner};
use bookmarker::rules::BookmarkRules;
use bookmarker::store::EntityStore;
use bookmarker::types::{CreateEntryRequest, CreateUserRequest};
use bookmarker::db;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

async fn fresh_store() -> EntityStore {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::init_db(&pool).await.unwrap();
    EntityStore::new(pool, Arc::new(BookmarkRules::default()))
}

fn benchmark_storage_path(c: &mut Criterion) {
    let owner = StorageOwner { id: 17, username: Some("alice") };
    c.bench_function("build_storage_path", |b| {
        b.iter(|| build_storage_path(black_box("avatar"), owner, black_box("C:\\pics\\holiday.v2.jpeg")))
    });
}

fn benchmark_provisioning(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = rt.block_on(fresh_store());
    let mut n = 0u64;

    c.bench_function("create_user_with_provisioning", |b| {
        b.iter(|| {
            n += 1;
            let req = CreateUserRequest { username: format!("user{}", n), email: None };
            rt.block_on(store.create_user(&req)).unwrap()
        })
    });
}

fn benchmark_entry_creation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("create_entries");
    group.sample_size(10);

    for batch in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter(|| {
                rt.block_on(async {
                    let store = fresh_store().await;
                    let user = store
                        .create_user(&CreateUserRequest { username: "bench".into(), email: None })
                        .await
                        .unwrap();
                    let belong = user.default_favor.unwrap();
                    for i in 0..batch {
                        let req = CreateEntryRequest {
                            belong,
                            url: format!("https://example.org/{}", i),
                            title: None,
                            priority: None,
                            remark: None,
                            tags: None,
                        };
                        store.create_entry(&req).await.unwrap();
                    }
                    black_box(store.get_favorite(belong).await.unwrap().entries_num)
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_storage_path, benchmark_provisioning, benchmark_entry_creation);
criterion_main!(benches);
