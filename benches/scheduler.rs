use std::sync::Arc;

use allowance_core::{
    ledger::{Account, Interval},
    scheduler::SchedulerService,
    storage::{JsonStorage, LedgerStore, MemoryStorage},
    time::SystemClock,
};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn build_accounts(count: usize) -> Vec<Account> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..count)
        .map(|idx| {
            let mut account = Account::new(format!("owner-{idx}"), "Bench");
            account
                .add_payment_schedule(
                    start + Duration::days((idx % 14) as i64),
                    Interval::weekly(),
                    Decimal::from(1 + (idx % 10) as i64),
                    "Pocket Money",
                )
                .unwrap();
            account
                .add_payment_schedule(start, Interval::monthly(), Decimal::from(25), "Allowance")
                .unwrap();
            account
        })
        .collect()
}

fn bench_memory_pass(c: &mut Criterion) {
    let accounts = build_accounts(black_box(1_000));
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

    c.bench_function("memory_pass_1k_accounts", |b| {
        b.iter_batched(
            || Arc::new(MemoryStorage::with_accounts(accounts.clone())),
            |store| {
                let scheduler = SchedulerService::new(store, Arc::new(SystemClock));
                black_box(scheduler.execute_updates(as_of).unwrap());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_json_pass(c: &mut Criterion) {
    let accounts = build_accounts(black_box(200));
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

    c.bench_function("json_pass_200_accounts", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().expect("tempdir");
                let store = JsonStorage::new(Some(dir.path().to_path_buf())).expect("storage");
                for account in &accounts {
                    store.commit_account(account).expect("seed");
                }
                (dir, Arc::new(store))
            },
            |(_dir, store)| {
                let scheduler = SchedulerService::new(store, Arc::new(SystemClock));
                black_box(scheduler.execute_updates(as_of).unwrap());
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, bench_memory_pass, bench_json_pass);
criterion_main!(benches);
