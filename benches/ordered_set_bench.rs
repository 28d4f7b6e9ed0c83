use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use fs_index_tables::OrderedFsSet;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn new_set() -> OrderedFsSet<u64> {
    OrderedFsSet::with_comparator(|a: &u64, b: &u64| a.cmp(b))
}

fn bench_add_50k(c: &mut Criterion) {
    c.bench_function("ordered::add_ascending_50k", |b| {
        b.iter_batched(
            new_set,
            |mut s| {
                for k in 0..50_000u64 {
                    s.add(k);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("ordered::add_descending_50k", |b| {
        b.iter_batched(
            new_set,
            |mut s| {
                for k in (0..50_000u64).rev() {
                    s.add(k);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });

    let random: Vec<u64> = lcg(3).take(50_000).collect();
    c.bench_function("ordered::add_random_50k", |b| {
        b.iter_batched(
            new_set,
            |mut s| {
                for &k in &random {
                    s.add(k);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    let members: Vec<u64> = lcg(5).take(50_000).collect();
    c.bench_function("ordered::remove_random_10k_of_50k", |b| {
        b.iter_batched(
            || {
                let mut s = new_set();
                for &k in &members {
                    s.add(k);
                }
                s
            },
            |mut s| {
                for k in members.iter().step_by(5) {
                    black_box(s.remove(k));
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_10k(c: &mut Criterion) {
    let members: Vec<u64> = lcg(9).take(50_000).collect();
    let mut s = new_set();
    for &k in &members {
        s.add(k);
    }
    c.bench_function("ordered::find_hit_10k_on_50k", |b| {
        b.iter(|| {
            for k in members.iter().step_by(5) {
                let _ = black_box(s.find(k));
            }
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_add_50k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k, bench_find_10k
}
criterion_main!(benches_insert, benches_ops);
