//! Write propagation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trkl_core::{Computed, Runtime, Subscriber};

fn chain(rt: &Runtime, length: usize) -> (trkl_core::Signal<u64>, Vec<Computed<u64>>) {
    let root = rt.signal(0u64);
    let mut links: Vec<Computed<u64>> = Vec::with_capacity(length);

    for i in 0..length {
        let link = match links.last() {
            Some(prev) => {
                let prev = prev.clone();
                rt.computed(move || Ok(prev.get() + 1))
            }
            None => {
                let root = root.clone();
                rt.computed(move || Ok(root.get() + 1))
            }
        }
        .unwrap_or_else(|err| panic!("link {i} failed: {err}"));
        links.push(link);
    }

    (root, links)
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");

    for length in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
            let rt = Runtime::new();
            let (root, links) = chain(&rt, length);
            let mut next = 0u64;

            b.iter(|| {
                next += 1;
                root.set(black_box(next)).unwrap();
            });

            black_box(links);
        });
    }

    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    c.bench_function("fan_out_100_subscribers", |b| {
        let rt = Runtime::new();
        let signal = rt.signal(0u64);
        for _ in 0..100 {
            signal
                .subscribe(&Subscriber::new(|new: &u64, _| {
                    black_box(*new);
                }), false)
                .unwrap();
        }

        let mut next = 0u64;
        b.iter(|| {
            next += 1;
            signal.set(black_box(next)).unwrap();
        });
    });
}

criterion_group!(benches, bench_chain, bench_fan_out);
criterion_main!(benches);
