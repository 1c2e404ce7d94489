use std::hint::black_box;

use addonhost::addons::{resolve, AddonCategory, AddonRecord, AddonRegistry};
use criterion::{criterion_group, criterion_main, Criterion};

/// `n` addons where each depends on the next and the last one is missing a
/// dependency, forcing one fixpoint pass per addon.
fn broken_chain(n: usize) -> Vec<AddonRecord> {
    (0..n)
        .map(|i| {
            AddonRecord::new(format!("addon-{i}"), AddonCategory::Module)
                .with_dependency(format!("addon-{}", i + 1))
        })
        .collect()
}

/// `n` addons that all depend on one shared base.
fn fan_in(n: usize) -> Vec<AddonRecord> {
    let mut records = vec![AddonRecord::new("base", AddonCategory::Module)];
    records.extend((0..n).map(|i| {
        AddonRecord::new(format!("addon-{i}"), AddonCategory::Module)
            .with_priority(1)
            .with_dependency("base")
    }));
    records
}

fn bench_resolve(c: &mut Criterion) {
    let chain = AddonRegistry::from_records(broken_chain(64));
    c.bench_function("resolve_broken_chain_64", |b| {
        b.iter(|| {
            let mut registry = chain.clone();
            black_box(resolve(&mut registry, None))
        })
    });

    let fan = AddonRegistry::from_records(fan_in(256));
    c.bench_function("resolve_fan_in_256", |b| {
        b.iter(|| {
            let mut registry = fan.clone();
            black_box(resolve(&mut registry, None))
        })
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
