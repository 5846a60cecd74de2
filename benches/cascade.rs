use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use cascadeql::{
    CancellationToken, CascadeParameters, CascadeSimulator, EngineConfig, EngineRuntime,
    InMemoryReactionStore, InputSlot, Nuclide, NuclideId, PathwaySort, QueryEngine, QueryFilter,
    Reaction, ReactionKind,
};

const MAX_Z: u8 = 20;

/// Deterministic pseudo Q-value in roughly [-2, 18) MeV.
fn q_value(a: NuclideId, b: NuclideId) -> f64 {
    let mix = u32::from(a.z) * 31 + u32::from(a.a) * 17 + u32::from(b.z) * 7 + u32::from(b.a) * 3;
    f64::from(mix % 200) / 10.0 - 2.0
}

/// Synthetic table: every nuclide `Z ≤ 20, Z ≤ A ≤ 2Z + 2`, all fusions and
/// alpha-exchange two-to-two channels whose products exist, and alpha
/// emission fissions.
fn make_store() -> Arc<InMemoryReactionStore> {
    let ids: Vec<NuclideId> = (1..=MAX_Z)
        .flat_map(|z| (u16::from(z)..=u16::from(z) * 2 + 2).map(move |a| NuclideId { z, a }))
        .collect();
    let exists = |z: u8, a: u16| z >= 1 && z <= MAX_Z && a >= u16::from(z) && a <= u16::from(z) * 2 + 2;
    let alpha = NuclideId { z: 2, a: 4 };

    let mut builder = InMemoryReactionStore::builder();
    for id in &ids {
        builder
            .add_nuclide(Nuclide::stable(*id, f64::from(id.a) * 8.0))
            .unwrap();
    }

    for (i, x) in ids.iter().enumerate() {
        for y in &ids[i..] {
            let (z, a) = (x.z + y.z, x.a + y.a);
            if z <= MAX_Z && exists(z, a) {
                builder.add_reaction(Reaction::fusion([*x, *y], NuclideId { z, a }, q_value(*x, *y)));
            }
            if z > 2 && a > 4 && exists(z - 2, a - 4) {
                builder.add_reaction(Reaction::two_to_two(
                    [*x, *y],
                    [alpha, NuclideId { z: z - 2, a: a - 4 }],
                    q_value(*y, *x),
                ));
            }
        }
        if x.z > 2 && x.a > 4 && exists(x.z - 2, x.a - 4) {
            builder.add_reaction(Reaction::fission(
                *x,
                [alpha, NuclideId { z: x.z - 2, a: x.a - 4 }],
                q_value(*x, alpha) - 6.0,
            ));
        }
    }
    Arc::new(builder.build().unwrap())
}

fn cascade_params() -> CascadeParameters {
    CascadeParameters::builder()
        .fuel("H-1")
        .fuel("H-2")
        .fuel("Li-7")
        .max_loops(5)
        .max_nuclides_to_pair(20)
        .build()
        .unwrap()
}

fn bench_query_element_fusion(c: &mut Criterion) {
    let engine = QueryEngine::new(make_store());
    let filter = QueryFilter::builder()
        .input(InputSlot::First, "H")
        .min_energy(1.0)
        .pin("C")
        .limit(100)
        .build();

    c.bench_function("query/element_fusion", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let _ = engine.query(&filter, ReactionKind::Fusion).unwrap();
            }
            start.elapsed()
        });
    });
}

fn bench_query_through_runtime(c: &mut Criterion) {
    c.bench_function("query/runtime_roundtrip", |b| {
        // Fresh runtime per sample; pool startup stays outside the timed loop.
        b.iter_custom(|iters| {
            let runtime = EngineRuntime::new(make_store(), EngineConfig::default()).unwrap();
            let filter = QueryFilter::builder()
                .input(InputSlot::First, "He")
                .limit(10)
                .build();

            let start = Instant::now();
            for _ in 0..iters {
                let _ = runtime.query(filter.clone(), ReactionKind::TwoToTwo).unwrap();
            }
            start.elapsed()
        });
    });
}

fn bench_cascade_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade");
    group.throughput(Throughput::Elements(1));
    group.sample_size(20);

    let simulator = CascadeSimulator::new(QueryEngine::new(make_store()));
    let params = cascade_params();

    group.bench_function("feedback_run", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let _ = simulator
                    .run(&params, |_| {}, &CancellationToken::new())
                    .unwrap();
            }
            start.elapsed()
        });
    });
    group.finish();
}

fn bench_pathway_view(c: &mut Criterion) {
    let simulator = CascadeSimulator::new(QueryEngine::new(make_store()));
    let result = simulator
        .run(&cascade_params(), |_| {}, &CancellationToken::new())
        .unwrap();

    c.bench_function("pathway/view_rarity", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let _ = result.pathways.view(PathwaySort::Rarity, 30);
            }
            start.elapsed()
        });
    });
}

criterion_group!(
    cascade,
    bench_query_element_fusion,
    bench_query_through_runtime,
    bench_cascade_run,
    bench_pathway_view
);
criterion_main!(cascade);
