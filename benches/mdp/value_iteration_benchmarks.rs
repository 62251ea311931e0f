use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use maxent_irl::experiment::corner_reward_map;
use maxent_irl::mdp::{value_iteration, Grid, GridWorld, PolicyExtraction, ValueIterationConfig};

fn corner_world(size: usize) -> GridWorld {
    let grid = Grid::new(size, size).unwrap();
    let rewards = grid.flatten(&corner_reward_map(&grid, 1.0)).unwrap();
    GridWorld::new(grid, rewards, &[], 0.3).unwrap()
}

fn bench_value_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_iteration");
    for size in [5, 10, 15] {
        let world = corner_world(size);
        let deterministic = ValueIterationConfig::new(0.8);
        let boltzmann = ValueIterationConfig::new(0.8)
            .extraction(PolicyExtraction::Boltzmann { temperature: 1.0 });

        group.bench_with_input(BenchmarkId::new("deterministic", size), &world, |b, w| {
            b.iter(|| value_iteration(black_box(w.transition_matrix()), w.rewards(), &deterministic))
        });
        group.bench_with_input(BenchmarkId::new("boltzmann", size), &world, |b, w| {
            b.iter(|| value_iteration(black_box(w.transition_matrix()), w.rewards(), &boltzmann))
        });
    }
    group.finish();
}

fn bench_transition_matrix(c: &mut Criterion) {
    c.bench_function("gridworld_10x10_build", |b| b.iter(|| corner_world(black_box(10))));
}

criterion_group!(benches, bench_value_iteration, bench_transition_matrix);
criterion_main!(benches);
