use criterion::{black_box, criterion_group, criterion_main, Criterion};
use maxent_irl::experiment::corner_reward_map;
use maxent_irl::irl::{
    features, generate_demonstrations, generate_demonstrations_par, DemonstrationOptions,
    MaxEntConfig, MaxEntIrl, StartMode,
};
use maxent_irl::mdp::{value_iteration, Grid, GridWorld, ValueIterationConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_maxent(c: &mut Criterion) {
    let grid = Grid::new(5, 5).unwrap();
    let rewards = grid.flatten(&corner_reward_map(&grid, 1.0)).unwrap();
    let world = GridWorld::new(grid, rewards, &[], 0.3).unwrap();
    let truth = value_iteration(
        world.transition_matrix(),
        world.rewards(),
        &ValueIterationConfig::new(0.8),
    )
    .unwrap();
    let options = DemonstrationOptions::new(100, 20).start(StartMode::Random);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let trajs = generate_demonstrations(&world, &truth.policy, &options, &mut rng).unwrap();
    let feat = features::identity(grid.n_states());
    let learner = MaxEntIrl::new(MaxEntConfig::default());

    c.bench_function("demonstrations_100x20", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            generate_demonstrations(&world, &truth.policy, black_box(&options), &mut rng)
        })
    });
    c.bench_function("demonstrations_par_100x20", |b| {
        b.iter(|| generate_demonstrations_par(&world, &truth.policy, black_box(&options), 1))
    });
    c.bench_function("maxent_5x5_20_iters", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            learner.fit(&feat, world.transition_matrix(), 0.8, black_box(&trajs), &mut rng)
        })
    });
}

criterion_group!(benches, bench_maxent);
criterion_main!(benches);
