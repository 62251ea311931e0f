use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::experiment::{corner_reward_map, policy_agreement};
use crate::irl::{
    features, generate_demonstrations, normalize, DemonstrationOptions, MaxEntConfig, MaxEntIrl,
    StartMode, ThetaInit,
};
use crate::mdp::{value_iteration, Grid, GridWorld, ValueIterationConfig};

fn corner_world() -> GridWorld {
    let grid = Grid::new(5, 5).unwrap();
    let rewards = grid.flatten(&corner_reward_map(&grid, 1.0)).unwrap();
    GridWorld::new(grid, rewards, &[], 0.3).unwrap()
}

#[test]
fn test_recovered_policy_matches_ground_truth_majority() {
    let world = corner_world();
    let p = world.transition_matrix();
    let vi = ValueIterationConfig::new(0.8).tolerance(0.01);
    let truth = value_iteration(p, world.rewards(), &vi).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let options = DemonstrationOptions::new(100, 20).start(StartMode::Random);
    let trajs = generate_demonstrations(&world, &truth.policy, &options, &mut rng).unwrap();

    let learner = MaxEntIrl::new(MaxEntConfig::new(0.01, 20).theta_init(ThetaInit::Zeros));
    let learned = learner
        .fit(&features::identity(25), p, 0.8, &trajs, &mut rng)
        .unwrap();
    let recovered = value_iteration(p, &learned.rewards, &vi).unwrap();

    let agreement = policy_agreement(
        &truth.policy.greedy_actions(),
        &recovered.policy.greedy_actions(),
    )
    .unwrap();
    assert!(agreement > 0.5, "policies agree on only {:.2} of states", agreement);
}

#[test]
fn test_goal_receives_highest_reward() {
    let world = corner_world();
    let p = world.transition_matrix();
    let truth = value_iteration(p, world.rewards(), &ValueIterationConfig::new(0.8)).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let trajs = generate_demonstrations(
        &world,
        &truth.policy,
        &DemonstrationOptions::new(100, 20),
        &mut rng,
    )
    .unwrap();
    let learner = MaxEntIrl::new(MaxEntConfig::new(0.01, 20).theta_init(ThetaInit::Zeros));
    let learned = learner
        .fit(&features::identity(25), p, 0.8, &trajs, &mut rng)
        .unwrap();

    let recovered = normalize(&learned.rewards);
    let goal = world.grid().n_states() - 1;
    assert_eq!(recovered[goal], 1.0);
}

#[test]
fn test_normalize() {
    let v = Array1::from_vec(vec![2.0, 4.0, 3.0]);
    assert_eq!(normalize(&v).to_vec(), vec![0.0, 1.0, 0.5]);
    assert!(normalize(&Array1::from_elem(3, 7.0)).iter().all(|&x| x == 0.0));
}
