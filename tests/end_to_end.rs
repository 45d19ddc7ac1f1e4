//! End-to-end scenario on a four-timestep day.
//!
//! Three position levels `[0, 500, 1000]`, one challenge that may run in
//! timestep 1 or 2, and a preference for the highest level.

mod common;

use common::monotone_transition;
use nudge::{
    action_plan::{ActionPlanGenerator, ChallengeWindow},
    efe::{EfeParameters, make_a_step, select_action_plan},
    position::PositionAxis,
    pseudo_counts::{JitterMask, PseudoCounts},
};
use rand::{SeedableRng, rngs::StdRng};

fn candidates() -> Vec<Vec<usize>> {
    ActionPlanGenerator::new(4)
        .generate(&[ChallengeWindow {
            offer_begin: 0,
            earliest: 1,
            latest: 3,
            duration: 1,
        }])
        .unwrap()
}

#[test]
fn scenario_selects_deterministically_and_never_walks_back() {
    let plans = candidates();
    assert_eq!(plans, vec![vec![0, 1, 0, 0], vec![0, 0, 1, 0]]);

    let axis = PositionAxis::from_levels(vec![0.0, 500.0, 1000.0]).unwrap();
    let counts = PseudoCounts::initialize(2, 4, axis.len(), 0.1, JitterMask::Uniform).unwrap();
    let params = EfeParameters::with_slope(axis.len(), 2.0, 1.0);
    assert!(params.log_prior_position[2] > params.log_prior_position[0]);

    let select = || {
        let mut rng = StdRng::seed_from_u64(40);
        select_action_plan(&counts, 0, 0, &params, &plans, &mut rng).unwrap()
    };
    let first = select();
    assert_eq!(first, select());
    assert!(first.index < plans.len());

    let transition = monotone_transition(&axis, 2, 4, 300.0, 400.0);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let plan = &plans[first.index];
        let mut pos_idx = 0;
        for t_idx in 0..4 {
            let (action, next) = make_a_step(t_idx, plan, pos_idx, &transition, &mut rng).unwrap();
            assert_eq!(action, plan[t_idx]);
            assert!(next >= pos_idx);
            pos_idx = next;
        }
    }
}

#[test]
fn learning_from_rollouts_shifts_the_choice_towards_progress() {
    let plans = candidates();
    let axis = PositionAxis::from_levels(vec![0.0, 500.0, 1000.0]).unwrap();
    let params = EfeParameters::with_slope(axis.len(), 2.0, 0.0);
    let mut counts = PseudoCounts::initialize(2, 4, axis.len(), 0.1, JitterMask::Uniform).unwrap();

    // Challenges only help at timestep 2.
    for _ in 0..30 {
        counts.update(0, 0, 0, 0).unwrap();
        counts.update(0, 1, 0, 0).unwrap();
        counts.update(1, 1, 0, 0).unwrap();
        counts.update(0, 2, 0, 0).unwrap();
        counts.update(1, 2, 0, 2).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(40);
    let selection = select_action_plan(&counts, 0, 0, &params, &plans, &mut rng).unwrap();
    assert_eq!(selection.index, 1);
}
