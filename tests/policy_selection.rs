//! Integration tests for expected-free-energy selection.

use nudge::{
    efe::{EfeParameters, ScoreFallback, evaluate_action_plans, select_action_plan},
    pseudo_counts::{JitterMask, PseudoCounts},
};
use rand::{SeedableRng, rngs::StdRng};

fn plans() -> Vec<Vec<usize>> {
    vec![vec![0, 1, 0, 0], vec![0, 0, 1, 0]]
}

#[test]
fn same_seed_same_choice() {
    let counts = PseudoCounts::initialize(2, 4, 3, 0.1, JitterMask::Uniform).unwrap();
    let params = EfeParameters::with_slope(3, 2.0, 1.0);
    let choices: Vec<usize> = (0..5)
        .map(|_| {
            let mut rng = StdRng::seed_from_u64(40);
            select_action_plan(&counts, 0, 0, &params, &plans(), &mut rng)
                .unwrap()
                .index
        })
        .collect();
    assert!(choices.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn observed_progress_is_preferred() {
    let mut counts = PseudoCounts::initialize(2, 4, 3, 0.1, JitterMask::Uniform).unwrap();
    for _ in 0..20 {
        counts.update(1, 2, 0, 2).unwrap();
        counts.update(0, 2, 0, 0).unwrap();
        counts.update(1, 1, 0, 0).unwrap();
        counts.update(0, 1, 0, 0).unwrap();
    }
    let params = EfeParameters::with_slope(3, 2.0, 1.0);
    let mut rng = StdRng::seed_from_u64(1);
    let selection = select_action_plan(&counts, 0, 0, &params, &plans(), &mut rng).unwrap();
    assert_eq!(selection.index, 1);
    assert_eq!(selection.fallback, ScoreFallback::Combined);
    assert!(selection.pragmatic[1] > selection.pragmatic[0]);
}

#[test]
fn unexplored_cells_carry_more_epistemic_value() {
    let mut counts = PseudoCounts::initialize(2, 4, 3, 0.1, JitterMask::Uniform).unwrap();
    for _ in 0..50 {
        counts.update(1, 1, 0, 1).unwrap();
    }
    let scores = evaluate_action_plans(&counts, 0, 0, &[0.0; 3], &plans()).unwrap();
    assert!(scores.epistemic[1] > scores.epistemic[0]);
}

#[test]
fn non_finite_prior_falls_back_to_epistemic() {
    let counts = PseudoCounts::initialize(2, 4, 3, 0.1, JitterMask::Uniform).unwrap();
    let params = EfeParameters::new(vec![f64::NAN; 3], 1.0);
    let mut rng = StdRng::seed_from_u64(3);
    let selection = select_action_plan(&counts, 0, 0, &params, &plans(), &mut rng).unwrap();
    assert_eq!(selection.fallback, ScoreFallback::EpistemicOnly);
    assert!(selection.efe.iter().all(|v| v.is_finite()));
}

#[test]
fn horizon_past_the_day_is_rejected() {
    let counts = PseudoCounts::initialize(2, 4, 3, 0.1, JitterMask::Uniform).unwrap();
    let params = EfeParameters::with_slope(3, 2.0, 1.0);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(select_action_plan(&counts, 0, 2, &params, &plans(), &mut rng).is_err());
    assert!(select_action_plan(&counts, 0, 0, &params, &[], &mut rng).is_err());
}
