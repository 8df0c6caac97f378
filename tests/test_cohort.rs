//! Cohort-level scenarios checked against independent matrix-power calculations.

use markov_cohort::{
    discount_factor, run_strategies, simulate, Cohort, HealthState, ModelConfig, ModelError,
    ParameterSet, Therapy,
};

fn flat_cost_config() -> ModelConfig {
    ModelConfig {
        mono_drug_cost: 0.0,
        add_on_drug_cost: 0.0,
        annual_state_costs: vec![1000.0, 1000.0, 1000.0, 0.0],
        annual_state_utilities: vec![1.0, 1.0, 1.0, 0.0],
        population_size: 1000,
        horizon: 10,
        ..ModelConfig::default()
    }
}

/// Probability of being alive at each step 0..horizon.
fn alive_probabilities(params: &ParameterSet, horizon: usize) -> Vec<f64> {
    let dead = params.states().terminal().index();
    (0..horizon)
        .map(|t| 1.0 - params.prob_matrix().distribution_after(params.initial_state(), t)[dead])
        .collect()
}

#[test]
fn test_mean_discounted_cost_matches_matrix_power() {
    let config = flat_cost_config();
    for therapy in [Therapy::Mono, Therapy::Combo] {
        let params = ParameterSet::new(&config, therapy).unwrap();
        let expected: f64 = alive_probabilities(&params, 10)
            .iter()
            .enumerate()
            .map(|(t, p)| 1000.0 * p * discount_factor(0.03, t))
            .sum();

        let out = simulate(1000, 10, &params, 12345).unwrap();
        let observed = out.mean_discounted_cost();
        let rel = (observed - expected).abs() / expected;
        assert!(rel < 0.04, "{}: observed {:.2}, expected {:.2}", therapy, observed, expected);

        // Utility of 1 per alive year makes utility the cost divided by 1000.
        assert!((out.mean_discounted_utility() * 1000.0 - observed).abs() < 1e-6);
    }
}

#[test]
fn test_survival_curve_matches_matrix_power() {
    let config = flat_cost_config();
    let params = ParameterSet::new(&config, Therapy::Mono).unwrap();
    let expected = alive_probabilities(&params, 10);
    let out = simulate(1000, 10, &params, 99).unwrap();
    for (t, p) in expected.iter().enumerate() {
        let observed = out.survival_curve()[t] as f64 / 1000.0;
        assert!((observed - p).abs() < 0.05, "step {}: observed {:.3}, expected {:.3}", t, observed, p);
    }
}

#[test]
fn test_two_state_chain_survival() {
    let config = ModelConfig {
        state_names: vec!["Alive".to_string(), "Dead".to_string()],
        initial_state: "Alive".to_string(),
        transition_counts: vec![vec![9, 1], vec![0, 1]],
        annual_state_costs: vec![0.0, 0.0],
        annual_state_utilities: vec![1.0, 0.0],
        combo_relative_risk: 2.0,
        discount_rate: 0.0,
        ..ModelConfig::default()
    };
    let params = ParameterSet::new(&config, Therapy::Mono).unwrap();
    let out = simulate(4000, 50, &params, 8).unwrap();
    // Geometric survival with death probability 0.1, truncated at 50 steps.
    let expected = (1.0 - 0.9f64.powi(50)) / 0.1;
    assert!((out.mean_survival_time() - expected).abs() < 0.5, "{}", out.mean_survival_time());
    // Without discounting, utility counts alive years.
    assert!((out.mean_discounted_utility() - out.mean_survival_time()).abs() < 1e-9);

    let combo = ParameterSet::new(&config, Therapy::Combo).unwrap();
    assert!((combo.prob_matrix().get(0, 1) - 0.2).abs() < 1e-12);
    let combo_out = simulate(4000, 50, &combo, 8).unwrap();
    assert!(combo_out.mean_survival_time() < out.mean_survival_time());
}

#[test]
fn test_run_strategies_reproducible() {
    let config = ModelConfig { population_size: 300, ..ModelConfig::default() };
    let a = run_strategies(&config, 42).unwrap();
    let b = run_strategies(&config, 42).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.mono.survival_curve()[0], 300);
    assert_eq!(a.combo.survival_curve().len(), config.horizon + 1);
}

#[test]
fn test_every_patient_counted_at_start() {
    let config = ModelConfig { initial_state: "AIDS".to_string(), ..ModelConfig::default() };
    let params = ParameterSet::new(&config, Therapy::Mono).unwrap();
    assert_eq!(params.initial_state(), HealthState(2));
    let out = Cohort::new(7, 250, 20, &params).unwrap().simulate(1);
    assert_eq!(out.survival_curve()[0], 250);
    // AIDS patients die fast: most are gone by the horizon.
    assert!(out.n_deaths() > 200);
}

#[test]
fn test_config_errors_surface_before_simulation() {
    let mut config = ModelConfig::default();
    config.transition_counts[1] = vec![0, 0, 0, 0];
    match ParameterSet::new(&config, Therapy::Mono) {
        Err(ModelError::DivisionByZero { state, .. }) => assert_eq!(state, 1),
        other => panic!("expected DivisionByZero, got {:?}", other),
    }

    let config = ModelConfig { population_size: 0, ..ModelConfig::default() };
    assert!(matches!(run_strategies(&config, 1), Err(ModelError::InvalidParameter { .. })));
}
