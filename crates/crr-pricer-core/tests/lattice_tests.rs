use crr_pricer_core::lattice::{self, LatticeStrategy, PricingParameters};
use crr_pricer_core::types::OptionType;
use crr_pricer_core::PricerError;
use proptest::prelude::*;

fn params(option_type: OptionType, steps: u32) -> PricingParameters {
    PricingParameters {
        spot: 100.0,
        strike: 100.0,
        risk_free_rate: 0.05,
        volatility: 0.2,
        time_to_expiry: 1.0,
        steps,
        option_type,
    }
}

fn both_strategies(p: &PricingParameters) -> f64 {
    let rolling = lattice::price_with(p, LatticeStrategy::Rolling).unwrap();
    let table = lattice::price_with(p, LatticeStrategy::FullTable).unwrap();
    assert_eq!(rolling.to_bits(), table.to_bits());
    rolling
}

// ===========================================================================
// Reference values
// ===========================================================================

#[test]
fn test_three_step_atm_call_reference() {
    // S0=K=100, r=5%, sigma=20%, T=1, N=3
    // u = exp(0.2 * sqrt(1/3)) = 1.12240090..., p = 0.54377659...
    let price = both_strategies(&params(OptionType::Call, 3));
    assert!(
        (price - 11.043871091951113).abs() < 1e-12,
        "3-step call {price}"
    );
}

#[test]
fn test_three_step_atm_put_reference() {
    let price = both_strategies(&params(OptionType::Put, 3));
    assert!((price - 6.166813542022532).abs() < 1e-12, "3-step put {price}");
}

#[test]
fn test_single_step_matches_hand_computation() {
    // One period, r = 0: discount is exactly 1 and only the up node pays.
    let p = PricingParameters {
        risk_free_rate: 0.0,
        ..params(OptionType::Call, 1)
    };
    let u = 0.2f64.exp();
    let d = 1.0 / u;
    let prob = (1.0 - d) / (u - d);
    let expected = prob * (100.0 * u - 100.0);
    assert_eq!(both_strategies(&p), expected);

    // The put pays only at the down node.
    let put = PricingParameters {
        option_type: OptionType::Put,
        ..p
    };
    let expected_put = (1.0 - prob) * (100.0 - 100.0 * d);
    assert!((both_strategies(&put) - expected_put).abs() < 1e-12);
}

#[test]
fn test_one_step_with_rate_discounts() {
    let p = PricingParameters {
        risk_free_rate: 0.1,
        ..params(OptionType::Call, 1)
    };
    let u = 0.2f64.exp();
    let d = 1.0 / u;
    let prob = (0.1f64.exp() - d) / (u - d);
    let expected = (-0.1f64).exp() * (prob * (100.0 * u - 100.0));
    assert!((lattice::price(&p).unwrap() - expected).abs() < 1e-12);
}

// ===========================================================================
// Zero volatility policy
// ===========================================================================

#[test]
fn test_zero_volatility_is_rejected_as_degenerate() {
    let p = PricingParameters {
        volatility: 0.0,
        ..params(OptionType::Call, 10)
    };
    match lattice::price(&p).unwrap_err() {
        PricerError::DegenerateLattice { up, down } => assert_eq!(up, down),
        other => panic!("Expected DegenerateLattice, got {other:?}"),
    }
}

// ===========================================================================
// Overflow policy
// ===========================================================================

#[test]
fn test_put_in_overflow_band_is_an_error_not_a_price() {
    // sigma = sqrt(1000), N = 4000: u = e^0.5, so u^(N-j) overflows while
    // d^j underflows and mid-lattice terminal prices evaluate to inf * 0.
    let p = PricingParameters {
        volatility: 1000.0f64.sqrt(),
        ..params(OptionType::Put, 4_000)
    };
    match lattice::price(&p).unwrap_err() {
        PricerError::NumericalInstability { .. } => {}
        other => panic!("Expected NumericalInstability, got {other:?}"),
    }
}

#[test]
fn test_call_in_overflow_band_is_an_error_not_a_price() {
    let p = PricingParameters {
        volatility: 1000.0f64.sqrt(),
        ..params(OptionType::Call, 4_000)
    };
    assert!(matches!(
        lattice::price(&p),
        Err(PricerError::NumericalInstability { .. })
    ));
}

#[test]
fn test_overflow_band_rejected_by_both_strategies() {
    for option_type in [OptionType::Call, OptionType::Put] {
        let p = PricingParameters {
            volatility: 100.0,
            ..params(option_type, 400)
        };
        for strategy in [LatticeStrategy::Rolling, LatticeStrategy::FullTable] {
            assert!(matches!(
                lattice::price_with(&p, strategy),
                Err(PricerError::NumericalInstability { .. })
            ));
        }
    }
}

#[test]
fn test_full_table_cap() {
    let p = params(OptionType::Put, lattice::FULL_TABLE_MAX_STEPS + 1);
    assert!(matches!(
        lattice::price_with(&p, LatticeStrategy::FullTable),
        Err(PricerError::InvalidInput { .. })
    ));
}

#[test]
fn test_invalid_parameters_rejected() {
    let cases = [
        (PricingParameters { spot: 0.0, ..params(OptionType::Call, 3) }, "spot"),
        (PricingParameters { strike: -1.0, ..params(OptionType::Call, 3) }, "strike"),
        (PricingParameters { time_to_expiry: 0.0, ..params(OptionType::Put, 3) }, "time_to_expiry"),
        (PricingParameters { steps: 0, ..params(OptionType::Put, 3) }, "steps"),
    ];
    for (p, expected) in cases {
        match lattice::price(&p).unwrap_err() {
            PricerError::InvalidInput { field, .. } => assert_eq!(field, expected),
            other => panic!("Expected InvalidInput for {expected}, got {other:?}"),
        }
    }
}

// ===========================================================================
// Parity and convergence
// ===========================================================================

#[test]
fn test_put_call_parity_across_step_counts() {
    let forward_gap = 100.0 - 100.0 * (-0.05f64).exp();
    for steps in [1, 2, 3, 10, 50, 100, 500] {
        let call = lattice::price(&params(OptionType::Call, steps)).unwrap();
        let put = lattice::price(&params(OptionType::Put, steps)).unwrap();
        let tol = 1e-9 + 1e-11 * f64::from(steps);
        assert!(
            (call - put - forward_gap).abs() < tol,
            "parity residual {} at N={steps}",
            call - put - forward_gap
        );
    }
}

#[test]
fn test_converges_towards_black_scholes() {
    // Black-Scholes ATM call, S=K=100, r=5%, sigma=20%, T=1
    let black_scholes = 10.450583572185565;
    let coarse = lattice::price(&params(OptionType::Call, 50)).unwrap();
    let fine = lattice::price(&params(OptionType::Call, 500)).unwrap();
    let coarse_err = (coarse - black_scholes).abs();
    let fine_err = (fine - black_scholes).abs();
    assert!(fine_err < coarse_err);
    // Roughly O(1/N): ten times the steps, several times smaller error.
    assert!(fine_err < coarse_err / 5.0, "{coarse_err} -> {fine_err}");
    assert!(fine_err < 0.01);
}

#[test]
fn test_large_tree_rolling_buffer() {
    let price = lattice::price(&params(OptionType::Put, 5_000)).unwrap();
    assert!((price - 5.573526022256971).abs() < 1e-3);
}

// ===========================================================================
// Re-entrancy
// ===========================================================================

#[test]
fn test_concurrent_calls_are_independent() {
    let expected = lattice::price(&params(OptionType::Call, 200)).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| lattice::price(&params(OptionType::Call, 200)).unwrap()))
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap().to_bits(), expected.to_bits());
    }
}

#[test]
fn test_public_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PricingParameters>();
    assert_send_sync::<lattice::LatticeFactors>();
    assert_send_sync::<PricerError>();
}

// ===========================================================================
// Properties
// ===========================================================================

fn option_type_strategy() -> impl Strategy<Value = OptionType> {
    prop_oneof![Just(OptionType::Call), Just(OptionType::Put)]
}

// Keeps r * sqrt(dt) < sigma so the up probability stays in [0, 1].
prop_compose! {
    fn arbitrage_free_params()(
        spot in 10.0f64..500.0,
        strike in 10.0f64..500.0,
        risk_free_rate in 0.0f64..0.1,
        volatility in 0.2f64..0.8,
        time_to_expiry in 0.1f64..3.0,
        steps in 1u32..200,
        option_type in option_type_strategy(),
    ) -> PricingParameters {
        PricingParameters {
            spot,
            strike,
            risk_free_rate,
            volatility,
            time_to_expiry,
            steps,
            option_type,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_price_is_non_negative(p in arbitrage_free_params()) {
        let price = lattice::price(&p).unwrap();
        prop_assert!(price >= 0.0, "negative price {price} for {p:?}");
    }

    #[test]
    fn prop_price_monotone_in_spot(p in arbitrage_free_params(), bump in 0.001f64..0.5) {
        let lower = lattice::price(&p).unwrap();
        let higher = lattice::price(&PricingParameters { spot: p.spot * (1.0 + bump), ..p }).unwrap();
        let tol = 1e-9 * p.spot.max(p.strike);
        match p.option_type {
            OptionType::Call => prop_assert!(higher >= lower - tol, "call {lower} -> {higher}"),
            OptionType::Put => prop_assert!(higher <= lower + tol, "put {lower} -> {higher}"),
        }
    }

    #[test]
    fn prop_discrete_put_call_parity(p in arbitrage_free_params()) {
        let call = lattice::price(&PricingParameters { option_type: OptionType::Call, ..p }).unwrap();
        let put = lattice::price(&PricingParameters { option_type: OptionType::Put, ..p }).unwrap();
        let gap = p.spot - p.strike * (-p.risk_free_rate * p.time_to_expiry).exp();
        let tol = 1e-10 * p.spot.max(p.strike) * (1.0 + f64::from(p.steps));
        prop_assert!((call - put - gap).abs() < tol, "residual {}", call - put - gap);
    }

    #[test]
    fn prop_strategies_agree(p in arbitrage_free_params()) {
        let rolling = lattice::price_with(&p, LatticeStrategy::Rolling).unwrap();
        let table = lattice::price_with(&p, LatticeStrategy::FullTable).unwrap();
        prop_assert_eq!(rolling.to_bits(), table.to_bits());
    }
}
