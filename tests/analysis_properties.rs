//! Behaviour tests for the scoring stages.
//!
//! These exercise the pure analysis functions the way the pipeline composes
//! them: normalization, reference aggregation, phase-shifted correlation,
//! the collapse trigger, memory strength and classification.

use echoscope_core::analysis::{
    aggregate_reference, analyze, compose_score, memory_strength, normalize, phase_correlation,
    AnalysisConfig, Classification, CollapseTrigger, Correlation, NormalizedSeries,
    ReferenceCandidate, ReturnSeries, UndefinedReason,
};
use echoscope_core::{AssetSeries, EchoError, PricePoint};
use echoscope_tests::{address, BONK, MEW, WIF};

fn series(raw: &str, prices: &[f64]) -> AssetSeries {
    let points = prices
        .iter()
        .enumerate()
        .map(|(index, price)| PricePoint::new(index as i64 * 3_600, *price).expect("valid point"))
        .collect();
    AssetSeries::new(address(raw), points).expect("valid series")
}

fn normalized(values: &[f64]) -> NormalizedSeries {
    NormalizedSeries::from_values(values.to_vec()).expect("anchored series")
}

fn candidate(raw: &str, values: &[f64]) -> ReferenceCandidate {
    ReferenceCandidate::new(address(raw), normalized(values))
}

// =============================================================================
// Normalizer
// =============================================================================

#[test]
fn when_first_price_is_nonzero_normalized_series_starts_at_exactly_one() {
    for prices in [
        vec![0.000_013_7, 0.000_021, 0.000_009],
        vec![3.0],
        vec![1e-12, 5e-12],
        vec![42.5, 0.0, 85.0],
    ] {
        // Given: a price series with a nonzero first price
        let asset = series(BONK, &prices);

        // When: it is normalized
        let result = normalize(&asset).expect("normalization succeeds");

        // Then: the first value is exactly 1.0 and the length is preserved
        assert_eq!(result.values()[0], 1.0);
        assert_eq!(result.len(), prices.len());
    }
}

#[test]
fn when_first_price_is_zero_normalization_fails_explicitly() {
    // Given: a series whose first price is zero
    let asset = series(BONK, &[0.0, 1.0, 2.0]);

    // When / Then: normalization reports DivisionUndefined instead of producing infinities
    assert_eq!(normalize(&asset), Err(EchoError::DivisionUndefined));
}

#[test]
fn when_series_is_empty_normalization_fails() {
    let asset = AssetSeries::new(address(BONK), Vec::new()).expect("empty is representable");

    assert_eq!(normalize(&asset), Err(EchoError::EmptySeries));
}

// =============================================================================
// Reference Aggregator
// =============================================================================

#[test]
fn aggregate_length_always_matches_target_length() {
    // Given: candidates of different lengths, all at least as long as the target
    let candidates = vec![
        candidate(BONK, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        candidate(WIF, &[1.0, 0.5, 0.25, 0.125]),
        candidate(MEW, &[1.0, 1.1, 1.2, 1.3, 1.4]),
    ];

    // When: the reference waveform is built for L = 4
    let aggregate = aggregate_reference(4, &candidates).expect("aggregate");

    // Then: it has exactly L values, each the elementwise mean of the truncated candidates
    assert_eq!(aggregate.waveform.len(), 4);
    let expected = [1.0, (2.0 + 0.5 + 1.1) / 3.0, (3.0 + 0.25 + 1.2) / 3.0];
    for (actual, expected) in aggregate.waveform.values().iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-12);
    }
    assert!(aggregate.short.is_empty());
}

#[test]
fn when_no_candidate_is_long_enough_aggregation_fails() {
    // Given: a target of length 500 and candidates of length 100
    let hundred: Vec<f64> = std::iter::once(1.0).chain((1..100).map(|i| 1.0 + i as f64 * 0.01)).collect();
    let candidates = vec![candidate(BONK, &hundred), candidate(WIF, &hundred)];

    // When: aggregation runs
    let err = aggregate_reference(500, &candidates).expect_err("must fail");

    // Then: InsufficientReferenceData is reported rather than a zero waveform
    assert_eq!(
        err,
        EchoError::InsufficientReferenceData {
            required: 500,
            offered: 2
        }
    );
}

#[test]
fn short_candidates_are_excluded_not_padded() {
    let candidates = vec![
        candidate(BONK, &[1.0, 2.0, 3.0]),
        candidate(WIF, &[1.0, 4.0]),
    ];

    let aggregate = aggregate_reference(3, &candidates).expect("aggregate");

    assert_eq!(aggregate.waveform.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(aggregate.short.len(), 1);
    assert_eq!(aggregate.short[0].address, address(WIF));
    assert_eq!(aggregate.short[0].observations, 2);
}

#[test]
fn aggregation_is_independent_of_candidate_order() {
    let forward = vec![
        candidate(BONK, &[1.0, 1.1, 0.7]),
        candidate(WIF, &[1.0, 1.3, 0.9]),
        candidate(MEW, &[1.0, 0.3, 1.7]),
    ];
    let mut reversed = forward.clone();
    reversed.reverse();

    let a = aggregate_reference(3, &forward).expect("aggregate");
    let b = aggregate_reference(3, &reversed).expect("aggregate");

    assert_eq!(a.waveform, b.waveform);
}

// =============================================================================
// Alignment & Correlation
// =============================================================================

#[test]
fn when_series_has_one_observation_correlation_is_undefined() {
    assert_eq!(
        phase_correlation(&[1.0], &[1.0], 1),
        Correlation::Undefined(UndefinedReason::TooShort)
    );
}

#[test]
fn correlation_stays_within_unit_interval() {
    let target = [1.0, 1.4, 0.9, 1.7, 2.2, 1.3];
    let reference = [1.0, 1.2, 1.1, 0.8, 1.9, 2.0];

    for shift in 0..4 {
        if let Correlation::Defined(r) = phase_correlation(&target, &reference, shift) {
            assert!((-1.0..=1.0).contains(&r));
        }
    }
}

// =============================================================================
// Collapse Trigger & Memory Strength
// =============================================================================

#[test]
fn collapse_gate_is_a_pure_function_of_jump_and_reversal_counts() {
    let cases = [((3, 0), 1.0), ((0, 0), 0.0), ((2, 2), 0.0), ((3, 2), 1.0)];

    for ((jumps, reversals), gate) in cases {
        assert_eq!(
            CollapseTrigger::from_counts(jumps, reversals).gate(),
            gate,
            "J={jumps}, R={reversals}"
        );
    }
}

#[test]
fn memory_strength_is_zero_for_constant_returns() {
    let returns = ReturnSeries::from_values(vec![0.05, 0.05, 0.05]);

    assert_eq!(memory_strength(&returns), 0.0);
}

#[test]
fn when_target_touches_zero_every_step_still_contributes_a_return() {
    // Given: a target that drops to zero and recovers
    let target = normalized(&[1.0, 0.0, 2.0, 3.0]);
    let reference = candidate(BONK, &[1.0, 1.1, 1.3, 1.2]);

    // When: the scoring stages run
    let analysis =
        analyze(&target, &[reference], &AnalysisConfig::default()).expect("analysis succeeds");

    // Then: the rise off zero is a jump, so J=2 against R=1 and the gate opens
    assert_eq!(target.returns().len(), 3);
    assert_eq!(analysis.trigger, CollapseTrigger::from_counts(2, 1));
    assert!(analysis.trigger.open);

    // And: memory strength is taken over the finite steps -1.0 and 0.5 only
    assert!((analysis.memory_strength - 1.0).abs() < 1e-12);
    assert!(analysis.score.is_finite());
}

#[test]
fn degenerate_inputs_never_leak_nan_into_the_score() {
    let score = compose_score(
        1.0,
        Correlation::Undefined(UndefinedReason::ZeroVariance),
        f64::INFINITY,
    );

    assert_eq!(score, 0.0);
    assert_eq!(
        Classification::from_score(score, &Default::default()),
        Classification::DecaySignature
    );
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[test]
fn four_point_target_against_single_reference_scores_deterministically() {
    // Given: target [1.0, 1.2, 1.1, 1.3] and one reference whose shifted waveform
    // is [0, 1.0, 1.15, 1.05]
    let target = normalized(&[1.0, 1.2, 1.1, 1.3]);
    let reference = candidate(WIF, &[1.0, 1.15, 1.05, 1.2]);

    // When: the scoring stages run with default constants
    let analysis =
        analyze(&target, &[reference], &AnalysisConfig::default()).expect("analysis succeeds");

    // Then: correlation follows Pearson on the shifted pair
    let r = analysis.correlation.value().expect("defined correlation");
    assert!((r - 0.721_270_555).abs() < 1e-6);

    // And: returns 0.2, -0.083, 0.182 give two jumps and no reversal, so the gate opens
    assert_eq!(analysis.trigger, CollapseTrigger::from_counts(2, 0));
    assert!(analysis.trigger.open);

    // And: memory strength is mean |r| over population std
    assert!((analysis.memory_strength - 1.197_374_850).abs() < 1e-6);

    // And: the score lands in the "Likely Pump" bucket
    assert!((analysis.score - 0.567_829_908).abs() < 1e-6);
    assert_eq!(analysis.classification, Classification::LikelyPump);
    assert_eq!(analysis.observations, 4);
}

#[test]
fn identical_inputs_produce_bit_identical_scores() {
    let target = normalized(&[1.0, 1.3, 1.2, 1.6, 1.4, 1.9]);
    let candidates = vec![
        candidate(BONK, &[1.0, 1.1, 1.4, 1.2, 1.5, 1.8, 2.0]),
        candidate(MEW, &[1.0, 0.9, 1.3, 1.5, 1.4, 1.7]),
    ];
    let config = AnalysisConfig::default();

    let first = analyze(&target, &candidates, &config).expect("analysis");
    let second = analyze(&target, &candidates, &config).expect("analysis");

    assert_eq!(first.score.to_bits(), second.score.to_bits());
    assert_eq!(first, second);
}
