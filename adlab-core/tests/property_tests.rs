//! Property tests for the scoring kernel.
//!
//! Uses proptest to verify:
//! 1. AUROC bounds and complement symmetry (ties included)
//! 2. AUROC invariance under monotone rescaling of scores
//! 3. Rank conservation: present ranks always sum to k(k+1)/2
//! 4. Reducer laws: mean lies between min and max, max dominates

use adlab_core::metrics::{auroc, top_precision};
use adlab_core::rank::rank_values;
use adlab_core::reduce;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Scores from a coarse grid so ties are frequent.
fn arb_scored_labels() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((0..20_i32, any::<bool>()), 2..60).prop_map(|pairs| {
        let scores = pairs.iter().map(|(s, _)| *s as f64 / 10.0).collect();
        let labels = pairs
            .iter()
            .map(|(_, l)| if *l { 1.0 } else { 0.0 })
            .collect();
        (scores, labels)
    })
}

fn has_both_classes(labels: &[f64]) -> bool {
    labels.iter().any(|&l| l == 1.0) && labels.iter().any(|&l| l == 0.0)
}

fn arb_row() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::of(0..8_i32), 0..12)
        .prop_map(|v| v.into_iter().map(|x| x.map(f64::from)).collect())
}

// ── 1–2. AUROC ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn auroc_is_bounded((scores, labels) in arb_scored_labels()) {
        prop_assume!(has_both_classes(&labels));
        let auc = auroc(&scores, &labels).unwrap();
        prop_assert!((0.0..=1.0 + 1e-12).contains(&auc));
    }

    #[test]
    fn auroc_complement_of_negated_scores((scores, labels) in arb_scored_labels()) {
        prop_assume!(has_both_classes(&labels));
        let negated: Vec<f64> = scores.iter().map(|s| -s).collect();
        let a = auroc(&scores, &labels).unwrap();
        let b = auroc(&negated, &labels).unwrap();
        prop_assert!((a + b - 1.0).abs() < 1e-9, "a={a} b={b}");
    }

    #[test]
    fn auroc_invariant_under_monotone_rescale((scores, labels) in arb_scored_labels()) {
        prop_assume!(has_both_classes(&labels));
        let rescaled: Vec<f64> = scores.iter().map(|s| 3.0 * s + 7.0).collect();
        let a = auroc(&scores, &labels).unwrap();
        let b = auroc(&rescaled, &labels).unwrap();
        prop_assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn auroc_single_class_always_missing(scores in prop::collection::vec(0.0..1.0_f64, 1..30)) {
        let labels = vec![1.0; scores.len()];
        prop_assert_eq!(auroc(&scores, &labels), None);
    }

    #[test]
    fn top_precision_full_list_is_one((scores, labels) in arb_scored_labels()) {
        prop_assume!(labels.iter().any(|&l| l == 1.0));
        prop_assert_eq!(top_precision(&scores, &labels, 1.0), Some(1.0));
    }
}

// ── 3. Rank conservation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn present_ranks_sum_to_triangular(row in arb_row(), higher in any::<bool>()) {
        let ranks = rank_values(&row, higher);
        let k = row.iter().filter(|v| v.is_some()).count() as f64;
        let sum: f64 = ranks.iter().flatten().sum();
        prop_assert!((sum - k * (k + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_stays_missing(row in arb_row()) {
        let ranks = rank_values(&row, true);
        prop_assert_eq!(ranks.len(), row.len());
        for (value, rank) in row.iter().zip(&ranks) {
            prop_assert_eq!(value.is_none(), rank.is_none());
            if let Some(r) = rank {
                prop_assert!(*r >= 1.0 && *r <= row.len() as f64);
            }
        }
    }

    #[test]
    fn reversing_direction_mirrors_ranks(row in arb_row()) {
        let up = rank_values(&row, true);
        let down = rank_values(&row, false);
        let k = row.iter().filter(|v| v.is_some()).count() as f64;
        for (u, d) in up.iter().zip(&down) {
            if let (Some(u), Some(d)) = (u, d) {
                prop_assert!((u + d - (k + 1.0)).abs() < 1e-9);
            }
        }
    }
}

// ── 4. Reducer laws ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn mean_between_min_and_max(values in prop::collection::vec(-1e6..1e6_f64, 1..50)) {
        let mean = reduce::mean(&values).unwrap();
        let max = reduce::max(&values).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert!(mean <= max + 1e-6 && mean >= min - 1e-6);
    }

    #[test]
    fn argmax_points_at_max(values in prop::collection::vec(-100..100_i32, 1..50)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let (value, idx) = reduce::argmax(&values).unwrap();
        prop_assert_eq!(values[idx], value);
        prop_assert!(values.iter().all(|&v| v <= value));
        prop_assert!(values[..idx].iter().all(|&v| v < value));
    }
}
