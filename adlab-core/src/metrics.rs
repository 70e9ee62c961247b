//! Detection metrics: pure functions over (anomaly score, label) pairs.
//!
//! Every metric returns `None` (missing) instead of failing: an unusable score
//! array, mismatched lengths or a degenerate label set all produce a missing
//! value that flows through the reductions downstream.

use serde::{Deserialize, Serialize};

/// Quantile used for the `top_5p` column.
pub const TOP_QUANTILE: f64 = 0.05;

/// Anomaly scores paired 1:1 with binary labels (1.0 = anomaly).
#[derive(Debug, Clone, Copy)]
pub struct ScoreLabelPair<'a> {
    pub scores: &'a [f64],
    pub labels: &'a [f64],
}

impl<'a> ScoreLabelPair<'a> {
    pub fn new(scores: &'a [f64], labels: &'a [f64]) -> Self {
        Self { scores, labels }
    }

    /// True if the scores can be evaluated at all (non-empty, NaN-free head,
    /// same length as the labels).
    pub fn is_usable(&self) -> bool {
        scores_usable(self.scores) && self.scores.len() == self.labels.len()
    }

    pub fn auroc(&self) -> Option<f64> {
        auroc(self.scores, self.labels)
    }

    pub fn top_precision(&self, p: f64) -> Option<f64> {
        top_precision(self.scores, self.labels, p)
    }
}

/// A single point on the ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// Lowest score still predicted anomalous at this point.
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC curve with its trapezoidal area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

/// A score array is unusable when it is empty or its first element is NaN.
///
/// Detectors that fail to fit write a NaN-filled score array, so only the
/// head is inspected.
pub fn scores_usable(scores: &[f64]) -> bool {
    scores.first().is_some_and(|s| !s.is_nan())
}

/// Build the ROC curve, one point per distinct score threshold.
///
/// Samples are visited in descending score order; a block of tied scores is
/// crossed in one step, so identical scores never produce separate points.
/// The curve starts at (0, 0) and ends at (1, 1).
///
/// Returns `None` for unusable scores, mismatched lengths, or labels with a
/// single class (the curve is undefined without both positives and negatives).
pub fn roc_curve(scores: &[f64], labels: &[f64]) -> Option<RocCurve> {
    if !scores_usable(scores) || scores.len() != labels.len() {
        return None;
    }

    let total_pos = labels.iter().filter(|&&l| is_positive(l)).count();
    let total_neg = labels.len() - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return None;
    }

    let order = descending_order(scores);
    let p = total_pos as f64;
    let n = total_neg as f64;

    let mut points = Vec::with_capacity(order.len() + 1);
    points.push(RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    });

    let mut tp = 0_usize;
    let mut fp = 0_usize;
    for (k, &idx) in order.iter().enumerate() {
        if is_positive(labels[idx]) {
            tp += 1;
        } else {
            fp += 1;
        }
        let closes_block = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if closes_block {
            points.push(RocPoint {
                threshold: scores[idx],
                fpr: fp as f64 / n,
                tpr: tp as f64 / p,
            });
        }
    }

    let auc = trapezoidal_area(&points);
    Some(RocCurve { points, auc })
}

/// Area under the ROC curve, in [0, 1]. `None` when the curve is undefined.
pub fn auroc(scores: &[f64], labels: &[f64]) -> Option<f64> {
    roc_curve(scores, labels).map(|curve| curve.auc)
}

/// Precision among the top `p` fraction of samples by score.
///
/// `top_n = round(N * p)` with ties rounded to even. The numerator counts the
/// positives among the `top_n` highest-scored samples. The denominator is the
/// label sum over the **last `top_n` entries of the unsorted label array**,
/// not the global positive count, so the ratio can exceed 1 or be undefined
/// when that tail holds no positives.
///
/// Returns `None` for unusable scores, mismatched lengths, `p` outside
/// `[0, 1]`, or a zero denominator.
pub fn top_precision(scores: &[f64], labels: &[f64], p: f64) -> Option<f64> {
    if !scores_usable(scores) || scores.len() != labels.len() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let n = scores.len();
    let top_n = ((n as f64 * p).round_ties_even() as usize).min(n);

    let order = descending_order(scores);
    let hits: f64 = order[..top_n].iter().map(|&i| labels[i]).sum();
    let tail: f64 = labels[n - top_n..].iter().sum();

    if tail == 0.0 {
        return None;
    }
    Some(hits / tail)
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn is_positive(label: f64) -> bool {
    label > 0.0
}

/// Indices sorted by descending score; equal scores keep their input order.
fn descending_order(scores: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indices
}

fn trapezoidal_area(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn auroc_perfect_separation() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(auroc(&scores, &labels), Some(1.0));
    }

    #[test]
    fn auroc_inverted_separation() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(auroc(&scores, &labels), Some(0.0));
    }

    #[test]
    fn auroc_nan_head_is_missing() {
        let scores = [f64::NAN, 0.8, 0.2, 0.1];
        let labels = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(auroc(&scores, &labels), None);
    }

    #[test]
    fn auroc_empty_is_missing() {
        assert_eq!(auroc(&[], &[]), None);
    }

    #[test]
    fn auroc_single_class_is_missing() {
        assert_eq!(auroc(&[0.3, 0.2], &[1.0, 1.0]), None);
        assert_eq!(auroc(&[0.3, 0.2], &[0.0, 0.0]), None);
    }

    #[test]
    fn auroc_length_mismatch_is_missing() {
        assert_eq!(auroc(&[0.3, 0.2, 0.1], &[1.0, 0.0]), None);
    }

    #[test]
    fn auroc_all_tied_is_half() {
        let scores = [0.5, 0.5, 0.5, 0.5];
        let labels = [1.0, 0.0, 1.0, 0.0];
        assert!(approx(auroc(&scores, &labels).unwrap(), 0.5));
    }

    #[test]
    fn auroc_ties_do_not_split_curve_points() {
        // A positive and a negative share 0.5; the tie contributes half a pair.
        // Pairs: (0.5+, 0.5-) = 0.5, (0.5+, 0.1-) = 1 → 1.5 / 2 = 0.75
        let scores = [0.5, 0.5, 0.1];
        let labels = [1.0, 0.0, 0.0];
        let curve = roc_curve(&scores, &labels).unwrap();
        assert_eq!(curve.points.len(), 3);
        assert!(approx(curve.auc, 0.75));

        // Input order of the tied pair must not matter.
        let swapped = auroc(&[0.5, 0.5, 0.1], &[0.0, 1.0, 0.0]).unwrap();
        assert!(approx(swapped, 0.75));
    }

    #[test]
    fn auroc_matches_pairwise_count() {
        // 2 positives, 3 negatives: positive 0.7 beats 0.6, 0.3, 0.1 (3);
        // positive 0.4 beats 0.3, 0.1 (2) → 5 / 6
        let scores = [0.7, 0.6, 0.4, 0.3, 0.1];
        let labels = [1.0, 0.0, 1.0, 0.0, 0.0];
        assert!(approx(auroc(&scores, &labels).unwrap(), 5.0 / 6.0));
    }

    #[test]
    fn roc_curve_endpoints() {
        let curve = roc_curve(&[0.9, 0.4, 0.3], &[1.0, 0.0, 1.0]).unwrap();
        let first = curve.points.first().unwrap();
        let last = curve.points.last().unwrap();
        assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
        assert!(first.threshold.is_infinite());
    }

    #[test]
    fn top_precision_full_list_is_one() {
        let scores = [0.9, 0.1, 0.6, 0.3];
        let labels = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(top_precision(&scores, &labels, 1.0), Some(1.0));
    }

    #[test]
    fn top_precision_nan_head_is_missing() {
        assert_eq!(top_precision(&[f64::NAN, 0.1], &[1.0, 0.0], 0.5), None);
    }

    #[test]
    fn top_precision_denominator_uses_label_tail() {
        // top_n = 2; top-scored samples are indices 0 and 3 (both positive).
        // Denominator is labels[2..] = [0, 1] → 1, so precision is 2.0.
        let scores = [0.9, 0.1, 0.2, 0.8];
        let labels = [1.0, 0.0, 0.0, 1.0];
        assert_eq!(top_precision(&scores, &labels, 0.5), Some(2.0));
    }

    #[test]
    fn top_precision_empty_tail_is_missing() {
        // Positives sit at the head of the label array, the tail sums to zero.
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(top_precision(&scores, &labels, 0.5), None);
    }

    #[test]
    fn top_precision_rounds_half_to_even() {
        // N = 10, p = 0.25 → 2.5 → top_n = 2
        let scores: Vec<f64> = (0..10).map(|i| 1.0 - i as f64 / 10.0).collect();
        let mut labels = vec![0.0; 10];
        labels[0] = 1.0;
        labels[1] = 1.0;
        labels[2] = 1.0;
        labels[8] = 1.0;
        labels[9] = 1.0;
        // hits over top 2 = 2; tail labels[8..] = 2
        assert_eq!(top_precision(&scores, &labels, 0.25), Some(1.0));

        // N = 6, p = 0.25 → 1.5 → top_n = 2; hits = 2; tail labels[4..] = 1
        let scores = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4];
        let labels = [1.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(top_precision(&scores, &labels, 0.25), Some(2.0));
    }

    #[test]
    fn top_precision_rejects_out_of_range_quantile() {
        let scores = [0.9, 0.1];
        let labels = [1.0, 0.0];
        assert_eq!(top_precision(&scores, &labels, 1.5), None);
        assert_eq!(top_precision(&scores, &labels, -0.1), None);
        assert_eq!(top_precision(&scores, &labels, f64::NAN), None);
    }

    #[test]
    fn pair_delegates() {
        let scores = [0.9, 0.8, 0.2, 0.1];
        let labels = [1.0, 1.0, 0.0, 0.0];
        let pair = ScoreLabelPair::new(&scores, &labels);
        assert!(pair.is_usable());
        assert_eq!(pair.auroc(), Some(1.0));
        assert_eq!(pair.top_precision(1.0), Some(1.0));
    }
}
