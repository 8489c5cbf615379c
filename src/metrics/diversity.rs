//! Ensemble diversity metrics.
//!
//! Measures how differently the members of an ensemble predict. For every
//! unordered pair of members and every example three contributions are
//! computed from the two predicted class distributions `p` (lower member
//! index) and `q`:
//!
//! - **disagreement**: 1 if the top classes differ, else 0
//! - **KL divergence**: `KL(p || q)`
//! - **cosine similarity**: cosine of the angle between `p` and `q`
//!
//! [`AveragePairwiseDiversity`] accumulates the sums of these contributions
//! across batches, so the final averages do not depend on how examples were
//! split into batches.

use std::collections::BTreeMap;

use ndarray::{Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MetricError;

/// Default tolerance for the per-example probability sum check.
pub const DEFAULT_SUM_TOLERANCE: f64 = 1e-3;

/// Relative slack for rounding error in restored cosine sums.
const STATE_SUM_SLACK: f64 = 1e-9;

/// Index of the largest entry; ties go to the lowest index.
pub fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// `KL(p || q)` for a single pair of distributions.
///
/// Zero-probability entries of `p` contribute nothing. A positive `p_c`
/// against a zero `q_c` yields infinity.
pub fn kl_divergence_single(p: ArrayView1<f64>, q: ArrayView1<f64>) -> f64 {
    p.iter()
        .zip(q.iter())
        .filter(|(pc, _)| **pc > 0.0)
        .map(|(&pc, &qc)| pc * (pc / qc).ln())
        .sum()
}

/// Cosine similarity of two vectors; 0 if either has zero norm.
pub fn cosine_similarity(p: ArrayView1<f64>, q: ArrayView1<f64>) -> f64 {
    let norm_p = p.dot(&p).sqrt();
    let norm_q = q.dot(&q).sqrt();
    if norm_p == 0.0 || norm_q == 0.0 {
        return 0.0;
    }
    p.dot(&q) / (norm_p * norm_q)
}

/// Converts logits `[members, examples, classes]` to probabilities along the
/// class axis.
pub fn softmax(logits: ArrayView3<f64>) -> Array3<f64> {
    let mut probs = logits.to_owned();
    for mut lane in probs.lanes_mut(Axis(2)) {
        let max = lane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        lane.mapv_inplace(|x| (x - max).exp());
        let total = lane.sum();
        if total > 0.0 {
            lane.mapv_inplace(|x| x / total);
        }
    }
    probs
}

fn check_pair(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Result<(), MetricError> {
    if a.shape() != b.shape() {
        return Err(MetricError::InvalidArgument(format!(
            "prediction shapes differ: {:?} vs {:?}",
            a.shape(),
            b.shape()
        )));
    }
    if a.nrows() == 0 {
        return Err(MetricError::InvalidArgument(
            "predictions contain no examples".to_string(),
        ));
    }
    Ok(())
}

fn mean_over_rows<F>(a: ArrayView2<f64>, b: ArrayView2<f64>, f: F) -> Result<f64, MetricError>
where
    F: Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64,
{
    check_pair(&a, &b)?;
    let total: f64 = a
        .outer_iter()
        .zip(b.outer_iter())
        .map(|(p, q)| f(p, q))
        .sum();
    Ok(total / a.nrows() as f64)
}

/// Fraction of examples whose top classes differ between two models.
///
/// Both inputs are `[examples, classes]`.
pub fn disagreement(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<f64, MetricError> {
    mean_over_rows(a, b, |p, q| if argmax(p) != argmax(q) { 1.0 } else { 0.0 })
}

/// Mean `KL(a || b)` over examples.
pub fn kl_divergence(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<f64, MetricError> {
    mean_over_rows(a, b, kl_divergence_single)
}

/// Mean cosine distance (`1 - cosine similarity`) over examples.
pub fn cosine_distance(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<f64, MetricError> {
    mean_over_rows(a, b, |p, q| 1.0 - cosine_similarity(p, q))
}

/// Accumulated contributions of one pair of ensemble members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairStatistics {
    /// Lower member index.
    pub first: usize,
    /// Higher member index.
    pub second: usize,
    /// Number of examples where the two members' top classes differ.
    pub disagreement_count: u64,
    /// Sum of `KL(first || second)` over examples.
    pub kl_sum: f64,
    /// Sum of cosine similarities over examples.
    pub cosine_sum: f64,
}

impl PairStatistics {
    fn new(first: usize, second: usize) -> Self {
        Self {
            first,
            second,
            disagreement_count: 0,
            kl_sum: 0.0,
            cosine_sum: 0.0,
        }
    }

    /// Checks that the sums could come from `example_count` examples.
    ///
    /// `kl_sum` may be `+inf`, never negative or `NaN`. Each cosine
    /// contribution lies in `[-1, 1]`.
    fn validate(&self, example_count: u64) -> Result<(), MetricError> {
        let pair = (self.first, self.second);
        if self.disagreement_count > example_count {
            return Err(MetricError::InvalidArgument(format!(
                "pair {:?} disagrees on {} of {} examples",
                pair, self.disagreement_count, example_count
            )));
        }
        if self.kl_sum.is_nan() || self.kl_sum < 0.0 {
            return Err(MetricError::InvalidArgument(format!(
                "pair {:?} has invalid KL sum {}",
                pair, self.kl_sum
            )));
        }
        let bound = example_count as f64 * (1.0 + STATE_SUM_SLACK) + STATE_SUM_SLACK;
        if !self.cosine_sum.is_finite() || self.cosine_sum.abs() > bound {
            return Err(MetricError::InvalidArgument(format!(
                "pair {:?} has cosine sum {} outside [-{}, {}]",
                pair, self.cosine_sum, example_count, example_count
            )));
        }
        Ok(())
    }
}

/// Running sufficient statistics of [`AveragePairwiseDiversity`].
///
/// Empty until the first batch fixes the number of members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityState {
    /// Total examples seen.
    pub example_count: u64,
    /// Ensemble size; 0 while empty.
    pub num_models: usize,
    /// One entry per pair `(i, j)` with `i < j`, in lexicographic order.
    pub pairs: Vec<PairStatistics>,
}

impl DiversityState {
    fn with_models(num_models: usize) -> Self {
        let pairs = (0..num_models)
            .flat_map(|i| ((i + 1)..num_models).map(move |j| PairStatistics::new(i, j)))
            .collect();
        Self {
            example_count: 0,
            num_models,
            pairs,
        }
    }

    /// Returns true before the first batch.
    pub fn is_empty(&self) -> bool {
        self.num_models == 0
    }

    fn validate(&self) -> Result<(), MetricError> {
        if self.is_empty() {
            if self.example_count != 0 || !self.pairs.is_empty() {
                return Err(MetricError::InvalidArgument(
                    "state without members must not carry statistics".to_string(),
                ));
            }
            return Ok(());
        }
        let expected = Self::with_models(self.num_models);
        let layout_matches = expected.pairs.len() == self.pairs.len()
            && expected
                .pairs
                .iter()
                .zip(&self.pairs)
                .all(|(e, p)| e.first == p.first && e.second == p.second);
        if self.num_models < 2 || !layout_matches {
            return Err(MetricError::InvalidArgument(format!(
                "state pairs do not cover {} members",
                self.num_models
            )));
        }
        for pair in &self.pairs {
            pair.validate(self.example_count)?;
        }
        Ok(())
    }
}

/// Averaged ensemble diversity.
///
/// Every field is `NaN` when no examples have been seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityResult {
    pub disagreement: f64,
    pub average_kl: f64,
    pub cosine_similarity: f64,
}

impl DiversityResult {
    fn undefined() -> Self {
        Self {
            disagreement: f64::NAN,
            average_kl: f64::NAN,
            cosine_similarity: f64::NAN,
        }
    }

    /// Returns true if no examples contributed.
    pub fn is_undefined(&self) -> bool {
        self.disagreement.is_nan() && self.average_kl.is_nan() && self.cosine_similarity.is_nan()
    }

    /// Metric name to value.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("disagreement", self.disagreement),
            ("average_kl", self.average_kl),
            ("cosine_similarity", self.cosine_similarity),
        ])
    }

    /// Returns a summary of the metrics as a formatted string.
    pub fn summary(&self) -> String {
        format!(
            "Ensemble Diversity:\n\
             - Disagreement: {:.4}\n\
             - Average KL: {:.4}\n\
             - Cosine Similarity: {:.4}",
            self.disagreement, self.average_kl, self.cosine_similarity
        )
    }
}

/// Streaming accumulator of pairwise ensemble diversity.
///
/// # Example
///
/// ```rust,ignore
/// use robustness_forge::metrics::AveragePairwiseDiversity;
///
/// let mut diversity = AveragePairwiseDiversity::new();
/// for batch in batches {
///     // batch: [num_models, batch_size, num_classes]
///     diversity.add_batch(batch.view(), num_models)?;
/// }
/// let result = diversity.result();
/// println!("disagreement: {:.3}", result.disagreement);
/// ```
#[derive(Debug, Clone)]
pub struct AveragePairwiseDiversity {
    state: DiversityState,
    sum_tolerance: f64,
}

impl Default for AveragePairwiseDiversity {
    fn default() -> Self {
        Self::new()
    }
}

impl AveragePairwiseDiversity {
    /// Creates an empty accumulator with the default sum tolerance.
    pub fn new() -> Self {
        Self {
            state: DiversityState::default(),
            sum_tolerance: DEFAULT_SUM_TOLERANCE,
        }
    }

    /// Sets the tolerance for the probability sum check.
    pub fn with_sum_tolerance(mut self, tolerance: f64) -> Self {
        self.sum_tolerance = tolerance;
        self
    }

    /// Restores an accumulator from a saved state.
    pub fn from_state(state: DiversityState) -> Result<Self, MetricError> {
        state.validate()?;
        Ok(Self {
            state,
            ..Self::new()
        })
    }

    /// The current sufficient statistics.
    pub fn state(&self) -> &DiversityState {
        &self.state
    }

    /// Total examples seen.
    pub fn example_count(&self) -> u64 {
        self.state.example_count
    }

    /// Returns to the empty state.
    pub fn reset(&mut self) {
        self.state = DiversityState::default();
    }

    /// Adds a batch of predictions shaped `[num_models, batch_size, num_classes]`.
    ///
    /// The batch is validated in full before any statistic changes, so a
    /// rejected batch leaves the accumulator untouched.
    pub fn add_batch(
        &mut self,
        probabilities: ArrayView3<f64>,
        num_models: usize,
    ) -> Result<(), MetricError> {
        self.validate_batch(&probabilities, num_models)?;

        if self.state.is_empty() {
            self.state = DiversityState::with_models(num_models);
        }

        let batch_size = probabilities.len_of(Axis(1));
        let predictions: Vec<Vec<usize>> = probabilities
            .outer_iter()
            .map(|member| member.outer_iter().map(argmax).collect())
            .collect();

        for pair in &mut self.state.pairs {
            let first = probabilities.index_axis(Axis(0), pair.first);
            let second = probabilities.index_axis(Axis(0), pair.second);
            for example in 0..batch_size {
                let p = first.row(example);
                let q = second.row(example);
                if predictions[pair.first][example] != predictions[pair.second][example] {
                    pair.disagreement_count += 1;
                }
                // Rows are normalized only up to the sum tolerance.
                pair.kl_sum += kl_divergence_single(p, q).max(0.0);
                pair.cosine_sum += cosine_similarity(p, q);
            }
        }
        self.state.example_count += batch_size as u64;

        debug!(
            batch_size,
            num_models,
            total_examples = self.state.example_count,
            "accumulated diversity batch"
        );
        Ok(())
    }

    /// Adds predictions stacked as `[num_models * batch_size, num_classes]`.
    ///
    /// Rows are grouped member-major: the first `batch_size` rows belong to
    /// member 0, the next to member 1, and so on.
    pub fn add_flat_batch(
        &mut self,
        predictions: ArrayView2<f64>,
        num_models: usize,
    ) -> Result<(), MetricError> {
        if num_models == 0 || predictions.nrows() % num_models != 0 {
            return Err(MetricError::InvalidArgument(format!(
                "{} prediction rows cannot be split across {} models",
                predictions.nrows(),
                num_models
            )));
        }
        let batch_size = predictions.nrows() / num_models;
        let reshaped = predictions
            .to_shape((num_models, batch_size, predictions.ncols()))
            .map_err(|e| MetricError::InvalidArgument(format!("cannot reshape predictions: {}", e)))?;
        self.add_batch(reshaped.view(), num_models)
    }

    /// Combines the statistics of an accumulator fed with other batches.
    pub fn merge(&mut self, other: &AveragePairwiseDiversity) -> Result<(), MetricError> {
        if other.state.is_empty() {
            return Ok(());
        }
        if self.state.is_empty() {
            self.state = other.state.clone();
            return Ok(());
        }
        if self.state.num_models != other.state.num_models {
            return Err(MetricError::InvalidArgument(format!(
                "cannot merge accumulators over {} and {} models",
                self.state.num_models, other.state.num_models
            )));
        }

        for (mine, theirs) in self.state.pairs.iter_mut().zip(&other.state.pairs) {
            mine.disagreement_count += theirs.disagreement_count;
            mine.kl_sum += theirs.kl_sum;
            mine.cosine_sum += theirs.cosine_sum;
        }
        self.state.example_count += other.state.example_count;
        Ok(())
    }

    /// Grand averages over every (pair, example) contribution seen so far.
    pub fn result(&self) -> DiversityResult {
        let contributions = self.state.pairs.len() as f64 * self.state.example_count as f64;
        if contributions == 0.0 {
            return DiversityResult::undefined();
        }

        let (disagreements, kl, cosine) = self.state.pairs.iter().fold(
            (0.0, 0.0, 0.0),
            |(d, k, c), pair| {
                (
                    d + pair.disagreement_count as f64,
                    k + pair.kl_sum,
                    c + pair.cosine_sum,
                )
            },
        );

        DiversityResult {
            disagreement: disagreements / contributions,
            average_kl: kl / contributions,
            cosine_similarity: cosine / contributions,
        }
    }

    fn validate_batch(
        &self,
        probabilities: &ArrayView3<f64>,
        num_models: usize,
    ) -> Result<(), MetricError> {
        if num_models < 2 {
            return Err(MetricError::InvalidArgument(format!(
                "diversity needs at least 2 models, got {}",
                num_models
            )));
        }
        let (members, _, classes) = probabilities.dim();
        if members != num_models {
            return Err(MetricError::InvalidArgument(format!(
                "leading axis has {} members but num_models is {}",
                members, num_models
            )));
        }
        if !self.state.is_empty() && self.state.num_models != num_models {
            return Err(MetricError::InvalidArgument(format!(
                "accumulator holds {} models, batch has {}",
                self.state.num_models, num_models
            )));
        }
        if classes == 0 {
            return Err(MetricError::InvalidArgument(
                "class axis is empty".to_string(),
            ));
        }

        for (member, rows) in probabilities.outer_iter().enumerate() {
            for (example, row) in rows.outer_iter().enumerate() {
                if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return Err(MetricError::InvalidArgument(format!(
                        "member {} example {} has negative or non-finite probabilities",
                        member, example
                    )));
                }
                let total = row.sum();
                if (total - 1.0).abs() > self.sum_tolerance {
                    return Err(MetricError::InvalidArgument(format!(
                        "member {} example {} probabilities sum to {}",
                        member, example, total
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "Expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(array![0.4, 0.4, 0.2].view()), 0);
        assert_eq!(argmax(array![0.1, 0.45, 0.45].view()), 1);
    }

    #[test]
    fn test_kl_zero_probability_convention() {
        let p = array![0.0, 1.0];
        let q = array![0.5, 0.5];
        assert_close(kl_divergence_single(p.view(), q.view()), 2.0_f64.ln());
        assert_close(kl_divergence_single(p.view(), p.view()), 0.0);
    }

    #[test]
    fn test_kl_against_zero_is_infinite() {
        let p = array![0.5, 0.5];
        let q = array![1.0, 0.0];
        assert!(kl_divergence_single(p.view(), q.view()).is_infinite());
    }

    #[test]
    fn test_cosine_similarity() {
        let p = array![1.0, 0.0];
        let q = array![0.0, 1.0];
        assert_close(cosine_similarity(p.view(), q.view()), 0.0);
        assert_close(cosine_similarity(p.view(), p.view()), 1.0);
        assert_close(cosine_similarity(array![0.0, 0.0].view(), p.view()), 0.0);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let logits = Array3::from_shape_vec((2, 1, 3), vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0])
            .expect("valid shape");
        let probs = softmax(logits.view());
        for row in probs.lanes(Axis(2)) {
            assert_close(row.sum(), 1.0);
        }
        assert_close(probs[[1, 0, 0]], 1.0 / 3.0);
    }

    #[test]
    fn test_batch_metric_functions() {
        let a = array![[0.9, 0.1], [0.2, 0.8]];
        let b = array![[0.6, 0.4], [0.7, 0.3]];
        assert_close(disagreement(a.view(), b.view()).expect("same shape"), 0.5);
        assert!(kl_divergence(a.view(), b.view()).expect("same shape") > 0.0);
        assert_close(cosine_distance(a.view(), a.view()).expect("same shape"), 0.0);
    }

    #[test]
    fn test_batch_metric_shape_mismatch() {
        let a = array![[0.9, 0.1]];
        let b = array![[0.2, 0.3, 0.5]];
        assert!(disagreement(a.view(), b.view()).is_err());
    }

    #[test]
    fn test_empty_result_is_undefined() {
        let diversity = AveragePairwiseDiversity::new();
        let result = diversity.result();
        assert!(result.is_undefined());
        assert_eq!(diversity.example_count(), 0);
    }

    #[test]
    fn test_identical_models() {
        let member = array![[0.7, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let mut probs = Array3::zeros((3, 2, 3));
        for mut slot in probs.outer_iter_mut() {
            slot.assign(&member);
        }

        let mut diversity = AveragePairwiseDiversity::new();
        diversity.add_batch(probs.view(), 3).expect("valid batch");
        let result = diversity.result();

        assert_close(result.disagreement, 0.0);
        assert_close(result.average_kl, 0.0);
        assert_close(result.cosine_similarity, 1.0);
        assert_eq!(diversity.state().pairs.len(), 3);
    }

    #[test]
    fn test_known_two_model_values() {
        let probs = Array3::from_shape_vec((2, 1, 2), vec![1.0, 0.0, 0.0, 1.0])
            .expect("valid shape");
        let mut diversity = AveragePairwiseDiversity::new();
        diversity.add_batch(probs.view(), 2).expect("valid batch");

        let result = diversity.result();
        assert_close(result.disagreement, 1.0);
        assert_close(result.cosine_similarity, 0.0);
        assert!(result.average_kl.is_infinite());
    }

    #[test]
    fn test_rejects_single_model() {
        let probs = Array3::from_elem((1, 2, 2), 0.5);
        let mut diversity = AveragePairwiseDiversity::new();
        let err = diversity.add_batch(probs.view(), 1).expect_err("one model");
        assert!(matches!(err, MetricError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_num_models_mismatch() {
        let probs = Array3::from_elem((3, 2, 2), 0.5);
        let mut diversity = AveragePairwiseDiversity::new();
        assert!(diversity.add_batch(probs.view(), 2).is_err());
    }

    #[test]
    fn test_rejects_bad_sums_without_mutating() {
        let mut diversity = AveragePairwiseDiversity::new();
        diversity
            .add_batch(Array3::from_elem((2, 1, 2), 0.5).view(), 2)
            .expect("valid batch");

        let bad = Array3::from_elem((2, 1, 2), 0.4);
        assert!(diversity.add_batch(bad.view(), 2).is_err());
        assert_eq!(diversity.example_count(), 1);
    }

    #[test]
    fn test_rejects_negative_probabilities() {
        let probs = Array3::from_shape_vec((2, 1, 2), vec![1.5, -0.5, 0.5, 0.5])
            .expect("valid shape");
        let mut diversity = AveragePairwiseDiversity::new();
        assert!(diversity.add_batch(probs.view(), 2).is_err());
    }

    #[test]
    fn test_rejects_changed_member_count() {
        let mut diversity = AveragePairwiseDiversity::new();
        diversity
            .add_batch(Array3::from_elem((2, 1, 2), 0.5).view(), 2)
            .expect("valid batch");
        let err = diversity
            .add_batch(Array3::from_elem((3, 1, 2), 0.5).view(), 3)
            .expect_err("member count changed");
        assert!(matches!(err, MetricError::InvalidArgument(_)));
    }

    #[test]
    fn test_flat_batch_matches_stacked_batch() {
        let stacked = Array3::from_shape_vec(
            (2, 2, 2),
            vec![0.9, 0.1, 0.3, 0.7, 0.6, 0.4, 0.2, 0.8],
        )
        .expect("valid shape");
        let flat = stacked
            .clone()
            .into_shape_with_order((4, 2))
            .expect("contiguous");

        let mut from_stacked = AveragePairwiseDiversity::new();
        from_stacked.add_batch(stacked.view(), 2).expect("valid");
        let mut from_flat = AveragePairwiseDiversity::new();
        from_flat.add_flat_batch(flat.view(), 2).expect("valid");

        assert_eq!(from_stacked.state(), from_flat.state());
    }

    #[test]
    fn test_flat_batch_indivisible_rows() {
        let flat = ndarray::Array2::from_elem((3, 2), 0.5);
        let mut diversity = AveragePairwiseDiversity::new();
        assert!(diversity.add_flat_batch(flat.view(), 2).is_err());
    }

    #[test]
    fn test_state_round_trip_and_validation() {
        let mut diversity = AveragePairwiseDiversity::new();
        diversity
            .add_batch(Array3::from_elem((3, 2, 2), 0.5).view(), 3)
            .expect("valid batch");

        let json = serde_json::to_string(diversity.state()).expect("serializable");
        let state: DiversityState = serde_json::from_str(&json).expect("deserializable");
        let restored = AveragePairwiseDiversity::from_state(state).expect("valid state");
        assert_eq!(restored.result(), diversity.result());

        let mut broken = diversity.state().clone();
        broken.pairs.pop();
        assert!(AveragePairwiseDiversity::from_state(broken).is_err());
    }

    #[test]
    fn test_loosely_normalized_rows_keep_state_restorable() {
        // Second row sums above one, which would make KL slightly negative.
        let probs = array![[[0.5, 0.5]], [[0.5005, 0.5004]]];
        let mut diversity = AveragePairwiseDiversity::new();
        diversity.add_batch(probs.view(), 2).expect("within tolerance");
        assert!(diversity.state().pairs[0].kl_sum >= 0.0);
        assert!(AveragePairwiseDiversity::from_state(diversity.state().clone()).is_ok());
    }

    #[test]
    fn test_from_state_rejects_out_of_range_sums() {
        let state = |disagreement_count: u64, kl_sum: f64, cosine_sum: f64| DiversityState {
            example_count: 1,
            num_models: 2,
            pairs: vec![PairStatistics {
                first: 0,
                second: 1,
                disagreement_count,
                kl_sum,
                cosine_sum,
            }],
        };

        assert!(AveragePairwiseDiversity::from_state(state(1, 0.5, 0.9)).is_ok());
        assert!(AveragePairwiseDiversity::from_state(state(1, f64::INFINITY, -1.0)).is_ok());

        assert!(AveragePairwiseDiversity::from_state(state(5, 0.5, 0.9)).is_err());
        assert!(AveragePairwiseDiversity::from_state(state(0, -3.0, 0.9)).is_err());
        assert!(AveragePairwiseDiversity::from_state(state(0, f64::NAN, 0.9)).is_err());
        assert!(AveragePairwiseDiversity::from_state(state(0, 0.5, 7.0)).is_err());
        assert!(AveragePairwiseDiversity::from_state(state(0, 0.5, f64::NAN)).is_err());
        assert!(AveragePairwiseDiversity::from_state(state(5, -3.0, 7.0)).is_err());
    }

    #[test]
    fn test_reset() {
        let mut diversity = AveragePairwiseDiversity::new();
        diversity
            .add_batch(Array3::from_elem((2, 1, 2), 0.5).view(), 2)
            .expect("valid batch");
        diversity.reset();
        assert!(diversity.state().is_empty());
        assert!(diversity.result().is_undefined());
    }

    #[test]
    fn test_result_map_keys() {
        let mut diversity = AveragePairwiseDiversity::new();
        diversity
            .add_batch(Array3::from_elem((2, 1, 2), 0.5).view(), 2)
            .expect("valid batch");
        let map = diversity.result().to_map();
        let keys: Vec<&str> = map.keys().copied().collect();
        assert_eq!(keys, vec!["average_kl", "cosine_similarity", "disagreement"]);
    }
}
