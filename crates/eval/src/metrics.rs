//! Counting assignment outcomes and turning counts into scores.
//!
//! Counts ([`Tally`]) are additive across documents; scores ([`Scores`]) are
//! always recomputed from counts, never averaged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assignment::Assignment;
use crate::predicate::MatchPredicate;

/// `num / den`, or 0 when `den` is 0.
pub fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub fn precision(tp: usize, fp: usize) -> f64 {
    ratio(tp, tp + fp)
}

pub fn recall(tp: usize, fn_: usize) -> f64 {
    ratio(tp, tp + fn_)
}

pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Raw counts for one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTally {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub correct_directions: usize,
    /// Ground-truth items of this type.
    pub support: usize,
    /// Extracted items of this type.
    pub predicted: usize,
}

impl TypeTally {
    fn absorb(&mut self, other: &TypeTally) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.correct_directions += other.correct_directions;
        self.support += other.support;
        self.predicted += other.predicted;
    }

    fn is_empty(&self) -> bool {
        self.support == 0 && self.predicted == 0
    }
}

/// Global and per-type counts for one document or a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub correct_directions: usize,
    pub per_type: BTreeMap<String, TypeTally>,
}

impl Tally {
    /// Zeroed counters for every type in `types`.
    pub fn seeded(types: &[String]) -> Self {
        Self {
            per_type: types
                .iter()
                .map(|t| (t.clone(), TypeTally::default()))
                .collect(),
            ..Self::default()
        }
    }

    /// Count the outcome of one assignment. TPs are bucketed by the matched
    /// ground-truth type, FPs by extracted type, FNs by ground-truth type.
    /// Items without a type count globally only.
    pub fn record<P: MatchPredicate>(
        &mut self,
        predicate: &P,
        assignment: &Assignment,
        extracted: &[P::Item],
        ground_truth: &[P::Item],
    ) {
        for item in extracted {
            if let Some(bucket) = self.bucket(predicate.item_type(item)) {
                bucket.predicted += 1;
            }
        }
        for item in ground_truth {
            if let Some(bucket) = self.bucket(predicate.item_type(item)) {
                bucket.support += 1;
            }
        }

        for pair in &assignment.pairs {
            self.true_positives += 1;
            if pair.direction_match {
                self.correct_directions += 1;
            }
            let truth_type = predicate.item_type(&ground_truth[pair.ground_truth_index]);
            if let Some(bucket) = self.bucket(truth_type) {
                bucket.true_positives += 1;
                if pair.direction_match {
                    bucket.correct_directions += 1;
                }
            }
        }

        for &i in &assignment.unassigned_extracted {
            self.false_positives += 1;
            if let Some(bucket) = self.bucket(predicate.item_type(&extracted[i])) {
                bucket.false_positives += 1;
            }
        }

        for &j in &assignment.unassigned_ground_truth {
            self.false_negatives += 1;
            if let Some(bucket) = self.bucket(predicate.item_type(&ground_truth[j])) {
                bucket.false_negatives += 1;
            }
        }
    }

    fn bucket(&mut self, item_type: &str) -> Option<&mut TypeTally> {
        if item_type.is_empty() {
            return None;
        }
        Some(self.per_type.entry(item_type.to_string()).or_default())
    }

    /// Add another tally's counts into this one.
    pub fn absorb(&mut self, other: &Tally) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.correct_directions += other.correct_directions;
        for (item_type, counts) in &other.per_type {
            self.per_type.entry(item_type.clone()).or_default().absorb(counts);
        }
    }

    pub fn scores(&self, tracks_direction: bool) -> Scores {
        let p = precision(self.true_positives, self.false_positives);
        let r = recall(self.true_positives, self.false_negatives);

        let per_type_metrics: BTreeMap<String, TypeMetrics> = self
            .per_type
            .iter()
            .filter(|(_, counts)| !counts.is_empty())
            .map(|(item_type, counts)| (item_type.clone(), TypeMetrics::from_tally(counts, tracks_direction)))
            .collect();

        let macro_average = MacroAverage::over(&per_type_metrics);

        Scores {
            precision: p,
            recall: r,
            f1: f1_score(p, r),
            direction_accuracy: tracks_direction
                .then(|| ratio(self.correct_directions, self.true_positives)),
            true_positives: self.true_positives,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
            macro_average,
            per_type_metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
    pub predicted: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_accuracy: Option<f64>,
}

impl TypeMetrics {
    fn from_tally(counts: &TypeTally, tracks_direction: bool) -> Self {
        let p = precision(counts.true_positives, counts.false_positives);
        let r = recall(counts.true_positives, counts.false_negatives);
        Self {
            precision: p,
            recall: r,
            f1: f1_score(p, r),
            support: counts.support,
            predicted: counts.predicted,
            true_positives: counts.true_positives,
            false_positives: counts.false_positives,
            false_negatives: counts.false_negatives,
            direction_accuracy: tracks_direction
                .then(|| ratio(counts.correct_directions, counts.true_positives)),
        }
    }
}

/// Unweighted mean of per-type scores over types with ground-truth support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroAverage {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of types averaged over.
    pub types: usize,
}

impl MacroAverage {
    pub fn over(per_type: &BTreeMap<String, TypeMetrics>) -> Self {
        let supported: Vec<&TypeMetrics> = per_type.values().filter(|m| m.support > 0).collect();
        if supported.is_empty() {
            return Self::default();
        }

        let n = supported.len() as f64;
        Self {
            precision: supported.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: supported.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: supported.iter().map(|m| m.f1).sum::<f64>() / n,
            types: supported.len(),
        }
    }
}

/// Micro scores (from pooled counts), macro average and per-type breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Present for item kinds that carry direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_accuracy: Option<f64>,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub macro_average: MacroAverage,
    pub per_type_metrics: BTreeMap<String, TypeMetrics>,
}

impl Scores {
    /// All-zero scores, as reported for unusable input.
    pub fn zero(tracks_direction: bool) -> Self {
        Tally::default().scores(tracks_direction)
    }
}
