//! Greedy one-to-one assignment of extracted items to ground-truth items.
//!
//! Candidates are taken in descending similarity, ties broken by ascending
//! `(extracted_index, ground_truth_index)`. A pair is kept only when neither
//! side is already used. This approximates maximum-weight bipartite matching;
//! it is not guaranteed optimal, but it is deterministic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::MatchMode;
use crate::predicate::MatchPredicate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub extracted_index: usize,
    pub ground_truth_index: usize,
    pub similarity: f64,
    pub type_match: bool,
    pub direction_match: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// Chosen pairs, in the order they were assigned.
    pub pairs: Vec<MatchCandidate>,
    pub unassigned_extracted: Vec<usize>,
    pub unassigned_ground_truth: Vec<usize>,
}

/// Every `(i, j)` pair the predicate accepts, in `(i, j)` order.
pub fn collect_candidates<P: MatchPredicate>(
    predicate: &P,
    extracted: &[P::Item],
    ground_truth: &[P::Item],
    mode: MatchMode,
    threshold: f64,
) -> Vec<MatchCandidate> {
    let mut candidates = Vec::new();

    for (i, e) in extracted.iter().enumerate() {
        for (j, g) in ground_truth.iter().enumerate() {
            let outcome = predicate.compare(e, g, mode, threshold);
            if outcome.matches {
                candidates.push(MatchCandidate {
                    extracted_index: i,
                    ground_truth_index: j,
                    similarity: outcome.similarity,
                    type_match: outcome.type_match,
                    direction_match: outcome.direction_match,
                });
            }
        }
    }

    candidates
}

fn rank(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then(a.extracted_index.cmp(&b.extracted_index))
        .then(a.ground_truth_index.cmp(&b.ground_truth_index))
}

/// Resolve candidates into a one-to-one assignment.
pub fn assign_greedy(
    mut candidates: Vec<MatchCandidate>,
    extracted_len: usize,
    ground_truth_len: usize,
) -> Assignment {
    candidates.sort_by(rank);

    let mut extracted_used = vec![false; extracted_len];
    let mut truth_used = vec![false; ground_truth_len];
    let mut pairs = Vec::new();

    for candidate in candidates {
        let (i, j) = (candidate.extracted_index, candidate.ground_truth_index);
        if extracted_used[i] || truth_used[j] {
            continue;
        }
        extracted_used[i] = true;
        truth_used[j] = true;
        pairs.push(candidate);
    }

    Assignment {
        pairs,
        unassigned_extracted: unused(&extracted_used),
        unassigned_ground_truth: unused(&truth_used),
    }
}

fn unused(used: &[bool]) -> Vec<usize> {
    used.iter()
        .enumerate()
        .filter(|&(_, &u)| !u)
        .map(|(idx, _)| idx)
        .collect()
}

/// Candidate generation followed by greedy assignment.
pub fn solve<P: MatchPredicate>(
    predicate: &P,
    extracted: &[P::Item],
    ground_truth: &[P::Item],
    mode: MatchMode,
    threshold: f64,
) -> Assignment {
    let candidates = collect_candidates(predicate, extracted, ground_truth, mode, threshold);
    assign_greedy(candidates, extracted.len(), ground_truth.len())
}
