//! Corpus-level evaluation.
//!
//! Documents are scored independently; their counts are summed and the micro,
//! macro and direction formulas are applied once to the totals.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::MatchMode;
use crate::error::Result;
use crate::evaluator::{Document, EvaluationResult, Evaluator};
use crate::metrics::{Scores, Tally};
use crate::predicate::MatchPredicate;
use crate::timing::{self, LatencySummary, TimedOperation};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult<T> {
    /// Scores over the summed counts of every document.
    #[serde(flatten)]
    pub aggregate: Scores,
    pub documents: Vec<EvaluationResult<T>>,
    pub document_count: usize,
    pub mode: MatchMode,
    pub similarity_threshold: f64,
    /// Per-document latency distribution.
    pub latency: LatencySummary,
    pub total_latency_ms: f64,
    pub timestamp: String,
}

impl<T> BatchResult<T> {
    pub fn f1(&self) -> f64 {
        self.aggregate.f1
    }

    pub fn macro_f1(&self) -> f64 {
        self.aggregate.macro_average.f1
    }

    pub fn direction_accuracy(&self) -> Option<f64> {
        self.aggregate.direction_accuracy
    }
}

impl<P: MatchPredicate> Evaluator<P> {
    /// Evaluate documents one after another.
    pub fn evaluate_batch(&self, documents: &[Document<P::Item>]) -> BatchResult<P::Item> {
        let timer = TimedOperation::start();
        let (mode, threshold) = self.resolved();

        let outcomes: Vec<_> = documents
            .iter()
            .map(|doc| self.evaluate_resolved(&doc.extracted, &doc.ground_truth, mode, threshold))
            .collect();

        self.combine(outcomes, mode, threshold, &timer)
    }

    /// Evaluate documents on a rayon pool. Results, including document order,
    /// are identical to [`evaluate_batch`](Self::evaluate_batch).
    pub fn evaluate_batch_parallel(
        &self,
        documents: &[Document<P::Item>],
        num_threads: Option<usize>,
    ) -> Result<BatchResult<P::Item>> {
        let timer = TimedOperation::start();
        let (mode, threshold) = self.resolved();

        let pool = if let Some(threads) = num_threads {
            rayon::ThreadPoolBuilder::new().num_threads(threads).build()?
        } else {
            rayon::ThreadPoolBuilder::new().build()?
        };

        let outcomes: Vec<_> = pool.install(|| {
            documents
                .par_iter()
                .map(|doc| self.evaluate_resolved(&doc.extracted, &doc.ground_truth, mode, threshold))
                .collect()
        });

        Ok(self.combine(outcomes, mode, threshold, &timer))
    }

    /// Evaluate a JSON array of documents. A non-array input is reported as
    /// an empty batch; unusable documents contribute zero counts.
    pub fn evaluate_batch_value(&self, input: &Value) -> BatchResult<P::Item> {
        let timer = TimedOperation::start();
        let (mode, threshold) = self.resolved();

        let outcomes: Vec<_> = match input.as_array() {
            Some(documents) => documents
                .iter()
                .map(|doc| self.evaluate_value_resolved(doc, mode, threshold))
                .collect(),
            None => {
                warn!(kind = P::KIND, "Batch input is not an array, reporting an empty batch");
                Vec::new()
            }
        };

        self.combine(outcomes, mode, threshold, &timer)
    }

    fn combine(
        &self,
        outcomes: Vec<(EvaluationResult<P::Item>, Tally)>,
        mode: MatchMode,
        threshold: f64,
        timer: &TimedOperation,
    ) -> BatchResult<P::Item> {
        let mut total = Tally::default();
        let mut documents = Vec::with_capacity(outcomes.len());
        for (result, tally) in outcomes {
            total.absorb(&tally);
            documents.push(result);
        }

        let aggregate = total.scores(P::TRACKS_DIRECTION);
        let latency = LatencySummary::from_samples(documents.iter().map(|d| d.latency_ms));

        info!(
            kind = P::KIND,
            mode = %mode,
            documents = documents.len(),
            f1 = aggregate.f1,
            macro_f1 = aggregate.macro_average.f1,
            "Batch evaluated"
        );

        BatchResult {
            aggregate,
            document_count: documents.len(),
            documents,
            mode,
            similarity_threshold: threshold,
            latency,
            total_latency_ms: timer.elapsed_ms(),
            timestamp: timing::timestamp(),
        }
    }
}
