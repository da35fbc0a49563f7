use extract::{Entity, Relation, TypeVocabulary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::batch::BatchResult;
use crate::config::{BenchmarkConfig, EvalOptions};
use crate::dataset::{BenchmarkCase, BenchmarkSuite, ItemKind};
use crate::evaluator::{Document, Evaluator};
use crate::metrics::Scores;
use crate::predicate::MatchPredicate;
use crate::timing::{self, LatencySummary, TimedOperation};

/// Which aggregate score a case is judged on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    #[default]
    F1,
    MacroF1,
    Precision,
    Recall,
    DirectionAccuracy,
}

impl ScoreMetric {
    /// `None` when the scores do not carry this metric (direction accuracy
    /// for entities).
    pub fn extract(&self, scores: &Scores) -> Option<f64> {
        match self {
            ScoreMetric::F1 => Some(scores.f1),
            ScoreMetric::MacroF1 => Some(scores.macro_average.f1),
            ScoreMetric::Precision => Some(scores.precision),
            ScoreMetric::Recall => Some(scores.recall),
            ScoreMetric::DirectionAccuracy => scores.direction_accuracy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum CaseResult {
    Entities(BatchResult<Entity>),
    Relationships(BatchResult<Relation>),
}

impl CaseResult {
    pub fn scores(&self) -> &Scores {
        match self {
            CaseResult::Entities(batch) => &batch.aggregate,
            CaseResult::Relationships(batch) => &batch.aggregate,
        }
    }

    pub fn total_latency_ms(&self) -> f64 {
        match self {
            CaseResult::Entities(batch) => batch.total_latency_ms,
            CaseResult::Relationships(batch) => batch.total_latency_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metric: ScoreMetric,
    pub score: f64,
    pub pass_threshold: f64,
    pub passed: bool,
    #[serde(flatten)]
    pub result: CaseResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub suite: String,
    pub total_cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub mean_score: f64,
    /// Per-case wall-clock latency.
    pub latency: LatencySummary,
    pub cases: Vec<CaseOutcome>,
    pub timestamp: String,
}

impl BenchmarkReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Extraction Benchmark: {}\n\n| Case | Kind | Metric | Score | Threshold | Result |\n|------|------|--------|-------|-----------|--------|\n",
            self.suite
        );
        for case in &self.cases {
            let kind = match case.result {
                CaseResult::Entities(_) => "entities",
                CaseResult::Relationships(_) => "relationships",
            };
            out.push_str(&format!(
                "| {} | {} | {:?} | {:.3} | {:.2} | {} |\n",
                case.id,
                kind,
                case.metric,
                case.score,
                case.pass_threshold,
                if case.passed { "PASS" } else { "FAIL" }
            ));
        }
        out.push_str(&format!(
            "\n**Passed:** {}/{} ({:.1}%)  \n**Mean score:** {:.3}  \n**P95 case latency:** {:.1} ms\n",
            self.passed,
            self.total_cases,
            self.pass_rate * 100.0,
            self.mean_score,
            self.latency.p95_ms
        ));
        out
    }
}

/// Runs benchmark suites through the entity and relationship evaluators.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    vocabulary: TypeVocabulary,
}

impl BenchmarkRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            vocabulary: TypeVocabulary::empty(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: TypeVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn run_suite(&self, suite: &BenchmarkSuite) -> BenchmarkReport {
        info!(suite = %suite.name, cases = suite.cases.len(), "Running benchmark suite");
        let vocabulary = suite.vocabulary.as_ref().unwrap_or(&self.vocabulary);

        let cases: Vec<CaseOutcome> = suite
            .cases
            .iter()
            .map(|case| self.run_case(case, vocabulary))
            .collect();

        let passed = cases.iter().filter(|c| c.passed).count();
        let total = cases.len();
        let mean_score = if total == 0 {
            0.0
        } else {
            cases.iter().map(|c| c.score).sum::<f64>() / total as f64
        };

        BenchmarkReport {
            suite: suite.name.clone(),
            total_cases: total,
            passed,
            failed: total - passed,
            pass_rate: crate::metrics::ratio(passed, total),
            mean_score,
            latency: LatencySummary::from_samples(cases.iter().map(|c| c.result.total_latency_ms())),
            cases,
            timestamp: timing::timestamp(),
        }
    }

    pub fn run_case(&self, case: &BenchmarkCase, vocabulary: &TypeVocabulary) -> CaseOutcome {
        let options = self.case_options(case);
        let pass_threshold = case.pass_threshold.unwrap_or(self.config.pass_threshold);

        let result = match case.kind {
            ItemKind::Entities => {
                let evaluator = Evaluator::entities(options).with_vocabulary(vocabulary);
                CaseResult::Entities(self.run_documents(&evaluator, case))
            }
            ItemKind::Relationships => {
                let evaluator = Evaluator::relationships(options).with_vocabulary(vocabulary);
                CaseResult::Relationships(self.run_documents(&evaluator, case))
            }
        };

        let (metric, score) = match case.metric.extract(result.scores()) {
            Some(score) => (case.metric, score),
            None => {
                warn!(case = %case.id, metric = ?case.metric, "Metric not available for this case, judging on f1");
                (ScoreMetric::F1, result.scores().f1)
            }
        };
        let passed = score >= pass_threshold;

        info!(case = %case.id, metric = ?metric, score, pass_threshold, passed, "Case evaluated");

        CaseOutcome {
            id: case.id.clone(),
            description: case.description.clone(),
            metric,
            score,
            pass_threshold,
            passed,
            result,
        }
    }

    fn case_options(&self, case: &BenchmarkCase) -> EvalOptions {
        let mut options = self.config.options;
        if let Some(mode) = case.mode {
            options.mode = mode;
        }
        if let Some(threshold) = case.similarity_threshold {
            options.similarity_threshold = threshold;
        }
        options
    }

    fn run_documents<P: MatchPredicate>(&self, evaluator: &Evaluator<P>, case: &BenchmarkCase) -> BatchResult<P::Item> {
        let timer = TimedOperation::start();
        let documents = self.typed_documents::<P::Item>(case);

        let batch = if self.config.concurrency.parallel {
            match evaluator.evaluate_batch_parallel(&documents, self.config.concurrency.num_threads) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(case = %case.id, error = %e, "Parallel evaluation unavailable, running sequentially");
                    evaluator.evaluate_batch(&documents)
                }
            }
        } else {
            evaluator.evaluate_batch(&documents)
        };

        debug!(case = %case.id, elapsed_ms = timer.elapsed_ms(), "Documents scored");
        batch
    }

    /// Parse and cap the case's documents. Unusable documents become empty
    /// documents, which contribute no counts.
    fn typed_documents<T>(&self, case: &BenchmarkCase) -> Vec<Document<T>>
    where
        T: Default + serde::de::DeserializeOwned,
    {
        let raw: &[Value] = match &case.documents {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            _ => {
                warn!(case = %case.id, "`documents` is not an array, case has no documents");
                &[]
            }
        };

        raw.iter()
            .enumerate()
            .map(|(idx, value)| {
                let mut document = Document::try_from_value(value).unwrap_or_else(|e| {
                    warn!(case = %case.id, document = idx, error = %e, "Unusable document, scoring as empty");
                    Document::default()
                });
                self.cap(&mut document, &case.id, idx);
                document
            })
            .collect()
    }

    fn cap<T>(&self, document: &mut Document<T>, case_id: &str, idx: usize) {
        let limit = self.config.max_items_per_document;
        if document.extracted.len() > limit || document.ground_truth.len() > limit {
            warn!(
                case = case_id,
                document = idx,
                extracted = document.extracted.len(),
                ground_truth = document.ground_truth.len(),
                limit,
                "Document exceeds item cap, truncating"
            );
            document.extracted.truncate(limit);
            document.ground_truth.truncate(limit);
        }
    }
}
