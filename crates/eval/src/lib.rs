//! Scoring of extracted entities and relationships against ground truth.
//!
//! Items are paired with a greedy one-to-one assignment under a configurable
//! match mode, then summarized as micro, macro and per-type precision, recall
//! and F1 (plus direction accuracy for relationships).

pub mod assignment;
pub mod batch;
pub mod benchmark;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod normalizer;
pub mod predicate;
pub mod similarity;
pub mod timing;

pub use batch::BatchResult;
pub use benchmark::{BenchmarkReport, BenchmarkRunner, CaseOutcome, CaseResult, ScoreMetric};
pub use config::{BenchmarkConfig, ConcurrencyConfig, EvalOptions, MatchMode};
pub use dataset::{BenchmarkCase, BenchmarkSuite, ItemKind};
pub use error::{EvalError, Result};
pub use evaluator::{
    evaluate_entities, evaluate_relationships, Document, EntityEvaluator, EvaluationResult, Evaluator, Match,
    RelationshipEvaluator,
};
pub use metrics::{MacroAverage, Scores, TypeMetrics};
pub use normalizer::normalize_name;
pub use predicate::{EntityPredicate, MatchOutcome, MatchPredicate, RelationshipPredicate};
pub use similarity::calculate_similarity;
