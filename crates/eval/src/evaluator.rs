//! Single-document evaluation, generic over the item kind.

use extract::{Entity, Relation, TypeVocabulary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::assignment::{self, Assignment};
use crate::config::{EvalOptions, MatchMode};
use crate::error::{EvalError, Result};
use crate::metrics::{Scores, Tally};
use crate::predicate::{EntityPredicate, MatchPredicate, RelationshipPredicate};
use crate::timing::{self, TimedOperation};

/// One document's extracted items and their ground truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    #[serde(default)]
    pub extracted: Vec<T>,
    #[serde(default, alias = "ground_truth")]
    pub ground_truth: Vec<T>,
}

impl<T> Document<T> {
    pub fn new(extracted: Vec<T>, ground_truth: Vec<T>) -> Self {
        Self {
            extracted,
            ground_truth,
        }
    }
}

impl<T: Default + serde::de::DeserializeOwned> Document<T> {
    /// Read a document from loosely typed JSON.
    ///
    /// Fails only when `extracted` or `groundTruth` is missing or not an
    /// array. Individual items that do not deserialize become default
    /// (malformed) items, which never match.
    pub fn try_from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| EvalError::malformed("document is not an object"))?;

        let extracted = item_list(object.get("extracted"), "extracted")?;
        let ground_truth = item_list(
            object.get("groundTruth").or_else(|| object.get("ground_truth")),
            "groundTruth",
        )?;

        Ok(Self {
            extracted,
            ground_truth,
        })
    }
}

fn item_list<T: Default + serde::de::DeserializeOwned>(value: Option<&Value>, field: &str) -> Result<Vec<T>> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| EvalError::malformed(format!("`{field}` is missing or not an array")))?;

    Ok(items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item.clone()).unwrap_or_else(|e| {
                debug!(field, index = idx, error = %e, "Unreadable item kept as malformed");
                T::default()
            })
        })
        .collect())
}

/// An assigned extracted / ground-truth pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match<T> {
    pub extracted: T,
    pub ground_truth: T,
    pub extracted_index: usize,
    pub ground_truth_index: usize,
    pub similarity: f64,
    pub type_match: bool,
    pub direction_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult<T> {
    #[serde(flatten)]
    pub scores: Scores,
    pub matches: Vec<Match<T>>,
    pub unmatched_extracted: Vec<T>,
    pub unmatched_ground_truth: Vec<T>,
    /// The mode actually applied, after any fallback.
    pub mode: MatchMode,
    pub similarity_threshold: f64,
    pub latency_ms: f64,
    pub timestamp: String,
}

impl<T> EvaluationResult<T> {
    pub fn precision(&self) -> f64 {
        self.scores.precision
    }

    pub fn recall(&self) -> f64 {
        self.scores.recall
    }

    pub fn f1(&self) -> f64 {
        self.scores.f1
    }

    pub fn direction_accuracy(&self) -> Option<f64> {
        self.scores.direction_accuracy
    }
}

/// Scores extracted items against ground truth using an injected predicate.
#[derive(Debug, Clone)]
pub struct Evaluator<P> {
    predicate: P,
    options: EvalOptions,
    seed_types: Vec<String>,
}

pub type EntityEvaluator = Evaluator<EntityPredicate>;
pub type RelationshipEvaluator = Evaluator<RelationshipPredicate>;

impl Evaluator<EntityPredicate> {
    pub fn entities(options: EvalOptions) -> Self {
        Self::new(EntityPredicate, options)
    }
}

impl Evaluator<RelationshipPredicate> {
    pub fn relationships(options: EvalOptions) -> Self {
        Self::new(RelationshipPredicate, options)
    }
}

impl<P: MatchPredicate> Evaluator<P> {
    pub fn new(predicate: P, options: EvalOptions) -> Self {
        Self {
            predicate,
            options,
            seed_types: Vec::new(),
        }
    }

    /// Pre-seed per-type counters from the vocabulary.
    pub fn with_vocabulary(mut self, vocabulary: &TypeVocabulary) -> Self {
        self.seed_types = self.predicate.vocabulary(vocabulary).to_vec();
        self
    }

    /// Mode and threshold after fallback and clamping.
    pub(crate) fn resolved(&self) -> (MatchMode, f64) {
        (
            self.predicate.resolve_mode(self.options.mode),
            self.options.effective_threshold(),
        )
    }

    pub fn evaluate(&self, extracted: &[P::Item], ground_truth: &[P::Item]) -> EvaluationResult<P::Item> {
        let (mode, threshold) = self.resolved();
        self.evaluate_resolved(extracted, ground_truth, mode, threshold).0
    }

    pub fn evaluate_document(&self, document: &Document<P::Item>) -> EvaluationResult<P::Item> {
        self.evaluate(&document.extracted, &document.ground_truth)
    }

    /// Evaluate loosely typed JSON of the form `{"extracted": [...], "groundTruth": [...]}`.
    ///
    /// Unusable input yields an all-zero result and a warning.
    pub fn evaluate_value(&self, input: &Value) -> EvaluationResult<P::Item> {
        let (mode, threshold) = self.resolved();
        self.evaluate_value_resolved(input, mode, threshold).0
    }

    pub(crate) fn evaluate_value_resolved(
        &self,
        input: &Value,
        mode: MatchMode,
        threshold: f64,
    ) -> (EvaluationResult<P::Item>, Tally) {
        match Document::<P::Item>::try_from_value(input) {
            Ok(document) => {
                self.evaluate_resolved(&document.extracted, &document.ground_truth, mode, threshold)
            }
            Err(e) => {
                warn!(kind = P::KIND, error = %e, "Unusable evaluation input, reporting zero scores");
                self.degraded(mode, threshold)
            }
        }
    }

    pub(crate) fn evaluate_resolved(
        &self,
        extracted: &[P::Item],
        ground_truth: &[P::Item],
        mode: MatchMode,
        threshold: f64,
    ) -> (EvaluationResult<P::Item>, Tally) {
        let timer = TimedOperation::start();

        let assignment =
            assignment::solve(&self.predicate, extracted, ground_truth, mode, threshold);

        let mut tally = Tally::seeded(&self.seed_types);
        tally.record(&self.predicate, &assignment, extracted, ground_truth);
        let scores = tally.scores(P::TRACKS_DIRECTION);

        debug!(
            kind = P::KIND,
            mode = %mode,
            extracted = extracted.len(),
            ground_truth = ground_truth.len(),
            true_positives = scores.true_positives,
            f1 = scores.f1,
            "Evaluated document"
        );

        let result = EvaluationResult {
            scores,
            matches: collect_matches(&assignment, extracted, ground_truth),
            unmatched_extracted: pick(extracted, &assignment.unassigned_extracted),
            unmatched_ground_truth: pick(ground_truth, &assignment.unassigned_ground_truth),
            mode,
            similarity_threshold: threshold,
            latency_ms: timer.elapsed_ms(),
            timestamp: timing::timestamp(),
        };

        (result, tally)
    }

    pub(crate) fn degraded(&self, mode: MatchMode, threshold: f64) -> (EvaluationResult<P::Item>, Tally) {
        let tally = Tally::seeded(&self.seed_types);
        let result = EvaluationResult {
            scores: tally.scores(P::TRACKS_DIRECTION),
            matches: Vec::new(),
            unmatched_extracted: Vec::new(),
            unmatched_ground_truth: Vec::new(),
            mode,
            similarity_threshold: threshold,
            latency_ms: 0.0,
            timestamp: timing::timestamp(),
        };
        (result, tally)
    }
}

fn collect_matches<T: Clone>(assignment: &Assignment, extracted: &[T], ground_truth: &[T]) -> Vec<Match<T>> {
    assignment
        .pairs
        .iter()
        .map(|pair| Match {
            extracted: extracted[pair.extracted_index].clone(),
            ground_truth: ground_truth[pair.ground_truth_index].clone(),
            extracted_index: pair.extracted_index,
            ground_truth_index: pair.ground_truth_index,
            similarity: pair.similarity,
            type_match: pair.type_match,
            direction_match: pair.direction_match,
        })
        .collect()
}

fn pick<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&idx| items[idx].clone()).collect()
}

pub fn evaluate_entities(
    extracted: &[Entity],
    ground_truth: &[Entity],
    options: EvalOptions,
) -> EvaluationResult<Entity> {
    Evaluator::entities(options).evaluate(extracted, ground_truth)
}

pub fn evaluate_relationships(
    extracted: &[Relation],
    ground_truth: &[Relation],
    options: EvalOptions,
) -> EvaluationResult<Relation> {
    Evaluator::relationships(options).evaluate(extracted, ground_truth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(name: &str, entity_type: &str) -> Entity {
        Entity::new(name, entity_type)
    }

    #[test]
    fn test_identity_under_strict() {
        let truth = vec![entity("Acme", "ORGANIZATION"), entity("Alice", "PERSON"), entity("Paris", "LOCATION")];
        let extracted = vec![truth[2].clone(), truth[0].clone(), truth[1].clone()];

        let result = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        assert_eq!(result.precision(), 1.0);
        assert_eq!(result.recall(), 1.0);
        assert_eq!(result.f1(), 1.0);
        assert_eq!(result.scores.false_positives, 0);
        assert_eq!(result.scores.false_negatives, 0);
        assert!(result.direction_accuracy().is_none());
    }

    #[test]
    fn test_empty_ground_truth() {
        let extracted = vec![entity("Acme", "ORGANIZATION"), entity("Bob", "PERSON")];
        let result = evaluate_entities(&extracted, &[], EvalOptions::strict());

        assert_eq!(result.precision(), 0.0);
        assert_eq!(result.recall(), 0.0);
        assert_eq!(result.scores.false_positives, 2);
        assert_eq!(result.unmatched_extracted.len(), 2);
    }

    #[test]
    fn test_empty_extracted() {
        let truth = vec![entity("Acme", "ORGANIZATION")];
        let result = evaluate_entities(&[], &truth, EvalOptions::strict());

        assert_eq!(result.precision(), 0.0);
        assert_eq!(result.recall(), 0.0);
        assert_eq!(result.scores.false_negatives, 1);
        assert_eq!(result.unmatched_ground_truth, truth);
    }

    #[test]
    fn test_fuzzy_upgrade() {
        let extracted = vec![entity("Acme Corporation", "Department")];
        let truth = vec![entity("Acme Corp", "Department")];

        let strict = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        assert_eq!(strict.f1(), 0.0);

        let partial = evaluate_entities(&extracted, &truth, EvalOptions::new(MatchMode::Partial).with_threshold(0.7));
        assert_eq!(partial.f1(), 1.0);
        assert_eq!(partial.matches.len(), 1);
        assert_eq!(partial.mode, MatchMode::Partial);
        assert_eq!(partial.similarity_threshold, 0.7);
    }

    #[test]
    fn test_direction_handling() {
        let extracted = vec![Relation::new("A", "B", "OWNS")];
        let truth = vec![Relation::new("B", "A", "OWNS")];

        for options in [EvalOptions::strict(), EvalOptions::new(MatchMode::Partial)] {
            let result = evaluate_relationships(&extracted, &truth, options);
            assert_eq!(result.f1(), 0.0);
        }

        let result = evaluate_relationships(&extracted, &truth, EvalOptions::direction_agnostic());
        assert_eq!(result.f1(), 1.0);
        assert!(!result.matches[0].direction_match);
        assert_eq!(result.direction_accuracy(), Some(0.0));
        assert_eq!(result.scores.per_type_metrics["OWNS"].direction_accuracy, Some(0.0));
    }

    #[test]
    fn test_duplicates_yield_one_true_positive() {
        let extracted = vec![entity("Acme", "ORGANIZATION"), entity("Acme", "ORGANIZATION")];
        let truth = vec![entity("Acme", "ORGANIZATION")];

        let result = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        assert_eq!(result.scores.true_positives, 1);
        assert_eq!(result.scores.false_positives, 1);
        assert_eq!(result.precision(), 0.5);
        assert_eq!(result.recall(), 1.0);
    }

    #[test]
    fn test_unrelated_extraction_lowers_precision_only() {
        let truth = vec![entity("Acme", "ORGANIZATION"), entity("Alice", "PERSON")];
        let mut extracted = vec![entity("Acme", "ORGANIZATION")];

        let before = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        extracted.push(entity("Zanzibar", "LOCATION"));
        let after = evaluate_entities(&extracted, &truth, EvalOptions::strict());

        assert!(after.precision() < before.precision());
        assert_eq!(after.recall(), before.recall());
    }

    #[test]
    fn test_per_type_metrics() {
        let truth = vec![entity("Acme", "ORGANIZATION"), entity("Alice", "PERSON"), entity("Bob", "PERSON")];
        let extracted = vec![entity("Acme", "ORGANIZATION"), entity("Alice", "PERSON"), entity("Carol", "PERSON")];

        let result = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        let person = &result.scores.per_type_metrics["PERSON"];
        assert_eq!(person.support, 2);
        assert_eq!(person.predicted, 2);
        assert_eq!(person.precision, 0.5);
        assert_eq!(person.recall, 0.5);

        let org = &result.scores.per_type_metrics["ORGANIZATION"];
        assert_eq!(org.f1, 1.0);
        assert_eq!(result.scores.macro_average.types, 2);
        assert_eq!(result.scores.macro_average.f1, 0.75);
    }

    #[test]
    fn test_vocabulary_seeding_hides_empty_types() {
        let vocab = TypeVocabulary::new(["PERSON", "LOCATION"], ["OWNS"]);
        let evaluator = Evaluator::entities(EvalOptions::strict()).with_vocabulary(&vocab);

        let result = evaluator.evaluate(&[entity("Alice", "PERSON")], &[entity("Alice", "PERSON")]);
        assert!(result.scores.per_type_metrics.contains_key("PERSON"));
        assert!(!result.scores.per_type_metrics.contains_key("LOCATION"));
    }

    #[test]
    fn test_type_outside_vocabulary_still_counted() {
        let vocab = TypeVocabulary::default();
        let evaluator = Evaluator::entities(EvalOptions::strict()).with_vocabulary(&vocab);

        let result = evaluator.evaluate(&[entity("HR", "Department")], &[entity("HR", "Department")]);
        assert_eq!(result.f1(), 1.0);
        assert_eq!(result.scores.per_type_metrics["Department"].support, 1);
    }

    #[test]
    fn test_unsupported_mode_falls_back_to_strict() {
        let extracted = vec![entity("Acme Corporation", "ORGANIZATION")];
        let truth = vec![entity("Acme Corp", "ORGANIZATION")];

        let result = evaluate_entities(&extracted, &truth, EvalOptions::direction_agnostic());
        assert_eq!(result.mode, MatchMode::Strict);
        assert_eq!(result.f1(), 0.0);
    }

    #[test]
    fn test_malformed_items_are_plain_misses() {
        let extracted = vec![entity("", "PERSON"), entity("Alice", "PERSON")];
        let truth = vec![entity("Alice", "PERSON"), entity("Ghost", "")];

        let result = evaluate_entities(&extracted, &truth, EvalOptions::strict());
        assert_eq!(result.scores.true_positives, 1);
        assert_eq!(result.scores.false_positives, 1);
        assert_eq!(result.scores.false_negatives, 1);
        // Typeless ground truth is counted globally but has no bucket.
        assert!(!result.scores.per_type_metrics.contains_key(""));
    }

    #[test]
    fn test_evaluate_value_non_array_degrades() {
        let evaluator = Evaluator::entities(EvalOptions::strict());

        let result = evaluator.evaluate_value(&json!({"extracted": "oops", "groundTruth": []}));
        assert_eq!(result.f1(), 0.0);
        assert_eq!(result.scores.true_positives, 0);
        assert_eq!(result.scores.false_positives, 0);
        assert!(result.matches.is_empty());

        let result = evaluator.evaluate_value(&json!(42));
        assert_eq!(result.scores.false_negatives, 0);
    }

    #[test]
    fn test_evaluate_value_keeps_bad_items_as_misses() {
        let evaluator = Evaluator::relationships(EvalOptions::strict());
        let input = json!({
            "extracted": [{"from": "A", "to": "B", "type": "OWNS"}, 17, {"from": "C"}],
            "groundTruth": [{"source": "A", "target": "B", "relation": "OWNS"}]
        });

        let result = evaluator.evaluate_value(&input);
        assert_eq!(result.scores.true_positives, 1);
        assert_eq!(result.scores.false_positives, 2);
        assert_eq!(result.direction_accuracy(), Some(1.0));
    }

    #[test]
    fn test_document_try_from_value() {
        let doc: Document<Entity> = Document::try_from_value(&json!({
            "extracted": [{"name": "A", "type": "X"}],
            "ground_truth": []
        }))
        .unwrap();
        assert_eq!(doc.extracted.len(), 1);

        let err = Document::<Entity>::try_from_value(&json!({"extracted": []})).unwrap_err();
        assert!(matches!(err, EvalError::MalformedInput(_)));
    }

    #[test]
    fn test_result_serializes_contract_fields() {
        let result = evaluate_relationships(
            &[Relation::new("A", "B", "OWNS")],
            &[Relation::new("A", "B", "OWNS")],
            EvalOptions::strict(),
        );
        let json = serde_json::to_value(&result).unwrap();

        for field in [
            "precision", "recall", "f1", "directionAccuracy", "truePositives", "falsePositives",
            "falseNegatives", "perTypeMetrics", "matches", "unmatchedExtracted",
            "unmatchedGroundTruth", "mode", "similarityThreshold", "latencyMs", "timestamp",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["mode"], "strict");
        assert_eq!(json["matches"][0]["groundTruth"]["type"], "OWNS");
    }
}
