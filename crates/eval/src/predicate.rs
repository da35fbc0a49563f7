//! Match predicates: the item-specific half of the evaluator.
//!
//! The assignment solver and metrics code are shared; each item kind plugs in
//! through [`MatchPredicate`].

use extract::{Entity, Relation, TypeVocabulary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MatchMode;
use crate::normalizer::normalize_name;
use crate::similarity::calculate_similarity;

/// Weak label-overlap floor for entities under `TypeOnly`.
pub const ENTITY_TYPE_ONLY_FLOOR: f64 = 0.5;
/// Endpoint-average floor for relationships under `TypeOnly`.
pub const RELATIONSHIP_TYPE_ONLY_FLOOR: f64 = 0.3;

/// Result of comparing one extracted item with one ground-truth item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub matches: bool,
    /// Ranking score used by the assignment solver.
    pub similarity: f64,
    pub type_match: bool,
    /// Whether the pair matched in its forward orientation. Always true for
    /// item kinds without direction.
    pub direction_match: bool,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self {
            matches: false,
            similarity: 0.0,
            type_match: false,
            direction_match: false,
        }
    }
}

pub trait MatchPredicate: Send + Sync {
    type Item: Clone + Default + Serialize + DeserializeOwned + Send + Sync;

    /// Label used in logs and reports.
    const KIND: &'static str;

    /// Whether results carry direction accuracy.
    const TRACKS_DIRECTION: bool;

    fn supports(&self, mode: MatchMode) -> bool;

    /// The item's type label, empty when missing.
    fn item_type<'a>(&self, item: &'a Self::Item) -> &'a str;

    /// The slice of the vocabulary that applies to this item kind.
    fn vocabulary<'v>(&self, vocabulary: &'v TypeVocabulary) -> &'v [String];

    /// Decide whether `extracted` matches `truth` under `mode`.
    ///
    /// `mode` is expected to be resolved already (see [`resolve_mode`](Self::resolve_mode)).
    fn compare(
        &self,
        extracted: &Self::Item,
        truth: &Self::Item,
        mode: MatchMode,
        threshold: f64,
    ) -> MatchOutcome;

    /// Map a requested mode to one this predicate supports. Unsupported modes
    /// fall back to `Strict` with a warning.
    fn resolve_mode(&self, mode: MatchMode) -> MatchMode {
        if self.supports(mode) {
            mode
        } else {
            warn!(
                kind = Self::KIND,
                mode = %mode,
                "Match mode not supported, falling back to strict"
            );
            MatchMode::Strict
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntityPredicate;

impl MatchPredicate for EntityPredicate {
    type Item = Entity;

    const KIND: &'static str = "entity";
    const TRACKS_DIRECTION: bool = false;

    fn supports(&self, mode: MatchMode) -> bool {
        matches!(mode, MatchMode::Strict | MatchMode::Partial | MatchMode::TypeOnly)
    }

    fn item_type<'a>(&self, item: &'a Entity) -> &'a str {
        &item.entity_type
    }

    fn vocabulary<'v>(&self, vocabulary: &'v TypeVocabulary) -> &'v [String] {
        &vocabulary.entity_types
    }

    fn compare(&self, extracted: &Entity, truth: &Entity, mode: MatchMode, threshold: f64) -> MatchOutcome {
        if !extracted.is_well_formed() || !truth.is_well_formed() {
            return MatchOutcome::no_match();
        }

        let type_match = extracted.entity_type == truth.entity_type;
        let similarity = calculate_similarity(&extracted.name, &truth.name);

        let matches = match mode {
            MatchMode::Partial => similarity >= threshold && type_match,
            MatchMode::TypeOnly => type_match && similarity > ENTITY_TYPE_ONLY_FLOOR,
            MatchMode::Strict | MatchMode::DirectionAgnostic => {
                type_match && normalize_name(&extracted.name) == normalize_name(&truth.name)
            }
        };

        MatchOutcome {
            matches,
            similarity,
            type_match,
            direction_match: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipPredicate;

impl MatchPredicate for RelationshipPredicate {
    type Item = Relation;

    const KIND: &'static str = "relationship";
    const TRACKS_DIRECTION: bool = true;

    fn supports(&self, _mode: MatchMode) -> bool {
        true
    }

    fn item_type<'a>(&self, item: &'a Relation) -> &'a str {
        &item.relation_type
    }

    fn vocabulary<'v>(&self, vocabulary: &'v TypeVocabulary) -> &'v [String] {
        &vocabulary.relationship_types
    }

    fn compare(&self, extracted: &Relation, truth: &Relation, mode: MatchMode, threshold: f64) -> MatchOutcome {
        if !extracted.is_well_formed() || !truth.is_well_formed() {
            return MatchOutcome::no_match();
        }

        let type_match = extracted.relation_type == truth.relation_type;
        let forward = EndpointScores::forward(extracted, truth);

        match mode {
            MatchMode::Strict => {
                let exact = normalize_name(&extracted.from) == normalize_name(&truth.from)
                    && normalize_name(&extracted.to) == normalize_name(&truth.to);
                MatchOutcome {
                    matches: exact && type_match,
                    similarity: forward.average(),
                    type_match,
                    direction_match: true,
                }
            }
            MatchMode::Partial => MatchOutcome {
                matches: forward.both_at_least(threshold) && type_match,
                similarity: forward.average(),
                type_match,
                direction_match: true,
            },
            MatchMode::DirectionAgnostic => {
                let reversed = EndpointScores::reversed(extracted, truth);
                let forward_ok = forward.both_at_least(threshold);
                let reversed_ok = reversed.both_at_least(threshold);
                MatchOutcome {
                    matches: (forward_ok || reversed_ok) && type_match,
                    similarity: forward.average().max(reversed.average()),
                    type_match,
                    direction_match: forward_ok && reversed.average() <= forward.average(),
                }
            }
            MatchMode::TypeOnly => {
                let reversed = EndpointScores::reversed(extracted, truth);
                let best = forward.average().max(reversed.average());
                MatchOutcome {
                    matches: type_match && best > RELATIONSHIP_TYPE_ONLY_FLOOR,
                    similarity: best,
                    type_match,
                    direction_match: forward.average() >= reversed.average(),
                }
            }
        }
    }
}

/// Similarities of the two endpoint pairings for one orientation.
#[derive(Debug, Clone, Copy)]
struct EndpointScores {
    from: f64,
    to: f64,
}

impl EndpointScores {
    fn forward(extracted: &Relation, truth: &Relation) -> Self {
        Self {
            from: calculate_similarity(&extracted.from, &truth.from),
            to: calculate_similarity(&extracted.to, &truth.to),
        }
    }

    fn reversed(extracted: &Relation, truth: &Relation) -> Self {
        Self {
            from: calculate_similarity(&extracted.from, &truth.to),
            to: calculate_similarity(&extracted.to, &truth.from),
        }
    }

    fn average(&self) -> f64 {
        (self.from + self.to) / 2.0
    }

    fn both_at_least(&self, threshold: f64) -> bool {
        self.from >= threshold && self.to >= threshold
    }
}
