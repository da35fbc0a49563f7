use serde::{Deserialize, Serialize};

/// An entity as emitted by the extractor or written into a ground-truth file.
///
/// Missing fields deserialize to empty strings so a malformed record still
/// loads; evaluators treat such items as never matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            description: None,
        }
    }

    /// Both `name` and `type` are non-empty. Whitespace counts as present.
    pub fn is_well_formed(&self) -> bool {
        !self.name.is_empty() && !self.entity_type.is_empty()
    }
}

/// A directed relationship between two named entities.
///
/// Accepts the extractor's `source` / `target` / `relation` field names as
/// aliases for `from` / `to` / `type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, alias = "source")]
    pub from: String,
    #[serde(default, alias = "target")]
    pub to: String,
    #[serde(rename = "type", default, alias = "relation")]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
            evidence: None,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty() && !self.relation_type.is_empty()
    }
}
