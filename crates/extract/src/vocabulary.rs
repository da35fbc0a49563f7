use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The closed set of entity and relationship types the extractor may emit.
///
/// Evaluators only use it to pre-seed per-type counters; items carrying a
/// type outside the vocabulary are still scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeVocabulary {
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub relationship_types: Vec<String>,
}

impl Default for TypeVocabulary {
    fn default() -> Self {
        Self {
            entity_types: [
                "PERSON",
                "ORGANIZATION",
                "CONCEPT",
                "TECHNOLOGY",
                "LOCATION",
                "EVENT",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            relationship_types: [
                "CREATES", "USES", "AFFECTS", "MANAGES", "CONTAINS", "OWNS", "PART_OF", "WORKS_FOR",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        }
    }
}

impl TypeVocabulary {
    pub fn new(
        entity_types: impl IntoIterator<Item = impl Into<String>>,
        relationship_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            entity_types: entity_types.into_iter().map(Into::into).collect(),
            relationship_types: relationship_types.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty vocabulary: per-type tables only contain types seen in the data.
    pub fn empty() -> Self {
        Self {
            entity_types: Vec::new(),
            relationship_types: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse type vocabulary")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read vocabulary file: {:?}", path))?;
        Self::from_json_str(&content)
    }

    pub fn has_entity_type(&self, entity_type: &str) -> bool {
        self.entity_types.iter().any(|t| t == entity_type)
    }

    pub fn has_relationship_type(&self, relationship_type: &str) -> bool {
        self.relationship_types.iter().any(|t| t == relationship_type)
    }
}
