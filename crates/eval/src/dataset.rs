use anyhow::{Context, Result};
use extract::TypeVocabulary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

use crate::benchmark::ScoreMetric;
use crate::config::MatchMode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Entities,
    Relationships,
}

/// One benchmark case: a set of documents scored together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkCase {
    pub id: String,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Array of `{"extracted": [...], "groundTruth": [...]}`. Kept as raw JSON
    /// so a bad document degrades instead of failing the whole suite.
    #[serde(default)]
    pub documents: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<f64>,
    #[serde(default)]
    pub metric: ScoreMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<TypeVocabulary>,
    #[serde(default)]
    pub cases: Vec<BenchmarkCase>,
}

impl BenchmarkSuite {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse benchmark suite")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if extension != "json" {
            anyhow::bail!("Unsupported dataset format: {}", extension);
        }

        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read dataset file: {:?}", path))?;
        Self::from_json_str(&content).context(format!("Invalid dataset file: {:?}", path))
    }

    /// Load every `.json` suite in a directory, sorted by file name.
    pub async fn load_directory(dir: &Path) -> Result<Vec<Self>> {
        let mut paths = Vec::new();
        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read dataset directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut suites = Vec::with_capacity(paths.len());
        for path in paths {
            suites.push(Self::load(&path).await?);
        }
        Ok(suites)
    }
}
