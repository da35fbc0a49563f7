//! Extraction schema shared by the extractor and the evaluation harness.

pub mod schema;
pub mod vocabulary;

pub use schema::{Entity, Relation};
pub use vocabulary::TypeVocabulary;
