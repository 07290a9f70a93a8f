// Canonical requirements object and the normalizer that reconciles caller
// overrides with what the extractor recovered from the report.

pub mod handlers;
pub mod models;
pub mod normalizer;

pub use models::{HeadingLevel, HeadingStructure, Location, LsiKeywords, LsiSource, Requirements};
pub use normalizer::{apply_overrides, normalize, GenerationOverrides, HeadingOverrides};
