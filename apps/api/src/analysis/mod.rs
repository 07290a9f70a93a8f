// Content Analyzer: word counts, heading counts, keyword occurrences and
// density, checked against a Requirements object. Pure computation, no I/O.

pub mod analyzer;
pub mod handlers;
pub mod headings;
pub mod text;

use serde::{Deserialize, Serialize};

pub use analyzer::{analyze, AnalysisReport};

/// Markup of the content being analyzed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Markdown,
    Html,
}
