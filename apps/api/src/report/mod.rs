//! CORA report ingestion: workbook loading and requirement extraction.

pub mod extractor;
pub mod handlers;
pub mod strategies;
pub mod workbook;

pub use extractor::extract;
pub use workbook::ExtractError;
