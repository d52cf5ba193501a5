//! Import pipeline for image blueprints.
//!
//! This crate ties the schema layer into the [`Importer`]: the structural gate
//! that accepts or rejects a parsed document, the registry of independent
//! per-field validators, the normalizer that assembles a complete
//! [`WizardState`](blueprint_schema::WizardState), and the aggregator that turns
//! the collected diagnostics into an [`ImportResult`]. It also provides the
//! exporter that writes a normalized state back out in either blueprint schema.

pub mod export;
pub mod importer;
pub mod normalize;
pub mod outcome;
pub mod structural;
pub mod validators;

pub use export::{to_image_request, to_system_config};
pub use importer::Importer;
pub use outcome::{ImportResult, INCOMPATIBLE_MESSAGE};
pub use structural::SchemaKind;
pub use validators::TokenListField;

use blueprint_schema::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("parse error: {0}")]
    Parse(#[from] blueprint_schema::ParseError),
    #[error("structural error: {}", summarize(.0))]
    Structural(Vec<Diagnostic>),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize TOML blueprint: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("failed to serialize JSON blueprint: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}: {}", d.field, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}
