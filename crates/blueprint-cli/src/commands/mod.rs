pub mod completions;
pub mod export;
pub mod import;
pub mod man_pages;
pub mod revalidate;
pub mod tables;

use blueprint_core::Importer;
use blueprint_schema::{DocumentFormat, FormatHint, ReferenceTables, Severity};
use clap::ValueEnum;
use std::path::Path;
use tracing::{debug, warn};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_REJECTED: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

/// Input syntax accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Config,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Config => Self::Config,
        }
    }
}

/// Output schema for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    /// Image-request JSON.
    Json,
    /// System-configuration TOML.
    Config,
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Build an importer from the table file, or the built-in tables when none is given.
pub fn load_importer(tables: Option<&Path>) -> Result<Importer, String> {
    let tables = match tables {
        Some(path) => {
            debug!("loading reference tables from {}", path.display());
            ReferenceTables::load(path).map_err(|e| {
                warn!("cannot use table file {}: {e}", path.display());
                format!("tables error: {}: {e}", path.display())
            })?
        }
        None => ReferenceTables::builtin().map_err(|e| format!("tables error: built-in: {e}"))?,
    };
    Ok(Importer::new(tables))
}

pub fn read_blueprint(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

/// A declared format wins; otherwise the file name, then the content, decide.
pub fn format_hint(path: &Path, format: Option<FormatArg>) -> FormatHint<'_> {
    match (format, path.to_str()) {
        (Some(format), _) => FormatHint::Declared(format.into()),
        (None, Some(name)) => FormatHint::Filename(name),
        (None, None) => FormatHint::Unknown,
    }
}

pub fn colorize_severity(severity: Severity) -> String {
    use console::Style;
    let label = severity.to_string();
    match severity {
        Severity::Fatal => Style::new().red().bold().apply_to(label).to_string(),
        Severity::Warning => Style::new().yellow().apply_to(label).to_string(),
    }
}
