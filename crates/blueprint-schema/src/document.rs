//! Format sniffing and parsing of raw blueprint text into a generic tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse JSON blueprint: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse TOML blueprint: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("blueprint root must be a table, found {0}")]
    NotATable(&'static str),
}

/// The two document syntaxes a blueprint can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// JSON, as produced by the hosted export.
    Json,
    /// TOML system configuration, as written by hand or by the on-premise tooling.
    Config,
}

impl DocumentFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" | "cfg" | "conf" => Some(Self::Config),
            _ => None,
        }
    }

    /// Guess the format from content alone: a leading `{` means JSON.
    pub fn sniff(content: &str) -> Self {
        let first = content
            .trim_start_matches('\u{feff}')
            .trim_start()
            .chars()
            .next();
        if first == Some('{') {
            Self::Json
        } else {
            Self::Config
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Config => f.write_str("config"),
        }
    }
}

/// What the caller knows about the format of the text it hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint<'a> {
    /// The format was declared explicitly.
    Declared(DocumentFormat),
    /// Only the file name is known; the extension decides, content sniffing otherwise.
    Filename(&'a str),
    /// Nothing is known; sniff the content.
    Unknown,
}

impl FormatHint<'_> {
    pub fn resolve(self, content: &str) -> DocumentFormat {
        match self {
            Self::Declared(format) => format,
            Self::Filename(name) => {
                DocumentFormat::from_path(name).unwrap_or_else(|| DocumentFormat::sniff(content))
            }
            Self::Unknown => DocumentFormat::sniff(content),
        }
    }
}

/// A parsed blueprint with its format erased into a JSON-shaped tree.
///
/// Keys are kept in sorted order so every walk over the tree is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintDocument {
    format: DocumentFormat,
    root: Map<String, Value>,
}

impl BlueprintDocument {
    pub fn new(format: DocumentFormat, root: Map<String, Value>) -> Self {
        Self { format, root }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }
}

/// Human-readable name of a value's kind, used in messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}

/// Parse raw blueprint text. Never returns a partial document.
pub fn parse_document(
    content: &str,
    hint: FormatHint<'_>,
) -> Result<BlueprintDocument, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let format = hint.resolve(content);
    let value = match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(content)?,
        DocumentFormat::Config => toml_value_to_json(toml::from_str::<toml::Value>(content)?),
    };
    match value {
        Value::Object(root) => Ok(BlueprintDocument::new(format, root)),
        other => Err(ParseError::NotATable(kind_name(&other))),
    }
}

/// Convert a [`toml::Value`] into a [`serde_json::Value`].
///
/// TOML has no null; datetimes are stringified.
fn toml_value_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_value_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_value_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}
