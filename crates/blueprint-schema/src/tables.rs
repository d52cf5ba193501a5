//! Reference tables validators check membership against.
//!
//! Tables are configuration data, not code: the engine is handed a
//! [`ReferenceTables`] value, so tests and deployments can substitute their own
//! sets. [`ReferenceTables::builtin`] parses the table file embedded at build time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN_TABLES: &str = include_str!("../tables/builtin.toml");

#[derive(Debug, Error)]
pub enum TablesError {
    #[error("failed to read table file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse table file: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to parse table file: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("table '{0}' must not be empty")]
    Empty(&'static str),
    #[error("{field} '{value}' is not listed in '{table}'")]
    UnknownDefault {
        field: &'static str,
        value: String,
        table: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReferenceTables {
    pub default_architecture: String,
    pub default_distribution: String,
    pub architectures: BTreeSet<String>,
    pub image_types: BTreeSet<String>,
    pub distributions: BTreeSet<String>,
    pub timezones: BTreeSet<String>,
    pub locales: BTreeSet<String>,
    pub keyboards: BTreeSet<String>,
    pub port_aliases: BTreeSet<String>,
    pub port_protocols: BTreeSet<String>,
}

/// A partial table file; every key left out keeps the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableOverrides {
    default_architecture: Option<String>,
    default_distribution: Option<String>,
    architectures: Option<BTreeSet<String>>,
    image_types: Option<BTreeSet<String>>,
    distributions: Option<BTreeSet<String>>,
    timezones: Option<BTreeSet<String>>,
    locales: Option<BTreeSet<String>>,
    keyboards: Option<BTreeSet<String>>,
    port_aliases: Option<BTreeSet<String>>,
    port_protocols: Option<BTreeSet<String>>,
}

impl ReferenceTables {
    /// The table set shipped with the engine.
    pub fn builtin() -> Result<Self, TablesError> {
        let tables: Self = toml::from_str(BUILTIN_TABLES)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Load a table file on top of the built-in set. `.toml` files are read as
    /// TOML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TablesError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, TablesError> {
        let overrides: TableOverrides = toml::from_str(input)?;
        Self::builtin()?.with_overrides(overrides)
    }

    pub fn from_json_str(input: &str) -> Result<Self, TablesError> {
        let overrides: TableOverrides = serde_json::from_str(input)?;
        Self::builtin()?.with_overrides(overrides)
    }

    fn with_overrides(self, o: TableOverrides) -> Result<Self, TablesError> {
        let merged = Self {
            default_architecture: o.default_architecture.unwrap_or(self.default_architecture),
            default_distribution: o.default_distribution.unwrap_or(self.default_distribution),
            architectures: o.architectures.unwrap_or(self.architectures),
            image_types: o.image_types.unwrap_or(self.image_types),
            distributions: o.distributions.unwrap_or(self.distributions),
            timezones: o.timezones.unwrap_or(self.timezones),
            locales: o.locales.unwrap_or(self.locales),
            keyboards: o.keyboards.unwrap_or(self.keyboards),
            port_aliases: o.port_aliases.unwrap_or(self.port_aliases),
            port_protocols: o.port_protocols.unwrap_or(self.port_protocols),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Check the sets the structural gate depends on are usable.
    pub fn validate(&self) -> Result<(), TablesError> {
        if self.architectures.is_empty() {
            return Err(TablesError::Empty("architectures"));
        }
        if self.image_types.is_empty() {
            return Err(TablesError::Empty("image_types"));
        }
        if self.distributions.is_empty() {
            return Err(TablesError::Empty("distributions"));
        }
        if !self.architectures.contains(&self.default_architecture) {
            return Err(TablesError::UnknownDefault {
                field: "default_architecture",
                value: self.default_architecture.clone(),
                table: "architectures",
            });
        }
        if !self.distributions.contains(&self.default_distribution) {
            return Err(TablesError::UnknownDefault {
                field: "default_distribution",
                value: self.default_distribution.clone(),
                table: "distributions",
            });
        }
        Ok(())
    }

    pub fn is_architecture(&self, value: &str) -> bool {
        self.architectures.contains(value)
    }

    pub fn is_image_type(&self, value: &str) -> bool {
        self.image_types.contains(value)
    }

    pub fn is_distribution(&self, value: &str) -> bool {
        self.distributions.contains(value)
    }

    pub fn is_timezone(&self, value: &str) -> bool {
        self.timezones.contains(value)
    }

    pub fn is_locale(&self, value: &str) -> bool {
        self.locales.contains(value)
    }

    pub fn is_keyboard(&self, value: &str) -> bool {
        self.keyboards.contains(value)
    }

    pub fn is_port_alias(&self, value: &str) -> bool {
        self.port_aliases.contains(value)
    }

    pub fn is_port_protocol(&self, value: &str) -> bool {
        self.port_protocols.contains(value)
    }
}
