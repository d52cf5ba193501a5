//! Validation diagnostic types.

use crate::types::FieldPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic. Fixed per field by the validator that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document as a whole is unusable.
    Fatal,
    /// One field was cleared, trimmed, or defaulted; the import still succeeds.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => f.write_str("fatal"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A single validation finding, attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub field: FieldPath,
    pub severity: Severity,
    pub message: String,
    /// Elements dropped from a list-typed field, verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_tokens: Vec<String>,
}

impl Diagnostic {
    pub fn fatal(field: impl Into<FieldPath>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            severity: Severity::Fatal,
            message: message.into(),
            invalid_tokens: Vec::new(),
        }
    }

    pub fn warning(field: impl Into<FieldPath>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            severity: Severity::Warning,
            message: message.into(),
            invalid_tokens: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.invalid_tokens = tokens;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// The wizard step that renders this diagnostic.
    pub fn step(&self) -> WizardStep {
        WizardStep::for_field(&self.field)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.field, self.message)
    }
}

/// Uniform return shape of every semantic validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> ValidationOutcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Every token dropped by this outcome, across all of its diagnostics.
    pub fn invalid_tokens(&self) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .flat_map(|d| d.invalid_tokens.iter().map(String::as_str))
    }

    /// Move the diagnostics into `sink` and return the value.
    pub fn drain_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

/// Wizard steps, used to route diagnostics to the step that owns the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    ImageOutput,
    Oscap,
    FileSystem,
    Packages,
    Users,
    Timezone,
    Locale,
    Hostname,
    Kernel,
    Firewall,
    Services,
    Details,
    Review,
}

impl WizardStep {
    const OWNERS: &'static [(&'static str, WizardStep)] = &[
        ("image_requests", WizardStep::ImageOutput),
        ("distribution", WizardStep::ImageOutput),
        ("customizations.installer", WizardStep::ImageOutput),
        ("customizations.openscap", WizardStep::Oscap),
        ("customizations.fips", WizardStep::Oscap),
        ("customizations.filesystem", WizardStep::FileSystem),
        ("customizations.packages", WizardStep::Packages),
        ("customizations.groups", WizardStep::Packages),
        ("customizations.users", WizardStep::Users),
        ("customizations.timezone", WizardStep::Timezone),
        ("customizations.locale", WizardStep::Locale),
        ("customizations.hostname", WizardStep::Hostname),
        ("customizations.kernel", WizardStep::Kernel),
        ("customizations.firewall", WizardStep::Firewall),
        ("customizations.services", WizardStep::Services),
        ("name", WizardStep::Details),
        ("description", WizardStep::Details),
    ];

    /// Step owning `field`; fields without a dedicated step land on review.
    pub fn for_field(field: &FieldPath) -> Self {
        Self::OWNERS
            .iter()
            .find(|(prefix, _)| field.is_within(prefix))
            .map_or(Self::Review, |(_, step)| *step)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageOutput => "image-output",
            Self::Oscap => "oscap",
            Self::FileSystem => "file-system",
            Self::Packages => "packages",
            Self::Users => "users",
            Self::Timezone => "timezone",
            Self::Locale => "locale",
            Self::Hostname => "hostname",
            Self::Kernel => "kernel",
            Self::Firewall => "firewall",
            Self::Services => "services",
            Self::Details => "details",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
