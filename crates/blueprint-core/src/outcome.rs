//! The import result handed to the wizard.

use blueprint_schema::{Diagnostic, WizardState, WizardStep};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shown for every rejected document; the specific reason is only logged.
pub const INCOMPATIBLE_MESSAGE: &str =
    "The selected blueprint is not compatible with the blueprints format and cannot be imported.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ImportResult {
    Rejected {
        message: String,
    },
    Accepted {
        state: WizardState,
        diagnostics: Vec<Diagnostic>,
    },
}

impl ImportResult {
    pub(crate) fn rejected() -> Self {
        Self::Rejected {
            message: INCOMPATIBLE_MESSAGE.to_owned(),
        }
    }

    /// Classify a fully assembled state: any fatal diagnostic rejects it.
    pub(crate) fn gate(state: WizardState, diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.iter().any(Diagnostic::is_fatal) {
            Self::rejected()
        } else {
            Self::Accepted { state, diagnostics }
        }
    }

    /// Whether the wizard may be opened with the imported state.
    pub fn can_proceed(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn state(&self) -> Option<&WizardState> {
        match self {
            Self::Accepted { state, .. } => Some(state),
            Self::Rejected { .. } => None,
        }
    }

    pub fn into_state(self) -> Option<WizardState> {
        match self {
            Self::Accepted { state, .. } => Some(state),
            Self::Rejected { .. } => None,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Accepted { diagnostics, .. } => diagnostics,
            Self::Rejected { .. } => &[],
        }
    }

    pub fn diagnostics_for_step(&self, step: WizardStep) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().iter().filter(move |d| d.step() == step)
    }

    /// Warnings grouped by the step that renders them, in wizard order.
    pub fn diagnostics_by_step(&self) -> BTreeMap<WizardStep, Vec<&Diagnostic>> {
        let mut grouped: BTreeMap<WizardStep, Vec<&Diagnostic>> = BTreeMap::new();
        for d in self.diagnostics() {
            grouped.entry(d.step()).or_default().push(d);
        }
        grouped
    }
}
