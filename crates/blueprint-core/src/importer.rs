//! The import pipeline: parse, gate, validate, normalize, classify.

use crate::outcome::ImportResult;
use crate::validators::{self, TokenListField};
use crate::{normalize, structural, ImportError};
use blueprint_schema::{
    parse_document, Diagnostic, FormatHint, ReferenceTables, ValidationOutcome, WizardState,
};
use tracing::{debug, info};

/// Blueprint importer bound to one set of reference tables.
///
/// Holds no per-import state; one instance can serve any number of imports,
/// from any number of threads.
#[derive(Debug, Clone)]
pub struct Importer {
    tables: ReferenceTables,
}

impl Importer {
    pub fn new(tables: ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Import `raw` and classify the result. Never fails: parse and structural
    /// errors become [`ImportResult::Rejected`] with the generic message.
    pub fn import(&self, raw: &str, hint: FormatHint<'_>) -> ImportResult {
        info!("importing blueprint ({} bytes)", raw.len());
        match self.try_import(raw, hint) {
            Ok((state, diagnostics)) => {
                let result = ImportResult::gate(state, diagnostics);
                info!(
                    "blueprint accepted with {} warning(s)",
                    result.diagnostics().len()
                );
                result
            }
            Err(e) => {
                debug!("rejection reason: {e}");
                info!("blueprint rejected");
                ImportResult::rejected()
            }
        }
    }

    /// The pipeline with its failure reason kept. Diagnostics are ordered
    /// structural warnings first, then validators in registry order.
    pub fn try_import(
        &self,
        raw: &str,
        hint: FormatHint<'_>,
    ) -> Result<(WizardState, Vec<Diagnostic>), ImportError> {
        let doc = parse_document(raw, hint)?;
        let structure = structural::check(&doc, &self.tables).map_err(ImportError::Structural)?;
        debug!(
            "structural gate passed for {:?} blueprint '{}'",
            structure.schema, structure.identity.name
        );

        let mut diagnostics = structure.warnings;
        let validated = validators::run_all(&structure.sections, &self.tables).drain_into(&mut diagnostics);
        let state = normalize::assemble(structure.identity, validated, &self.tables);
        Ok((state, diagnostics))
    }

    /// Re-run one token-list validator over a user-reduced list.
    pub fn revalidate(
        &self,
        field: TokenListField,
        tokens: &[String],
    ) -> ValidationOutcome<Vec<String>> {
        let outcome = field.validate(tokens, &self.tables);
        debug!(
            "revalidated {field}: {} kept, {} dropped",
            outcome.value.len(),
            outcome.invalid_tokens().count()
        );
        outcome
    }

    /// [`Importer::revalidate`] addressed by dotted field path. `None` when the
    /// path is not a token-list field.
    pub fn revalidate_path(
        &self,
        path: &str,
        tokens: &[String],
    ) -> Option<ValidationOutcome<Vec<String>>> {
        TokenListField::from_path(path).map(|field| self.revalidate(field, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer() -> Importer {
        Importer::new(ReferenceTables::builtin().unwrap())
    }

    #[test]
    fn parse_errors_reject_without_diagnostics() {
        let result = importer().import("{ not json", FormatHint::Unknown);
        assert!(!result.can_proceed());
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn json_with_byte_order_mark_is_accepted() {
        let result = importer().import(
            "\u{feff}{\"name\":\"bp\",\"distribution\":\"rhel-9\"}",
            FormatHint::Filename("bp.json"),
        );
        assert!(result.can_proceed());
        assert_eq!(result.state().unwrap().name, "bp");
    }

    #[test]
    fn try_import_keeps_the_reason() {
        let err = importer()
            .try_import(r#"{"name":"Blueprint test"}"#, FormatHint::Unknown)
            .unwrap_err();
        match err {
            ImportError::Structural(diags) => assert_eq!(diags[0].field, "distribution"),
            ImportError::Parse(e) => panic!("unexpected parse error: {e}"),
        }
    }

    #[test]
    fn revalidate_by_path() {
        let importer = importer();
        let tokens = vec!["en_US.UTF-8".to_owned(), "xx".to_owned()];
        let outcome = importer
            .revalidate_path("customizations.locale.languages", &tokens)
            .unwrap();
        assert_eq!(outcome.value, vec!["en_US.UTF-8"]);
        assert_eq!(outcome.diagnostics[0].message, "Unknown languages: xx");
        assert!(importer.revalidate_path("name", &tokens).is_none());
    }

    #[test]
    fn importer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Importer>();
    }
}
