//! Document model, diagnostics, and wizard state for blueprint import.
//!
//! This crate defines the schema layer: parsing raw JSON or TOML text into a
//! format-erased [`BlueprintDocument`], the [`Diagnostic`] and [`FieldPath`]
//! types every validator reports with, the normalized [`WizardState`] the
//! wizard consumes, and the injectable [`ReferenceTables`] (architectures,
//! image types, timezones, locales, keyboards) that validators check against.

pub mod diagnostic;
pub mod document;
pub mod state;
pub mod tables;
pub mod types;

pub use diagnostic::{Diagnostic, Severity, ValidationOutcome, WizardStep};
pub use document::{parse_document, BlueprintDocument, DocumentFormat, FormatHint, ParseError};
pub use state::{
    Customizations, FileEntry, FilesystemPartition, Firewall, FirewallServices, ImageTarget,
    Installer, Kernel, Locale, OpenScapProfile, Services, SizeUnit, Timezone, UploadTarget,
    UserAccount, WizardState,
};
pub use tables::{ReferenceTables, TablesError};
pub use types::{Architecture, DistributionId, FieldPath, ImageType};
