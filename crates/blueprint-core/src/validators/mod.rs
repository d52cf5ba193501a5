//! Semantic validator registry.
//!
//! Each validator takes the raw sub-document of one customization and returns
//! a [`ValidationOutcome`] holding its normalized value and warnings. Validators
//! never see each other's input or output, and [`run_all`] applies them in a
//! fixed order so diagnostic order is deterministic.

pub mod accounts;
pub mod grammar;
pub mod network;
pub mod software;
pub mod storage;
pub mod system;
pub(crate) mod value;

use crate::structural::Sections;
use blueprint_schema::{
    Diagnostic, FileEntry, FilesystemPartition, Firewall, Installer, Kernel, Locale,
    OpenScapProfile, ReferenceTables, Services, Timezone, UserAccount, ValidationOutcome,
};
use serde_json::Value;
use std::fmt;
use tracing::debug;

pub use software::PackageSet;
pub use value::partition_tokens;

/// Validator outputs. `None` means the section was absent or unusable and the
/// normalizer should apply its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedCustomizations {
    pub hostname: Option<String>,
    pub kernel: Option<Kernel>,
    pub timezone: Option<Timezone>,
    pub locale: Option<Locale>,
    pub firewall: Option<Firewall>,
    pub services: Option<Services>,
    pub filesystem: Option<Vec<FilesystemPartition>>,
    pub users: Option<Vec<UserAccount>>,
    pub packages: Option<PackageSet>,
    pub files: Option<Vec<FileEntry>>,
    pub installer: Option<Installer>,
    pub openscap: Option<OpenScapProfile>,
    pub fips: Option<bool>,
}

/// Run every validator over `sections` in registry order.
pub fn run_all(
    sections: &Sections,
    tables: &ReferenceTables,
) -> ValidationOutcome<ValidatedCustomizations> {
    let mut diags = Vec::new();

    macro_rules! step {
        ($name:literal, $call:expr) => {{
            let outcome = $call;
            debug!("validator {}: {} diagnostic(s)", $name, outcome.diagnostics.len());
            outcome.drain_into(&mut diags)
        }};
    }

    let hostname = step!("hostname", system::hostname(sections.hostname.as_ref()));
    let kernel = step!("kernel", system::kernel(sections.kernel.as_ref(), tables));
    let timezone = step!("timezone", system::timezone(sections.timezone.as_ref(), tables));
    let locale = step!("locale", system::locale(sections.locale.as_ref(), tables));
    let firewall = step!("firewall", network::firewall(sections.firewall.as_ref(), tables));
    let services = step!("services", network::services(sections.services.as_ref(), tables));
    let filesystem = step!("filesystem", storage::filesystem(sections.filesystem.as_ref()));
    let users = step!("users", accounts::users(sections.users.as_ref()));
    let packages = step!(
        "packages",
        software::packages(sections.packages.as_ref(), sections.groups.as_ref())
    );
    let files = step!("files", storage::files(sections.files.as_ref()));
    let installer = step!("installer", software::installer(sections.installer.as_ref()));
    let openscap = step!("openscap", software::openscap(sections.openscap.as_ref()));
    let fips = step!("fips", software::fips(sections.fips.as_ref()));
    step!("subscription", software::subscription(sections.subscription.as_ref()));

    ValidationOutcome::new(
        ValidatedCustomizations {
            hostname,
            kernel,
            timezone,
            locale,
            firewall,
            services,
            filesystem,
            users,
            packages,
            files,
            installer,
            openscap,
            fips,
        },
        diags,
    )
}

/// List-typed fields whose elements are validated one by one and can be
/// re-validated after the user removes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenListField {
    NtpServers,
    Languages,
    KernelAppend,
    FirewallPorts,
    FirewallServicesEnabled,
    FirewallServicesDisabled,
    ServicesEnabled,
    ServicesDisabled,
    ServicesMasked,
}

impl TokenListField {
    pub const ALL: [Self; 9] = [
        Self::NtpServers,
        Self::Languages,
        Self::KernelAppend,
        Self::FirewallPorts,
        Self::FirewallServicesEnabled,
        Self::FirewallServicesDisabled,
        Self::ServicesEnabled,
        Self::ServicesDisabled,
        Self::ServicesMasked,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::NtpServers => "customizations.timezone.ntpservers",
            Self::Languages => "customizations.locale.languages",
            Self::KernelAppend => "customizations.kernel.append",
            Self::FirewallPorts => "customizations.firewall.ports",
            Self::FirewallServicesEnabled => "customizations.firewall.services.enabled",
            Self::FirewallServicesDisabled => "customizations.firewall.services.disabled",
            Self::ServicesEnabled => "customizations.services.enabled",
            Self::ServicesDisabled => "customizations.services.disabled",
            Self::ServicesMasked => "customizations.services.masked",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.path() == path)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NtpServers => "Invalid NTP servers",
            Self::Languages => "Unknown languages",
            Self::KernelAppend => "Invalid kernel arguments",
            Self::FirewallPorts => "Invalid ports",
            Self::FirewallServicesEnabled | Self::FirewallServicesDisabled => {
                "Invalid firewall services"
            }
            Self::ServicesEnabled | Self::ServicesDisabled | Self::ServicesMasked => {
                "Invalid services"
            }
        }
    }

    pub fn accepts(self, token: &str, tables: &ReferenceTables) -> bool {
        match self {
            Self::NtpServers => grammar::is_ntp_server(token),
            Self::Languages => tables.is_locale(token),
            Self::KernelAppend => grammar::is_kernel_argument(token),
            Self::FirewallPorts => grammar::is_port(token, tables),
            Self::FirewallServicesEnabled
            | Self::FirewallServicesDisabled
            | Self::ServicesEnabled
            | Self::ServicesDisabled
            | Self::ServicesMasked => grammar::is_service_name(token),
        }
    }

    /// Validate a token list already in string form. Re-running this over the
    /// returned value yields no diagnostics.
    pub fn validate(
        self,
        tokens: &[String],
        tables: &ReferenceTables,
    ) -> ValidationOutcome<Vec<String>> {
        let (valid, invalid) =
            partition_tokens(tokens.iter().map(String::as_str), |t| self.accepts(t, tables));
        value::tokens_outcome(self.path(), self.label(), valid, invalid)
    }

    /// Validate the raw document value of this field, pushing warnings into
    /// `diags`. Kernel arguments may also be given as one whitespace-separated
    /// string.
    pub(crate) fn validate_raw(
        self,
        raw: Option<&Value>,
        tables: &ReferenceTables,
        diags: &mut Vec<Diagnostic>,
    ) -> Vec<String> {
        if let (Self::KernelAppend, Some(Value::String(line))) = (self, raw) {
            let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
            return self.validate(&tokens, tables).drain_into(diags);
        }
        match value::list(self.path(), raw, diags) {
            Some(items) => value::token_list(self.path(), self.label(), items, |t| {
                self.accepts(t, tables)
            })
            .drain_into(diags),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for TokenListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
