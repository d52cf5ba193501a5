//! Assembly of validator outputs into a complete [`WizardState`].

use crate::structural::Identity;
use crate::validators::{PackageSet, ValidatedCustomizations};
use blueprint_schema::{Architecture, Customizations, ReferenceTables, WizardState};

/// Build the wizard state. Total: every section a validator could not use
/// takes its default, and no diagnostics are produced here.
pub fn assemble(
    identity: Identity,
    validated: ValidatedCustomizations,
    tables: &ReferenceTables,
) -> WizardState {
    let architecture = identity.image_targets.first().map_or_else(
        || Architecture::new(tables.default_architecture.clone()),
        |target| target.architecture.clone(),
    );

    let PackageSet { packages, groups } = validated.packages.unwrap_or_default();
    let customizations = Customizations {
        packages,
        groups,
        users: validated.users.unwrap_or_default(),
        services: validated.services.unwrap_or_default(),
        firewall: validated.firewall.unwrap_or_default(),
        kernel: validated.kernel.unwrap_or_default(),
        locale: validated.locale.unwrap_or_default(),
        timezone: validated.timezone.unwrap_or_default(),
        hostname: validated.hostname.unwrap_or_default(),
        fips: validated.fips.unwrap_or(false),
        filesystem: validated.filesystem.unwrap_or_default(),
        files: validated.files.unwrap_or_default(),
        installer: validated.installer.unwrap_or_default(),
        openscap: validated.openscap,
    };

    WizardState {
        name: identity.name,
        description: identity.description,
        distribution: identity.distribution,
        architecture,
        image_targets: identity.image_targets,
        customizations,
    }
}
