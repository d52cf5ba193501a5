//! Packages, installer options, compliance profile and FIPS mode.

use super::grammar::{is_rpm_name, is_sudo_entry};
use super::value::{boolean, list, string, table, token_list, token_text, tokens_outcome};
use blueprint_schema::document::kind_name;
use blueprint_schema::{Diagnostic, Installer, OpenScapProfile, ValidationOutcome};
use serde_json::Value;
use tracing::debug;

/// Package and package group names, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    pub packages: Vec<String>,
    pub groups: Vec<String>,
}

/// `packages` holds plain names, `@group` names, or `{name, version}` tables;
/// `groups` holds names or `{name}` tables.
pub fn packages(
    raw_packages: Option<&Value>,
    raw_groups: Option<&Value>,
) -> ValidationOutcome<Option<PackageSet>> {
    let mut diags = Vec::new();
    let package_items = list("customizations.packages", raw_packages, &mut diags);
    let group_items = list("customizations.groups", raw_groups, &mut diags);
    if package_items.is_none() && group_items.is_none() {
        return ValidationOutcome::new(None, diags);
    }

    let mut set = PackageSet::default();
    let mut bad_packages = Vec::new();
    for item in package_items.unwrap_or_default() {
        match entry_name(item) {
            Some(name) => match name.strip_prefix('@') {
                Some(group) if is_rpm_name(group) => push_unique(&mut set.groups, group),
                None if is_rpm_name(name) => push_unique(&mut set.packages, name),
                _ => bad_packages.push(name.to_owned()),
            },
            None => bad_packages.push(token_text(item)),
        }
    }

    let mut bad_groups = Vec::new();
    for item in group_items.unwrap_or_default() {
        match entry_name(item) {
            Some(name) if is_rpm_name(name.trim_start_matches('@')) => {
                push_unique(&mut set.groups, name.trim_start_matches('@'));
            }
            Some(name) => bad_groups.push(name.to_owned()),
            None => bad_groups.push(token_text(item)),
        }
    }

    tokens_outcome("customizations.packages", "Invalid packages", Vec::new(), bad_packages)
        .drain_into(&mut diags);
    tokens_outcome("customizations.groups", "Invalid package groups", Vec::new(), bad_groups)
        .drain_into(&mut diags);

    ValidationOutcome::new(Some(set), diags)
}

fn entry_name(item: &Value) -> Option<&str> {
    match item {
        Value::String(name) => Some(name),
        Value::Object(entry) => entry.get("name").and_then(Value::as_str),
        _ => None,
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_owned());
    }
}

pub fn installer(raw: Option<&Value>) -> ValidationOutcome<Option<Installer>> {
    const SUDO_FIELD: &str = "customizations.installer.sudo-nopasswd";
    let mut diags = Vec::new();
    let Some(section) = table("customizations.installer", raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let unattended = boolean(
        "customizations.installer.unattended",
        section.get("unattended"),
        &mut diags,
    )
    .unwrap_or(false);
    let sudo_nopasswd = match list(SUDO_FIELD, section.get("sudo-nopasswd"), &mut diags) {
        Some(items) => {
            token_list(SUDO_FIELD, "Invalid sudo entries", items, is_sudo_entry).drain_into(&mut diags)
        }
        None => Vec::new(),
    };

    ValidationOutcome::new(
        Some(Installer {
            unattended,
            sudo_nopasswd,
        }),
        diags,
    )
}

pub fn openscap(raw: Option<&Value>) -> ValidationOutcome<Option<OpenScapProfile>> {
    let mut diags = Vec::new();
    let Some(section) = table("customizations.openscap", raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let profile_id = string(
        "customizations.openscap.profile_id",
        section.get("profile_id"),
        &mut diags,
    )
    .map(str::trim)
    .filter(|id| !id.is_empty());
    let Some(profile_id) = profile_id else {
        diags.push(Diagnostic::warning(
            "customizations.openscap.profile_id",
            "Missing OpenSCAP profile id",
        ));
        return ValidationOutcome::new(None, diags);
    };

    let mut text = |key: &str| {
        string(&format!("customizations.openscap.{key}"), section.get(key), &mut diags)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let profile_name = text("profile_name");
    let profile_description = text("profile_description");

    ValidationOutcome::new(
        Some(OpenScapProfile {
            profile_id: profile_id.to_owned(),
            profile_name,
            profile_description,
        }),
        diags,
    )
}

/// FIPS mode, given as a bare boolean or as `{enabled = bool}`.
pub fn fips(raw: Option<&Value>) -> ValidationOutcome<Option<bool>> {
    const FIELD: &str = "customizations.fips";
    let mut diags = Vec::new();
    let value = match raw {
        None | Some(Value::Null) => None,
        Some(Value::Bool(enabled)) => Some(*enabled),
        Some(Value::Object(section)) => {
            boolean("customizations.fips.enabled", section.get("enabled"), &mut diags)
        }
        Some(other) => {
            diags.push(Diagnostic::warning(
                FIELD,
                format!("Expected a boolean or a table, found {}", kind_name(other)),
            ));
            None
        }
    };
    ValidationOutcome::new(value, diags)
}

/// Registration data is never imported, whatever its shape.
pub fn subscription(raw: Option<&Value>) -> ValidationOutcome<()> {
    if raw.is_some() {
        debug!("discarding subscription section");
    }
    ValidationOutcome::clean(())
}
