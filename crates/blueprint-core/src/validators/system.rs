use super::grammar::{is_hostname, is_package_name};
use super::value::{string, table};
use super::TokenListField;
use blueprint_schema::{Diagnostic, Kernel, Locale, ReferenceTables, Timezone, ValidationOutcome};
use serde_json::Value;

pub fn hostname(raw: Option<&Value>) -> ValidationOutcome<Option<String>> {
    const FIELD: &str = "customizations.hostname";
    let mut diags = Vec::new();
    let value = match string(FIELD, raw, &mut diags) {
        Some("") | None => None,
        Some(name) if is_hostname(name) => Some(name.to_owned()),
        Some(_) => {
            diags.push(Diagnostic::warning(FIELD, "Invalid hostname"));
            None
        }
    };
    ValidationOutcome::new(value, diags)
}

pub fn timezone(raw: Option<&Value>, tables: &ReferenceTables) -> ValidationOutcome<Option<Timezone>> {
    const FIELD: &str = "customizations.timezone";
    let mut diags = Vec::new();
    let Some(section) = table(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let zone = match string("customizations.timezone.timezone", section.get("timezone"), &mut diags) {
        Some("") | None => String::new(),
        Some(zone) if tables.is_timezone(zone) => zone.to_owned(),
        Some(_) => {
            diags.push(Diagnostic::warning(
                "customizations.timezone.timezone",
                "Unknown timezone",
            ));
            String::new()
        }
    };
    let ntpservers =
        TokenListField::NtpServers.validate_raw(section.get("ntpservers"), tables, &mut diags);

    ValidationOutcome::new(
        Some(Timezone {
            timezone: zone,
            ntpservers,
        }),
        diags,
    )
}

pub fn locale(raw: Option<&Value>, tables: &ReferenceTables) -> ValidationOutcome<Option<Locale>> {
    const FIELD: &str = "customizations.locale";
    let mut diags = Vec::new();
    let Some(section) = table(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let languages =
        TokenListField::Languages.validate_raw(section.get("languages"), tables, &mut diags);
    let keyboard = match string("customizations.locale.keyboard", section.get("keyboard"), &mut diags) {
        Some("") | None => String::new(),
        Some(layout) if tables.is_keyboard(layout) => layout.to_owned(),
        Some(_) => {
            diags.push(Diagnostic::warning(
                "customizations.locale.keyboard",
                "Unknown keyboard",
            ));
            String::new()
        }
    };

    ValidationOutcome::new(
        Some(Locale {
            languages,
            keyboard,
        }),
        diags,
    )
}

pub fn kernel(raw: Option<&Value>, tables: &ReferenceTables) -> ValidationOutcome<Option<Kernel>> {
    const FIELD: &str = "customizations.kernel";
    let mut diags = Vec::new();
    let Some(section) = table(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let name = match string("customizations.kernel.name", section.get("name"), &mut diags) {
        Some("") | None => String::new(),
        Some(name) if is_package_name(name) => name.to_owned(),
        Some(_) => {
            diags.push(Diagnostic::warning(
                "customizations.kernel.name",
                "Invalid format",
            ));
            String::new()
        }
    };
    let append = TokenListField::KernelAppend.validate_raw(section.get("append"), tables, &mut diags);

    ValidationOutcome::new(Some(Kernel { name, append }), diags)
}
