use super::{
    colorize_severity, format_hint, json_pretty, read_blueprint, FormatArg, EXIT_REJECTED,
    EXIT_SUCCESS,
};
use blueprint_core::{ImportResult, Importer};
use blueprint_schema::{FilesystemPartition, WizardState};
use console::Style;
use std::path::Path;

pub fn run(
    importer: &Importer,
    file: &Path,
    format: Option<FormatArg>,
    json: bool,
) -> Result<u8, String> {
    let raw = read_blueprint(file)?;
    let result = importer.import(&raw, format_hint(file, format));
    let code = if result.can_proceed() {
        EXIT_SUCCESS
    } else {
        EXIT_REJECTED
    };

    if json {
        println!("{}", json_pretty(&result)?);
        return Ok(code);
    }

    match &result {
        ImportResult::Rejected { message } => {
            println!("{} {message}", Style::new().red().bold().apply_to("✗ rejected:"));
        }
        ImportResult::Accepted { state, diagnostics } => {
            println!(
                "{} {}",
                Style::new().green().apply_to("✓ accepted:"),
                state.name
            );
            print_state(state);
            if diagnostics.is_empty() {
                println!("no warnings");
            } else {
                println!("{} warning(s):", diagnostics.len());
                for (step, diags) in result.diagnostics_by_step() {
                    println!("  [{step}]");
                    for d in diags {
                        println!(
                            "    {} {}: {}",
                            colorize_severity(d.severity),
                            d.field,
                            d.message
                        );
                    }
                }
            }
        }
    }
    Ok(code)
}

fn print_state(state: &WizardState) {
    let c = &state.customizations;
    println!("distribution:  {}", state.distribution);
    println!("architecture:  {}", state.architecture);
    let targets: Vec<String> = state
        .image_targets
        .iter()
        .map(|t| format!("{}/{}", t.architecture, t.image_type))
        .collect();
    println!("targets:       {}", display_list(&targets));
    println!("packages:      {}", c.packages.len());
    println!("groups:        {}", c.groups.len());
    println!("users:         {}", c.users.len());
    let admins = administrators(state);
    if !admins.is_empty() {
        println!("administrators: {}", admins.join(", "));
    }
    println!(
        "filesystem:    {} ({} bytes minimum)",
        c.filesystem.len(),
        minimum_bytes(state)
    );
    if !c.hostname.is_empty() {
        println!("hostname:      {}", c.hostname);
    }
    if !c.timezone.timezone.is_empty() {
        println!("timezone:      {}", c.timezone.timezone);
    }
    if c.fips {
        println!("fips:          enabled");
    }
}

fn administrators(state: &WizardState) -> Vec<&str> {
    state
        .customizations
        .users
        .iter()
        .filter(|u| u.is_administrator())
        .map(|u| u.name.as_str())
        .collect()
}

fn minimum_bytes(state: &WizardState) -> u64 {
    state
        .customizations
        .filesystem
        .iter()
        .map(FilesystemPartition::size_in_bytes)
        .fold(0, u64::saturating_add)
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_owned()
    } else {
        items.join(", ")
    }
}
