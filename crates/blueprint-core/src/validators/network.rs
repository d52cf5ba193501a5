use super::value::table;
use super::TokenListField;
use blueprint_schema::{Firewall, FirewallServices, ReferenceTables, Services, ValidationOutcome};
use serde_json::Value;

pub fn firewall(raw: Option<&Value>, tables: &ReferenceTables) -> ValidationOutcome<Option<Firewall>> {
    let mut diags = Vec::new();
    let Some(section) = table("customizations.firewall", raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let ports = TokenListField::FirewallPorts.validate_raw(section.get("ports"), tables, &mut diags);
    let services = match table(
        "customizations.firewall.services",
        section.get("services"),
        &mut diags,
    ) {
        Some(services) => FirewallServices {
            enabled: TokenListField::FirewallServicesEnabled.validate_raw(
                services.get("enabled"),
                tables,
                &mut diags,
            ),
            disabled: TokenListField::FirewallServicesDisabled.validate_raw(
                services.get("disabled"),
                tables,
                &mut diags,
            ),
        },
        None => FirewallServices::default(),
    };

    ValidationOutcome::new(Some(Firewall { ports, services }), diags)
}

/// systemd units to enable, disable, or mask. Each list is checked on its own.
pub fn services(raw: Option<&Value>, tables: &ReferenceTables) -> ValidationOutcome<Option<Services>> {
    let mut diags = Vec::new();
    let Some(section) = table("customizations.services", raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let mut field = |f: TokenListField, key: &str| f.validate_raw(section.get(key), tables, &mut diags);
    let enabled = field(TokenListField::ServicesEnabled, "enabled");
    let disabled = field(TokenListField::ServicesDisabled, "disabled");
    let masked = field(TokenListField::ServicesMasked, "masked");

    ValidationOutcome::new(
        Some(Services {
            enabled,
            disabled,
            masked,
        }),
        diags,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> ReferenceTables {
        ReferenceTables::builtin().unwrap()
    }

    #[test]
    fn invalid_ports_are_dropped() {
        let outcome = firewall(Some(&json!({"ports": ["invalid-port"]})), &tables());
        assert_eq!(outcome.value.unwrap().ports, Vec::<String>::new());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].message, "Invalid ports: invalid-port");
        assert_eq!(outcome.diagnostics[0].field, "customizations.firewall.ports");
    }

    #[test]
    fn firewall_services_are_checked_per_list() {
        let raw = json!({
            "ports": ["22:tcp", "443:tcp"],
            "services": {"enabled": ["ftp", "bad service"], "disabled": ["telnet", "x y"]}
        });
        let outcome = firewall(Some(&raw), &tables());
        let value = outcome.value.unwrap();
        assert_eq!(value.ports, vec!["22:tcp", "443:tcp"]);
        assert_eq!(value.services.enabled, vec!["ftp"]);
        assert_eq!(value.services.disabled, vec!["telnet"]);
        let fields: Vec<&str> = outcome.diagnostics.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "customizations.firewall.services.enabled",
                "customizations.firewall.services.disabled"
            ]
        );
        assert!(outcome.diagnostics[0].message.starts_with("Invalid firewall services: "));
    }

    #[test]
    fn ports_given_as_string_warn_and_default() {
        let outcome = firewall(Some(&json!({"ports": "22:tcp"})), &tables());
        assert!(outcome.value.unwrap().ports.is_empty());
        assert_eq!(outcome.diagnostics[0].message, "Expected a list, found a string");
    }

    #[test]
    fn services_lists_are_independent() {
        let raw = json!({
            "enabled": ["sshd", "cockpit.socket"],
            "disabled": ["bad unit"],
            "masked": ["rpcbind", 7]
        });
        let outcome = services(Some(&raw), &tables());
        let value = outcome.value.unwrap();
        assert_eq!(value.enabled, vec!["sshd", "cockpit.socket"]);
        assert!(value.disabled.is_empty());
        assert_eq!(value.masked, vec!["rpcbind"]);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert_eq!(outcome.diagnostics[0].message, "Invalid services: bad unit");
        assert_eq!(outcome.diagnostics[1].invalid_tokens, vec!["7"]);
    }
}
