use blueprint_core::{to_image_request, to_system_config, ImportResult, Importer, TokenListField};
use blueprint_schema::{DocumentFormat, FormatHint, ReferenceTables, Severity, WizardState, WizardStep};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn importer() -> Importer {
    Importer::new(ReferenceTables::builtin().unwrap())
}

fn accepted(result: ImportResult) -> (WizardState, Vec<blueprint_schema::Diagnostic>) {
    match result {
        ImportResult::Accepted { state, diagnostics } => (state, diagnostics),
        ImportResult::Rejected { message } => panic!("expected acceptance, got: {message}"),
    }
}

fn messages(diagnostics: &[blueprint_schema::Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.message.as_str()).collect()
}

const RICH_JSON: &str = r#"{
  "name": "web-server",
  "description": "Base web image",
  "distribution": "rhel-9",
  "image_requests": [
    {
      "architecture": "aarch64",
      "image_type": "aws",
      "upload_request": {"type": "aws", "options": {"share_with_accounts": ["123456789012"]}}
    },
    {"architecture": "x86_64", "image_type": "guest-image"}
  ],
  "customizations": {
    "packages": ["httpd", "mod_ssl", "@core"],
    "users": [{
      "name": "admin",
      "password": "$6$abc",
      "ssh_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIJ admin@example.com",
      "groups": ["wheel"]
    }],
    "services": {"enabled": ["httpd"], "masked": ["rpcbind"]},
    "firewall": {"ports": ["80:tcp", "443:tcp", "8000-8080:tcp"], "services": {"enabled": ["https"]}},
    "kernel": {"name": "kernel-rt", "append": ["nosmt=force"]},
    "locale": {"languages": ["en_US.UTF-8"], "keyboard": "us"},
    "timezone": {"timezone": "Europe/Prague", "ntpservers": ["0.pool.ntp.org"]},
    "hostname": "web01",
    "fips": {"enabled": true},
    "filesystem": [
      {"mountpoint": "/", "min_size": 10737418240},
      {"mountpoint": "/var", "min_size": "2 GiB"}
    ],
    "files": [{"path": "/etc/motd", "data": "welcome", "mode": "0644", "user": "root", "group": "root"}],
    "installer": {"unattended": true, "sudo-nopasswd": ["admin", "%wheel"]},
    "openscap": {"profile_id": "xccdf_org.ssgproject.content_profile_cis", "profile_name": "CIS"}
  }
}"#;

const RICH_CONFIG: &str = r#"
name = "edge-box"
description = "Config blueprint"
version = "1.0.0"
distro = "rhel-9"

[[packages]]
name = "tmux"
version = "*"

[[groups]]
name = "core"

[customizations]
hostname = "edge01"
fips = true

[customizations.kernel]
append = "quiet nosmt=force"

[customizations.timezone]
timezone = "UTC"
ntpservers = ["time.example.com"]

[customizations.locale]
languages = ["en_US.UTF-8"]
keyboard = "us"

[customizations.services]
enabled = ["sshd"]

[customizations.firewall]
ports = ["22:tcp"]

[[customizations.user]]
name = "admin"
groups = ["wheel"]

[[customizations.sshkey]]
user = "admin"
key = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5 admin@edge"

[[customizations.filesystem]]
mountpoint = "/var"
minsize = 2147483648
"#;

#[test]
fn name_only_document_is_rejected() {
    let result = importer().import(r#"{"name":"Blueprint test"}"#, FormatHint::Unknown);
    assert!(!result.can_proceed());
    match result {
        ImportResult::Rejected { message } => assert!(message.contains("not compatible")),
        ImportResult::Accepted { .. } => panic!("expected rejection"),
    }
}

#[test]
fn subscription_is_accepted_and_discarded() {
    let input = json!({
        "name": "registered",
        "distribution": "rhel-9",
        "customizations": {
            "subscription": {
                "organization": 123_456,
                "activation-key": "secret",
                "server-url": "subscription.example.com",
                "base-url": "https://cdn.example.com",
                "insights": true,
                "rhc": true
            }
        }
    });
    let (state, diagnostics) = accepted(importer().import(&input.to_string(), FormatHint::Unknown));
    assert!(diagnostics.is_empty());
    let serialized = serde_json::to_string(&state).unwrap();
    assert!(!serialized.contains("subscription"));
    assert!(!serialized.contains("secret"));
}

#[test]
fn unsupported_architecture_is_rejected() {
    let input = json!({
        "name": "bp",
        "distribution": "rhel-9",
        "image_requests": [{"architecture": "aaaaa", "image_type": "guest-image"}],
        "customizations": {"hostname": "fine"}
    });
    let result = importer().import(&input.to_string(), FormatHint::Unknown);
    assert!(!result.can_proceed());
    assert!(result.state().is_none());
}

#[test]
fn config_timezone_problems_are_warnings() {
    let input = r#"
name = "tz"
distro = "rhel-9"

[customizations.timezone]
timezone = "invalid-timezone"
ntpservers = ["0.pool.ntp.org", "invalid-ntp-server"]
"#;
    let (state, diagnostics) = accepted(importer().import(input, FormatHint::Filename("tz.toml")));
    let msgs = messages(&diagnostics);
    assert!(msgs.contains(&"Unknown timezone"));
    assert!(msgs.contains(&"Invalid NTP servers: invalid-ntp-server"));
    assert_eq!(state.customizations.timezone.ntpservers, vec!["0.pool.ntp.org"]);
    assert_eq!(state.customizations.timezone.timezone, "");
    assert!(diagnostics.iter().all(|d| d.step() == WizardStep::Timezone));
}

#[test]
fn config_invalid_port_is_dropped() {
    let input = r#"
name = "fw"
distro = "rhel-9"

[customizations.firewall]
ports = ["invalid-port"]
"#;
    let (state, diagnostics) = accepted(importer().import(input, FormatHint::Unknown));
    assert_eq!(messages(&diagnostics), vec!["Invalid ports: invalid-port"]);
    assert_eq!(diagnostics[0].invalid_tokens, vec!["invalid-port"]);
    assert!(state.customizations.firewall.ports.is_empty());
}

#[test]
fn missing_distribution_is_rejected_for_both_schemas() {
    let importer = importer();
    assert!(!importer
        .import(r#"{"name":"bp","customizations":{}}"#, FormatHint::Unknown)
        .can_proceed());
    assert!(!importer
        .import("name = \"bp\"\n[[packages]]\nname = \"vim\"\n", FormatHint::Unknown)
        .can_proceed());
    assert!(!importer
        .import(r#"{"distribution":"rhel-9"}"#, FormatHint::Unknown)
        .can_proceed());
}

#[test]
fn unsupported_image_type_is_rejected() {
    let input = json!({
        "name": "bp",
        "distribution": "rhel-9",
        "image_requests": [{"architecture": "x86_64", "image_type": "floppy"}]
    });
    assert!(!importer()
        .import(&input.to_string(), FormatHint::Unknown)
        .can_proceed());
}

#[test]
fn customization_problems_never_reject() {
    let input = json!({
        "name": "messy",
        "distribution": "rhel-9",
        "customizations": {
            "hostname": "Not_Valid",
            "firewall": {"ports": ["22:tcp", "bogus"]},
            "users": [{"name": "-bad"}, {"name": "good", "ssh_key": "nope"}],
            "locale": {"keyboard": "klingon"},
            "kernel": {"append": "quiet $(reboot)"},
            "services": {"enabled": "sshd"}
        }
    });
    let (state, diagnostics) = accepted(importer().import(&input.to_string(), FormatHint::Unknown));
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
    assert_eq!(
        messages(&diagnostics),
        vec![
            "Invalid hostname",
            "Invalid kernel arguments: $(reboot)",
            "Unknown keyboard",
            "Invalid ports: bogus",
            "Expected a list, found a string",
            "Invalid user names: -bad",
            "Invalid SSH key for user good",
        ]
    );
    assert_eq!(state.customizations.firewall.ports, vec!["22:tcp"]);
    assert_eq!(state.customizations.kernel.append, vec!["quiet"]);
    assert_eq!(state.customizations.users.len(), 1);
    assert!(state.customizations.services.enabled.is_empty());
}

#[test]
fn duplicate_mountpoints_warn_exactly_once() {
    let input = json!({
        "name": "fs",
        "distribution": "rhel-9",
        "customizations": {
            "filesystem": [
                {"mountpoint": "/var", "min_size": "1 GiB"},
                {"mountpoint": "/var", "min_size": "2 GiB"},
                {"mountpoint": "/home", "min_size": "1 GiB"},
                {"mountpoint": "/home", "min_size": "1 GiB"}
            ]
        }
    });
    let (state, diagnostics) = accepted(importer().import(&input.to_string(), FormatHint::Unknown));
    assert_eq!(state.customizations.filesystem.len(), 4);
    let on_filesystem: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.field == "customizations.filesystem")
        .collect();
    assert_eq!(on_filesystem.len(), 1);
    assert_eq!(on_filesystem[0].message, "Duplicate mountpoints: /var, /home");
    assert!(on_filesystem[0].invalid_tokens.is_empty());
}

#[test]
fn token_lists_lose_exactly_their_invalid_tokens() {
    let importer = importer();
    let input = json!({
        "name": "tokens",
        "distribution": "rhel-9",
        "customizations": {
            "timezone": {"ntpservers": ["a.example.com", "nope", "10.0.0.1", "nope"]},
            "services": {"disabled": ["cups", "bad unit", "avahi-daemon"]}
        }
    });
    let (state, diagnostics) = accepted(importer.import(&input.to_string(), FormatHint::Unknown));

    let ntp = &state.customizations.timezone.ntpservers;
    assert_eq!(ntp, &vec!["a.example.com".to_owned(), "10.0.0.1".to_owned()]);
    let ntp_diag = diagnostics
        .iter()
        .find(|d| d.field == TokenListField::NtpServers.path())
        .unwrap();
    assert_eq!(ntp_diag.invalid_tokens, vec!["nope", "nope"]);

    for (field, kept) in [
        (TokenListField::NtpServers, ntp.clone()),
        (
            TokenListField::ServicesDisabled,
            state.customizations.services.disabled.clone(),
        ),
    ] {
        let again = importer.revalidate(field, &kept);
        assert!(again.is_clean(), "{field} should revalidate cleanly");
        assert_eq!(again.value, kept);
    }
}

#[test]
fn json_export_round_trips() {
    let importer = importer();
    let (state, diagnostics) = accepted(importer.import(RICH_JSON, FormatHint::Unknown));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(state.architecture, "aarch64");
    assert_eq!(state.image_targets.len(), 2);
    assert_eq!(state.customizations.groups, vec!["core"]);
    assert!(state.customizations.fips);

    let exported_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let exported = to_image_request(&state, exported_at).unwrap().to_string();
    let (again, diagnostics) = accepted(importer.import(&exported, FormatHint::Declared(DocumentFormat::Json)));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(again, state);
}

#[test]
fn config_export_round_trips() {
    let importer = importer();
    let (state, diagnostics) = accepted(importer.import(RICH_CONFIG, FormatHint::Filename("edge.toml")));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(state.architecture, "x86_64");
    assert_eq!(
        state.customizations.users[0].ssh_key.as_deref(),
        Some("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5 admin@edge")
    );
    assert_eq!(state.customizations.filesystem[0].size_label(), "2 GiB");
    assert_eq!(state.customizations.kernel.append, vec!["quiet", "nosmt=force"]);

    let exported = to_system_config(&state).unwrap();
    let (again, diagnostics) = accepted(importer.import(&exported, FormatHint::Filename("edge.toml")));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(again, state);
}

#[test]
fn json_state_round_trips_through_config_without_targets() {
    let importer = importer();
    let (mut state, _) = accepted(importer.import(RICH_JSON, FormatHint::Unknown));
    state.image_targets.clear();
    state.architecture = "x86_64".into();
    let exported = to_system_config(&state).unwrap();
    let (again, diagnostics) = accepted(importer.import(&exported, FormatHint::Declared(DocumentFormat::Config)));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(again, state);
}

#[test]
fn injected_tables_change_membership() {
    let tables = ReferenceTables::from_toml_str(r#"timezones = ["Antarctica/Troll"]"#).unwrap();
    let importer = Importer::new(tables);
    let input = json!({
        "name": "tz",
        "distribution": "rhel-9",
        "customizations": {"timezone": {"timezone": "Europe/Prague"}}
    });
    let (_, diagnostics) = accepted(importer.import(&input.to_string(), FormatHint::Unknown));
    assert_eq!(messages(&diagnostics), vec!["Unknown timezone"]);
}

#[test]
fn identical_input_gives_identical_output() {
    let importer = importer();
    let first = importer.import(RICH_CONFIG, FormatHint::Unknown);
    let second = importer.import(RICH_CONFIG, FormatHint::Unknown);
    assert_eq!(first, second);
}
