//! CLI subprocess integration tests.
//!
//! These tests invoke the `blueprint` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::Command;

fn blueprint_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_blueprint"));
    cmd.env_remove("BLUEPRINT_TABLES");
    cmd.env_remove("BLUEPRINT_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const CONFIG_WITH_BAD_PORT: &str = r#"
name = "fw"
distro = "rhel-9"

[customizations]
hostname = "fw01"

[customizations.firewall]
ports = ["22:tcp", "invalid-port"]
"#;

#[test]
fn cli_version_exits_zero() {
    let output = blueprint_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "blueprint --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("blueprint"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let output = blueprint_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["import", "revalidate", "export", "tables"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_import_accepts_with_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "fw.toml", CONFIG_WITH_BAD_PORT);

    let output = blueprint_bin()
        .args(["import", &file.to_string_lossy()])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accepted"));
    assert!(stdout.contains("[firewall]"));
    assert!(stdout.contains("Invalid ports: invalid-port"));
}

#[test]
fn cli_import_summary_lists_administrators_and_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "bp.json",
        r#"{
  "name": "ops",
  "distribution": "rhel-9",
  "customizations": {
    "users": [{"name": "admin", "groups": ["wheel"]}, {"name": "guest"}],
    "filesystem": [{"mountpoint": "/", "min_size": 2147483648.0}]
  }
}"#,
    );
    let output = blueprint_bin()
        .args(["import", &file.to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("administrators: admin"), "stdout: {stdout}");
    assert!(stdout.contains("2147483648 bytes minimum"), "stdout: {stdout}");
    assert!(stdout.contains("no warnings"), "stdout: {stdout}");
}

#[test]
fn cli_import_json_output_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "fw.toml", CONFIG_WITH_BAD_PORT);

    let output = blueprint_bin()
        .args(["--json", "import", &file.to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "accepted");
    assert_eq!(json["state"]["customizations"]["firewall"]["ports"], serde_json::json!(["22:tcp"]));
    assert_eq!(json["diagnostics"][0]["field"], "customizations.firewall.ports");
    assert_eq!(json["diagnostics"][0]["severity"], "warning");
    assert_eq!(json["diagnostics"][0]["invalid_tokens"], serde_json::json!(["invalid-port"]));
}

#[test]
fn cli_import_rejected_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "bp.json", r#"{"name":"Blueprint test"}"#);

    let output = blueprint_bin()
        .args(["--json", "import", &file.to_string_lossy()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "rejected");
    assert!(json["message"].as_str().unwrap().contains("not compatible"));
}

#[test]
fn cli_import_missing_file_fails() {
    let output = blueprint_bin()
        .args(["import", "/nonexistent/blueprint.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "stderr: {stderr}");
}

#[test]
fn cli_declared_format_overrides_extension() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "bp.txt", CONFIG_WITH_BAD_PORT);
    let output = blueprint_bin()
        .args(["import", "--format", "config", &file.to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn cli_revalidate_reports_dropped_tokens() {
    let output = blueprint_bin()
        .args([
            "--json",
            "revalidate",
            "customizations.timezone.ntpservers",
            "0.pool.ntp.org",
            "invalid-ntp-server",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["value"], serde_json::json!(["0.pool.ntp.org"]));
    assert_eq!(
        json["diagnostics"][0]["message"],
        "Invalid NTP servers: invalid-ntp-server"
    );
}

#[test]
fn cli_revalidate_unknown_field_fails() {
    let output = blueprint_bin()
        .args(["revalidate", "customizations.hostname", "x"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a token-list field"));
}

#[test]
fn cli_export_config_reimports_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(
        dir.path(),
        "bp.json",
        r#"{
  "name": "web",
  "distribution": "rhel-9",
  "image_requests": [{"architecture": "x86_64", "image_type": "guest-image"}],
  "customizations": {
    "packages": ["httpd", "@core"],
    "timezone": {"timezone": "UTC"},
    "filesystem": [{"mountpoint": "/var", "min_size": "4 GiB"}]
  }
}"#,
    );
    let exported = dir.path().join("web.toml");

    let output = blueprint_bin()
        .args([
            "export",
            &input.to_string_lossy(),
            "--to",
            "config",
            "--output",
            &exported.to_string_lossy(),
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let toml_text = std::fs::read_to_string(&exported).unwrap();
    assert!(toml_text.contains("distro = \"rhel-9\""));
    assert!(toml_text.contains("minsize = \"4 GiB\""));

    let output = blueprint_bin()
        .args(["--json", "import", &exported.to_string_lossy()])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["outcome"], "accepted");
    assert_eq!(json["diagnostics"], serde_json::json!([]));
    assert_eq!(json["state"]["customizations"]["groups"], serde_json::json!(["core"]));
}

#[test]
fn cli_export_refuses_rejected_blueprint() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "bp.json", r#"{"name":"only a name"}"#);
    let output = blueprint_bin()
        .args(["export", &input.to_string_lossy(), "--to", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_export_json_has_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "bp.toml", CONFIG_WITH_BAD_PORT);
    let output = blueprint_bin()
        .args(["export", &input.to_string_lossy(), "--to", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["metadata"]["exported_at"].is_string());
    assert_eq!(json["distribution"], "rhel-9");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid ports: invalid-port"));
}

#[test]
fn cli_tables_override_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let tables = write_file(dir.path(), "tables.toml", "timezones = [\"UTC\"]\n");
    let output = blueprint_bin()
        .args(["--json", "--tables", &tables.to_string_lossy(), "tables"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["timezones"], serde_json::json!(["UTC"]));
    assert_eq!(json["default_architecture"], "x86_64");
}

#[test]
fn cli_tables_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let tables = write_file(dir.path(), "tables.json", r#"{"keyboards": ["us"]}"#);
    let output = blueprint_bin()
        .env("BLUEPRINT_TABLES", &tables)
        .args(["--json", "tables"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["keyboards"], serde_json::json!(["us"]));
}

#[test]
fn cli_bad_tables_exit_three() {
    let dir = tempfile::tempdir().unwrap();
    let tables = write_file(dir.path(), "tables.toml", "architectures = []\n");
    let output = blueprint_bin()
        .args(["--tables", &tables.to_string_lossy(), "tables"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_completions_bash() {
    let output = blueprint_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.contains("_blueprint()"), "script: {script}");
    assert!(script.contains("revalidate"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let output = blueprint_bin()
        .args(["man-pages", &dir.path().to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("blueprint.1").exists());
    assert!(dir.path().join("blueprint-import.1").exists());
}
