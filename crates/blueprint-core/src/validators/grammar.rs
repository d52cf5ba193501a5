//! Token grammars shared by the validators.

use blueprint_schema::{FilesystemPartition, ReferenceTables, SizeUnit};
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::LazyLock;

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]|[a-z0-9][a-z0-9-]{0,61}[a-z0-9])(\.([a-z0-9]|[a-z0-9][a-z0-9-]{0,61}[a-z0-9]))*$")
        .expect("valid hostname regex")
});

static PACKAGE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9._+-]*[a-z0-9+])?$").expect("valid package regex")
});

static RPM_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._+-]*$").expect("valid rpm name regex")
});

static KERNEL_ARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z0-9_.,:/=+@"'-]+$"#).expect("valid kernel argument regex")
});

static SERVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9:_.@\\-]*[A-Za-z0-9])?$").expect("valid service regex")
});

static PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<from>\d{1,5})(?:-(?P<to>\d{1,5}))?|(?P<alias>[a-z][a-z0-9-]*)):(?P<proto>[a-z]+)$")
        .expect("valid port regex")
});

static USER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.][A-Za-z0-9_.-]{0,31}$").expect("valid user name regex")
});

static GROUP_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid group name regex"));

static SSH_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(ssh-(rsa|dss|ed25519)|ecdsa-sha2-nistp(256|384|521)|sk-(ssh-ed25519|ecdsa-sha2-nistp256)@openssh\.com) [A-Za-z0-9+/]+={0,3}( .*)?$",
    )
    .expect("valid ssh key regex")
});

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d+(?:\.\d+)?)\s*(?P<unit>[A-Za-z]+)?$").expect("valid size regex")
});

/// Lowercase RFC-1123 labels, 64 characters at most.
pub fn is_hostname(value: &str) -> bool {
    value.len() <= 64 && HOSTNAME_RE.is_match(value)
}

/// An IP address, or a hostname with at least two labels.
pub fn is_ntp_server(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok() || (value.contains('.') && is_hostname(value))
}

pub fn is_package_name(value: &str) -> bool {
    value.len() <= 64 && PACKAGE_NAME_RE.is_match(value)
}

/// Installable package or group name; case is significant.
pub fn is_rpm_name(value: &str) -> bool {
    value.len() <= 256 && RPM_NAME_RE.is_match(value)
}

pub fn is_kernel_argument(value: &str) -> bool {
    KERNEL_ARG_RE.is_match(value)
}

/// systemd unit or firewalld service name.
pub fn is_service_name(value: &str) -> bool {
    value.len() <= 256 && SERVICE_RE.is_match(value)
}

/// `<port>[-<port>]:<proto>` or `<alias>:<proto>`.
pub fn is_port(value: &str, tables: &ReferenceTables) -> bool {
    let Some(caps) = PORT_RE.captures(value) else {
        return false;
    };
    if !tables.is_port_protocol(&caps["proto"]) {
        return false;
    }
    if let Some(alias) = caps.name("alias") {
        return tables.is_port_alias(alias.as_str());
    }
    let port = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
    match (port("from"), port("to")) {
        (Some(from), None) => (1..=65535).contains(&from),
        (Some(from), Some(to)) => (1..=65535).contains(&from) && (from..=65535).contains(&to),
        _ => false,
    }
}

/// Account names: no leading dash, not purely numeric.
pub fn is_user_name(value: &str) -> bool {
    USER_NAME_RE.is_match(value)
        && !value.chars().all(|c| c.is_ascii_digit())
        && value != "."
        && value != ".."
}

pub fn is_group_name(value: &str) -> bool {
    GROUP_NAME_RE.is_match(value)
}

pub fn is_ssh_key(value: &str) -> bool {
    SSH_KEY_RE.is_match(value.trim())
}

/// A user name, or `%group` for group-wide sudo rules.
pub fn is_sudo_entry(value: &str) -> bool {
    match value.strip_prefix('%') {
        Some(group) => is_group_name(group),
        None => is_user_name(value),
    }
}

/// Absolute and canonical: no empty, `.` or `..` segments, no trailing slash.
pub fn is_absolute_path(value: &str) -> bool {
    if value == "/" {
        return true;
    }
    let Some(rest) = value.strip_prefix('/') else {
        return false;
    };
    !value.chars().any(char::is_whitespace)
        && rest
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// How a raw minimum size maps onto the units the wizard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedSize {
    /// Expressible exactly in KiB, MiB, or GiB.
    Exact(u64, SizeUnit),
    /// Well-formed, but in another unit or not a whole KiB.
    OtherUnit(u64),
    /// Missing, zero, negative, or unreadable.
    Invalid,
}

const DECIMAL_UNITS: &[(&str, f64)] = &[
    ("B", 1.0),
    ("kB", 1e3),
    ("KB", 1e3),
    ("MB", 1e6),
    ("GB", 1e9),
    ("TB", 1e12),
    ("KiB", 1024.0),
    ("MiB", 1_048_576.0),
    ("GiB", 1_073_741_824.0),
    ("TiB", 1_099_511_627_776.0),
];

/// Parse a minimum size given as integer bytes or as `"<n> <unit>"`.
pub fn parse_size(raw: &Value) -> ParsedSize {
    match raw {
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(bytes), _) => classify_bytes(bytes),
            (None, Some(f)) if f.fract() == 0.0 && f > 0.0 && f < u64::MAX as f64 => {
                classify_bytes(f as u64)
            }
            _ => ParsedSize::Invalid,
        },
        Value::String(s) => parse_size_str(s.trim()),
        _ => ParsedSize::Invalid,
    }
}

fn classify_bytes(bytes: u64) -> ParsedSize {
    if bytes == 0 {
        return ParsedSize::Invalid;
    }
    if bytes % SizeUnit::KiB.bytes() == 0 {
        let p = FilesystemPartition::from_bytes("", bytes);
        ParsedSize::Exact(p.min_size, p.unit)
    } else {
        ParsedSize::OtherUnit(bytes)
    }
}

fn parse_size_str(s: &str) -> ParsedSize {
    let Some(caps) = SIZE_RE.captures(s) else {
        return ParsedSize::Invalid;
    };
    let num = &caps["num"];
    let Some(unit) = caps.name("unit").map(|m| m.as_str()) else {
        return num.parse::<u64>().map_or(ParsedSize::Invalid, classify_bytes);
    };

    if let (Ok(unit), Ok(count)) = (unit.parse::<SizeUnit>(), num.parse::<u64>()) {
        return if count == 0 {
            ParsedSize::Invalid
        } else {
            ParsedSize::Exact(count, unit)
        };
    }

    let Some((_, factor)) = DECIMAL_UNITS.iter().find(|(name, _)| *name == unit) else {
        return ParsedSize::Invalid;
    };
    let Ok(count) = num.parse::<f64>() else {
        return ParsedSize::Invalid;
    };
    let bytes = (count * factor).ceil();
    if bytes < 1.0 || bytes >= u64::MAX as f64 {
        return ParsedSize::Invalid;
    }
    ParsedSize::OtherUnit(bytes as u64)
}
