//! Root-shape gate: schema selection, identity fields, and image targets.
//!
//! This is the only stage that emits fatal diagnostics. On success it hands the
//! validators a [`Sections`] value in which both schemas have been mapped onto
//! the same shape, so nothing downstream needs to know which schema was used.

use blueprint_schema::document::kind_name;
use blueprint_schema::{
    Architecture, BlueprintDocument, Diagnostic, DistributionId, DocumentFormat, ImageTarget,
    ImageType, ReferenceTables, UploadTarget,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Which of the two blueprint schemas a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Hosted export: `distribution`, optional `image_requests`.
    ImageRequest,
    /// System configuration: `distro`, repeated `packages`/`groups` blocks.
    SystemConfig,
}

const IMAGE_REQUEST_KEYS: &[&str] = &["image_requests", "distribution", "metadata"];
const SYSTEM_CONFIG_KEYS: &[&str] = &["distro", "packages", "groups", "modules", "version"];

impl SchemaKind {
    /// Select the schema from the root keys present, falling back to the
    /// document's syntax when neither set of keys appears.
    pub fn detect(doc: &BlueprintDocument) -> Self {
        if IMAGE_REQUEST_KEYS.iter().any(|k| doc.contains_key(k)) {
            Self::ImageRequest
        } else if SYSTEM_CONFIG_KEYS.iter().any(|k| doc.contains_key(k)) {
            Self::SystemConfig
        } else {
            match doc.format() {
                DocumentFormat::Json => Self::ImageRequest,
                DocumentFormat::Config => Self::SystemConfig,
            }
        }
    }

    pub fn distribution_key(self) -> &'static str {
        match self {
            Self::ImageRequest => "distribution",
            Self::SystemConfig => "distro",
        }
    }
}

/// Checked identity of an accepted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub description: String,
    pub distribution: DistributionId,
    pub image_targets: Vec<ImageTarget>,
}

/// Raw customization sub-documents, mapped onto the image-request shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub hostname: Option<Value>,
    pub kernel: Option<Value>,
    pub timezone: Option<Value>,
    pub locale: Option<Value>,
    pub firewall: Option<Value>,
    pub services: Option<Value>,
    pub filesystem: Option<Value>,
    pub users: Option<Value>,
    pub packages: Option<Value>,
    pub groups: Option<Value>,
    pub files: Option<Value>,
    pub installer: Option<Value>,
    pub openscap: Option<Value>,
    pub fips: Option<Value>,
    pub subscription: Option<Value>,
}

/// A document that passed the gate.
#[derive(Debug, Clone)]
pub struct Structure {
    pub schema: SchemaKind,
    pub identity: Identity,
    pub sections: Sections,
    pub warnings: Vec<Diagnostic>,
}

/// Run the structural gate. `Err` carries every fatal diagnostic found.
pub fn check(
    doc: &BlueprintDocument,
    tables: &ReferenceTables,
) -> Result<Structure, Vec<Diagnostic>> {
    let schema = SchemaKind::detect(doc);
    debug!("detected {schema:?} schema in {} document", doc.format());

    let mut fatal = Vec::new();
    let mut warnings = Vec::new();

    let name = required_string(doc, "name", &mut fatal);
    let dist_key = schema.distribution_key();
    let distribution = required_string(doc, dist_key, &mut fatal);

    let image_targets = match schema {
        SchemaKind::ImageRequest => {
            image_targets(doc.get("image_requests"), tables, &mut fatal, &mut warnings)
        }
        SchemaKind::SystemConfig => Vec::new(),
    };

    let customizations = match doc.get("customizations") {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            fatal.push(Diagnostic::fatal(
                "customizations",
                format!("Expected a table, found {}", kind_name(other)),
            ));
            None
        }
    };

    if !fatal.is_empty() {
        return Err(fatal);
    }

    let description = match doc.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            warnings.push(Diagnostic::warning(
                "description",
                format!("Expected a string, found {}", kind_name(other)),
            ));
            String::new()
        }
    };

    let distribution = if tables.is_distribution(&distribution) {
        DistributionId::new(distribution)
    } else {
        warnings.push(Diagnostic::warning(
            dist_key,
            format!(
                "Unknown distribution {distribution}, using {}",
                tables.default_distribution
            ),
        ));
        DistributionId::new(tables.default_distribution.clone())
    };

    let empty = Map::new();
    let customizations = customizations.unwrap_or(&empty);
    let sections = match schema {
        SchemaKind::ImageRequest => image_request_sections(doc, customizations),
        SchemaKind::SystemConfig => system_config_sections(doc, customizations),
    };

    Ok(Structure {
        schema,
        identity: Identity {
            name,
            description,
            distribution,
            image_targets,
        },
        sections,
        warnings,
    })
}

fn required_string(doc: &BlueprintDocument, key: &str, fatal: &mut Vec<Diagnostic>) -> String {
    match doc.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Some(Value::String(_)) => {
            fatal.push(Diagnostic::fatal(key, format!("{key} must not be empty")));
            String::new()
        }
        Some(other) => {
            fatal.push(Diagnostic::fatal(
                key,
                format!("{key} must be a string, found {}", kind_name(other)),
            ));
            String::new()
        }
        None => {
            fatal.push(Diagnostic::fatal(key, format!("missing required field {key}")));
            String::new()
        }
    }
}

fn image_targets(
    raw: Option<&Value>,
    tables: &ReferenceTables,
    fatal: &mut Vec<Diagnostic>,
    warnings: &mut Vec<Diagnostic>,
) -> Vec<ImageTarget> {
    const FIELD: &str = "image_requests";
    let items = match raw {
        None => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            fatal.push(Diagnostic::fatal(
                FIELD,
                format!("Expected a list, found {}", kind_name(other)),
            ));
            return Vec::new();
        }
    };

    let mut targets = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(entry) = item.as_object() else {
            fatal.push(Diagnostic::fatal(
                FIELD,
                format!("image request {idx} must be a table"),
            ));
            continue;
        };

        let architecture = entry.get("architecture").and_then(Value::as_str);
        let image_type = entry.get("image_type").and_then(Value::as_str);
        let mut usable = true;

        match architecture {
            Some(arch) if tables.is_architecture(arch) => {}
            Some(arch) => {
                fatal.push(Diagnostic::fatal(
                    FIELD,
                    format!("Unsupported architecture: {arch}"),
                ));
                usable = false;
            }
            None => {
                fatal.push(Diagnostic::fatal(
                    FIELD,
                    format!("image request {idx} is missing architecture"),
                ));
                usable = false;
            }
        }
        match image_type {
            Some(kind) if tables.is_image_type(kind) => {}
            Some(kind) => {
                fatal.push(Diagnostic::fatal(
                    FIELD,
                    format!("Unsupported image type: {kind}"),
                ));
                usable = false;
            }
            None => {
                fatal.push(Diagnostic::fatal(
                    FIELD,
                    format!("image request {idx} is missing image_type"),
                ));
                usable = false;
            }
        }

        if let (true, Some(arch), Some(kind)) = (usable, architecture, image_type) {
            targets.push(ImageTarget {
                architecture: Architecture::new(arch),
                image_type: ImageType::new(kind),
                upload: upload_target(entry.get("upload_request"), warnings),
            });
        }
    }
    targets
}

fn upload_target(raw: Option<&Value>, warnings: &mut Vec<Diagnostic>) -> Option<UploadTarget> {
    const FIELD: &str = "image_requests.upload_request";
    let entry = match raw? {
        Value::Object(entry) => entry,
        other => {
            warnings.push(Diagnostic::warning(
                FIELD,
                format!("Expected a table, found {}", kind_name(other)),
            ));
            return None;
        }
    };
    let Some(kind) = entry.get("type").and_then(Value::as_str) else {
        warnings.push(Diagnostic::warning(FIELD, "Upload request is missing its type"));
        return None;
    };
    let options = match entry.get("options") {
        None | Some(Value::Null) => Default::default(),
        Some(Value::Object(options)) => options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Some(other) => {
            warnings.push(Diagnostic::warning(
                FIELD,
                format!("Expected upload options to be a table, found {}", kind_name(other)),
            ));
            Default::default()
        }
    };
    Some(UploadTarget {
        kind: kind.to_owned(),
        options,
    })
}

fn image_request_sections(doc: &BlueprintDocument, c: &Map<String, Value>) -> Sections {
    let get = |key: &str| c.get(key).cloned();
    Sections {
        hostname: get("hostname"),
        kernel: get("kernel"),
        timezone: get("timezone"),
        locale: get("locale"),
        firewall: get("firewall"),
        services: get("services"),
        filesystem: get("filesystem"),
        users: get("users"),
        packages: get("packages"),
        groups: None,
        files: get("files"),
        installer: get("installer"),
        openscap: get("openscap"),
        fips: get("fips"),
        subscription: get("subscription").or_else(|| doc.get("subscription").cloned()),
    }
}

fn system_config_sections(doc: &BlueprintDocument, c: &Map<String, Value>) -> Sections {
    let get = |key: &str| c.get(key).cloned();
    Sections {
        hostname: get("hostname"),
        kernel: get("kernel"),
        timezone: get("timezone"),
        locale: get("locale"),
        firewall: get("firewall"),
        services: get("services"),
        filesystem: c.get("filesystem").map(|fs| rename_in_entries(fs, "minsize", "min_size")),
        users: merge_config_users(c.get("user"), c.get("sshkey")),
        packages: doc.get("packages").cloned(),
        groups: doc.get("groups").cloned(),
        files: get("files"),
        installer: get("installer"),
        openscap: get("openscap"),
        fips: get("fips"),
        subscription: get("subscription").or_else(|| doc.get("subscription").cloned()),
    }
}

/// Rename `from` to `to` in every table of a list, leaving `to` alone when
/// both are present.
fn rename_in_entries(raw: &Value, from: &str, to: &str) -> Value {
    match raw {
        Value::Array(items) => Value::Array(items.iter().map(|v| rename_key(v, from, to)).collect()),
        other => other.clone(),
    }
}

fn rename_key(item: &Value, from: &str, to: &str) -> Value {
    let Value::Object(entry) = item else {
        return item.clone();
    };
    let mut entry = entry.clone();
    if !entry.contains_key(to) {
        if let Some(v) = entry.remove(from) {
            entry.insert(to.to_owned(), v);
        }
    }
    Value::Object(entry)
}

/// Map `[[customizations.user]]` and `[[customizations.sshkey]]` onto the
/// image-request `users` list. A key is attached to the user of the same name
/// when that user has none; otherwise it becomes a key-only user.
fn merge_config_users(users: Option<&Value>, keys: Option<&Value>) -> Option<Value> {
    if users.is_none() && keys.is_none() {
        return None;
    }
    let mut merged: Vec<Value> = match users {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(|u| rename_key(u, "key", "ssh_key")).collect(),
        Some(other) => return Some(other.clone()),
    };

    match keys {
        None => {}
        Some(Value::Array(items)) => {
            for item in items {
                let entry = rename_key(&rename_key(item, "user", "name"), "key", "ssh_key");
                let name = entry.get("name").and_then(Value::as_str).map(str::to_owned);
                let existing = name.as_deref().and_then(|name| {
                    merged
                        .iter()
                        .position(|u| u.get("name").and_then(Value::as_str) == Some(name))
                });
                let Some(idx) = existing else {
                    merged.push(entry);
                    continue;
                };
                match (merged[idx].as_object_mut(), entry.get("ssh_key")) {
                    (Some(user), Some(key)) if !user.contains_key("ssh_key") => {
                        user.insert("ssh_key".to_owned(), key.clone());
                    }
                    _ => debug!("user {name:?} already has an ssh key; skipping sshkey entry"),
                }
            }
        }
        Some(other) => {
            debug!("customizations.sshkey is {}, ignoring", kind_name(other));
        }
    }

    Some(Value::Array(merged))
}
