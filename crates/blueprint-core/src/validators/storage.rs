//! Filesystem partitions and custom files.

use super::grammar::{is_absolute_path, parse_size, ParsedSize};
use super::value::{list, scalar_text, token_text, tokens_outcome};
use blueprint_schema::{Diagnostic, FileEntry, FilesystemPartition, SizeUnit, ValidationOutcome};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const UNSUPPORTED_UNIT_MESSAGE: &str =
    "The Wizard only supports KiB, MiB, or GiB. Adjust or keep the default value.";

const ROOT_DEFAULT_GIB: u64 = 10;
const DEFAULT_GIB: u64 = 1;

pub fn filesystem(raw: Option<&Value>) -> ValidationOutcome<Option<Vec<FilesystemPartition>>> {
    const FIELD: &str = "customizations.filesystem";
    let mut diags = Vec::new();
    let Some(items) = list(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let mut partitions = Vec::with_capacity(items.len());
    let mut bad_mountpoints = Vec::new();
    let mut bad_sizes = false;

    for item in items {
        let Some(entry) = item.as_object() else {
            bad_mountpoints.push(token_text(item));
            continue;
        };
        let mountpoint = match entry.get("mountpoint") {
            Some(Value::String(m)) if is_absolute_path(m) => m.clone(),
            Some(other) => {
                bad_mountpoints.push(token_text(other));
                continue;
            }
            None => {
                bad_mountpoints.push(token_text(item));
                continue;
            }
        };

        let size = entry.get("min_size").map_or(ParsedSize::Invalid, parse_size);
        let partition = match size {
            ParsedSize::Exact(min_size, unit) => FilesystemPartition {
                mountpoint,
                min_size,
                unit,
            },
            ParsedSize::OtherUnit(bytes) => {
                bad_sizes = true;
                FilesystemPartition::from_bytes(mountpoint, bytes)
            }
            ParsedSize::Invalid => {
                bad_sizes = true;
                let gib = if mountpoint == "/" {
                    ROOT_DEFAULT_GIB
                } else {
                    DEFAULT_GIB
                };
                FilesystemPartition {
                    mountpoint,
                    min_size: gib,
                    unit: SizeUnit::GiB,
                }
            }
        };
        partitions.push(partition);
    }

    if !bad_mountpoints.is_empty() {
        tokens_outcome(
            "customizations.filesystem.mountpoint",
            "Invalid mountpoints",
            Vec::new(),
            bad_mountpoints,
        )
        .drain_into(&mut diags);
    }
    if bad_sizes {
        diags.push(Diagnostic::warning(
            "customizations.filesystem.min_size",
            UNSUPPORTED_UNIT_MESSAGE,
        ));
    }

    let duplicates = duplicate_mountpoints(&partitions);
    if !duplicates.is_empty() {
        diags.push(Diagnostic::warning(
            FIELD,
            format!("Duplicate mountpoints: {}", duplicates.join(", ")),
        ));
    }

    ValidationOutcome::new(Some(partitions), diags)
}

/// Mountpoints used more than once, in order of first appearance.
fn duplicate_mountpoints(partitions: &[FilesystemPartition]) -> Vec<&str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for p in partitions {
        *counts.entry(p.mountpoint.as_str()).or_default() += 1;
    }
    let mut seen = Vec::new();
    for p in partitions {
        let m = p.mountpoint.as_str();
        if counts[m] > 1 && !seen.contains(&m) {
            seen.push(m);
        }
    }
    seen
}

pub fn files(raw: Option<&Value>) -> ValidationOutcome<Option<Vec<FileEntry>>> {
    const FIELD: &str = "customizations.files";
    let mut diags = Vec::new();
    let Some(items) = list(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let mut entries = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();
    for item in items {
        match item.as_object().and_then(file_entry) {
            Some(entry) => entries.push(entry),
            None => {
                let path = item.get("path").unwrap_or(item);
                invalid.push(token_text(path));
            }
        }
    }

    let outcome = tokens_outcome(FIELD, "Invalid file paths", Vec::new(), invalid);
    diags.extend(outcome.diagnostics);
    ValidationOutcome::new(Some(entries), diags)
}

fn file_entry(entry: &Map<String, Value>) -> Option<FileEntry> {
    let path = entry.get("path")?.as_str().filter(|p| is_absolute_path(p))?;
    let data = match entry.get("data") {
        None | Some(Value::Null) => None,
        Some(Value::String(data)) => Some(data.clone()),
        Some(_) => return None,
    };
    let ensure_parents = match entry.get("ensure_parents") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return None,
    };
    Some(FileEntry {
        path: path.to_owned(),
        data,
        mode: scalar_text(entry.get("mode")).ok()?,
        user: scalar_text(entry.get("user")).ok()?,
        group: scalar_text(entry.get("group")).ok()?,
        ensure_parents,
    })
}
