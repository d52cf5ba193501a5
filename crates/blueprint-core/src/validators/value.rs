//! Kind checks on raw values, reporting mismatches as warnings.

use blueprint_schema::document::kind_name;
use blueprint_schema::{Diagnostic, ValidationOutcome};
use serde_json::{Map, Value};

pub(crate) fn table<'a>(
    field: &str,
    raw: Option<&'a Value>,
    diags: &mut Vec<Diagnostic>,
) -> Option<&'a Map<String, Value>> {
    match raw? {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            diags.push(mismatch(field, "a table", other));
            None
        }
    }
}

pub(crate) fn string<'a>(
    field: &str,
    raw: Option<&'a Value>,
    diags: &mut Vec<Diagnostic>,
) -> Option<&'a str> {
    match raw? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            diags.push(mismatch(field, "a string", other));
            None
        }
    }
}

pub(crate) fn list<'a>(
    field: &str,
    raw: Option<&'a Value>,
    diags: &mut Vec<Diagnostic>,
) -> Option<&'a [Value]> {
    match raw? {
        Value::Array(items) => Some(items),
        Value::Null => None,
        other => {
            diags.push(mismatch(field, "a list", other));
            None
        }
    }
}

pub(crate) fn boolean(field: &str, raw: Option<&Value>, diags: &mut Vec<Diagnostic>) -> Option<bool> {
    match raw? {
        Value::Bool(b) => Some(*b),
        Value::Null => None,
        other => {
            diags.push(mismatch(field, "a boolean", other));
            None
        }
    }
}

/// A string, or a number rendered as text (modes, uids).
pub(crate) fn scalar_text(raw: Option<&Value>) -> Result<Option<String>, ()> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(()),
    }
}

/// Verbatim form of a list element for `invalid_tokens`.
pub(crate) fn token_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn mismatch(field: &str, expected: &str, found: &Value) -> Diagnostic {
    Diagnostic::warning(
        field,
        format!("Expected {expected}, found {}", kind_name(found)),
    )
}

/// Split tokens into kept and dropped, preserving order and duplicates.
pub fn partition_tokens<'a, I>(tokens: I, accept: impl Fn(&str) -> bool) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for token in tokens {
        if accept(token) {
            valid.push(token.to_owned());
        } else {
            invalid.push(token.to_owned());
        }
    }
    (valid, invalid)
}

/// Validate a token list. Non-string elements are always invalid.
pub(crate) fn token_list(
    field: &str,
    label: &str,
    items: &[Value],
    accept: impl Fn(&str) -> bool,
) -> ValidationOutcome<Vec<String>> {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for item in items {
        match item {
            Value::String(s) if accept(s) => valid.push(s.clone()),
            other => invalid.push(token_text(other)),
        }
    }
    tokens_outcome(field, label, valid, invalid)
}

pub(crate) fn tokens_outcome(
    field: &str,
    label: &str,
    valid: Vec<String>,
    invalid: Vec<String>,
) -> ValidationOutcome<Vec<String>> {
    if invalid.is_empty() {
        return ValidationOutcome::clean(valid);
    }
    let message = format!("{label}: {}", invalid.join(", "));
    ValidationOutcome::new(
        valid,
        vec![Diagnostic::warning(field, message).with_tokens(invalid)],
    )
}
