use super::grammar::{is_group_name, is_ssh_key, is_user_name};
use super::value::{list, string, token_text, tokens_outcome};
use blueprint_schema::{Diagnostic, UserAccount, ValidationOutcome};
use serde_json::{Map, Value};

/// User accounts. Users with an invalid name are dropped; a bad key or group
/// only clears that part of the account.
pub fn users(raw: Option<&Value>) -> ValidationOutcome<Option<Vec<UserAccount>>> {
    const FIELD: &str = "customizations.users";
    let mut diags = Vec::new();
    let Some(items) = list(FIELD, raw, &mut diags) else {
        return ValidationOutcome::new(None, diags);
    };

    let mut accounts = Vec::with_capacity(items.len());
    let mut bad_names = Vec::new();
    let mut bad_groups = Vec::new();
    let mut key_diags = Vec::new();

    for item in items {
        let Some(entry) = item.as_object() else {
            bad_names.push(token_text(item));
            continue;
        };
        let name = match entry.get("name") {
            Some(Value::String(name)) if is_user_name(name) => name.clone(),
            Some(other) => {
                bad_names.push(token_text(other));
                continue;
            }
            None => {
                bad_names.push(token_text(item));
                continue;
            }
        };
        accounts.push(account(name, entry, &mut key_diags, &mut bad_groups));
    }

    tokens_outcome(FIELD, "Invalid user names", Vec::new(), bad_names).drain_into(&mut diags);
    diags.append(&mut key_diags);
    tokens_outcome(
        "customizations.users.groups",
        "Invalid user groups",
        Vec::new(),
        bad_groups,
    )
    .drain_into(&mut diags);

    ValidationOutcome::new(Some(accounts), diags)
}

fn account(
    name: String,
    entry: &Map<String, Value>,
    diags: &mut Vec<Diagnostic>,
    bad_groups: &mut Vec<String>,
) -> UserAccount {
    let password = string("customizations.users.password", entry.get("password"), diags)
        .filter(|p| !p.is_empty())
        .map(str::to_owned);

    let ssh_key = match string("customizations.users.ssh_key", entry.get("ssh_key"), diags) {
        Some("") | None => None,
        Some(key) if is_ssh_key(key) => Some(key.to_owned()),
        Some(_) => {
            diags.push(Diagnostic::warning(
                "customizations.users.ssh_key",
                format!("Invalid SSH key for user {name}"),
            ));
            None
        }
    };

    let mut groups = Vec::new();
    for group in list("customizations.users.groups", entry.get("groups"), diags).unwrap_or_default() {
        match group {
            Value::String(g) if is_group_name(g) => groups.push(g.clone()),
            other => bad_groups.push(token_text(other)),
        }
    }

    UserAccount {
        name,
        password,
        ssh_key,
        groups,
    }
}
