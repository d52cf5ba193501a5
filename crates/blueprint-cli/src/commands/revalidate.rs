use super::{json_pretty, EXIT_SUCCESS};
use blueprint_core::{Importer, TokenListField};

pub fn run(importer: &Importer, field: &str, tokens: &[String], json: bool) -> Result<u8, String> {
    let Some(outcome) = importer.revalidate_path(field, tokens) else {
        let known: Vec<&str> = TokenListField::ALL.iter().map(|f| f.path()).collect();
        return Err(format!(
            "'{field}' is not a token-list field; expected one of: {}",
            known.join(", ")
        ));
    };

    if json {
        let report = serde_json::json!({
            "field": field,
            "value": outcome.value,
            "diagnostics": outcome.diagnostics,
        });
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("kept:    {}", outcome.value.join(" "));
    let dropped: Vec<&str> = outcome.invalid_tokens().collect();
    if dropped.is_empty() {
        println!("dropped: (none)");
    } else {
        println!("dropped: {}", dropped.join(" "));
        for d in &outcome.diagnostics {
            println!("{d}");
        }
    }
    Ok(EXIT_SUCCESS)
}
