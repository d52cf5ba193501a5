use super::{json_pretty, EXIT_SUCCESS};
use blueprint_schema::ReferenceTables;

pub fn run(tables: &ReferenceTables, json: bool) -> Result<u8, String> {
    if json {
        println!("{}", json_pretty(tables)?);
    } else {
        let rendered = toml::to_string_pretty(tables)
            .map_err(|e| format!("TOML serialization failed: {e}"))?;
        println!("{}", rendered.trim_end());
    }
    Ok(EXIT_SUCCESS)
}
