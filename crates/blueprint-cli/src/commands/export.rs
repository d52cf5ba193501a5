use super::{format_hint, json_pretty, read_blueprint, ExportTarget, FormatArg, EXIT_SUCCESS};
use blueprint_core::{to_image_request, to_system_config, ImportResult, Importer};
use chrono::Utc;
use std::path::Path;
use tracing::info;

pub fn run(
    importer: &Importer,
    file: &Path,
    to: ExportTarget,
    format: Option<FormatArg>,
    output: Option<&Path>,
) -> Result<u8, String> {
    let raw = read_blueprint(file)?;
    let state = match importer.import(&raw, format_hint(file, format)) {
        ImportResult::Accepted { state, diagnostics } => {
            for d in &diagnostics {
                eprintln!("{d}");
            }
            state
        }
        ImportResult::Rejected { message } => {
            return Err(format!("blueprint rejected: {message}"));
        }
    };

    let rendered = match to {
        ExportTarget::Json => {
            let value = to_image_request(&state, Utc::now()).map_err(|e| e.to_string())?;
            json_pretty(&value)?
        }
        ExportTarget::Config => to_system_config(&state).map_err(|e| e.to_string())?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(EXIT_SUCCESS)
}
