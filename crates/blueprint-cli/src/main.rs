mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{ExportTarget, FormatArg, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_REJECTED};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "blueprint",
    version,
    about = "Validate, normalize, and convert image blueprints for import"
)]
struct Cli {
    /// Reference table file (TOML or JSON) layered over the built-in tables.
    /// Falls back to $BLUEPRINT_TABLES.
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a blueprint and report the normalized state and warnings.
    Import {
        /// Path to a JSON or TOML blueprint.
        file: PathBuf,
        /// Input format; inferred from the file name or content when omitted.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Re-validate a token list for one field, as after removing tokens in the wizard.
    Revalidate {
        /// Dotted field path, e.g. customizations.firewall.ports.
        field: String,
        /// Tokens to check.
        tokens: Vec<String>,
    },
    /// Import a blueprint and write the normalized result in either schema.
    Export {
        /// Path to a JSON or TOML blueprint.
        file: PathBuf,
        /// Output schema.
        #[arg(long, value_enum)]
        to: ExportTarget,
        /// Input format; inferred from the file name or content when omitted.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective reference tables.
    Tables,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BLUEPRINT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let tables_path = cli
        .tables
        .or_else(|| std::env::var_os("BLUEPRINT_TABLES").map(PathBuf::from));
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Import { file, format } => {
            commands::load_importer(tables_path.as_deref())
                .and_then(|importer| commands::import::run(&importer, &file, format, json_output))
        }
        Commands::Revalidate { field, tokens } => commands::load_importer(tables_path.as_deref())
            .and_then(|importer| commands::revalidate::run(&importer, &field, &tokens, json_output)),
        Commands::Export {
            file,
            to,
            format,
            output,
        } => commands::load_importer(tables_path.as_deref()).and_then(|importer| {
            commands::export::run(&importer, &file, to, format, output.as_deref())
        }),
        Commands::Tables => commands::load_importer(tables_path.as_deref())
            .and_then(|importer| commands::tables::run(importer.tables(), json_output)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("tables error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("blueprint rejected") {
                EXIT_REJECTED
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
