use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheetlift_core::{run, validate, RunOptions, SheetliftResult, ValidateOptions};
use tracing_subscriber::EnvFilter;

mod output;

use output::OutputMode;

const LOG_ENV: &str = "SHEETLIFT_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "sheetlift",
    version = env!("SHEETLIFT_VERSION"),
    about = "Turns legacy spreadsheets into idempotent upserts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a config file without reading any workbook.
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_delimiter = ',')]
        entities: Vec<String>,
    },
    /// Normalize the configured workbooks and emit upserts.
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long, value_delimiter = ',')]
        entities: Vec<String>,
        /// Read these workbooks instead of each entity's source.path.
        #[arg(long = "input", value_name = "PATH")]
        inputs: Vec<PathBuf>,
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,
        #[arg(short, long)]
        verbose: bool,
        /// Print the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> SheetliftResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { config, entities } => {
            init_logging(OutputMode::Default);
            let config_path = resolve_path(config)?;
            let options = ValidateOptions { entities };
            validate(&config_path, options)?;
            println!(
                "config {} is valid; run it with 'sheetlift run -c {}'",
                config_path.display(),
                config_path.display()
            );
            Ok(())
        }
        Command::Run {
            config,
            run_id,
            entities,
            inputs,
            quiet,
            verbose,
            json,
        } => {
            let mode = if quiet {
                OutputMode::Quiet
            } else if verbose {
                OutputMode::Verbose
            } else {
                OutputMode::Default
            };
            init_logging(mode);
            let config_path = resolve_path(config)?;
            let inputs = inputs
                .into_iter()
                .map(resolve_path)
                .collect::<SheetliftResult<Vec<_>>>()?;
            let options = RunOptions {
                run_id,
                entities,
                inputs,
            };
            tracing::debug!(config = %config_path.display(), "starting run");
            let outcome = run(&config_path, options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
            } else {
                println!("{}", output::format_run_output(&outcome, mode));
            }
            let exit_code = outcome.summary.run.exit_code;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays parseable. `SHEETLIFT_LOG` takes the
/// usual `EnvFilter` directives and wins over the output mode.
fn init_logging(mode: OutputMode) {
    let default_directive = match mode {
        OutputMode::Quiet => "error",
        OutputMode::Default => "warn",
        OutputMode::Verbose => "sheetlift_core=debug,info",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn resolve_path(path: PathBuf) -> SheetliftResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
