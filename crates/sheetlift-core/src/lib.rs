use std::path::{Path, PathBuf};

pub mod config;
pub mod errors;
pub mod io;
pub mod model;
pub mod normalize;
pub mod report;
pub mod run;
pub mod sink;
pub mod upsert;

pub use run::{process_file, process_source, run, EntityOutcome, FileRun, PipelineConfig, RunOutcome};

pub type SheetliftResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Default)]
pub struct ValidateOptions {
    pub entities: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RunOptions {
    pub run_id: Option<String>,
    pub entities: Vec<String>,
    /// Overrides every selected entity's `source.path` with these files.
    pub inputs: Vec<PathBuf>,
}

pub fn validate(config_path: &Path, options: ValidateOptions) -> SheetliftResult<()> {
    let config = config::parse_config(config_path)?;
    config::validate_config(&config)?;

    if !options.entities.is_empty() {
        run::validate_entities(&config, &options.entities)?;
    }

    Ok(())
}
