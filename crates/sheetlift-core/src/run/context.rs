use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::io::resolve_local_path;
use crate::{config, report, SheetliftResult};

pub struct RunContext {
    pub config: config::RootConfig,
    pub config_path: PathBuf,
    pub config_dir: PathBuf,
    pub report_dir: Option<PathBuf>,
    pub run_id: String,
    pub started_at: String,
    pub run_timer: Instant,
}

impl RunContext {
    pub fn new(config_path: &Path, run_id: Option<String>) -> SheetliftResult<Self> {
        let config = config::parse_config(config_path)?;
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let report_dir = config
            .report
            .as_ref()
            .map(|report| resolve_local_path(&config_dir, &report.path));
        let started_at = report::now_rfc3339();
        let run_id = run_id.unwrap_or_else(|| report::run_id_from_timestamp(&started_at));

        Ok(Self {
            config,
            config_path: config_path.to_path_buf(),
            config_dir,
            report_dir,
            run_id,
            started_at,
            run_timer: Instant::now(),
        })
    }

    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        resolve_local_path(&self.config_dir, raw)
    }
}
