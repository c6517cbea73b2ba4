use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunReport {
    pub config_version: String,
    pub entity: EntityEcho,
    pub source: SourceEcho,
    pub sink: SinkEcho,
    pub results: ResultsTotals,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunSummaryReport {
    pub config_version: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub config: ConfigEcho,
    pub report: ReportEcho,
    pub results: ResultsTotals,
    pub entities: Vec<EntitySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EntitySummary {
    pub name: String,
    pub kind: String,
    pub status: RunStatus,
    pub results: ResultsTotals,
    pub report_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub status: RunStatus,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigEcho {
    pub path: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EntityEcho {
    pub name: String,
    pub kind: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceEcho {
    pub path: String,
    pub sheet: String,
    pub resolved_inputs: ResolvedInputs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolvedInputs {
    pub mode: ResolvedInputMode,
    pub file_count: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SinkEcho {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportEcho {
    pub path: String,
    pub report_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResultsTotals {
    pub files_total: u64,
    pub rows_total: u64,
    pub emitted_total: u64,
    pub duplicates_total: u64,
    pub discarded_total: u64,
    pub statements_total: u64,
    pub warnings_total: u64,
    pub errors_total: u64,
}

impl ResultsTotals {
    pub fn add_file(&mut self, file: &FileReport) {
        self.files_total += 1;
        self.rows_total += file.row_count;
        self.emitted_total += file.emitted_count;
        self.duplicates_total += file.duplicate_count;
        self.discarded_total += file.discarded_count;
        self.statements_total += file.statements_handled;
        self.warnings_total += file.warnings.len() as u64;
        if file.error.is_some() {
            self.errors_total += 1;
        }
    }

    pub fn add(&mut self, other: &ResultsTotals) {
        self.files_total += other.files_total;
        self.rows_total += other.rows_total;
        self.emitted_total += other.emitted_total;
        self.duplicates_total += other.duplicates_total;
        self.discarded_total += other.discarded_total;
        self.statements_total += other.statements_total;
        self.warnings_total += other.warnings_total;
        self.errors_total += other.errors_total;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileReport {
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub status: FileStatus,
    pub row_count: u64,
    pub emitted_count: u64,
    pub duplicate_count: u64,
    pub discarded_count: u64,
    pub discards: BTreeMap<String, u64>,
    pub statements_handled: u64,
    pub output: FileOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileIssue>,
}

impl FileReport {
    pub fn new(input_file: &str) -> Self {
        Self {
            input_file: input_file.to_string(),
            sheet: None,
            status: FileStatus::Success,
            row_count: 0,
            emitted_count: 0,
            duplicate_count: 0,
            discarded_count: 0,
            discards: BTreeMap::new(),
            statements_handled: 0,
            output: FileOutput::default(),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn fail(mut self, rule: &str, message: String) -> Self {
        self.status = FileStatus::Failed;
        self.error = Some(FileIssue {
            rule: rule.to_string(),
            message,
        });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileOutput {
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileIssue {
    pub rule: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    SuccessWithWarnings,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedInputMode {
    Directory,
    File,
    Glob,
    Override,
}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "report io error: {err}"),
            ReportError::Serialize(err) => write!(f, "report serialize error: {err}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn run_id_from_timestamp(timestamp: &str) -> String {
    timestamp.replace(':', "-")
}

pub struct ReportWriter;

impl ReportWriter {
    pub fn run_dir_name(run_id: &str) -> String {
        format!("run_{run_id}")
    }

    pub fn report_file_name() -> String {
        "run.json".to_string()
    }

    pub fn summary_file_name() -> String {
        "run.summary.json".to_string()
    }

    pub fn entity_report_dir(report_dir: &Path, run_id: &str, entity_name: &str) -> PathBuf {
        report_dir
            .join(Self::run_dir_name(run_id))
            .join(entity_name)
    }

    pub fn report_path(report_dir: &Path, run_id: &str, entity_name: &str) -> PathBuf {
        Self::entity_report_dir(report_dir, run_id, entity_name).join(Self::report_file_name())
    }

    pub fn summary_path(report_dir: &Path, run_id: &str) -> PathBuf {
        report_dir
            .join(Self::run_dir_name(run_id))
            .join(Self::summary_file_name())
    }

    pub fn write_report(
        report_dir: &Path,
        run_id: &str,
        entity_name: &str,
        report: &RunReport,
    ) -> Result<PathBuf, ReportError> {
        let report_path = Self::report_path(report_dir, run_id, entity_name);
        write_json_atomic(&report_path, report)?;
        Ok(report_path)
    }

    pub fn write_summary(
        report_dir: &Path,
        run_id: &str,
        report: &RunSummaryReport,
    ) -> Result<PathBuf, ReportError> {
        let report_path = Self::summary_path(report_dir, run_id);
        write_json_atomic(&report_path, report)?;
        Ok(report_path)
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = dir.join(format!("{file_name}.tmp-{}", unique_suffix()));

    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Any failed file fails the run with exit code 1.
pub fn compute_run_outcome(file_statuses: &[FileStatus]) -> (RunStatus, i32) {
    if file_statuses.contains(&FileStatus::Failed) {
        return (RunStatus::Failed, 1);
    }
    (RunStatus::Success, 0)
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    format!("{}-{}", std::process::id(), nanos)
}
