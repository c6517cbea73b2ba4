use std::path::Path;

use sheetlift_core::{report, EntityOutcome, RunOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Default,
    Quiet,
    Verbose,
}

pub fn format_run_output(outcome: &RunOutcome, mode: OutputMode) -> String {
    let mut lines = Vec::new();

    if mode != OutputMode::Quiet {
        lines.push(format!("run id: {}", &outcome.run_id));
        lines.push(format!(
            "report base: {}",
            outcome.report_base_path.as_deref().unwrap_or("(disabled)")
        ));
        for entity in &outcome.entity_outcomes {
            lines.extend(format_entity_output(entity, mode));
        }
    }

    lines.extend(format_run_summary(outcome, mode == OutputMode::Quiet));

    lines.join("\n")
}

fn format_entity_output(entity: &EntityOutcome, mode: OutputMode) -> Vec<String> {
    let mut lines = Vec::new();
    let report = &entity.report;
    lines.push(format!(
        "==> entity {} (kind={}, table={}, sink={})",
        &report.entity.name, &report.entity.kind, &report.entity.table, &report.sink.kind
    ));

    if mode == OutputMode::Verbose {
        lines.push(format!(
            "  source: {} ({})",
            &report.source.path, &report.source.sheet
        ));
        if let Some(path) = &report.sink.path {
            lines.push(format!("  sink path: {path}"));
        }
        if !report.source.resolved_inputs.files.is_empty() {
            lines.push("  inputs:".to_string());
            for file in &report.source.resolved_inputs.files {
                lines.push(format!("    {}", file));
            }
        }
    }

    for (index, file_report) in report.files.iter().enumerate() {
        let elapsed_ms = entity.file_timings_ms.get(index).copied().flatten();
        lines.push(format_file_line(file_report, elapsed_ms));
        if mode == OutputMode::Verbose {
            for (reason, count) in &file_report.discards {
                lines.push(format!("    discarded {reason}={count}"));
            }
        }
        for warning in &file_report.warnings {
            lines.push(format!("    warning: {warning}"));
        }
        if let Some(error) = &file_report.error {
            lines.push(format!("    error [{}]: {}", error.rule, error.message));
        }
    }

    lines
}

fn format_file_line(file: &report::FileReport, elapsed_ms: Option<u64>) -> String {
    let mut line = format!(
        "  {} {} rows={} emitted={} duplicates={} discarded={}",
        format_file_status(file.status),
        short_path(&file.input_file),
        file.row_count,
        file.emitted_count,
        file.duplicate_count,
        file.discarded_count
    );
    if let Some(ms) = elapsed_ms {
        line.push_str(&format!(" elapsed_ms={ms}"));
    }
    line.push_str(&format!(
        " statements={} out={}",
        file.statements_handled,
        short_optional_path(&file.output.target)
    ));
    line
}

fn format_run_summary(outcome: &RunOutcome, include_run_info: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if include_run_info {
        lines.push(format!("run id: {}", &outcome.run_id));
        lines.push(format!(
            "report base: {}",
            outcome.report_base_path.as_deref().unwrap_or("(disabled)")
        ));
    }
    let results = &outcome.summary.results;
    lines.push(format!(
        "Totals: files={} rows={} emitted={} duplicates={} discarded={} statements={}",
        results.files_total,
        results.rows_total,
        results.emitted_total,
        results.duplicates_total,
        results.discarded_total,
        results.statements_total
    ));
    lines.push(format!(
        "Overall: {} (exit_code={})",
        format_run_status(outcome.summary.run.status),
        outcome.summary.run.exit_code
    ));
    lines.push(format!(
        "Run summary: {}",
        run_summary_path(&outcome.run_id, outcome.report_base_path.as_deref())
    ));
    lines
}

fn run_summary_path(run_id: &str, report_base_path: Option<&str>) -> String {
    match report_base_path {
        Some(base) => report::ReportWriter::summary_path(Path::new(base), run_id)
            .display()
            .to_string(),
        None => "(disabled)".to_string(),
    }
}

fn format_file_status(status: report::FileStatus) -> &'static str {
    match status {
        report::FileStatus::Success => "SUCCESS",
        report::FileStatus::Empty => "EMPTY",
        report::FileStatus::Failed => "FAILED",
    }
}

fn format_run_status(status: report::RunStatus) -> &'static str {
    match status {
        report::RunStatus::Success => "success",
        report::RunStatus::SuccessWithWarnings => "success_with_warnings",
        report::RunStatus::Failed => "failed",
    }
}

fn short_optional_path(path: &Option<String>) -> String {
    path.as_deref()
        .map(short_path)
        .unwrap_or_else(|| "-".to_string())
}

fn short_path(path: &str) -> String {
    let trimmed = path.trim_end_matches(std::path::MAIN_SEPARATOR);
    Path::new(trimmed)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(trimmed)
        .to_string()
}
