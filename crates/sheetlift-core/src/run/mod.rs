use std::path::Path;

use crate::{config, report, ConfigError, RunOptions, SheetliftResult, ValidateOptions};

mod context;
mod entity;
mod file;

use context::RunContext;
use entity::run_entity;

pub use file::{process_file, process_source, FileRun, PipelineConfig};

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub report_base_path: Option<String>,
    pub entity_outcomes: Vec<EntityOutcome>,
    pub summary: report::RunSummaryReport,
}

#[derive(Debug, Clone)]
pub struct EntityOutcome {
    pub report: crate::report::RunReport,
    pub file_timings_ms: Vec<Option<u64>>,
}

pub(crate) fn validate_entities(
    config: &config::RootConfig,
    selected: &[String],
) -> SheetliftResult<()> {
    let missing: Vec<String> = selected
        .iter()
        .filter(|name| !config.entities.iter().any(|entity| &entity.name == *name))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(Box::new(ConfigError(format!(
            "entities not found: {}",
            missing.join(", ")
        ))));
    }
    Ok(())
}

/// Runs every selected entity in config order. File failures are recorded
/// in the reports; only config and report-writing problems return `Err`.
pub fn run(config_path: &Path, options: RunOptions) -> SheetliftResult<RunOutcome> {
    let validate_options = ValidateOptions {
        entities: options.entities.clone(),
    };
    crate::validate(config_path, validate_options)?;

    let context = RunContext::new(config_path, options.run_id.clone())?;
    tracing::info!(
        run_id = %context.run_id,
        config = %context.config_path.display(),
        "run started"
    );

    let mut entity_outcomes = Vec::new();
    for entity in &context.config.entities {
        if !options.entities.is_empty() && !options.entities.contains(&entity.name) {
            continue;
        }
        entity_outcomes.push(run_entity(&context, entity, &options.inputs)?);
    }

    let summary = build_run_summary(&context, &entity_outcomes);
    if let Some(report_dir) = &context.report_dir {
        let path = report::ReportWriter::write_summary(report_dir, &context.run_id, &summary)?;
        tracing::debug!(path = %path.display(), "run summary written");
    }
    tracing::info!(
        run_id = %context.run_id,
        status = ?summary.run.status,
        exit_code = summary.run.exit_code,
        "run finished"
    );

    Ok(RunOutcome {
        run_id: context.run_id.clone(),
        report_base_path: context
            .report_dir
            .as_ref()
            .map(|dir| dir.display().to_string()),
        entity_outcomes,
        summary,
    })
}

fn build_run_summary(
    context: &RunContext,
    entity_outcomes: &[EntityOutcome],
) -> report::RunSummaryReport {
    let mut totals = report::ResultsTotals::default();
    let mut statuses = Vec::new();
    let mut entities = Vec::with_capacity(entity_outcomes.len());

    for outcome in entity_outcomes {
        let report = &outcome.report;
        totals.add(&report.results);

        let file_statuses = report
            .files
            .iter()
            .map(|file| file.status)
            .collect::<Vec<_>>();
        let (mut status, _) = report::compute_run_outcome(&file_statuses);
        if status == report::RunStatus::Success && report.results.warnings_total > 0 {
            status = report::RunStatus::SuccessWithWarnings;
        }
        statuses.extend(file_statuses);

        let report_file = context
            .report_dir
            .as_ref()
            .map(|dir| {
                report::ReportWriter::report_path(dir, &context.run_id, &report.entity.name)
                    .display()
                    .to_string()
            })
            .unwrap_or_else(|| "disabled".to_string());
        entities.push(report::EntitySummary {
            name: report.entity.name.clone(),
            kind: report.entity.kind.clone(),
            status,
            results: report.results.clone(),
            report_file,
        });
    }

    let (mut status, exit_code) = report::compute_run_outcome(&statuses);
    if status == report::RunStatus::Success && totals.warnings_total > 0 {
        status = report::RunStatus::SuccessWithWarnings;
    }

    let finished_at = report::now_rfc3339();
    let duration_ms = context.run_timer.elapsed().as_millis() as u64;
    let report_base_path = context
        .report_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "disabled".to_string());
    let report_file = context
        .report_dir
        .as_ref()
        .map(|dir| {
            report::ReportWriter::summary_path(dir, &context.run_id)
                .display()
                .to_string()
        })
        .unwrap_or_else(|| "disabled".to_string());

    report::RunSummaryReport {
        config_version: context.config.version.clone(),
        tool: report::ToolInfo {
            name: "sheetlift".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: report::RunInfo {
            run_id: context.run_id.clone(),
            started_at: context.started_at.clone(),
            finished_at,
            duration_ms,
            status,
            exit_code,
        },
        config: report::ConfigEcho {
            path: context.config_path.display().to_string(),
            version: context.config.version.clone(),
        },
        report: report::ReportEcho {
            path: report_base_path,
            report_file,
        },
        results: totals,
        entities,
    }
}
