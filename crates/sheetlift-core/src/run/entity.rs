use std::path::PathBuf;

use crate::config::EntityConfig;
use crate::io::{is_glob_pattern, resolve_inputs, InputFile};
use crate::report::{
    self, EntityEcho, FileReport, ReportWriter, ResolvedInputMode, ResolvedInputs, ResultsTotals,
    RunReport, SinkEcho, SourceEcho,
};
use crate::run::context::RunContext;
use crate::run::file::{process_file, FileRun, PipelineConfig};
use crate::run::EntityOutcome;
use crate::sink::{resolve_batch_path, RestStoreClient, SinkKind, StoreClient};
use crate::SheetliftResult;

pub(super) fn run_entity(
    context: &RunContext,
    entity: &EntityConfig,
    input_overrides: &[PathBuf],
) -> SheetliftResult<EntityOutcome> {
    let kind = entity.entity_kind()?;
    let table = entity.table_name()?;
    let layout = entity.entity_layout()?;
    let selector = entity.sheet_selector()?;
    let sink_kind = entity.sink_kind()?;
    let sink_base = entity
        .sink
        .path
        .as_deref()
        .map(|path| context.resolve_path(path));

    let (mode, inputs) = if input_overrides.is_empty() {
        (
            input_mode(context, &entity.source.path),
            resolve_inputs(&context.config_dir, &entity.source.path)?,
        )
    } else {
        let inputs = input_overrides
            .iter()
            .map(|path| InputFile::new(path.clone()))
            .collect();
        (ResolvedInputMode::Override, inputs)
    };
    tracing::info!(
        entity = %entity.name,
        kind = %kind,
        files = inputs.len(),
        "entity started"
    );
    if inputs.is_empty() {
        tracing::warn!(entity = %entity.name, path = %entity.source.path, "no input files found");
    }

    // One store connection serves every file of the entity.
    let mut store = match sink_kind {
        SinkKind::Direct => Some(
            context
                .config
                .store
                .as_ref()
                .ok_or_else(|| "store section is missing".to_string())
                .and_then(|store| {
                    RestStoreClient::from_config(store).map_err(|err| err.to_string())
                }),
        ),
        SinkKind::BatchFile => None,
    };

    let multiple_inputs = inputs.len() > 1;
    let mut files = Vec::with_capacity(inputs.len());
    let mut file_timings_ms = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let output_path = match (sink_kind, &sink_base) {
            (SinkKind::BatchFile, Some(base)) => Some(resolve_batch_path(
                base,
                &entity.name,
                &input.stem,
                multiple_inputs,
            )),
            _ => None,
        };
        let pipeline = PipelineConfig {
            source_file: input.path.clone(),
            sheet_selector: selector.clone(),
            sink_kind,
            output_path,
        };

        let run = match store.as_mut() {
            Some(Ok(client)) => {
                process_file(&pipeline, &layout, &table, Some(client as &mut dyn StoreClient))
            }
            Some(Err(message)) => {
                let report = FileReport::new(&input.path.display().to_string())
                    .fail("sink_config_error", message.clone());
                tracing::warn!(file = %report.input_file, error = %message, "file failed");
                FileRun {
                    report,
                    elapsed_ms: 0,
                }
            }
            None => process_file(&pipeline, &layout, &table, None),
        };
        file_timings_ms.push(Some(run.elapsed_ms));
        files.push(run.report);
    }

    let mut results = ResultsTotals::default();
    for file in &files {
        results.add_file(file);
    }

    let report = RunReport {
        config_version: context.config.version.clone(),
        entity: EntityEcho {
            name: entity.name.clone(),
            kind: kind.to_string(),
            table,
        },
        source: SourceEcho {
            path: entity.source.path.clone(),
            sheet: selector.to_string(),
            resolved_inputs: ResolvedInputs {
                mode,
                file_count: inputs.len() as u64,
                files: inputs
                    .iter()
                    .map(|input| input.path.display().to_string())
                    .collect(),
            },
        },
        sink: SinkEcho {
            kind: sink_kind.as_str().to_string(),
            path: sink_base.map(|path| path.display().to_string()),
        },
        results,
        files,
    };

    if let Some(report_dir) = &context.report_dir {
        let path = ReportWriter::write_report(report_dir, &context.run_id, &entity.name, &report)?;
        tracing::debug!(entity = %entity.name, path = %path.display(), "entity report written");
    }

    let file_statuses = report.files.iter().map(|file| file.status).collect::<Vec<_>>();
    let (status, _) = report::compute_run_outcome(&file_statuses);
    tracing::info!(
        entity = %entity.name,
        status = ?status,
        emitted = report.results.emitted_total,
        discarded = report.results.discarded_total,
        "entity finished"
    );

    Ok(EntityOutcome {
        report,
        file_timings_ms,
    })
}

fn input_mode(context: &RunContext, raw_path: &str) -> ResolvedInputMode {
    if is_glob_pattern(raw_path) {
        ResolvedInputMode::Glob
    } else if context.resolve_path(raw_path).is_dir() {
        ResolvedInputMode::Directory
    } else {
        ResolvedInputMode::File
    }
}
