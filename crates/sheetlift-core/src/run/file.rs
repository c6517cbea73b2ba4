use std::path::PathBuf;
use std::time::Instant;

use crate::errors::{SinkError, SourceError};
use crate::io::{extract_rows, SheetSelector, TabularSource, XlsxSource};
use crate::normalize::{normalize_sheet, EntityLayout};
use crate::report::{FileReport, FileStatus};
use crate::sink::{BatchFileSink, DirectSink, SinkAdapter, SinkKind, StatementBatch, StoreClient};

/// Everything needed to take one workbook through the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_file: PathBuf,
    pub sheet_selector: SheetSelector,
    pub sink_kind: SinkKind,
    /// Script location for batch-file sinks; unused by direct sinks.
    pub output_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// The sink named by `sink_kind`. Direct sinks borrow the store client;
    /// batch-file sinks write to `output_path` and never touch the store.
    pub fn build_sink<'a>(
        &self,
        store: Option<&'a mut dyn StoreClient>,
    ) -> Result<Box<dyn SinkAdapter + 'a>, SinkError> {
        match self.sink_kind {
            SinkKind::BatchFile => {
                let path = self.output_path.clone().ok_or_else(|| {
                    SinkError::Config(format!(
                        "batch_file sink for {} has no output path",
                        self.source_file.display()
                    ))
                })?;
                Ok(Box::new(BatchFileSink::new(path)))
            }
            SinkKind::Direct => {
                let store = store.ok_or_else(|| {
                    SinkError::Config("direct sink needs a store client".to_string())
                })?;
                Ok(Box::new(DirectSink::new(store)))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileRun {
    pub report: FileReport,
    pub elapsed_ms: u64,
}

/// Opens the workbook and runs it through extraction, normalization and the
/// sink chosen by the pipeline. Failures end up in the returned report and
/// never escape.
pub fn process_file(
    pipeline: &PipelineConfig,
    layout: &EntityLayout,
    table: &str,
    store: Option<&mut dyn StoreClient>,
) -> FileRun {
    let timer = Instant::now();
    let input = pipeline.source_file.display().to_string();
    let report = match pipeline.build_sink(store) {
        Ok(mut sink) => match XlsxSource::open(&pipeline.source_file) {
            Ok(mut source) => process_source(
                &mut source,
                &input,
                &pipeline.sheet_selector,
                layout,
                table,
                sink.as_mut(),
            ),
            Err(err) => failed(FileReport::new(&input), err.as_ref(), "file_unreadable"),
        },
        Err(err) => failed(FileReport::new(&input), &err, "sink_config_error"),
    };
    FileRun {
        report,
        elapsed_ms: timer.elapsed().as_millis() as u64,
    }
}

pub fn process_source(
    source: &mut dyn TabularSource,
    input: &str,
    selector: &SheetSelector,
    layout: &EntityLayout,
    table: &str,
    sink: &mut dyn SinkAdapter,
) -> FileReport {
    let mut report = FileReport::new(input);

    let rows = match extract_rows(source, selector) {
        Ok(rows) => rows,
        Err(err) => return failed(report, err.as_ref(), "file_unreadable"),
    };
    report.sheet = Some(rows.sheet_name.clone());

    for column in layout.unresolved_columns(rows.header()) {
        let warning = format!("header has no column for {column}");
        tracing::warn!(file = %input, sheet = %rows.sheet_name, "{warning}");
        report.warnings.push(warning);
    }

    let normalized = normalize_sheet(&rows, layout);
    report.row_count = normalized.rows_seen;
    report.discarded_count = normalized.discarded_total();
    report.discards = normalized.discards.clone();
    report.duplicate_count = normalized.entities.replaced();
    report.emitted_count = normalized.entities.len() as u64;

    let batch = match StatementBatch::new(layout.kind(), table, normalized.entities.into_vec()) {
        Ok(batch) => batch,
        Err(err) => return failed(report, err.as_ref(), "statement_error"),
    };

    let outcome = match sink.apply(&batch) {
        Ok(outcome) => outcome,
        Err(err) => return failed(report, err.as_ref(), "sink_write_error"),
    };
    report.statements_handled = outcome.handled;
    report.output.target = Some(outcome.target);
    report.output.response = outcome.response;

    if outcome.empty {
        report.status = FileStatus::Empty;
        tracing::warn!(
            file = %input,
            sheet = %rows.sheet_name,
            rows = report.row_count,
            "no entities emitted"
        );
    } else {
        tracing::info!(
            file = %input,
            sheet = %rows.sheet_name,
            rows = report.row_count,
            emitted = report.emitted_count,
            discarded = report.discarded_count,
            "file processed"
        );
    }
    report
}

fn failed(
    report: FileReport,
    err: &(dyn std::error::Error + Send + Sync + 'static),
    fallback_rule: &str,
) -> FileReport {
    let rule = if let Some(source_error) = err.downcast_ref::<SourceError>() {
        source_error.rule()
    } else if let Some(sink_error) = err.downcast_ref::<SinkError>() {
        sink_error.rule()
    } else {
        fallback_rule
    };
    tracing::warn!(file = %report.input_file, rule, error = %err, "file failed");
    report.fail(rule, err.to_string())
}
