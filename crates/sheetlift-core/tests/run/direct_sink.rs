use std::path::Path;

use sheetlift_core::io::SheetSelector;
use sheetlift_core::model::EntityKind;
use sheetlift_core::normalize::EntityLayout;
use sheetlift_core::report::{FileStatus, RunStatus};
use sheetlift_core::sink::{MemoryStore, SinkKind, StatementBatch};
use sheetlift_core::{process_file, run, PipelineConfig, RunOptions};

use crate::support::{driver_rows, write_config, write_workbook};

fn driver_pipeline(path: &Path) -> PipelineConfig {
    PipelineConfig {
        source_file: path.to_path_buf(),
        sheet_selector: SheetSelector::Contains("cadastro".to_string()),
        sink_kind: SinkKind::Direct,
        output_path: None,
    }
}

#[test]
fn drivers_are_merged_into_the_store() {
    let root = tempfile::tempdir().expect("temp dir");
    let workbook = root.path().join("CADASTRO.xlsx");
    write_workbook(&workbook, &[("CADASTRO MOTORISTAS", driver_rows())]);
    let layout = EntityLayout::default_for(EntityKind::Driver);
    let mut store = MemoryStore::new();

    let first = process_file(&driver_pipeline(&workbook), &layout, "drivers", Some(&mut store));
    let second = process_file(&driver_pipeline(&workbook), &layout, "drivers", Some(&mut store));

    assert_eq!(first.report.status, FileStatus::Success);
    assert_eq!(first.report.sheet.as_deref(), Some("CADASTRO MOTORISTAS"));
    assert_eq!(first.report.emitted_count, 2);
    assert_eq!(first.report.discards.get("empty_row"), Some(&1));
    assert_eq!(first.report.statements_handled, 2);
    assert_eq!(second.report.statements_handled, 2);
    let response = first.report.output.response.as_ref().expect("response");
    assert_eq!(response.as_array().map(Vec::len), Some(2));

    assert_eq!(store.calls(), 2);
    assert_eq!(store.rows("drivers").len(), 2);
    let joao = store.row("drivers", "JOÃO DA SILVA").expect("joao");
    assert_eq!(joao["tax_id"], serde_json::json!("12345678900"));
    assert_eq!(joao["plate"], serde_json::json!("ABC1D23"));
    let maria = store.row("drivers", "MARIA").expect("maria");
    assert_eq!(maria["tax_id"], serde_json::Value::Null);
    assert_eq!(maria["plate"], serde_json::json!("XYZ9876"));
}

#[test]
fn batch_file_pipeline_never_calls_the_store() {
    let root = tempfile::tempdir().expect("temp dir");
    let workbook = root.path().join("CADASTRO.xlsx");
    write_workbook(&workbook, &[("CADASTRO", driver_rows())]);
    let output = root.path().join("out/drivers.sql");
    let pipeline = PipelineConfig {
        sink_kind: SinkKind::BatchFile,
        output_path: Some(output.clone()),
        ..driver_pipeline(&workbook)
    };
    let mut store = MemoryStore::new();

    let run = process_file(
        &pipeline,
        &EntityLayout::default_for(EntityKind::Driver),
        "drivers",
        Some(&mut store),
    );

    assert_eq!(run.report.status, FileStatus::Success);
    assert!(output.is_file());
    assert_eq!(store.calls(), 0);
    assert!(store.rows("drivers").is_empty());
}

#[test]
fn replaying_statements_converges() {
    let root = tempfile::tempdir().expect("temp dir");
    let workbook = root.path().join("CADASTRO.xlsx");
    write_workbook(&workbook, &[("CADASTRO", driver_rows())]);
    let mut merged = MemoryStore::new();
    process_file(
        &driver_pipeline(&workbook),
        &EntityLayout::default_for(EntityKind::Driver),
        "drivers",
        Some(&mut merged),
    );

    let entities = merged
        .rows("drivers")
        .iter()
        .map(|row| {
            sheetlift_core::model::Entity::Driver(sheetlift_core::model::Driver::new(
                row["name"].as_str().unwrap_or_default().to_string(),
                row["tax_id"].as_str().map(str::to_string),
                row["plate"].as_str().map(str::to_string),
            ))
        })
        .collect::<Vec<_>>();
    let batch = StatementBatch::new(EntityKind::Driver, "drivers", entities).expect("batch");

    let mut replayed = MemoryStore::new();
    for statement in batch.statements() {
        replayed.execute(statement);
    }
    let once = replayed.rows("drivers").into_iter().cloned().collect::<Vec<_>>();
    for statement in batch.statements() {
        replayed.execute(statement);
    }
    let twice = replayed.rows("drivers").into_iter().cloned().collect::<Vec<_>>();

    assert_eq!(once, twice);
    assert_eq!(
        once,
        merged.rows("drivers").into_iter().cloned().collect::<Vec<_>>()
    );
}

#[test]
fn missing_store_key_fails_every_file() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(&root.path().join("CADASTRO.xlsx"), &[("CADASTRO", driver_rows())]);
    let config = write_config(
        root.path(),
        r#"version: "0.1"
store:
  url: "http://127.0.0.1:9"
  key_env: "SHEETLIFT_TEST_KEY_THAT_IS_NEVER_SET"
entities:
  - name: "drivers"
    kind: "driver"
    source:
      path: "CADASTRO.xlsx"
    sink:
      kind: "direct"
"#,
    );

    let outcome = run(&config, RunOptions::default()).expect("run");

    let file = &outcome.entity_outcomes[0].report.files[0];
    assert_eq!(file.status, FileStatus::Failed);
    let error = file.error.as_ref().expect("error");
    assert_eq!(error.rule, "sink_config_error");
    assert!(error.message.contains("SHEETLIFT_TEST_KEY_THAT_IS_NEVER_SET"));
    assert_eq!(outcome.summary.run.status, RunStatus::Failed);
    assert_eq!(outcome.summary.run.exit_code, 1);
}
