use std::fs;

use sheetlift_core::report::{ReportWriter, ResolvedInputMode, RunStatus};
use sheetlift_core::{run, RunOptions};

use crate::support::{driver_rows, surcharge_rows, t, write_config, write_workbook};

fn two_entity_config(root: &std::path::Path) -> std::path::PathBuf {
    write_workbook(
        &root.join("legacy/ROTAS.xlsx"),
        &[("ACRÉSCIMOS", surcharge_rows())],
    );
    write_workbook(&root.join("legacy/CADASTRO.xlsx"), &[("CADASTRO", driver_rows())]);
    write_config(
        root,
        r#"version: "0.1"
report:
  path: "report"
entities:
  - name: "cities"
    kind: "city_surcharge"
    source:
      path: "legacy/ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out"
  - name: "drivers"
    kind: "driver"
    table: "public.drivers"
    source:
      path: "legacy/CADASTRO.xlsx"
      sheet: "CADASTRO"
    sink:
      kind: "batch_file"
      path: "out"
"#,
    )
}

#[test]
fn run_writes_entity_reports_and_summary() {
    let root = tempfile::tempdir().expect("temp dir");
    let config = two_entity_config(root.path());

    let outcome = run(
        &config,
        RunOptions {
            run_id: Some("nightly".to_string()),
            ..RunOptions::default()
        },
    )
    .expect("run");

    let report_dir = root.path().join("report");
    let summary_path = ReportWriter::summary_path(&report_dir, "nightly");
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).expect("summary")).expect("json");
    assert_eq!(summary["tool"]["name"], "sheetlift");
    assert_eq!(summary["run"]["run_id"], "nightly");
    assert_eq!(summary["run"]["status"], "success");
    assert_eq!(summary["results"]["files_total"], 2);
    assert_eq!(summary["results"]["emitted_total"], 4);
    assert_eq!(summary["entities"][1]["name"], "drivers");
    assert_eq!(summary["entities"][1]["kind"], "driver");

    let drivers_path = ReportWriter::report_path(&report_dir, "nightly", "drivers");
    let drivers: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&drivers_path).expect("report")).expect("json");
    assert_eq!(drivers["entity"]["table"], "public.drivers");
    assert_eq!(drivers["files"][0]["status"], "success");
    assert_eq!(drivers["files"][0]["emitted_count"], 2);
    assert_eq!(
        outcome.summary.entities[1].report_file,
        drivers_path.display().to_string()
    );

    let script = fs::read_to_string(root.path().join("out/import_drivers.sql")).expect("script");
    assert!(script.starts_with("INSERT INTO public.drivers (name, tax_id, plate, status"));
    assert!(root.path().join("out/import_cities.sql").is_file());
}

#[test]
fn selected_entities_and_input_overrides() {
    let root = tempfile::tempdir().expect("temp dir");
    let config = two_entity_config(root.path());
    let other = root.path().join("other/CADASTRO_2024.xlsx");
    write_workbook(
        &other,
        &[(
            "CADASTRO",
            vec![vec![t("NOME"), t("CNPJ"), t("PLACA")], vec![t("bia"), t("1"), t("a")]],
        )],
    );

    let outcome = run(
        &config,
        RunOptions {
            run_id: Some("override".to_string()),
            entities: vec!["drivers".to_string()],
            inputs: vec![other.clone()],
        },
    )
    .expect("run");

    assert_eq!(outcome.entity_outcomes.len(), 1);
    let report = &outcome.entity_outcomes[0].report;
    assert_eq!(report.entity.name, "drivers");
    assert_eq!(report.source.resolved_inputs.mode, ResolvedInputMode::Override);
    assert_eq!(
        report.source.resolved_inputs.files,
        vec![other.display().to_string()]
    );
    assert_eq!(report.results.emitted_total, 1);
    assert_eq!(outcome.summary.run.status, RunStatus::Success);
    assert!(!root.path().join("out/import_cities.sql").exists());
}

#[test]
fn unknown_entity_selection_is_rejected() {
    let root = tempfile::tempdir().expect("temp dir");
    let config = two_entity_config(root.path());
    let err = run(
        &config,
        RunOptions {
            entities: vec!["vehicles".to_string()],
            ..RunOptions::default()
        },
    )
    .expect_err("unknown entity");
    assert!(err.to_string().contains("entities not found: vehicles"));
}

#[test]
fn warnings_mark_the_run_as_success_with_warnings() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("CADASTRO.xlsx"),
        &[(
            "CADASTRO",
            vec![vec![t("NOME"), t("CPF")], vec![t("ana"), t("1")]],
        )],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "drivers"
    kind: "driver"
    source:
      path: "CADASTRO.xlsx"
    sink:
      kind: "batch_file"
      path: "out/drivers.sql"
"#,
    );

    let outcome = run(&config, RunOptions::default()).expect("run");

    let file = &outcome.entity_outcomes[0].report.files[0];
    assert_eq!(file.warnings.len(), 2);
    assert_eq!(file.emitted_count, 1);
    assert_eq!(outcome.summary.run.status, RunStatus::SuccessWithWarnings);
    assert_eq!(outcome.summary.run.exit_code, 0);
}
