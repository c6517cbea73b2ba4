use std::fs;
use std::path::Path;

use sheetlift_core::report::{FileStatus, ResolvedInputMode, RunStatus};
use sheetlift_core::{run, RunOptions, RunOutcome};

use crate::support::{blank, n, route_rows, surcharge_rows, t, write_config, write_workbook};

fn run_config(path: &Path) -> RunOutcome {
    run(
        path,
        RunOptions {
            run_id: Some("test-run".to_string()),
            ..RunOptions::default()
        },
    )
    .expect("run config")
}

const CITY_UPDATE: &str = "ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, \
type = EXCLUDED.type, state = EXCLUDED.state, region = EXCLUDED.region;";

#[test]
fn surcharges_become_one_statement_per_city() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("legacy/ROTAS.xlsx"),
        &[
            ("RESUMO", vec![vec![t("TOTAL")]]),
            ("ACRÉSCIMOS", surcharge_rows()),
        ],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "cities"
    kind: "city_surcharge"
    source:
      path: "legacy/ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/cities.sql"
"#,
    );

    let outcome = run_config(&config);

    let script = fs::read_to_string(root.path().join("out/cities.sql")).expect("read script");
    let lines = script.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            format!(
                "INSERT INTO cities (name, value, type, state, region) VALUES \
('SOROCABA', 12, 'fixed', 'SP', 'Geral') {CITY_UPDATE}"
            ),
            format!(
                "INSERT INTO cities (name, value, type, state, region) VALUES \
('Itu', 7, 'fixed', 'SP', 'Geral') {CITY_UPDATE}"
            ),
        ]
    );
    assert!(script.ends_with(";\n"));

    let report = &outcome.entity_outcomes[0].report;
    assert_eq!(report.entity.table, "cities");
    assert_eq!(report.source.resolved_inputs.mode, ResolvedInputMode::File);
    let file = &report.files[0];
    assert_eq!(file.status, FileStatus::Success);
    assert_eq!(file.sheet.as_deref(), Some("ACRÉSCIMOS"));
    assert_eq!(file.row_count, 5);
    assert_eq!(file.emitted_count, 2);
    assert_eq!(file.duplicate_count, 1);
    assert_eq!(file.discarded_count, 2);
    assert_eq!(file.discards.get("missing_field"), Some(&1));
    assert_eq!(file.discards.get("invalid_number"), Some(&1));
    assert_eq!(outcome.summary.run.status, RunStatus::Success);
    assert_eq!(outcome.summary.run.exit_code, 0);
}

#[test]
fn rerunning_produces_the_same_script() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("ROTAS.xlsx"),
        &[("ACRÉSCIMOS", surcharge_rows())],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "cities"
    kind: "city_surcharge"
    source:
      path: "ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/cities.sql"
"#,
    );

    run_config(&config);
    let first = fs::read_to_string(root.path().join("out/cities.sql")).expect("first");
    run_config(&config);
    let second = fs::read_to_string(root.path().join("out/cities.sql")).expect("second");
    assert_eq!(first, second);
    let leftovers = fs::read_dir(root.path().join("out")).expect("out dir").count();
    assert_eq!(leftovers, 1);
}

#[test]
fn missing_sheet_fails_only_its_own_file() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("in/a.xlsx"),
        &[("ACRÉSCIMOS", surcharge_rows())],
    );
    write_workbook(
        &root.path().join("in/b.xlsx"),
        &[("OUTRA", vec![vec![t("CIDADES")]])],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "cities"
    kind: "city_surcharge"
    source:
      path: "in"
    sink:
      kind: "batch_file"
      path: "out"
"#,
    );

    let outcome = run_config(&config);

    let report = &outcome.entity_outcomes[0].report;
    assert_eq!(report.source.resolved_inputs.mode, ResolvedInputMode::Directory);
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].status, FileStatus::Success);
    assert_eq!(report.files[1].status, FileStatus::Failed);
    let error = report.files[1].error.as_ref().expect("error");
    assert_eq!(error.rule, "sheet_not_found");
    assert!(error.message.contains("OUTRA"));

    assert!(root.path().join("out/import_cities_a.sql").is_file());
    assert!(!root.path().join("out/import_cities_b.sql").exists());
    assert_eq!(outcome.summary.run.status, RunStatus::Failed);
    assert_eq!(outcome.summary.run.exit_code, 1);
    assert_eq!(outcome.summary.results.errors_total, 1);
}

#[test]
fn routes_are_read_by_position() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("ROTAS.xlsx"),
        &[("CIDADES DA ROTA", route_rows())],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "routes"
    kind: "route"
    source:
      path: "ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/routes.sql"
"#,
    );

    let outcome = run_config(&config);

    let script = fs::read_to_string(root.path().join("out/routes.sql")).expect("read script");
    assert_eq!(
        script,
        "INSERT INTO routes (id, origin, destination, value, cities, status) VALUES \
('12', 'SOROCABA', 'CAMPINAS', 350.5, \
'[{\"name\":\"SOROCABA\",\"value\":0},{\"name\":\"ITU\",\"value\":0},{\"name\":\"CAMPINAS\",\"value\":0}]', \
'Ativo') ON CONFLICT (id) DO UPDATE SET origin = EXCLUDED.origin, \
destination = EXCLUDED.destination, value = EXCLUDED.value, cities = EXCLUDED.cities, \
status = EXCLUDED.status;\n"
    );

    let file = &outcome.entity_outcomes[0].report.files[0];
    assert_eq!(file.row_count, 3);
    assert_eq!(file.emitted_count, 1);
    assert_eq!(file.discards.get("header_row"), Some(&1));
    assert_eq!(file.discards.get("no_cities"), Some(&1));
    assert!(file.warnings.is_empty());
}

#[test]
fn leading_blank_row_keeps_the_first_route() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("ROTAS.xlsx"),
        &[(
            "CIDADES DA ROTA",
            vec![
                vec![],
                vec![blank(), t("ROTA"), t("VALOR FIXO"), t("CIDADES")],
                vec![blank(), n(12.0), n(100.0), t("sorocaba"), t("itu")],
                vec![blank(), n(13.0), n(100.0), t("jundiai")],
            ],
        )],
    );
    let config = write_config(
        root.path(),
        r#"version: "0.1"
entities:
  - name: "routes"
    kind: "route"
    source:
      path: "ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/routes.sql"
"#,
    );

    let outcome = run_config(&config);

    let script = fs::read_to_string(root.path().join("out/routes.sql")).expect("read script");
    let ids = script
        .lines()
        .map(|line| line.split("VALUES ('").nth(1).and_then(|rest| rest.split('\'').next()))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![Some("12"), Some("13")]);

    let file = &outcome.entity_outcomes[0].report.files[0];
    assert_eq!(file.row_count, 3);
    assert_eq!(file.emitted_count, 2);
    assert_eq!(file.discards.get("header_row"), Some(&1));
    assert_eq!(file.discarded_count, 1);
}

#[test]
fn sheet_without_rows_writes_a_comment_script() {
    let root = tempfile::tempdir().expect("temp dir");
    write_workbook(
        &root.path().join("CADASTRO.xlsx"),
        &[("CADASTRO", vec![vec![t("NOME"), t("CNPJ"), t("PLACA")]])],
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

    let outcome = run_config(&config);

    let script = fs::read_to_string(root.path().join("out/drivers.sql")).expect("read script");
    assert_eq!(script, "-- no driver rows to import into drivers\n");
    let file = &outcome.entity_outcomes[0].report.files[0];
    assert_eq!(file.status, FileStatus::Empty);
    assert_eq!(outcome.summary.run.exit_code, 0);
}
