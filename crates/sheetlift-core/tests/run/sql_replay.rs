use std::fs;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::Connection;
use sheetlift_core::{run, RunOptions};

use crate::support::{driver_rows, n, route_rows, surcharge_rows, t, write_config, write_workbook};

const SCHEMA: &str = "
CREATE TABLE cities (
    name TEXT PRIMARY KEY,
    value REAL NOT NULL,
    type TEXT,
    state TEXT,
    region TEXT
);
CREATE TABLE drivers (
    name TEXT PRIMARY KEY,
    tax_id TEXT,
    plate TEXT,
    status TEXT,
    monthly_routes INTEGER,
    revenue REAL,
    rate_per_km REAL,
    rate_per_stop REAL
);
CREATE TABLE routes (
    id TEXT PRIMARY KEY,
    origin TEXT,
    destination TEXT,
    value REAL,
    cities TEXT,
    status TEXT
);
";

const CONFIG: &str = r#"version: "0.1"
entities:
  - name: "cities"
    kind: "city_surcharge"
    source:
      path: "legacy/ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/cities.sql"
  - name: "drivers"
    kind: "driver"
    source:
      path: "legacy/CADASTRO.xlsx"
    sink:
      kind: "batch_file"
      path: "out/drivers.sql"
  - name: "routes"
    kind: "route"
    source:
      path: "legacy/ROTAS.xlsx"
    sink:
      kind: "batch_file"
      path: "out/routes.sql"
"#;

fn write_legacy_workbooks(root: &Path) {
    write_workbook(
        &root.join("legacy/ROTAS.xlsx"),
        &[
            ("ACRÉSCIMOS", surcharge_rows()),
            ("CIDADES DA ROTA", route_rows()),
        ],
    );
    write_workbook(&root.join("legacy/CADASTRO.xlsx"), &[("CADASTRO", driver_rows())]);
}

fn emit_scripts(root: &Path) -> Vec<String> {
    let config = write_config(root, CONFIG);
    let outcome = run(&config, RunOptions::default()).expect("run config");
    assert_eq!(outcome.summary.run.exit_code, 0);
    ["cities", "drivers", "routes"]
        .iter()
        .map(|name| {
            fs::read_to_string(root.join(format!("out/{name}.sql"))).expect("read script")
        })
        .collect()
}

fn table_rows(conn: &Connection, table: &str) -> Vec<Vec<Value>> {
    let mut statement = conn
        .prepare(&format!("SELECT * FROM {table} ORDER BY 1"))
        .expect("prepare select");
    let width = statement.column_count();
    let rows = statement
        .query_map([], |row| {
            (0..width)
                .map(|index| row.get::<_, Value>(index))
                .collect::<Result<Vec<_>, _>>()
        })
        .expect("query rows")
        .collect::<Result<Vec<_>, _>>()
        .expect("read rows");
    rows
}

fn snapshot(conn: &Connection) -> Vec<Vec<Vec<Value>>> {
    ["cities", "drivers", "routes"]
        .iter()
        .map(|table| table_rows(conn, table))
        .collect()
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[test]
fn emitted_scripts_run_twice_with_the_same_result() {
    let root = tempfile::tempdir().expect("temp dir");
    write_legacy_workbooks(root.path());
    let scripts = emit_scripts(root.path());

    let conn = Connection::open_in_memory().expect("sqlite");
    conn.execute_batch(SCHEMA).expect("schema");
    for script in &scripts {
        conn.execute_batch(script).expect("first apply");
    }
    let once = snapshot(&conn);
    for script in &scripts {
        conn.execute_batch(script).expect("second apply");
    }
    let twice = snapshot(&conn);

    assert_eq!(once, twice);
    assert_eq!(once[0].len(), 2);
    assert_eq!(once[1].len(), 2);
    assert_eq!(once[2].len(), 1);

    assert_eq!(
        once[0],
        vec![
            vec![text("Itu"), Value::Real(7.0), text("fixed"), text("SP"), text("Geral")],
            vec![text("SOROCABA"), Value::Real(12.0), text("fixed"), text("SP"), text("Geral")],
        ]
    );
    assert_eq!(once[1][0][0], text("JOÃO DA SILVA"));
    assert_eq!(once[1][0][1], text("12345678900"));
    assert_eq!(once[1][0][2], text("ABC1D23"));
    assert_eq!(once[1][1][0], text("MARIA"));
    assert_eq!(once[1][1][1], Value::Null);
    assert_eq!(once[1][1][4], Value::Integer(0));
    assert_eq!(
        once[2][0],
        vec![
            text("12"),
            text("SOROCABA"),
            text("CAMPINAS"),
            Value::Real(350.5),
            text(r#"[{"name":"SOROCABA","value":0},{"name":"ITU","value":0},{"name":"CAMPINAS","value":0}]"#),
            text("Ativo"),
        ]
    );
}

#[test]
fn rerun_after_a_sheet_change_updates_rows_in_place() {
    let root = tempfile::tempdir().expect("temp dir");
    write_legacy_workbooks(root.path());
    let first = emit_scripts(root.path());

    let conn = Connection::open_in_memory().expect("sqlite");
    conn.execute_batch(SCHEMA).expect("schema");
    conn.execute_batch(&first[0]).expect("first cities");

    write_workbook(
        &root.path().join("legacy/ROTAS.xlsx"),
        &[
            (
                "ACRÉSCIMOS",
                vec![
                    vec![t("CIDADES"), t("VALOR ADICIONAL R$")],
                    vec![t("SOROCABA"), n(15.0)],
                    vec![t("O'Higgins"), n(3.25)],
                ],
            ),
            ("CIDADES DA ROTA", route_rows()),
        ],
    );
    let second = emit_scripts(root.path());
    conn.execute_batch(&second[0]).expect("second cities");

    let rows = table_rows(&conn, "cities");
    let names_and_values = rows
        .iter()
        .map(|row| (row[0].clone(), row[1].clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        names_and_values,
        vec![
            (text("Itu"), Value::Real(7.0)),
            (text("O'Higgins"), Value::Real(3.25)),
            (text("SOROCABA"), Value::Real(15.0)),
        ]
    );
}
