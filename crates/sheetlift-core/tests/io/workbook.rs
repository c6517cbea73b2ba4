use sheetlift_core::errors::SourceError;
use sheetlift_core::io::{extract_rows, CellValue, ColumnRef, SheetSelector, XlsxSource};

use crate::support::{blank, n, route_rows, surcharge_rows, t, write_workbook};

#[test]
fn sheets_are_listed_in_workbook_order() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("ROTAS.xlsx");
    write_workbook(
        &path,
        &[
            ("RESUMO", vec![vec![t("TOTAL")]]),
            ("ACRÉSCIMOS", surcharge_rows()),
            ("CIDADES DA ROTA", route_rows()),
        ],
    );

    let mut source = XlsxSource::open(&path).expect("open workbook");
    let rows = extract_rows(&mut source, &SheetSelector::Contains("acrés".to_string()))
        .expect("extract");
    assert_eq!(rows.sheet_name, "ACRÉSCIMOS");
    assert_eq!(rows.len(), 5);

    let first = rows.iter().next().expect("first row");
    assert_eq!(first.get(&ColumnRef::name("cidades")), &CellValue::text("SOROCABA"));
    assert_eq!(
        first.get(&ColumnRef::name("  valor   adicional r$ ")),
        &CellValue::Number(10.5)
    );
}

#[test]
fn positions_are_absolute_even_with_a_blank_first_column() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("ROTAS.xlsx");
    write_workbook(
        &path,
        &[(
            "CIDADES DA ROTA",
            vec![
                vec![blank(), t("ROTA"), t("VALOR")],
                vec![blank(), n(7.0), t("99.9")],
            ],
        )],
    );

    let mut source = XlsxSource::open(&path).expect("open workbook");
    let rows = extract_rows(
        &mut source,
        &SheetSelector::Exact("CIDADES DA ROTA".to_string()),
    )
    .expect("extract");
    let row = rows.iter().next().expect("row");
    assert_eq!(row.get(&ColumnRef::Position(0)), &CellValue::Missing);
    assert_eq!(row.get(&ColumnRef::Position(1)), &CellValue::Number(7.0));
    assert_eq!(row.get(&ColumnRef::Position(2)), &CellValue::text("99.9"));
}

#[test]
fn exact_sheet_names_are_case_sensitive() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("CADASTRO.xlsx");
    write_workbook(&path, &[("Cadastro", vec![vec![t("NOME")]])]);

    let mut source = XlsxSource::open(&path).expect("open workbook");
    let err = extract_rows(&mut source, &SheetSelector::Exact("CADASTRO".to_string()))
        .err()
        .expect("no exact match");
    let source_error = err.downcast_ref::<SourceError>().expect("source error");
    assert_eq!(source_error.rule(), "sheet_not_found");
    assert!(err.to_string().contains("available: Cadastro"));
}

#[test]
fn non_workbook_files_are_unreadable() {
    let root = tempfile::tempdir().expect("temp dir");
    let path = root.path().join("notes.xlsx");
    std::fs::write(&path, "not a zip archive").expect("write file");

    let err = XlsxSource::open(&path).err().expect("open fails");
    let source_error = err.downcast_ref::<SourceError>().expect("source error");
    assert_eq!(source_error.rule(), "file_unreadable");
}
