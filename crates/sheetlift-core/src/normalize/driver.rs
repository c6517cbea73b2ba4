use crate::io::{CellValue, ColumnRef, RawRow};
use crate::model::Driver;

use super::{field, required_text, RowOutcome};

const TAX_ID_PUNCTUATION: [char; 3] = ['.', '-', '/'];

#[derive(Debug, Clone, PartialEq)]
pub struct DriverLayout {
    pub name: ColumnRef,
    pub tax_id: ColumnRef,
    pub plate: ColumnRef,
    pub skip_rows: usize,
}

impl Default for DriverLayout {
    fn default() -> Self {
        Self {
            name: ColumnRef::name("NOME"),
            tax_id: ColumnRef::name("CNPJ"),
            plate: ColumnRef::name("PLACA"),
            skip_rows: 0,
        }
    }
}

pub fn normalize_driver(row: &RawRow<'_>, layout: &DriverLayout) -> RowOutcome<Driver> {
    let name = field!(required_text(row.get(&layout.name), "name")).to_uppercase();
    let tax_id = clean_tax_id(row.get(&layout.tax_id));
    let plate = row
        .get(&layout.plate)
        .trimmed_text()
        .map(|plate| plate.to_uppercase())
        .filter(|plate| !plate.is_empty());

    RowOutcome::Emitted(Driver::new(name, tax_id, plate))
}

fn clean_tax_id(cell: &CellValue) -> Option<String> {
    let raw = cell.trimmed_text()?;
    let digits = raw.replace(TAX_ID_PUNCTUATION, "");
    let digits = digits.trim();
    if digits.is_empty() {
        None
    } else {
        Some(digits.to_string())
    }
}
