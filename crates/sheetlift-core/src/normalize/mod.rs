//! Row-to-entity normalization.
//!
//! Every lane follows the same shape: read the key field, discard the row when
//! it is blank, clean and coerce the remaining fields, then emit the entity.
//! Discards are ordinary outcomes and carry a reason so they can be counted.

mod city;
mod driver;
mod route;
mod set;

use std::collections::BTreeMap;
use std::fmt;

pub use city::{normalize_city, CityLayout};
pub use driver::{normalize_driver, DriverLayout};
pub use route::{normalize_route, RouteLayout};
pub use set::EntitySet;

use crate::io::{CellValue, ColumnRef, Header, RawRow, SheetRows};
use crate::model::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    HeaderRow,
    EmptyRow,
    MissingField { field: &'static str },
    InvalidNumber { field: &'static str, raw: String },
    NegativeNumber { field: &'static str, value: f64 },
    NoCities,
}

impl DiscardReason {
    pub fn code(&self) -> &'static str {
        match self {
            DiscardReason::HeaderRow => "header_row",
            DiscardReason::EmptyRow => "empty_row",
            DiscardReason::MissingField { .. } => "missing_field",
            DiscardReason::InvalidNumber { .. } => "invalid_number",
            DiscardReason::NegativeNumber { .. } => "negative_number",
            DiscardReason::NoCities => "no_cities",
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::HeaderRow => write!(f, "header row"),
            DiscardReason::EmptyRow => write!(f, "empty row"),
            DiscardReason::MissingField { field } => write!(f, "{field} is blank"),
            DiscardReason::InvalidNumber { field, raw } => {
                write!(f, "{field} is not a number: {raw:?}")
            }
            DiscardReason::NegativeNumber { field, value } => {
                write!(f, "{field} is negative: {value}")
            }
            DiscardReason::NoCities => write!(f, "route has no cities"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Emitted(T),
    Discarded(DiscardReason),
}

impl<T> RowOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RowOutcome<U> {
        match self {
            RowOutcome::Emitted(value) => RowOutcome::Emitted(f(value)),
            RowOutcome::Discarded(reason) => RowOutcome::Discarded(reason),
        }
    }

    pub fn emitted(self) -> Option<T> {
        match self {
            RowOutcome::Emitted(value) => Some(value),
            RowOutcome::Discarded(_) => None,
        }
    }
}

/// Unwraps a field result inside a normalizer, turning the error side into a
/// discarded row.
macro_rules! field {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(reason) => return $crate::normalize::RowOutcome::Discarded(reason),
        }
    };
}
pub(crate) use field;

pub(crate) fn required_text(cell: &CellValue, field: &'static str) -> Result<String, DiscardReason> {
    cell.trimmed_text()
        .filter(|value| !value.is_empty())
        .ok_or(DiscardReason::MissingField { field })
}

/// Blank cells yield `None`; anything present must be a finite, non-negative
/// number written with a `.` decimal point.
pub(crate) fn optional_decimal(
    cell: &CellValue,
    field: &'static str,
) -> Result<Option<f64>, DiscardReason> {
    if cell.is_blank() {
        return Ok(None);
    }
    let value = match cell {
        CellValue::Number(value) => *value,
        CellValue::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| DiscardReason::InvalidNumber {
                field,
                raw: raw.clone(),
            })?,
        CellValue::Missing => return Ok(None),
    };
    if !value.is_finite() {
        return Err(DiscardReason::InvalidNumber {
            field,
            raw: value.to_string(),
        });
    }
    if value < 0.0 {
        return Err(DiscardReason::NegativeNumber { field, value });
    }
    Ok(Some(if value == 0.0 { 0.0 } else { value }))
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityLayout {
    City(CityLayout),
    Driver(DriverLayout),
    Route(RouteLayout),
}

impl EntityLayout {
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::CitySurcharge => EntityLayout::City(CityLayout::default()),
            EntityKind::Driver => EntityLayout::Driver(DriverLayout::default()),
            EntityKind::Route => EntityLayout::Route(RouteLayout::default()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityLayout::City(_) => EntityKind::CitySurcharge,
            EntityLayout::Driver(_) => EntityKind::Driver,
            EntityLayout::Route(_) => EntityKind::Route,
        }
    }

    pub fn skip_rows(&self) -> usize {
        match self {
            EntityLayout::City(layout) => layout.skip_rows,
            EntityLayout::Driver(layout) => layout.skip_rows,
            EntityLayout::Route(layout) => layout.skip_rows,
        }
    }

    pub fn columns(&self) -> Vec<(&'static str, &ColumnRef)> {
        match self {
            EntityLayout::City(layout) => vec![("name", &layout.name), ("value", &layout.value)],
            EntityLayout::Driver(layout) => vec![
                ("name", &layout.name),
                ("tax_id", &layout.tax_id),
                ("plate", &layout.plate),
            ],
            EntityLayout::Route(layout) => {
                let mut columns = vec![("id", &layout.id), ("value", &layout.value)];
                columns.extend(layout.cities.iter().map(|column| ("cities", column)));
                columns
            }
        }
    }

    /// Named columns that the sheet header does not provide.
    pub fn unresolved_columns(&self, header: &Header) -> Vec<String> {
        self.columns()
            .into_iter()
            .filter(|(_, column)| header.resolve(column).is_none())
            .map(|(field, column)| format!("{field} ({column})"))
            .collect()
    }

    pub fn normalize(&self, row: &RawRow<'_>) -> RowOutcome<Entity> {
        if row.index < self.skip_rows() {
            return RowOutcome::Discarded(DiscardReason::HeaderRow);
        }
        if row.is_empty() {
            return RowOutcome::Discarded(DiscardReason::EmptyRow);
        }
        match self {
            EntityLayout::City(layout) => normalize_city(row, layout).map(Entity::City),
            EntityLayout::Driver(layout) => normalize_driver(row, layout).map(Entity::Driver),
            EntityLayout::Route(layout) => normalize_route(row, layout).map(Entity::Route),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedSheet {
    pub entities: EntitySet,
    pub rows_seen: u64,
    pub discards: BTreeMap<String, u64>,
}

impl NormalizedSheet {
    pub fn discarded_total(&self) -> u64 {
        self.discards.values().sum()
    }
}

pub fn normalize_sheet(rows: &SheetRows, layout: &EntityLayout) -> NormalizedSheet {
    let mut normalized = NormalizedSheet::default();
    for row in rows.iter() {
        normalized.rows_seen += 1;
        match layout.normalize(&row) {
            RowOutcome::Emitted(entity) => {
                if normalized.entities.insert(entity) {
                    tracing::debug!(
                        sheet = %rows.sheet_name,
                        row = row.index,
                        "duplicate key, later row replaces earlier one"
                    );
                }
            }
            RowOutcome::Discarded(reason) => {
                tracing::debug!(
                    sheet = %rows.sheet_name,
                    row = row.index,
                    reason = %reason,
                    "row discarded"
                );
                *normalized
                    .discards
                    .entry(reason.code().to_string())
                    .or_insert(0) += 1;
            }
        }
    }
    normalized
}
