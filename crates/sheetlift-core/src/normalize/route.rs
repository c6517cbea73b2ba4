use crate::io::{ColumnRef, RawRow};
use crate::model::{Route, RouteCity};

use super::{field, optional_decimal, required_text, DiscardReason, RowOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLayout {
    pub id: ColumnRef,
    pub value: ColumnRef,
    /// Scanned left to right; blank cells are skipped.
    pub cities: Vec<ColumnRef>,
    pub status: String,
    pub skip_rows: usize,
}

impl Default for RouteLayout {
    // The route sheet carries its real header in the first data row, so the
    // columns are addressed by position and that row is skipped.
    fn default() -> Self {
        Self {
            id: ColumnRef::Position(1),
            value: ColumnRef::Position(2),
            cities: (3..=10).map(ColumnRef::Position).collect(),
            status: "Ativo".to_string(),
            skip_rows: 1,
        }
    }
}

pub fn normalize_route(row: &RawRow<'_>, layout: &RouteLayout) -> RowOutcome<Route> {
    let raw_id = field!(required_text(row.get(&layout.id), "id"));
    let id = strip_float_suffix(&raw_id);
    if id.is_empty() {
        return RowOutcome::Discarded(DiscardReason::MissingField { field: "id" });
    }
    let value = field!(optional_decimal(row.get(&layout.value), "value")).unwrap_or(0.0);

    let names = layout
        .cities
        .iter()
        .filter_map(|column| row.get(column).trimmed_text())
        .map(|name| name.to_uppercase())
        .collect::<Vec<_>>();
    let (Some(origin), Some(destination)) = (names.first(), names.last()) else {
        return RowOutcome::Discarded(DiscardReason::NoCities);
    };
    let origin = origin.clone();
    let destination = destination.clone();

    let cities = names
        .into_iter()
        .map(|name| RouteCity { name, value: 0.0 })
        .collect();

    RowOutcome::Emitted(Route {
        id: id.to_string(),
        origin,
        destination,
        value,
        cities,
        status: layout.status.clone(),
    })
}

/// Ids typed as numbers come back as `12.0`; the intended id is `12`.
fn strip_float_suffix(value: &str) -> &str {
    value.strip_suffix(".0").unwrap_or(value)
}
