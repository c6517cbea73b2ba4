use crate::io::{ColumnRef, RawRow};
use crate::model::CitySurcharge;

use super::{field, optional_decimal, required_text, DiscardReason, RowOutcome};

pub const SURCHARGE_TYPE: &str = "fixed";

#[derive(Debug, Clone, PartialEq)]
pub struct CityLayout {
    pub name: ColumnRef,
    pub value: ColumnRef,
    pub state: String,
    pub region: String,
    pub skip_rows: usize,
}

impl Default for CityLayout {
    fn default() -> Self {
        Self {
            name: ColumnRef::name("CIDADES"),
            value: ColumnRef::name("VALOR ADICIONAL R$"),
            state: "SP".to_string(),
            region: "Geral".to_string(),
            skip_rows: 0,
        }
    }
}

/// Surcharge names keep their case; the value is required.
pub fn normalize_city(row: &RawRow<'_>, layout: &CityLayout) -> RowOutcome<CitySurcharge> {
    let name = field!(required_text(row.get(&layout.name), "name"));
    let value = match field!(optional_decimal(row.get(&layout.value), "value")) {
        Some(value) => value,
        None => return RowOutcome::Discarded(DiscardReason::MissingField { field: "value" }),
    };

    RowOutcome::Emitted(CitySurcharge {
        name,
        value,
        surcharge_type: SURCHARGE_TYPE.to_string(),
        state: layout.state.clone(),
        region: layout.region.clone(),
    })
}
