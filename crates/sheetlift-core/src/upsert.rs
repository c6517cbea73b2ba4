//! Conflict-safe insert statements for normalized entities.
//!
//! Every statement targets the entity's natural key and overwrites the
//! remaining columns on conflict, so replaying a batch converges on the same
//! table state.

use crate::model::{format_decimal, CitySurcharge, Driver, Entity, Route};
use crate::SheetliftResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Number(f64),
    Json(serde_json::Value),
}

impl SqlValue {
    fn optional_text(value: &Option<String>) -> Self {
        match value {
            Some(value) => SqlValue::Text(value.clone()),
            None => SqlValue::Null,
        }
    }

    /// SQL literal form. Quotes inside text are doubled; JSON is rendered
    /// compactly with non-ASCII characters kept as-is.
    pub fn render(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(value) => quote(value),
            SqlValue::Number(value) => format_decimal(*value),
            SqlValue::Json(value) => quote(&value.to_string()),
        }
    }

    /// The value as the store would hand it back.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Null => serde_json::Value::Null,
            SqlValue::Text(value) => serde_json::Value::String(value.clone()),
            SqlValue::Number(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                serde_json::Value::from(*value as i64)
            }
            SqlValue::Number(value) => serde_json::Value::from(*value),
            SqlValue::Json(value) => value.clone(),
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertStatement {
    pub table: String,
    pub key_columns: Vec<&'static str>,
    pub insert_columns: Vec<&'static str>,
    pub update_columns: Vec<&'static str>,
    pub values: Vec<SqlValue>,
}

impl UpsertStatement {
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.insert_columns
            .iter()
            .position(|name| *name == column)
            .and_then(|index| self.values.get(index))
    }

    /// Single-line statement terminated by `;`.
    pub fn render(&self) -> String {
        let values = self
            .values
            .iter()
            .map(SqlValue::render)
            .collect::<Vec<_>>();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({})",
            self.table,
            self.insert_columns.join(", "),
            values.join(", "),
            self.key_columns.join(", ")
        );
        if self.update_columns.is_empty() {
            sql.push_str(" DO NOTHING;");
            return sql;
        }
        let assignments = self
            .update_columns
            .iter()
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect::<Vec<_>>();
        sql.push_str(" DO UPDATE SET ");
        sql.push_str(&assignments.join(", "));
        sql.push(';');
        sql
    }
}

pub trait Upsertable {
    fn key_columns(&self) -> &'static [&'static str];

    /// Insert columns with their values, in statement order.
    fn columns(&self) -> SheetliftResult<Vec<(&'static str, SqlValue)>>;

    fn to_statement(&self, table: &str) -> SheetliftResult<UpsertStatement> {
        let columns = self.columns()?;
        let keys = self.key_columns();
        let update_columns = columns
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !keys.contains(name))
            .collect();
        let (insert_columns, values): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        Ok(UpsertStatement {
            table: table.to_string(),
            key_columns: keys.to_vec(),
            insert_columns,
            update_columns,
            values,
        })
    }
}

impl Upsertable for CitySurcharge {
    fn key_columns(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn columns(&self) -> SheetliftResult<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", SqlValue::Text(self.name.clone())),
            ("value", SqlValue::Number(self.value)),
            ("type", SqlValue::Text(self.surcharge_type.clone())),
            ("state", SqlValue::Text(self.state.clone())),
            ("region", SqlValue::Text(self.region.clone())),
        ])
    }
}

impl Upsertable for Driver {
    fn key_columns(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn columns(&self) -> SheetliftResult<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", SqlValue::Text(self.name.clone())),
            ("tax_id", SqlValue::optional_text(&self.tax_id)),
            ("plate", SqlValue::optional_text(&self.plate)),
            ("status", SqlValue::Text(self.status.clone())),
            ("monthly_routes", SqlValue::Number(self.monthly_routes as f64)),
            ("revenue", SqlValue::Number(self.revenue)),
            ("rate_per_km", SqlValue::Number(self.rate_per_km)),
            ("rate_per_stop", SqlValue::Number(self.rate_per_stop)),
        ])
    }
}

impl Upsertable for Route {
    fn key_columns(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn columns(&self) -> SheetliftResult<Vec<(&'static str, SqlValue)>> {
        let cities = serde_json::to_value(&self.cities)?;
        Ok(vec![
            ("id", SqlValue::Text(self.id.clone())),
            ("origin", SqlValue::Text(self.origin.clone())),
            ("destination", SqlValue::Text(self.destination.clone())),
            ("value", SqlValue::Number(self.value)),
            ("cities", SqlValue::Json(cities)),
            ("status", SqlValue::Text(self.status.clone())),
        ])
    }
}

impl Upsertable for Entity {
    fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Entity::City(city) => city.key_columns(),
            Entity::Driver(driver) => driver.key_columns(),
            Entity::Route(route) => route.key_columns(),
        }
    }

    fn columns(&self) -> SheetliftResult<Vec<(&'static str, SqlValue)>> {
        match self {
            Entity::City(city) => city.columns(),
            Entity::Driver(driver) => driver.columns(),
            Entity::Route(route) => route.columns(),
        }
    }
}

/// One statement per entity, in the order given.
pub fn build_statements<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    table: &str,
) -> SheetliftResult<Vec<UpsertStatement>> {
    entities
        .into_iter()
        .map(|entity| entity.to_statement(table))
        .collect()
}
