use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::config::StoreConfig;
use crate::errors::SinkError;
use crate::upsert::UpsertStatement;
use crate::SheetliftResult;

pub const DEFAULT_URL_ENV: &str = "SUPABASE_URL";
pub const DEFAULT_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Batch insert-or-merge into a remote table. Implementations return whatever
/// the store reports back for the accepted rows.
pub trait StoreClient {
    fn batch_insert(
        &mut self,
        table: &str,
        key_columns: &[&str],
        records: &[Value],
    ) -> SheetliftResult<Value>;
}

impl<C: StoreClient + ?Sized> StoreClient for &mut C {
    fn batch_insert(
        &mut self,
        table: &str,
        key_columns: &[&str],
        records: &[Value],
    ) -> SheetliftResult<Value> {
        (**self).batch_insert(table, key_columns, records)
    }
}

/// PostgREST endpoint, as exposed by Supabase.
#[derive(Debug, Clone)]
pub struct RestStoreClient {
    base_url: Url,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl RestStoreClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> SheetliftResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            SinkError::Config(format!("store.url={base_url} is not a valid url: {err}"))
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            client,
        })
    }

    /// Url and key come from the config or the environment variables it
    /// names; the key is only ever read from the environment.
    pub fn from_config(config: &StoreConfig) -> SheetliftResult<Self> {
        let url = match &config.url {
            Some(url) => url.clone(),
            None => read_env(config.url_env.as_deref().unwrap_or(DEFAULT_URL_ENV), "store.url_env")?,
        };
        let key = read_env(config.key_env.as_deref().unwrap_or(DEFAULT_KEY_ENV), "store.key_env")?;
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        Self::new(&url, &key, timeout)
    }

    pub fn endpoint(&self, table: &str, key_columns: &[&str]) -> SheetliftResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut endpoint = Url::parse(&format!("{base}/rest/v1/{table}"))?;
        if !key_columns.is_empty() {
            endpoint
                .query_pairs_mut()
                .append_pair("on_conflict", &key_columns.join(","));
        }
        Ok(endpoint)
    }
}

fn read_env(name: &str, ctx: &str) -> Result<String, SinkError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SinkError::Config(format!(
            "environment variable {name} ({ctx}) is not set"
        ))),
    }
}

impl StoreClient for RestStoreClient {
    fn batch_insert(
        &mut self,
        table: &str,
        key_columns: &[&str],
        records: &[Value],
    ) -> SheetliftResult<Value> {
        let endpoint = self.endpoint(table, key_columns)?;
        let response = self
            .client
            .post(endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(records)
            .send()
            .map_err(|err| SinkError::Remote {
                target: table.to_string(),
                message: err.to_string(),
            })?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(Box::new(SinkError::Remote {
                target: table.to_string(),
                message: format!("{status} - {body}"),
            }));
        }
        tracing::debug!(endpoint = %endpoint, %status, "batch insert accepted");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Tables held in memory, keyed by the natural key of each row. Rows merge on
/// conflict the same way the remote store and the rendered statements do.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>,
    calls: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn rows(&self, table: &str) -> Vec<&BTreeMap<String, Value>> {
        self.tables
            .get(table)
            .map(|rows| rows.values().collect())
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, key: &str) -> Option<&BTreeMap<String, Value>> {
        self.tables.get(table).and_then(|rows| rows.get(key))
    }

    /// Applies an upsert statement: insert when the key is new, otherwise
    /// overwrite the update columns only.
    pub fn execute(&mut self, statement: &UpsertStatement) {
        let row = statement
            .insert_columns
            .iter()
            .zip(&statement.values)
            .map(|(column, value)| (column.to_string(), value.to_json()))
            .collect::<BTreeMap<_, _>>();
        let key = row_key(&row, &statement.key_columns);
        let table = self.tables.entry(statement.table.clone()).or_default();
        match table.get_mut(&key) {
            Some(existing) => {
                for column in &statement.update_columns {
                    if let Some(value) = row.get(*column) {
                        existing.insert(column.to_string(), value.clone());
                    }
                }
            }
            None => {
                table.insert(key, row);
            }
        }
    }
}

fn row_key(row: &BTreeMap<String, Value>, key_columns: &[&str]) -> String {
    key_columns
        .iter()
        .map(|column| match row.get(*column) {
            Some(Value::String(value)) => value.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

impl StoreClient for MemoryStore {
    fn batch_insert(
        &mut self,
        table: &str,
        key_columns: &[&str],
        records: &[Value],
    ) -> SheetliftResult<Value> {
        self.calls += 1;
        let rows = self.tables.entry(table.to_string()).or_default();
        let mut accepted = Vec::with_capacity(records.len());
        for record in records {
            let Value::Object(fields) = record else {
                return Err(Box::new(SinkError::Remote {
                    target: table.to_string(),
                    message: format!("record is not an object: {record}"),
                }));
            };
            let incoming = fields
                .iter()
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect::<BTreeMap<_, _>>();
            let key = row_key(&incoming, key_columns);
            let row = rows.entry(key).or_default();
            row.extend(incoming);
            accepted.push(Value::Object(
                row.iter()
                    .map(|(column, value)| (column.clone(), value.clone()))
                    .collect(),
            ));
        }
        Ok(Value::Array(accepted))
    }
}
