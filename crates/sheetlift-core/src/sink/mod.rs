//! Where statement batches go once a file has been normalized.

pub mod batch_file;
pub mod direct;
pub mod store;

use crate::model::{Entity, EntityKind};
use crate::upsert::{build_statements, UpsertStatement};
use crate::SheetliftResult;

pub use batch_file::{resolve_batch_path, BatchFileSink};
pub use direct::DirectSink;
pub use store::{MemoryStore, RestStoreClient, StoreClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    BatchFile,
    Direct,
}

impl SinkKind {
    pub const ALLOWED: &'static [&'static str] = &["batch_file", "direct"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "batch_file" | "sql" | "file" => Some(SinkKind::BatchFile),
            "direct" => Some(SinkKind::Direct),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SinkKind::BatchFile => "batch_file",
            SinkKind::Direct => "direct",
        }
    }
}

/// Entities of one file together with their statements, both in extraction
/// order.
#[derive(Debug, Clone)]
pub struct StatementBatch {
    pub kind: EntityKind,
    pub table: String,
    entities: Vec<Entity>,
    statements: Vec<UpsertStatement>,
}

impl StatementBatch {
    pub fn new(kind: EntityKind, table: &str, entities: Vec<Entity>) -> SheetliftResult<Self> {
        let statements = build_statements(&entities, table)?;
        Ok(Self {
            kind,
            table: table.to_string(),
            entities,
            statements,
        })
    }

    pub fn key_columns(&self) -> Vec<&'static str> {
        self.statements
            .first()
            .map(|statement| statement.key_columns.clone())
            .unwrap_or_else(|| vec![self.kind.key_column()])
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn statements(&self) -> &[UpsertStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statements joined by newlines, one per line.
    pub fn render_sql(&self) -> String {
        self.statements
            .iter()
            .map(UpsertStatement::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkOutcome {
    pub handled: u64,
    pub target: String,
    pub response: Option<serde_json::Value>,
    pub empty: bool,
}

pub trait SinkAdapter {
    fn apply(&mut self, batch: &StatementBatch) -> SheetliftResult<SinkOutcome>;
}
