use crate::errors::SinkError;
use crate::sink::{SinkAdapter, SinkOutcome, StatementBatch, StoreClient};
use crate::SheetliftResult;

/// Sends entity records straight to the store instead of writing SQL.
pub struct DirectSink<C: StoreClient> {
    client: C,
}

impl<C: StoreClient> DirectSink<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }
}

impl<C: StoreClient> SinkAdapter for DirectSink<C> {
    fn apply(&mut self, batch: &StatementBatch) -> SheetliftResult<SinkOutcome> {
        if batch.is_empty() {
            return Ok(SinkOutcome {
                handled: 0,
                target: batch.table.clone(),
                response: None,
                empty: true,
            });
        }

        let records = batch
            .entities()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let key_columns = batch.key_columns();
        let response = self
            .client
            .batch_insert(&batch.table, &key_columns, &records)
            .map_err(|err| -> Box<dyn std::error::Error + Send + Sync> {
                if err.is::<SinkError>() {
                    err
                } else {
                    Box::new(SinkError::Remote {
                        target: batch.table.clone(),
                        message: err.to_string(),
                    })
                }
            })?;
        tracing::info!(
            table = %batch.table,
            records = records.len(),
            "records sent to store"
        );

        Ok(SinkOutcome {
            handled: records.len() as u64,
            target: batch.table.clone(),
            response: Some(response),
            empty: false,
        })
    }
}
