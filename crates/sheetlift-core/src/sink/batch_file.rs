use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::SinkError;
use crate::sink::{SinkAdapter, SinkOutcome, StatementBatch};
use crate::SheetliftResult;

/// Writes a batch as a SQL script. The file is either fully replaced or left
/// untouched.
#[derive(Debug, Clone)]
pub struct BatchFileSink {
    path: PathBuf,
}

impl BatchFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, contents: &str) -> Result<(), SinkError> {
        let write_error = |message: String| SinkError::Write {
            target: self.path.display().to_string(),
            message,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|err| write_error(err.to_string()))?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|err| write_error(err.to_string()))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|err| write_error(err.to_string()))?;
        tmp.flush().map_err(|err| write_error(err.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|err| write_error(err.error.to_string()))?;
        Ok(())
    }
}

impl SinkAdapter for BatchFileSink {
    fn apply(&mut self, batch: &StatementBatch) -> SheetliftResult<SinkOutcome> {
        let contents = if batch.is_empty() {
            format!("-- no {} rows to import into {}\n", batch.kind, batch.table)
        } else {
            let mut sql = batch.render_sql();
            sql.push('\n');
            sql
        };
        self.write_atomic(&contents)?;
        tracing::debug!(
            path = %self.path.display(),
            statements = batch.len(),
            "batch file written"
        );
        Ok(SinkOutcome {
            handled: batch.len() as u64,
            target: self.path.display().to_string(),
            response: None,
            empty: batch.is_empty(),
        })
    }
}

/// Output script for one input file. A base path with an extension names the
/// script itself; anything else is a directory that receives
/// `import_<entity>.sql`. When an entity reads several files each one gets its
/// own script, suffixed with the input file stem.
pub fn resolve_batch_path(
    base_path: &Path,
    entity_name: &str,
    input_stem: &str,
    multiple_inputs: bool,
) -> PathBuf {
    let suffix = if multiple_inputs {
        format!("_{input_stem}")
    } else {
        String::new()
    };
    match (base_path.file_stem(), base_path.extension()) {
        (Some(stem), Some(extension)) => {
            if !multiple_inputs {
                return base_path.to_path_buf();
            }
            let filename = format!(
                "{}{suffix}.{}",
                stem.to_string_lossy(),
                extension.to_string_lossy()
            );
            base_path.with_file_name(filename)
        }
        _ => base_path.join(format!("import_{entity_name}{suffix}.sql")),
    }
}
