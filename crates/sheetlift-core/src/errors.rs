use std::fmt;

/// Failures that make a single workbook unusable. They stop that file's
/// processing and nothing else.
#[derive(Debug)]
pub enum SourceError {
    FileNotFound {
        path: String,
    },
    Unreadable {
        path: String,
        message: String,
    },
    SheetNotFound {
        selector: String,
        available: Vec<String>,
    },
}

impl SourceError {
    pub fn rule(&self) -> &'static str {
        match self {
            SourceError::FileNotFound { .. } => "file_not_found",
            SourceError::Unreadable { .. } => "file_unreadable",
            SourceError::SheetNotFound { .. } => "sheet_not_found",
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::FileNotFound { path } => write!(f, "file not found: {path}"),
            SourceError::Unreadable { path, message } => {
                write!(f, "failed to read workbook {path}: {message}")
            }
            SourceError::SheetNotFound {
                selector,
                available,
            } => write!(
                f,
                "no sheet matches {selector} (available: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug)]
pub enum SinkError {
    Write { target: String, message: String },
    Remote { target: String, message: String },
    Config(String),
}

impl SinkError {
    pub fn rule(&self) -> &'static str {
        match self {
            SinkError::Write { .. } => "sink_write_error",
            SinkError::Remote { .. } => "sink_remote_error",
            SinkError::Config(_) => "sink_config_error",
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Write { target, message } => {
                write!(f, "failed to write {target}: {message}")
            }
            SinkError::Remote { target, message } => {
                write!(f, "remote insert into {target} failed: {message}")
            }
            SinkError::Config(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SinkError {}
