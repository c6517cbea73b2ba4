use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

use crate::errors::SourceError;
use crate::io::source::{CellValue, Grid, TabularSource};
use crate::SheetliftResult;

/// Workbook backed by calamine; handles xlsx, xlsm, xls and ods.
pub struct XlsxSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl XlsxSource {
    pub fn open(path: &Path) -> SheetliftResult<Self> {
        if !path.is_file() {
            return Err(Box::new(SourceError::FileNotFound {
                path: path.display().to_string(),
            }));
        }
        let workbook = open_workbook_auto(path).map_err(|err| SourceError::Unreadable {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TabularSource for XlsxSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn open_sheet(&mut self, name: &str) -> SheetliftResult<Box<dyn Grid>> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|err| SourceError::Unreadable {
                path: self.path.display().to_string(),
                message: format!("sheet {name:?}: {err}"),
            })?;
        Ok(Box::new(RangeGrid(range)))
    }
}

struct RangeGrid(Range<Data>);

impl Grid for RangeGrid {
    fn height(&self) -> usize {
        self.0
            .end()
            .map(|(row, _)| row as usize + 1)
            .unwrap_or(0)
    }

    fn width(&self) -> usize {
        self.0
            .end()
            .map(|(_, col)| col as usize + 1)
            .unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> CellValue {
        match self.0.get_value((row as u32, col as u32)) {
            Some(value) => cell_value(value),
            None => CellValue::Missing,
        }
    }
}

fn cell_value(value: &Data) -> CellValue {
    match value {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(value) => CellValue::Number(value.as_f64()),
        Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
    }
}
