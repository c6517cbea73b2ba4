use std::collections::HashMap;
use std::fmt;

use crate::errors::SourceError;
use crate::model::format_decimal;
use crate::SheetliftResult;

const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single spreadsheet cell as read from the workbook, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }

    /// Missing cells, whitespace-only text, NaN numbers and the usual
    /// missing-value markers (`NULL`, `N/A`, `#N/A`, `None`, `nan`, ...) all
    /// count as blank. Markers match exactly after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Text(value) => {
                let trimmed = value.trim();
                trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
            }
            CellValue::Number(value) => value.is_nan(),
        }
    }

    /// Trimmed textual form of the cell, `None` when blank. Numbers use the
    /// locale-free decimal rendering.
    pub fn trimmed_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            CellValue::Missing => None,
            CellValue::Text(value) => Some(value.trim().to_string()),
            CellValue::Number(value) => Some(format_decimal(*value)),
        }
    }
}

/// Addresses a column either by its header text or by its absolute position
/// (0-based, column A is 0).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Name(String),
    Position(usize),
}

impl ColumnRef {
    pub fn name(value: &str) -> Self {
        ColumnRef::Name(value.to_string())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => write!(f, "{name:?}"),
            ColumnRef::Position(position) => write!(f, "column {position}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub position: usize,
    pub name: Option<String>,
}

impl Column {
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("column {}", self.position),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
}

impl Header {
    pub fn from_cells(cells: &[CellValue]) -> Self {
        let mut columns = Vec::with_capacity(cells.len());
        let mut by_name = HashMap::new();
        for (position, cell) in cells.iter().enumerate() {
            let name = cell.trimmed_text();
            if let Some(name) = &name {
                by_name.entry(header_key(name)).or_insert(position);
            }
            columns.push(Column { position, name });
        }
        Self { columns, by_name }
    }

    pub fn from_names(names: &[&str]) -> Self {
        let cells = names
            .iter()
            .map(|name| CellValue::text(name))
            .collect::<Vec<_>>();
        Self::from_cells(&cells)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn resolve(&self, column: &ColumnRef) -> Option<usize> {
        match column {
            ColumnRef::Name(name) => self.by_name.get(&header_key(name)).copied(),
            ColumnRef::Position(position) => Some(*position),
        }
    }
}

/// Header matching ignores case and surrounding or repeated whitespace.
fn header_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// One data row. `index` is 0 for the first row below the header.
#[derive(Debug, Clone)]
pub struct RawRow<'a> {
    pub index: usize,
    header: &'a Header,
    cells: Vec<CellValue>,
}

static MISSING: CellValue = CellValue::Missing;

impl<'a> RawRow<'a> {
    pub fn new(index: usize, header: &'a Header, cells: Vec<CellValue>) -> Self {
        Self {
            index,
            header,
            cells,
        }
    }

    pub fn get(&self, column: &ColumnRef) -> &CellValue {
        self.header
            .resolve(column)
            .and_then(|position| self.cells.get(position))
            .unwrap_or(&MISSING)
    }

    /// Cells in column order, labelled by header text or `column N` when the
    /// header cell is blank.
    pub fn fields(&self) -> impl Iterator<Item = (String, &CellValue)> + '_ {
        self.cells.iter().enumerate().map(|(position, cell)| {
            let label = self
                .header
                .columns()
                .get(position)
                .map(Column::label)
                .unwrap_or_else(|| format!("column {position}"));
            (label, cell)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Exact(String),
    Contains(String),
}

impl SheetSelector {
    /// Exact matches are case-sensitive; fragment matches ignore case and take
    /// the first sheet in workbook order.
    pub fn select<'a>(&self, names: &'a [String]) -> Option<&'a str> {
        match self {
            SheetSelector::Exact(expected) => names
                .iter()
                .find(|name| name.as_str() == expected)
                .map(String::as_str),
            SheetSelector::Contains(fragment) => {
                let fragment = fragment.to_lowercase();
                names
                    .iter()
                    .find(|name| name.to_lowercase().contains(&fragment))
                    .map(String::as_str)
            }
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Exact(name) => write!(f, "sheet {name:?}"),
            SheetSelector::Contains(fragment) => write!(f, "sheet containing {fragment:?}"),
        }
    }
}

/// Random access to a sheet's cells in absolute coordinates.
pub trait Grid {
    fn height(&self) -> usize;
    fn width(&self) -> usize;
    fn cell(&self, row: usize, col: usize) -> CellValue;
}

pub trait TabularSource {
    fn sheet_names(&self) -> Vec<String>;
    fn open_sheet(&mut self, name: &str) -> SheetliftResult<Box<dyn Grid>>;
}

pub struct SheetRows {
    pub sheet_name: String,
    header: Header,
    header_row: Option<usize>,
    grid: Box<dyn Grid>,
}

impl SheetRows {
    /// The header is always the sheet's first row, blank or not, so data
    /// indexes do not shift when a workbook starts with an empty line.
    pub fn new(sheet_name: &str, grid: Box<dyn Grid>) -> Self {
        let width = grid.width();
        let header_row = (grid.height() > 0).then_some(0);
        let header = match header_row {
            Some(row) => {
                let cells = (0..width)
                    .map(|col| grid.cell(row, col))
                    .collect::<Vec<_>>();
                Header::from_cells(&cells)
            }
            None => Header::default(),
        };
        Self {
            sheet_name: sheet_name.to_string(),
            header,
            header_row,
            grid,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn len(&self) -> usize {
        match self.header_row {
            Some(row) => self.grid.height().saturating_sub(row + 1),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows are materialized one at a time; calling `iter` again restarts
    /// from the first data row.
    pub fn iter(&self) -> impl Iterator<Item = RawRow<'_>> + '_ {
        let first = self.header_row.map(|row| row + 1).unwrap_or(0);
        let width = self.grid.width();
        (0..self.len()).map(move |index| {
            let row = first + index;
            let cells = (0..width)
                .map(|col| self.grid.cell(row, col))
                .collect::<Vec<_>>();
            RawRow::new(index, &self.header, cells)
        })
    }
}

pub fn extract_rows(
    source: &mut dyn TabularSource,
    selector: &SheetSelector,
) -> SheetliftResult<SheetRows> {
    let names = source.sheet_names();
    let sheet_name = selector
        .select(&names)
        .ok_or_else(|| SourceError::SheetNotFound {
            selector: selector.to_string(),
            available: names.clone(),
        })?
        .to_string();
    tracing::debug!(sheet = %sheet_name, %selector, "sheet selected");
    let grid = source.open_sheet(&sheet_name)?;
    Ok(SheetRows::new(&sheet_name, grid))
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    rows: Vec<Vec<CellValue>>,
}

impl MemoryGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }
}

impl Grid for MemoryGrid {
    fn height(&self) -> usize {
        self.rows.len()
    }

    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .cloned()
            .unwrap_or(CellValue::Missing)
    }
}

/// In-memory workbook, handy for feeding rows that did not come from a file.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, MemoryGrid)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push((name.to_string(), MemoryGrid::new(rows)));
        self
    }
}

impl TabularSource for MemorySource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn open_sheet(&mut self, name: &str) -> SheetliftResult<Box<dyn Grid>> {
        let grid = self
            .sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| SourceError::SheetNotFound {
                selector: format!("sheet {name:?}"),
                available: self.sheet_names(),
            })?;
        Ok(Box::new(grid))
    }
}
