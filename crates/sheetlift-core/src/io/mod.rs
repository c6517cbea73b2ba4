pub mod inputs;
pub mod source;
pub mod xlsx;

pub use inputs::{is_glob_pattern, resolve_inputs, resolve_local_path, InputFile};
pub use source::{
    extract_rows, CellValue, Column, ColumnRef, Grid, Header, MemorySource, RawRow,
    SheetRows, SheetSelector, TabularSource,
};
pub use xlsx::XlsxSource;
