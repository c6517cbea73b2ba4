use std::path::{Path, PathBuf};

use crate::{ConfigError, SheetliftResult};

const WORKBOOK_SUFFIXES: &[&str] = &[".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub name: String,
    pub stem: String,
}

impl InputFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        Self { path, name, stem }
    }
}

/// Resolves `source.path` into the workbooks to process. A directory yields
/// every workbook inside it, a pattern is expanded with glob, and anything else
/// is taken as a single file even if it does not exist yet, so the per-file run
/// reports it as missing.
pub fn resolve_inputs(config_dir: &Path, raw_path: &str) -> SheetliftResult<Vec<InputFile>> {
    if is_glob_pattern(raw_path) {
        let pattern = if Path::new(raw_path).is_absolute() {
            raw_path.to_string()
        } else {
            let base = glob::Pattern::escape(&config_dir.display().to_string());
            format!("{}/{}", base.trim_end_matches('/'), raw_path)
        };
        return expand_glob(&pattern);
    }

    let path = resolve_local_path(config_dir, raw_path);
    if path.is_dir() {
        let base = glob::Pattern::escape(&path.display().to_string());
        let mut files = Vec::new();
        for suffix in WORKBOOK_SUFFIXES {
            let pattern = format!("{}/{}", base.trim_end_matches('/'), glob_for_suffix(suffix));
            files.extend(expand_glob(&pattern)?);
        }
        files.sort_by(|left, right| left.path.cmp(&right.path));
        files.dedup();
        return Ok(files);
    }

    Ok(vec![InputFile::new(path)])
}

pub fn resolve_local_path(config_dir: &Path, raw_path: &str) -> PathBuf {
    let path = Path::new(raw_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

fn expand_glob(pattern: &str) -> SheetliftResult<Vec<InputFile>> {
    let entries = glob::glob(pattern).map_err(|err| {
        Box::new(ConfigError(format!(
            "invalid source.path pattern {pattern}: {err}"
        )))
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| {
            Box::new(ConfigError(format!(
                "failed to expand source.path pattern {pattern}: {err}"
            )))
        })?;
        if path.is_file() && !is_lock_file(&path) {
            files.push(InputFile::new(path));
        }
    }
    files.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(files)
}

pub fn is_glob_pattern(value: &str) -> bool {
    value.contains(['*', '?', '['])
}

// Office leaves "~$name.xlsx" owner files next to open workbooks.
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with("~$"))
        .unwrap_or(false)
}

fn glob_for_suffix(suffix: &str) -> String {
    let mut out = String::from("*");
    for ch in suffix.chars() {
        if ch.is_ascii_alphabetic() {
            out.push('[');
            out.push(ch.to_ascii_lowercase());
            out.push(ch.to_ascii_uppercase());
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}
