//! This module provides the `TableLoader` struct, responsible for loading rule
//! tables from files, directories and strings. Files ending in `.json` are read
//! with `serde_json`; everything else goes through the `.tm` parser.

use crate::parser::parse;
use crate::rules::RuleTable;
use crate::types::{MachineError, MAX_TABLE_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions recognized when scanning a directory.
const TABLE_EXTENSIONS: [&str; 2] = ["tm", "json"];

/// `TableLoader` is a utility struct for loading rule tables.
pub struct TableLoader;

impl TableLoader {
    /// Loads a single table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(RuleTable)` if the file is successfully read, parsed and validated.
    /// * `Err(MachineError::FileError)` if the file cannot be read, is too large or
    ///   holds invalid JSON.
    /// * `Err(MachineError::ParseError)` / `Err(MachineError::MalformedTable)` for
    ///   invalid `.tm` content.
    pub fn load_table(path: &Path) -> Result<RuleTable, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_TABLE_SIZE {
            return Err(MachineError::FileError(format!(
                "File {} exceeds the maximum table size of {} bytes",
                path.display(),
                MAX_TABLE_SIZE
            )));
        }

        debug!(path = %path.display(), "Loading table");

        if has_extension(path, "json") {
            Self::load_table_from_json(&content)
        } else {
            Self::load_table_from_string(&content)
        }
    }

    /// Loads a single table from `.tm` source held in memory.
    pub fn load_table_from_string(content: &str) -> Result<RuleTable, MachineError> {
        parse(content)
    }

    /// Loads a single table from its JSON form.
    pub fn load_table_from_json(content: &str) -> Result<RuleTable, MachineError> {
        serde_json::from_str(content)
            .map_err(|e| MachineError::FileError(format!("Invalid table JSON: {e}")))
    }

    /// Loads every table file (`.tm` or `.json`) from a given directory.
    ///
    /// Directories and other files are skipped. Each element of the result is
    /// either the loaded table with its path or the error for that file.
    pub fn load_tables(directory: &Path) -> Vec<Result<(PathBuf, RuleTable), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir() || !TABLE_EXTENSIONS.iter().any(|ext| has_extension(&path, ext)) {
                    return None;
                }

                match Self::load_table(&path) {
                    Ok(table) => Some(Ok((path, table))),
                    Err(e) => Some(Err(MachineError::FileError(format!(
                        "Failed to load table from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect::<Vec<_>>();

        // Directory order is platform dependent.
        results.sort_by_key(|result| result.as_ref().ok().map(|(path, _)| path.clone()));
        results
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
