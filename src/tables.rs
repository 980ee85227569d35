use crate::analyzer::analyze;
use crate::rules::RuleTable;
use crate::types::{MachineError, State};

use std::sync::RwLock;
use tracing::warn;

// Embedded tables
const TABLE_TEXTS: [&str; 3] = [
    include_str!("../tables/four-state-beaver.tm"),
    include_str!("../tables/busy-beaver-2.tm"),
    include_str!("../tables/busy-beaver-3.tm"),
];

lazy_static::lazy_static! {
    pub static ref TABLES: RwLock<Vec<RuleTable>> = RwLock::new(Vec::new());
}

pub struct TableManager;

impl TableManager {
    /// Parses the embedded tables into `TABLES`. Safe to call repeatedly.
    pub fn load() -> Result<(), MachineError> {
        if TABLES.read().is_ok_and(|tables| !tables.is_empty()) {
            return Ok(());
        }

        let mut tables = Vec::new();
        for text in TABLE_TEXTS {
            match crate::parser::parse(text) {
                Ok(table) => tables.push(table),
                Err(e) => warn!(error = %e, "Failed to parse embedded table"),
            }
        }

        let mut guard = TABLES
            .write()
            .map_err(|_| MachineError::FileError("Failed to acquire write lock".to_string()))?;
        *guard = tables;

        Ok(())
    }

    /// Get the number of available tables
    pub fn count() -> usize {
        let _ = Self::load();

        TABLES.read().map(|tables| tables.len()).unwrap_or(0)
    }

    /// Get a table by its index
    pub fn by_index(index: usize) -> Result<RuleTable, MachineError> {
        let _ = Self::load();

        TABLES
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| MachineError::FileError(format!("Table index {} out of range", index)))
    }

    /// Get a table by its name, ignoring case
    pub fn by_name(name: &str) -> Result<RuleTable, MachineError> {
        let _ = Self::load();

        TABLES
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|table| table.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| MachineError::FileError(format!("Table '{}' not found", name)))
    }

    /// List all table names
    pub fn names() -> Vec<String> {
        let _ = Self::load();

        TABLES
            .read()
            .map(|tables| tables.iter().map(|t| t.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Get information about a table by its index
    pub fn info(index: usize) -> Result<TableInfo, MachineError> {
        let table = Self::by_index(index)?;

        Ok(TableInfo {
            index,
            name: table.name().to_string(),
            state_count: table.state_count(),
            symbol_count: table.symbol_count(),
            halting_transitions: table
                .rows()
                .flatten()
                .filter(|t| t.next_state == State::Halted)
                .count(),
            warnings: analyze(&table).len(),
        })
    }

    /// Search for tables by name
    pub fn search(query: &str) -> Vec<usize> {
        let _ = Self::load();
        let query = query.to_lowercase();

        TABLES
            .read()
            .map(|tables| {
                tables
                    .iter()
                    .enumerate()
                    .filter(|(_, table)| table.name().to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the original source of a table by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, MachineError> {
        TABLE_TEXTS.get(index).copied().ok_or_else(|| {
            MachineError::FileError(format!("Table text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct TableInfo {
    pub index: usize,
    pub name: String,
    pub state_count: usize,
    pub symbol_count: usize,
    pub halting_transitions: usize,
    pub warnings: usize,
}
