//! Tabular dataset loaded from CSV
//!
//! The frame is loaded once per agent construction and is read-only after
//! that. Cells are kept as strings; column types are inferred on demand for
//! descriptions and numeric operations.

pub mod dictionary;
pub mod ops;

pub use dictionary::DataDictionary;
pub use ops::{AggFunc, AggValue, ColumnSummary, Condition, FilterOp};

use crate::error::{AskCsvError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every non-empty cell parses as an integer
    Integer,
    /// Every non-empty cell parses as a number
    Float,
    /// Every non-empty cell is `true` or `false`
    Boolean,
    /// Anything else
    Text,
    /// No non-empty cells
    Empty,
}

impl ColumnType {
    /// Whether numeric aggregations make sense for this column
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Empty => "empty",
        };
        write!(f, "{}", name)
    }
}

/// Rows by named columns, all cells stored as text
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataFrame {
    /// Build a frame from headers and rows
    ///
    /// Rows shorter or longer than the header are padded or truncated.
    ///
    /// # Errors
    ///
    /// Returns error if the header is empty or contains duplicates
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(|c| c.trim().to_string()).collect();

        if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
            return Err(AskCsvError::Dataset("CSV has no header row".to_string()).into());
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(
                    AskCsvError::Dataset(format!("Duplicate column name: {}", column)).into(),
                );
            }
        }

        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Load a frame from a CSV file with a header row
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or parsed
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AskCsvError::Dataset(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let frame = Self::from_reader(file)?;
        tracing::info!(
            "Loaded dataset {} ({} rows, {} columns)",
            path.display(),
            frame.row_count(),
            frame.columns.len()
        );
        Ok(frame)
    }

    /// Parse CSV from any reader
    ///
    /// # Errors
    ///
    /// Returns error on malformed CSV, an empty header, or duplicate headers
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(AskCsvError::from)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(AskCsvError::from)?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Self::new(columns, rows)
    }

    /// Column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A single row by index
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Cell value at row/column position
    pub(crate) fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Resolve a column name to its index
    ///
    /// Exact matches win; otherwise a unique case-insensitive match is used.
    ///
    /// # Errors
    ///
    /// Returns error naming the known columns when nothing matches
    pub fn column_index(&self, name: &str) -> Result<usize> {
        let name = name.trim();
        if let Some(idx) = self.columns.iter().position(|c| c == name) {
            return Ok(idx);
        }

        let folded: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
            .collect();
        if folded.len() == 1 {
            return Ok(folded[0]);
        }

        Err(AskCsvError::Dataset(format!(
            "Unknown column '{}'. Known columns: {}",
            name,
            self.columns.join(", ")
        ))
        .into())
    }

    /// Inferred type of a column by name
    ///
    /// # Errors
    ///
    /// Returns error if the column does not exist
    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        let idx = self.column_index(name)?;
        Ok(self.infer_type(idx))
    }

    pub(crate) fn infer_type(&self, column: usize) -> ColumnType {
        let mut saw_value = false;
        let mut all_int = true;
        let mut all_num = true;
        let mut all_bool = true;

        for row in 0..self.rows.len() {
            let cell = self.cell(row, column).trim();
            if cell.is_empty() {
                continue;
            }
            saw_value = true;
            if all_int && cell.parse::<i64>().is_err() {
                all_int = false;
            }
            if all_num && ops::parse_number(cell).is_none() {
                all_num = false;
            }
            if all_bool && !(cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false"))
            {
                all_bool = false;
            }
            if !all_int && !all_num && !all_bool {
                return ColumnType::Text;
            }
        }

        match (saw_value, all_int, all_num, all_bool) {
            (false, _, _, _) => ColumnType::Empty,
            (true, true, _, _) => ColumnType::Integer,
            (true, _, true, _) => ColumnType::Float,
            (true, _, _, true) => ColumnType::Boolean,
            _ => ColumnType::Text,
        }
    }

    /// All row indices in order
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }

    /// Render the first `n` rows
    pub fn head(&self, n: usize) -> String {
        let rows: Vec<usize> = (0..n.min(self.rows.len())).collect();
        self.render(&rows, n)
    }

    /// Render selected rows as a pipe-delimited table
    ///
    /// At most `max_rows` rows are printed; a trailing line reports how many
    /// were left out.
    pub fn render(&self, rows: &[usize], max_rows: usize) -> String {
        let columns: Vec<usize> = (0..self.columns.len()).collect();
        self.render_columns(rows, &columns, max_rows)
    }

    /// Render selected rows restricted to the given column indices
    pub fn render_columns(&self, rows: &[usize], columns: &[usize], max_rows: usize) -> String {
        let mut out = String::new();
        let header: Vec<&str> = columns
            .iter()
            .filter_map(|&c| self.columns.get(c).map(|s| s.as_str()))
            .collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));

        for &row in rows.iter().take(max_rows) {
            let cells: Vec<&str> = columns.iter().map(|&c| self.cell(row, c)).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        if rows.len() > max_rows {
            out.push_str(&format!("... ({} more rows)\n", rows.len() - max_rows));
        }
        out.push_str(&format!("[{} rows]", rows.len()));
        out
    }
}
