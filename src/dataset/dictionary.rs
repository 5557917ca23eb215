//! Data dictionary describing dataset columns

use crate::error::{AskCsvError, Result};
use std::path::{Path, PathBuf};

/// Human-readable column descriptions injected into the agent instructions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDictionary {
    text: String,
    source: Option<PathBuf>,
}

impl DataDictionary {
    /// Load a dictionary from disk
    ///
    /// A `.csv` file is read as `column,description` pairs (header row
    /// skipped) and rendered as `column: description` lines. Any other file
    /// is used verbatim. A missing file yields an empty dictionary and a
    /// warning, since the agent can still answer from the data alone.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "Data dictionary not found at {}, continuing without one",
                path.display()
            );
            return Ok(Self::default());
        }

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let text = if is_csv {
            let file = std::fs::File::open(path).map_err(|e| {
                AskCsvError::Dictionary(format!("Failed to open {}: {}", path.display(), e))
            })?;
            Self::render_csv(file)?
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| {
                    AskCsvError::Dictionary(format!("Failed to read {}: {}", path.display(), e))
                })?
                .trim_end()
                .to_string()
        };

        tracing::debug!(
            "Loaded data dictionary from {} ({} bytes)",
            path.display(),
            text.len()
        );

        Ok(Self {
            text,
            source: Some(path.to_path_buf()),
        })
    }

    /// Build a dictionary from literal text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    fn render_csv<R: std::io::Read>(reader: R) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut lines = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| AskCsvError::Dictionary(format!("Invalid CSV: {}", e)))?;
            let column = record.get(0).unwrap_or("").trim();
            if column.is_empty() {
                continue;
            }
            let description = record.get(1).unwrap_or("").trim();
            lines.push(format!("{}: {}", column, description));
        }
        Ok(lines.join("\n"))
    }

    /// Dictionary text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether there is anything to show the model
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// File the dictionary came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
