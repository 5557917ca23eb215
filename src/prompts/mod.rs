//! Instruction prefix for the dataset agent
//!
//! The prefix grounds the model in the loaded table: a fixed boilerplate
//! describing the dataframe, the data dictionary, the reference date for
//! relative-date questions, and the rules for answering.

use crate::dataset::{DataDictionary, DataFrame};
use chrono::NaiveDate;

/// Builds the system instruction prefix for a dataset
///
/// # Arguments
///
/// * `frame` - The loaded dataset
/// * `dictionary` - Column descriptions (may be empty)
/// * `as_of_date` - Date the model should treat as today
///
/// # Returns
///
/// The instruction text sent as the system message of every question
///
/// # Examples
///
/// ```
/// use askcsv::dataset::{DataDictionary, DataFrame};
/// use askcsv::prompts::build_instruction_prefix;
/// use chrono::NaiveDate;
///
/// let df = DataFrame::from_reader("id,score\n1,9.5\n".as_bytes()).unwrap();
/// let dict = DataDictionary::from_text("score: judge score out of 10");
/// let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
///
/// let prefix = build_instruction_prefix(&df, &dict, date);
/// assert!(prefix.contains("score: judge score out of 10"));
/// assert!(prefix.contains("Today's date is 2023-06-01"));
/// ```
pub fn build_instruction_prefix(
    frame: &DataFrame,
    dictionary: &DataDictionary,
    as_of_date: NaiveDate,
) -> String {
    let columns = frame
        .columns()
        .iter()
        .map(|name| {
            let column_type = frame
                .column_type(name)
                .map(|t| t.to_string())
                .unwrap_or_else(|_| "text".to_string());
            format!("- {} ({})", name, column_type)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let dictionary_section = if dictionary.is_empty() {
        "No data dictionary was provided. Infer column meaning from names and values.".to_string()
    } else {
        dictionary.text().to_string()
    };

    format!(
        r#"You are working with a table of data loaded from a CSV file. The table is called `df`.
It has {rows} rows and the following columns:
{columns}

You cannot see the rows directly. Use the provided tools to inspect, filter,
aggregate, group and sort the table. Every tool works on `df`.

DATA DICTIONARY:
{dictionary}

Today's date is {date}. Resolve relative dates ("last month", "this year") against it.

ANSWERING RULES:
- Use the tools to look at the data before answering. Do not guess values.
- Never invent rows, columns or numbers that the tools did not return.
- Answer concisely in plain language, including the key figures.
- If the data cannot answer the question, say so and explain what is missing."#,
        rows = frame.row_count(),
        columns = columns,
        dictionary = dictionary_section,
        date = as_of_date.format("%Y-%m-%d"),
    )
}

/// Resolves the reference date from configuration, defaulting to today
///
/// # Errors
///
/// Returns error if the configured date is not `YYYY-MM-DD`
pub fn resolve_as_of_date(configured: Option<&str>) -> crate::error::Result<NaiveDate> {
    match configured {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
            crate::error::AskCsvError::Config(format!("Invalid as_of_date '{}': {}", text, e))
                .into()
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
