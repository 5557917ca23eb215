//! Query operations over a [`DataFrame`]
//!
//! These are the primitives the agent's table tools are built on: row
//! filtering, column aggregation, grouping, value counts, sorting and a
//! per-column description.

use super::{ColumnType, DataFrame};
use crate::error::{AskCsvError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Comparison operator used in a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[serde(alias = "==", alias = "=")]
    Eq,
    #[serde(alias = "!=")]
    Ne,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Ge,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Le,
    Contains,
    StartsWith,
    IsEmpty,
    NotEmpty,
}

impl FilterOp {
    fn needs_value(&self) -> bool {
        !matches!(self, Self::IsEmpty | Self::NotEmpty)
    }
}

/// A single `{column, op, value}` filter condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column name
    pub column: String,
    /// Operator
    pub op: FilterOp,
    /// Right-hand side; numbers and booleans are accepted and compared as text
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
}

impl Condition {
    /// Build a condition
    pub fn new(column: impl Into<String>, op: FilterOp, value: Option<&str>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.map(|v| v.to_string()),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Aggregation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Count,
    Sum,
    #[serde(alias = "avg", alias = "average")]
    Mean,
    Min,
    Max,
    #[serde(alias = "distinct", alias = "unique")]
    Nunique,
    Median,
}

impl AggFunc {
    fn is_numeric(&self) -> bool {
        !matches!(self, Self::Count | Self::Nunique)
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Nunique => "nunique",
            Self::Median => "median",
        };
        write!(f, "{}", name)
    }
}

/// Result of an aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggValue {
    /// Count-like result
    Count(usize),
    /// Numeric result
    Number(f64),
}

impl AggValue {
    /// Numeric view of the value
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Count(n) => *n as f64,
            Self::Number(v) => *v,
        }
    }
}

impl fmt::Display for AggValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Number(v) => write!(f, "{}", format_number(*v)),
        }
    }
}

/// Summary statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub non_empty: usize,
    pub unique: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// Parse a cell as a finite number
///
/// Surrounding whitespace and thousands separators are ignored.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a number without a trailing `.0` for whole values
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.4}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Numeric-aware comparison: numbers by value, numbers before text, text
/// lexically
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn matches_condition(cell: &str, op: FilterOp, value: &str) -> bool {
    match op {
        FilterOp::IsEmpty => cell.trim().is_empty(),
        FilterOp::NotEmpty => !cell.trim().is_empty(),
        FilterOp::Contains => cell.to_lowercase().contains(&value.to_lowercase()),
        FilterOp::StartsWith => cell.starts_with(value),
        _ => {
            let ordering = match (parse_number(cell), parse_number(value)) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => {
                    if matches!(op, FilterOp::Gt | FilterOp::Ge | FilterOp::Lt | FilterOp::Le)
                        && cell.trim().is_empty()
                    {
                        None
                    } else {
                        Some(cell.cmp(value))
                    }
                }
            };
            match (op, ordering) {
                (_, None) => false,
                (FilterOp::Eq, Some(o)) => o == Ordering::Equal,
                (FilterOp::Ne, Some(o)) => o != Ordering::Equal,
                (FilterOp::Gt, Some(o)) => o == Ordering::Greater,
                (FilterOp::Ge, Some(o)) => o != Ordering::Less,
                (FilterOp::Lt, Some(o)) => o == Ordering::Less,
                (FilterOp::Le, Some(o)) => o != Ordering::Greater,
                _ => false,
            }
        }
    }
}

impl DataFrame {
    /// Summarize every column
    pub fn describe(&self) -> Vec<ColumnSummary> {
        (0..self.columns().len())
            .map(|col| {
                let mut non_empty = 0;
                let mut unique = HashSet::new();
                let mut numbers = Vec::new();
                for row in 0..self.row_count() {
                    let cell = self.cell(row, col);
                    if cell.trim().is_empty() {
                        continue;
                    }
                    non_empty += 1;
                    unique.insert(cell);
                    if let Some(v) = parse_number(cell) {
                        numbers.push(v);
                    }
                }

                let column_type = self.infer_type(col);
                let (min, max, mean) = if column_type.is_numeric() && !numbers.is_empty() {
                    let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                    (Some(min), Some(max), Some(mean))
                } else {
                    (None, None, None)
                };

                ColumnSummary {
                    name: self.columns()[col].clone(),
                    column_type,
                    non_empty,
                    unique: unique.len(),
                    min,
                    max,
                    mean,
                }
            })
            .collect()
    }

    /// Row indices matching every condition
    ///
    /// # Errors
    ///
    /// Returns error for unknown columns or a missing comparison value
    pub fn filter(&self, conditions: &[Condition]) -> Result<Vec<usize>> {
        let mut resolved = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let idx = self.column_index(&condition.column)?;
            let value = match (&condition.value, condition.op.needs_value()) {
                (Some(v), _) => v.as_str(),
                (None, false) => "",
                (None, true) => {
                    return Err(AskCsvError::Dataset(format!(
                        "Filter on '{}' with {:?} needs a value",
                        condition.column, condition.op
                    ))
                    .into())
                }
            };
            resolved.push((idx, condition.op, value));
        }

        Ok((0..self.row_count())
            .filter(|&row| {
                resolved
                    .iter()
                    .all(|(col, op, value)| matches_condition(self.cell(row, *col), *op, value))
            })
            .collect())
    }

    /// Aggregate a column over all rows
    ///
    /// # Errors
    ///
    /// Returns error for unknown columns, or a numeric function on a column
    /// with no numeric values
    pub fn aggregate(&self, column: &str, func: AggFunc) -> Result<AggValue> {
        let col = self.column_index(column)?;
        self.aggregate_rows(col, func, &self.all_rows())
    }

    /// Aggregate a column over a subset of rows
    pub fn aggregate_rows(&self, col: usize, func: AggFunc, rows: &[usize]) -> Result<AggValue> {
        let cells: Vec<&str> = rows
            .iter()
            .map(|&r| self.cell(r, col))
            .filter(|c| !c.trim().is_empty())
            .collect();

        if !func.is_numeric() {
            let n = match func {
                AggFunc::Nunique => cells.iter().collect::<HashSet<_>>().len(),
                _ => cells.len(),
            };
            return Ok(AggValue::Count(n));
        }

        let mut numbers: Vec<f64> = cells.into_iter().filter_map(parse_number).collect();
        if numbers.is_empty() {
            return Err(AskCsvError::Dataset(format!(
                "Column '{}' has no numeric values for {}",
                self.columns()[col],
                func
            ))
            .into());
        }

        let value = match func {
            AggFunc::Mean => numbers.iter().sum::<f64>() / numbers.len() as f64,
            AggFunc::Min => numbers.iter().cloned().fold(f64::INFINITY, f64::min),
            AggFunc::Max => numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            AggFunc::Median => {
                numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                let mid = numbers.len() / 2;
                if numbers.len() % 2 == 0 {
                    (numbers[mid - 1] + numbers[mid]) / 2.0
                } else {
                    numbers[mid]
                }
            }
            _ => numbers.iter().sum(),
        };
        Ok(AggValue::Number(value))
    }

    /// Frequency of each non-empty value, most frequent first
    ///
    /// Ties are ordered by value.
    pub fn value_counts(&self, column: &str, limit: Option<usize>) -> Result<Vec<(String, usize)>> {
        let col = self.column_index(column)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in 0..self.row_count() {
            let cell = self.cell(row, col);
            if !cell.trim().is_empty() {
                *counts.entry(cell).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| compare_cells(&a.0, &b.0)));
        if let Some(limit) = limit {
            counts.truncate(limit);
        }
        Ok(counts)
    }

    /// Aggregate `column` per distinct value of `by`, sorted by group key
    ///
    /// Rows with an empty key are skipped. Groups with no numeric values are
    /// left out of numeric aggregations.
    ///
    /// # Errors
    ///
    /// Returns error for unknown columns, or when no group yields a value
    pub fn group_by(&self, by: &str, column: &str, func: AggFunc) -> Result<Vec<(String, AggValue)>> {
        let key_col = self.column_index(by)?;
        let value_col = self.column_index(column)?;

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for row in 0..self.row_count() {
            let key = self.cell(row, key_col);
            if !key.trim().is_empty() {
                groups.entry(key).or_default().push(row);
            }
        }

        let mut out = Vec::with_capacity(groups.len());
        for (key, rows) in &groups {
            match self.aggregate_rows(value_col, func, rows) {
                Ok(value) => out.push((key.to_string(), value)),
                Err(e) if func.is_numeric() => {
                    tracing::debug!("Skipping group {}: {}", key, e);
                }
                Err(e) => return Err(e),
            }
        }

        if out.is_empty() && !groups.is_empty() {
            return Err(AskCsvError::Dataset(format!(
                "Column '{}' has no numeric values for {}",
                column, func
            ))
            .into());
        }

        out.sort_by(|a, b| compare_cells(&a.0, &b.0));
        Ok(out)
    }

    /// Row indices ordered by a column
    ///
    /// The sort is stable and numeric-aware; empty cells always sort last.
    pub fn sort_by(&self, column: &str, descending: bool) -> Result<Vec<usize>> {
        let col = self.column_index(column)?;
        let mut rows = self.all_rows();
        rows.sort_by(|&a, &b| {
            let (x, y) = (self.cell(a, col), self.cell(b, col));
            match (x.trim().is_empty(), y.trim().is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_cells(x, y);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            }
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTINGS: &str = "\
name,city,price,rooms
Loft,Austin,120.5,1
Cottage,Denver,95,2
Villa,Austin,310,4
Studio,Boston,,1
Cabin,denver,80,2
";

    fn frame() -> DataFrame {
        DataFrame::from_reader(LISTINGS.as_bytes()).unwrap()
    }

    fn names(df: &DataFrame, rows: &[usize]) -> Vec<String> {
        rows.iter().map(|&r| df.row(r).unwrap()[0].clone()).collect()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("1,250.5"), Some(1250.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("Austin"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(606.0), "606");
        assert_eq!(format_number(151.375), "151.375");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn test_filter_numeric_comparison() {
        let df = frame();
        let rows = df
            .filter(&[Condition::new("price", FilterOp::Gt, Some("100"))])
            .unwrap();
        assert_eq!(names(&df, &rows), vec!["Loft", "Villa"]);
    }

    #[test]
    fn test_filter_conjunction() {
        let df = frame();
        let rows = df
            .filter(&[
                Condition::new("city", FilterOp::Eq, Some("Austin")),
                Condition::new("rooms", FilterOp::Ge, Some("2")),
            ])
            .unwrap();
        assert_eq!(names(&df, &rows), vec!["Villa"]);
    }

    #[test]
    fn test_filter_contains_is_case_insensitive() {
        let df = frame();
        let rows = df
            .filter(&[Condition::new("city", FilterOp::Contains, Some("DENVER"))])
            .unwrap();
        assert_eq!(names(&df, &rows), vec!["Cottage", "Cabin"]);
    }

    #[test]
    fn test_filter_eq_is_case_sensitive() {
        let df = frame();
        let rows = df
            .filter(&[Condition::new("city", FilterOp::Eq, Some("Denver"))])
            .unwrap();
        assert_eq!(names(&df, &rows), vec!["Cottage"]);
    }

    #[test]
    fn test_filter_empty_checks() {
        let df = frame();
        let empty = df
            .filter(&[Condition::new("price", FilterOp::IsEmpty, None)])
            .unwrap();
        assert_eq!(names(&df, &empty), vec!["Studio"]);
        let lt = df
            .filter(&[Condition::new("price", FilterOp::Lt, Some("100"))])
            .unwrap();
        assert_eq!(names(&df, &lt), vec!["Cottage", "Cabin"]);
    }

    #[test]
    fn test_filter_missing_value_is_error() {
        let df = frame();
        assert!(df
            .filter(&[Condition::new("price", FilterOp::Gt, None)])
            .is_err());
    }

    #[test]
    fn test_filter_unknown_column_is_error() {
        let df = frame();
        let err = df
            .filter(&[Condition::new("cost", FilterOp::Eq, Some("1"))])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown column 'cost'"));
    }

    #[test]
    fn test_condition_deserialize_accepts_numbers_and_symbols() {
        let condition: Condition =
            serde_json::from_str(r#"{"column": "price", "op": ">=", "value": 95}"#).unwrap();
        assert_eq!(condition.op, FilterOp::Ge);
        assert_eq!(condition.value.as_deref(), Some("95"));

        let condition: Condition =
            serde_json::from_str(r#"{"column": "price", "op": "is_empty"}"#).unwrap();
        assert_eq!(condition.value, None);
    }

    #[test]
    fn test_aggregate_functions() {
        let df = frame();
        assert_eq!(df.aggregate("price", AggFunc::Count).unwrap(), AggValue::Count(4));
        assert_eq!(
            df.aggregate("price", AggFunc::Sum).unwrap(),
            AggValue::Number(605.5)
        );
        assert_eq!(
            df.aggregate("price", AggFunc::Min).unwrap(),
            AggValue::Number(80.0)
        );
        assert_eq!(
            df.aggregate("price", AggFunc::Max).unwrap(),
            AggValue::Number(310.0)
        );
        assert_eq!(
            df.aggregate("price", AggFunc::Median).unwrap(),
            AggValue::Number(107.75)
        );
        assert_eq!(
            df.aggregate("city", AggFunc::Nunique).unwrap(),
            AggValue::Count(4)
        );
        let mean = df.aggregate("price", AggFunc::Mean).unwrap().as_f64();
        assert!((mean - 151.375).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_numeric_on_text_is_error() {
        let df = frame();
        assert!(df.aggregate("city", AggFunc::Sum).is_err());
    }

    #[test]
    fn test_value_counts_orders_by_count_then_value() {
        let df = frame();
        let counts = df.value_counts("rooms", None).unwrap();
        assert_eq!(
            counts,
            vec![
                ("1".to_string(), 2),
                ("2".to_string(), 2),
                ("4".to_string(), 1)
            ]
        );
        let top = df.value_counts("city", Some(1)).unwrap();
        assert_eq!(top, vec![("Austin".to_string(), 2)]);
    }

    #[test]
    fn test_group_by_mean() {
        let df = frame();
        let groups = df.group_by("city", "price", AggFunc::Mean).unwrap();
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        // Boston has no price, so it drops out of a numeric aggregation
        assert_eq!(keys, vec!["Austin", "Denver", "denver"]);
        assert!((groups[0].1.as_f64() - 215.25).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_count_keeps_all_groups() {
        let df = frame();
        let groups = df.group_by("city", "name", AggFunc::Count).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], ("Austin".to_string(), AggValue::Count(2)));
    }

    #[test]
    fn test_sort_by_numeric_with_empty_last() {
        let df = frame();
        let asc = df.sort_by("price", false).unwrap();
        assert_eq!(names(&df, &asc), vec!["Cabin", "Cottage", "Loft", "Villa", "Studio"]);
        let desc = df.sort_by("price", true).unwrap();
        assert_eq!(names(&df, &desc), vec!["Villa", "Loft", "Cottage", "Cabin", "Studio"]);
    }

    #[test]
    fn test_sort_by_is_stable() {
        let df = frame();
        let rows = df.sort_by("rooms", false).unwrap();
        assert_eq!(names(&df, &rows), vec!["Loft", "Studio", "Cottage", "Cabin", "Villa"]);
    }

    #[test]
    fn test_describe() {
        let df = frame();
        let summary = df.describe();
        assert_eq!(summary.len(), 4);
        let price = &summary[2];
        assert_eq!(price.column_type, ColumnType::Float);
        assert_eq!(price.non_empty, 4);
        assert_eq!(price.min, Some(80.0));
        assert_eq!(price.max, Some(310.0));
        let city = &summary[1];
        assert_eq!(city.unique, 4);
        assert_eq!(city.mean, None);
    }
}
