//! Report frames.
//!
//! A [`ReportFrame`] is an ordered table of rows sharing one column set,
//! optionally tagged with the account that produced it. Frames are built
//! fresh for each report request and concatenated by the aggregator.

use serde::{Deserialize, Serialize};

use super::platform::AccountId;
use super::value::Value;
use crate::error::CoreError;

/// Normalizes a column name: lowercase, spaces replaced with underscores.
///
/// ```
/// use adconnect_core::normalize_column_name;
/// assert_eq!(normalize_column_name("Cost per Result"), "cost_per_result");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Ordered table of report rows sharing a common column set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<AccountId>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one frame row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Looks up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Cells in column order.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + use<'a> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl ReportFrame {
    /// Creates an empty, untagged frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty frame tagged with an account.
    pub fn for_account(account: impl Into<AccountId>) -> Self {
        Self {
            account: Some(account.into()),
            ..Self::default()
        }
    }

    /// Creates an empty frame with a fixed column set.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            account: None,
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Sets the account tag.
    #[must_use]
    pub fn tagged(mut self, account: impl Into<AccountId>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// The account that produced this frame, if tagged.
    pub fn account(&self) -> Option<&AccountId> {
        self.account.as_ref()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A frame with no rows is empty regardless of its columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns true if the frame has the column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates rows as borrowed views.
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Returns row `index`.
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Looks up a cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Iterates the cells of one column. Empty if the column is missing.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |r| idx.and_then(|i| r.get(i)))
    }

    /// Appends a row given as `(column, value)` pairs.
    ///
    /// Unseen columns are appended to the column set and earlier rows are
    /// padded with [`Value::Null`].
    pub fn push_row<I, K>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut row = vec![Value::Null; self.columns.len()];
        for (key, value) in cells {
            let key = key.as_ref();
            let idx = match self.column_index(key) {
                Some(i) => i,
                None => {
                    self.add_column(key);
                    row.push(Value::Null);
                    self.columns.len() - 1
                }
            };
            row[idx] = value;
        }
        self.rows.push(row);
    }

    /// Appends a row of values in column order.
    pub fn push_values(&mut self, values: Vec<Value>) -> Result<(), CoreError> {
        if values.len() != self.columns.len() {
            return Err(CoreError::InvalidData(format!(
                "row has {} values, frame has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(values);
        Ok(())
    }

    fn add_column(&mut self, name: &str) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
    }

    /// Sets `column` to `value` on every row, adding the column if needed.
    pub fn set_constant(&mut self, column: &str, value: &Value) {
        let idx = if let Some(i) = self.column_index(column) {
            i
        } else {
            self.add_column(column);
            self.columns.len() - 1
        };
        for row in &mut self.rows {
            row[idx] = value.clone();
        }
    }

    /// Renames a column. Returns false if the column is missing.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(i) => {
                self.columns[i] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Rewrites every cell of a column in place.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        if let Some(i) = self.column_index(column) {
            for row in &mut self.rows {
                row[i] = f(&row[i]);
            }
        }
    }

    /// Adds `target` as a copy of `source`. No-op if `source` is missing.
    pub fn copy_column(&mut self, source: &str, target: &str) {
        let Some(src) = self.column_index(source) else {
            return;
        };
        let dst = if let Some(i) = self.column_index(target) {
            i
        } else {
            self.add_column(target);
            self.columns.len() - 1
        };
        for row in &mut self.rows {
            row[dst] = row[src].clone();
        }
    }

    /// Keeps only rows matching the predicate.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(RowRef<'_>) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|values| keep(RowRef { columns, values }));
    }

    /// Lowercases column names and replaces spaces with underscores.
    ///
    /// No deduplication is performed: two columns that normalize to the same
    /// name are both kept.
    pub fn normalize_columns(&mut self) {
        for column in &mut self.columns {
            *column = normalize_column_name(column);
        }
    }

    /// Appends another frame's rows, unioning the column sets in first-seen
    /// order. Missing cells are filled with [`Value::Null`].
    pub fn extend(&mut self, other: ReportFrame) {
        if self.columns.is_empty() && self.rows.is_empty() {
            self.columns = other.columns;
            self.rows = other.rows;
            return;
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| match self.column_index(c) {
                Some(i) => i,
                None => {
                    self.add_column(c);
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for src in other.rows {
            let mut row = vec![Value::Null; width];
            for (value, &dst) in src.into_iter().zip(&mapping) {
                row[dst] = value;
            }
            self.rows.push(row);
        }
    }

    /// Concatenates frames in iteration order into one untagged frame.
    pub fn concat<I>(frames: I) -> ReportFrame
    where
        I: IntoIterator<Item = ReportFrame>,
    {
        let mut out = ReportFrame::new();
        for frame in frames {
            out.extend(frame);
        }
        out.account = None;
        out
    }

    /// Sorts rows by the rendered text of the given columns.
    pub fn sort_by_columns(&mut self, columns: &[&str]) {
        let idx: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        self.rows.sort_by(|a, b| {
            idx.iter()
                .map(|&i| a[i].to_string().cmp(&b[i].to_string()))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: &[&[(&str, Value)]]) -> ReportFrame {
        let mut f = ReportFrame::new();
        for row in rows {
            f.push_row(row.iter().cloned());
        }
        f
    }

    #[test]
    fn test_push_row_unions_columns() {
        let f = frame(&[
            &[("date", "2022-01-01".into()), ("clicks", Value::Int(3))],
            &[("date", "2022-01-02".into()), ("spend", Value::Float(1.5))],
        ]);
        assert_eq!(f.columns(), &["date", "clicks", "spend"]);
        assert_eq!(f.get(0, "spend"), Some(&Value::Null));
        assert_eq!(f.get(1, "clicks"), Some(&Value::Null));
        assert_eq!(f.get(1, "spend"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Date Start"), "date_start");
        assert_eq!(normalize_column_name("CTR (All)"), "ctr_(all)");
        assert_eq!(normalize_column_name("already_ok"), "already_ok");
    }

    #[test]
    fn test_normalize_keeps_duplicates() {
        let mut f = ReportFrame::with_columns(["Clicks", "clicks"]);
        f.normalize_columns();
        assert_eq!(f.columns(), &["clicks", "clicks"]);
    }

    #[test]
    fn test_concat_preserves_order_and_fills_missing() {
        let a = frame(&[&[("clicks", Value::Int(1))]]).tagged("a");
        let b = frame(&[&[("impressions", Value::Int(10))], &[("clicks", Value::Int(2))]]).tagged("b");
        let out = ReportFrame::concat([a, b]);

        assert!(out.account().is_none());
        assert_eq!(out.columns(), &["clicks", "impressions"]);
        assert_eq!(out.len(), 3);
        let clicks: Vec<_> = out.column_values("clicks").cloned().collect();
        assert_eq!(clicks, vec![Value::Int(1), Value::Null, Value::Int(2)]);
    }

    #[test]
    fn test_concat_of_nothing_is_empty() {
        let out = ReportFrame::concat(Vec::new());
        assert!(out.is_empty());
        assert!(out.columns().is_empty());
    }

    #[test]
    fn test_set_constant_and_rename() {
        let mut f = frame(&[&[("Date", "2022/01/01".into())]]);
        f.set_constant("account_id", &Value::from("act_1"));
        assert!(f.rename_column("Date", "date_start"));
        assert!(!f.rename_column("missing", "x"));
        f.copy_column("date_start", "date_stop");
        assert_eq!(f.columns(), &["date_start", "account_id", "date_stop"]);
        assert_eq!(f.get(0, "date_stop"), Some(&Value::from("2022/01/01")));
    }

    #[test]
    fn test_retain_and_map() {
        let mut f = frame(&[
            &[("date", "2022/01/01".into())],
            &[("date", "Total".into())],
        ]);
        f.retain(|row| row.get("date").and_then(Value::as_str) != Some("Total"));
        f.map_column("date", |v| Value::from(v.to_string().replace('/', "-")));
        assert_eq!(f.len(), 1);
        assert_eq!(f.get(0, "date"), Some(&Value::from("2022-01-01")));
    }

    #[test]
    fn test_push_values_checks_width() {
        let mut f = ReportFrame::with_columns(["a", "b"]);
        assert!(f.push_values(vec![Value::Int(1)]).is_err());
        assert!(f.push_values(vec![Value::Int(1), Value::Null]).is_ok());
    }

    #[test]
    fn test_sort_by_columns() {
        let mut f = frame(&[
            &[("date", "2022-01-02".into())],
            &[("date", "2022-01-01".into())],
        ]);
        f.sort_by_columns(&["date"]);
        assert_eq!(f.get(0, "date"), Some(&Value::from("2022-01-01")));
    }
}
