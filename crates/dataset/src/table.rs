//! The assembled table and its CSV form

// standard library
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// crate modules
use crate::columns::Column;
use crate::error::{Error, Result};

// external crates
use log::{debug, info};

/// Name of the categorical column holding the case id of every row
pub const CASE_COLUMN: &str = "Case";

/// Flat table of scalar columns with one row per cell per case
///
/// Numeric columns are stored column-major as `f64` and only narrowed to
/// `f32` when written. Every row also records its index within its own case
/// and the case it came from.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TabularDataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: Vec<usize>,
    cases: Vec<String>,
}

impl TabularDataset {
    /// Number of rows over all cases
    pub fn n_rows(&self) -> usize {
        self.cases.len()
    }

    /// Number of columns, including the case column
    pub fn n_columns(&self) -> usize {
        self.names.len() + 1
    }

    /// Column names in output order, ending with the case column
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .chain(std::iter::once(CASE_COLUMN))
    }

    /// Values of a numeric column
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Case id of every row
    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    /// Row index within its own case, for every row
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Stack the rows of another case below the existing ones
    ///
    /// The first case decides the columns, every later case must provide
    /// exactly the same names in the same order.
    pub fn push_case(&mut self, case: &str, columns: Vec<Column>) -> Result<()> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);

        if self.names.is_empty() && self.cases.is_empty() {
            self.names = columns.iter().map(|c| c.name.clone()).collect();
            self.columns = vec![Vec::new(); self.names.len()];
        } else if !columns.iter().map(|c| &c.name).eq(self.names.iter()) {
            return Err(Error::ColumnMismatch {
                case: case.to_string(),
            });
        }

        for (target, column) in self.columns.iter_mut().zip(columns) {
            target.extend(column.values);
        }
        self.index.extend(0..n_rows);
        self.cases.extend(std::iter::repeat(case.to_string()).take(n_rows));

        debug!("Added {n_rows} rows for {case}");
        Ok(())
    }

    /// Write the table as comma separated text
    ///
    /// The first column is the unnamed row index within each case, then the
    /// data columns as `f32`, then [CASE_COLUMN]. NaN values are left empty.
    /// Rows are written to a temporary file next to `path` which only replaces
    /// `path` once everything has been written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let partial = partial_path(path);
        info!("Writing {} rows to {}", self.n_rows(), path.display());

        if let Err(e) = self.write_records(&partial) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }

        std::fs::rename(&partial, path)?;
        Ok(())
    }

    fn write_records(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(std::iter::once("").chain(self.column_names()))?;

        let mut record = Vec::with_capacity(self.n_columns() + 1);
        for row in 0..self.n_rows() {
            record.clear();
            record.push(self.index[row].to_string());
            record.extend(self.columns.iter().map(|c| format_value(c[row])));
            record.push(self.cases[row].clone());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Narrow to `f32`, with NaN written as an empty field
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        (value as f32).to_string()
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: &[f64]) -> Column {
        Column {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn cases_are_stacked_in_order() {
        let mut table = TabularDataset::default();
        table
            .push_case("case_1", vec![column("k", &[1.0, 2.0]), column("nut", &[0.1, 0.2])])
            .unwrap();
        table
            .push_case("case_2", vec![column("k", &[3.0]), column("nut", &[0.3])])
            .unwrap();

        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.column("k").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(table.index(), &[0, 1, 0]);
        assert_eq!(table.cases(), &["case_1", "case_1", "case_2"]);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["k", "nut", CASE_COLUMN]
        );
    }

    #[test]
    fn later_cases_must_match_columns() {
        let mut table = TabularDataset::default();
        table.push_case("case_1", vec![column("k", &[1.0])]).unwrap();
        let result = table.push_case("case_2", vec![column("nut", &[1.0])]);
        assert!(matches!(result, Err(Error::ColumnMismatch { .. })));
    }

    #[test]
    fn values_are_narrowed() {
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(1.0 / 3.0), "0.33333334");
        assert_eq!(format_value(f64::NAN), "");
    }
}
