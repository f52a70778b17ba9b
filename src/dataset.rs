use crate::error::{DashboardError, DashboardResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Field spellings treated as a missing value rather than text
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A single parsed cell of a result file
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// The field parsed as a floating point number
    Number(f64),

    /// Anything that is not a number
    Text(String),

    /// Blank field or a recognised missing-value marker
    Empty,
}

impl CellValue {
    /// Classify one raw CSV field
    pub fn parse(field: &str) -> Self {
        let trimmed = field.trim();
        if MISSING_MARKERS.contains(&trimmed) {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(field.to_string()),
        }
    }

    /// Plottable value, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

/// Inferred type of a whole column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing value is a number
    Numeric,

    /// At least one value is text
    NonNumeric,
}

/// One named column of a dataset
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Type inference pass over every value in the column.
    ///
    /// A column consisting only of missing values counts as numeric.
    pub fn kind(&self) -> ColumnKind {
        let all_numeric = self
            .values
            .iter()
            .all(|value| matches!(value, CellValue::Number(_) | CellValue::Empty));

        if all_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::NonNumeric
        }
    }

    /// Values as a plottable series; text, missing and non-finite cells become gaps
    pub fn series(&self) -> Vec<Option<f64>> {
        self.values.iter().map(CellValue::as_number).collect()
    }
}

/// Tabular result data, stored column-wise
///
/// All columns have the same length, which is the dataset's row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from already-parsed columns
    ///
    /// # Errors
    /// * `DatasetUnreadable` if the columns differ in length
    pub fn from_columns(columns: Vec<Column>) -> DashboardResult<Self> {
        let row_count = columns.first().map_or(0, |c| c.values.len());

        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(DashboardError::DatasetUnreadable(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.values.len(),
                row_count
            )));
        }

        Ok(Self { columns, row_count })
    }

    /// Parse CSV text with a header row
    ///
    /// Records shorter than the header are padded with missing values;
    /// records longer than the header make the dataset unreadable.
    ///
    /// # Examples
    /// ```
    /// use sheetdash::dataset::{ColumnKind, Dataset};
    ///
    /// let data = Dataset::from_csv_reader("time,price\n09:00,1.5\n09:01,2\n".as_bytes()).unwrap();
    /// assert_eq!(data.row_count(), 2);
    /// assert_eq!(data.columns()[0].kind(), ColumnKind::NonNumeric);
    /// assert_eq!(data.columns()[1].kind(), ColumnKind::Numeric);
    /// ```
    pub fn from_csv_reader<R: Read>(reader: R) -> DashboardResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for record in csv_reader.records() {
            let record = record?;
            if record.len() > columns.len() {
                let line = record.position().map_or(0, |p| p.line());
                return Err(DashboardError::DatasetUnreadable(format!(
                    "line {}: expected {} fields, saw {}",
                    line,
                    columns.len(),
                    record.len()
                )));
            }

            let mut fields = record.iter();
            for column in columns.iter_mut() {
                let value = fields.next().map_or(CellValue::Empty, CellValue::parse);
                column.values.push(value);
            }
        }

        Self::from_columns(columns)
    }

    /// Open and parse a CSV file from disk
    pub fn from_path(path: impl AsRef<Path>) -> DashboardResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            DashboardError::DatasetUnreadable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_csv_reader(file)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cells() {
        assert_eq!(CellValue::parse("1.5"), CellValue::Number(1.5));
        assert_eq!(CellValue::parse(" -2 "), CellValue::Number(-2.0));
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("NaN"), CellValue::Empty);
        assert_eq!(CellValue::parse("abc"), CellValue::Text("abc".into()));
    }

    #[test]
    fn missing_values_keep_column_numeric() {
        let data = Dataset::from_csv_reader("a,b\n1,x\n,2\n3,\n".as_bytes()).unwrap();
        assert_eq!(data.columns()[0].kind(), ColumnKind::Numeric);
        assert_eq!(data.columns()[1].kind(), ColumnKind::NonNumeric);
        assert_eq!(data.columns()[0].series(), vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn header_only_has_columns_but_no_rows() {
        let data = Dataset::from_csv_reader("a,b\n".as_bytes()).unwrap();
        assert_eq!(data.columns().len(), 2);
        assert_eq!(data.row_count(), 0);
    }

    #[test]
    fn empty_input_has_no_columns() {
        let data = Dataset::from_csv_reader("".as_bytes()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn short_rows_are_padded() {
        let data = Dataset::from_csv_reader("a,b\n1,2\n3\n".as_bytes()).unwrap();
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.columns()[0].series(), vec![Some(1.0), Some(3.0)]);
        assert_eq!(data.columns()[1].values, vec![CellValue::Number(2.0), CellValue::Empty]);
        assert_eq!(data.columns()[1].kind(), ColumnKind::Numeric);
    }

    #[test]
    fn long_rows_are_unreadable() {
        let err = Dataset::from_csv_reader("a,b\n1,2\n3,4,5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::DatasetUnreadable(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn mismatched_columns_rejected() {
        let err = Dataset::from_columns(vec![
            Column::new("a", vec![CellValue::Number(1.0)]),
            Column::new("b", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, DashboardError::DatasetUnreadable(_)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = Dataset::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DashboardError::DatasetUnreadable(_)));
    }
}
