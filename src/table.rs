//! In-memory tables loaded from the CSV files that ns-3 experiments write.
//!
//! Columns are typed when the file is read: a column where every non-empty
//! cell parses as a float is numeric, any other column is categorical. Empty
//! cells of a numeric column hold NaN and are skipped when reducing. Tables are never
//! mutated after construction, operations like [`Table::drop_columns`] return
//! a new table.

use crate::error::{AnalysisError, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, error};
use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt,
    fs::File,
    io::Read,
    path::Path,
};

/// A single cell.
#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            Value::Text(_) => None,
        }
    }
}

// Numbers sort before text so that mixed key columns still have a total
// order. `total_cmp` keeps -0 apart from 0 and puts NaN keys in a group of
// their own.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// The columns an experiment expects to find in its results file.
#[derive(Clone, Copy, Debug)]
pub struct Schema {
    pub name: &'static str,
    /// Columns that must be present.
    pub columns: &'static [&'static str],
    /// Subset of `columns` that must hold numbers only.
    pub numeric: &'static [&'static str],
}

impl Schema {
    pub fn validate(&self, table: &Table) -> Result<()> {
        for column in self.columns {
            if table.column_index(column).is_err() {
                let reason = format!(
                    "missing column (schema={}, column={column}, found={:?})",
                    self.name, table.columns
                );
                error!("{reason}");
                return Err(AnalysisError::Schema(reason));
            }
        }

        for column in self.numeric {
            if !table.is_numeric(column)? {
                let reason = format!(
                    "column is not numeric (schema={}, column={column})",
                    self.name
                );
                error!("{reason}");
                return Err(AnalysisError::Schema(reason));
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(AnalysisError::schema(format!(
                    "duplicate column (column={column})"
                )));
            }
        }

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AnalysisError::schema(format!(
                "row width does not match header (row={idx}, expected={}, got={})",
                columns.len(),
                row.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Read a comma-delimited file with a header row.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            error!("error opening results file (path={}, error={e:?})", path.display());
            AnalysisError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        Self::from_reader(file, path)
    }

    /// Read a results file and check it against `schema` straight away.
    pub fn load_with_schema(path: &Path, schema: &Schema) -> Result<Self> {
        let table = Self::load(path)?;
        schema.validate(&table)?;
        debug!(
            "load_with_schema(): loaded table (path={}, schema={}, rows={})",
            path.display(),
            schema.name,
            table.len()
        );

        Ok(table)
    }

    /// Parse CSV from any reader. `origin` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let csv_error = |e: csv::Error| {
            error!("error parsing csv (path={}, error={e:?})", origin.display());
            AnalysisError::Csv {
                path: origin.to_path_buf(),
                source: e,
            }
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut raw_rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            raw_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let numeric: Vec<bool> = (0..columns.len())
            .map(|idx| {
                raw_rows
                    .iter()
                    .all(|row| row[idx].is_empty() || row[idx].parse::<f64>().is_ok())
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&numeric)
                    .map(|(cell, is_numeric)| match cell.parse::<f64>() {
                        Ok(x) if *is_numeric => Value::Number(x),
                        // Missing value.
                        Err(_) if *is_numeric => Value::Number(f64::NAN),
                        _ => Value::Text(cell),
                    })
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| {
                AnalysisError::schema(format!(
                    "unknown column (column={name}, found={:?})",
                    self.columns
                ))
            })
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// A column is numeric when every cell in it is a number. Columns of an
    /// empty table count as numeric.
    pub fn is_numeric(&self, name: &str) -> Result<bool> {
        Ok(self.column(name)?.all(|v| matches!(v, Value::Number(_))))
    }

    /// Return a copy of the table without `names`. Naming a column that does
    /// not exist is a schema error.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table> {
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            dropped.push(self.column_index(name).inspect_err(|e| error!("{e}"))?);
        }

        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|idx| !dropped.contains(idx))
            .collect();

        let columns = keep.iter().map(|&idx| self.columns[idx].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&idx| row[idx].clone()).collect())
            .collect();

        Ok(Table { columns, rows })
    }
}
