//! Group-by and reduce over [`Table`]s.
//!
//! Grouping never mutates its input: [`group_by`] borrows the table and
//! returns the row partition, [`Groups::reduce`] turns that partition into a
//! [`Grouped`] mapping, and [`Grouped::into_table`] turns the mapping back
//! into a table so that it can be grouped again.

use crate::{
    error::{AnalysisError, Result},
    table::{Table, Value},
};
use log::{debug, error};
use std::collections::BTreeMap;

/// Group key tuple, one value per grouping column.
pub type Key = Vec<Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
    Count,
    /// Sample standard deviation (n - 1 denominator). NaN for a single
    /// sample.
    Std,
}

impl Reducer {
    pub fn apply(&self, samples: &[f64]) -> f64 {
        let n = samples.len() as f64;
        match self {
            Reducer::Mean => samples.iter().sum::<f64>() / n,
            Reducer::Sum => samples.iter().sum(),
            Reducer::Count => n,
            Reducer::Std => {
                if samples.len() < 2 {
                    return f64::NAN;
                }
                let mean = Reducer::Mean.apply(samples);
                let variance =
                    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
                variance.sqrt()
            }
        }
    }
}

/// Partition of a table's rows by the values of one or more key columns.
#[derive(Debug)]
pub struct Groups<'a> {
    table: &'a Table,
    keys: Vec<String>,
    members: BTreeMap<Key, Vec<usize>>,
}

pub fn group_by<'a>(table: &'a Table, keys: &[&str]) -> Result<Groups<'a>> {
    if keys.is_empty() {
        return Err(AnalysisError::schema("group_by needs at least one key column"));
    }

    let key_idx = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<Result<Vec<usize>>>()
        .inspect_err(|e| error!("{e}"))?;

    let mut members = BTreeMap::<Key, Vec<usize>>::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let key: Key = key_idx.iter().map(|&idx| row[idx].clone()).collect();
        members.entry(key).or_default().push(row_idx);
    }

    debug!(
        "group_by(): partitioned table (keys={keys:?}, rows={}, groups={})",
        table.len(),
        members.len()
    );

    Ok(Groups {
        table,
        keys: keys.iter().map(|k| k.to_string()).collect(),
        members,
    })
}

impl Groups<'_> {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Row indices of each group, in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[usize])> {
        self.members.iter().map(|(k, rows)| (k, rows.as_slice()))
    }

    /// Values of `value_column` collected per group. Missing (NaN) values are
    /// left out.
    pub fn samples(&self, value_column: &str) -> Result<BTreeMap<Key, Vec<f64>>> {
        let idx = self.table.column_index(value_column)?;
        if !self.table.is_numeric(value_column)? {
            let reason = format!("cannot reduce non-numeric column (column={value_column})");
            error!("{reason}");
            return Err(AnalysisError::Schema(reason));
        }

        let rows = self.table.rows();
        Ok(self
            .members
            .iter()
            .map(|(key, members)| {
                let samples = members
                    .iter()
                    .filter_map(|&row| rows[row][idx].as_f64())
                    .filter(|x| !x.is_nan())
                    .collect();
                (key.clone(), samples)
            })
            .collect())
    }

    pub fn reduce(&self, value_column: &str, reducer: Reducer) -> Result<Grouped> {
        let values = self
            .samples(value_column)?
            .into_iter()
            .map(|(key, samples)| (key, reducer.apply(&samples)))
            .collect();

        Ok(Grouped {
            keys: self.keys.clone(),
            value_column: value_column.to_string(),
            values,
        })
    }
}

/// One reduced value per group.
#[derive(Clone, Debug, PartialEq)]
pub struct Grouped {
    keys: Vec<String>,
    value_column: String,
    values: BTreeMap<Key, f64>,
}

pub fn group_reduce(
    table: &Table,
    keys: &[&str],
    value_column: &str,
    reducer: Reducer,
) -> Result<Grouped> {
    group_by(table, keys)?.reduce(value_column, reducer)
}

impl Grouped {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &[Value]) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Key columns followed by the reduced value column.
    pub fn into_table(self) -> Result<Table> {
        let mut columns = self.keys;
        columns.push(self.value_column);

        let rows = self
            .values
            .into_iter()
            .map(|(mut key, value)| {
                key.push(Value::Number(value));
                key
            })
            .collect();

        Table::new(columns, rows)
    }

    /// Pivot `series_key` out of a two-key grouping: one series per value of
    /// `series_key`, each holding `(other key, value)` points in key order.
    pub fn unstack(&self, series_key: &str) -> Result<BTreeMap<Value, Vec<(Value, f64)>>> {
        if self.keys.len() != 2 {
            return Err(AnalysisError::schema(format!(
                "unstack needs exactly two key columns (keys={:?})",
                self.keys
            )));
        }
        let series_idx = self
            .keys
            .iter()
            .position(|k| k == series_key)
            .ok_or_else(|| {
                AnalysisError::schema(format!(
                    "unknown key column (column={series_key}, keys={:?})",
                    self.keys
                ))
            })?;
        let x_idx = 1 - series_idx;

        let mut series = BTreeMap::<Value, Vec<(Value, f64)>>::new();
        for (key, value) in &self.values {
            series
                .entry(key[series_idx].clone())
                .or_default()
                .push((key[x_idx].clone(), *value));
        }

        Ok(series)
    }
}

/// First aggregation stage for run-based experiments: total `value_column`
/// across all rows (flows) of the same `(independent, run)` pair. The
/// returned table has columns `independent`, `run`, `value_column`.
pub fn run_totals(
    table: &Table,
    independent: &str,
    run: &str,
    value_column: &str,
) -> Result<Table> {
    group_reduce(table, &[independent, run], value_column, Reducer::Sum)?.into_table()
}
