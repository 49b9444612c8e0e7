//! Sample table loading
//!
//! A sample table is a CSV with one row per sample: scatter coordinates,
//! one or more image path columns and optional label columns.

use super::error::{Result, ViewerError};
use polars::prelude::*;
use std::path::Path;

/// Tabular dataset backing a scatter plot
#[derive(Debug, Clone)]
pub struct SampleTable {
    df: DataFrame,
}

impl SampleTable {
    /// Read a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        log::info!(
            "Loaded {} ({} rows, {} columns)",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(Self { df })
    }

    pub fn from_dataframe(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Fail with MissingColumn for the first absent name
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            if !self.has_column(name.as_ref()) {
                return Err(ViewerError::MissingColumn(name.as_ref().to_string()));
            }
        }
        Ok(())
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| ViewerError::MissingColumn(name.to_string()))
    }

    /// Numeric column as f64; nulls become NaN
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.series(name)?.cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Scatter coordinates as `[x, y]` pairs
    pub fn coords(&self, x_col: &str, y_col: &str) -> Result<Vec<[f64; 2]>> {
        let xs = self.numeric_column(x_col)?;
        let ys = self.numeric_column(y_col)?;
        Ok(xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect())
    }

    /// Cell value rendered as a string (None for null)
    pub fn string_at(&self, column: &str, row: usize) -> Result<Option<String>> {
        if row >= self.len() {
            return Err(ViewerError::RowOutOfRange {
                row,
                len: self.len(),
            });
        }
        let series = self.series(column)?.cast(&DataType::String)?;
        Ok(series.str()?.get(row).map(|s| s.to_string()))
    }

    /// Image path at a row; a null cell is an error
    pub fn path_at(&self, column: &str, row: usize) -> Result<String> {
        self.string_at(column, row)?
            .ok_or_else(|| ViewerError::MissingPath {
                column: column.to_string(),
                row,
            })
    }

    /// Return a copy with `column` rewritten cell by cell; nulls stay null
    pub fn map_string_column<F>(&self, column: &str, f: F) -> Result<Self>
    where
        F: Fn(&str) -> String,
    {
        let series = self.series(column)?.cast(&DataType::String)?;
        let values: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|opt| opt.map(&f))
            .collect();

        let mut df = self.df.clone();
        df.with_column(Series::new(column.into(), values))?;
        Ok(Self { df })
    }

    /// Keep only the named columns, in the given order
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        self.require_columns(columns)?;
        let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
        Ok(Self {
            df: self.df.select(names)?,
        })
    }

    /// Write the table as CSV with a header row
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        let mut df = self.df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        log::info!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }
}
