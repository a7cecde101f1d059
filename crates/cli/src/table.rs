//! Tabular inputs (CSV or Parquet) read through polars.
//!
//! Columns are looked up by name and cast, so integer-typed coordinates or
//! float-typed labels are accepted.

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::path::Path;

/// Reads a whole CSV or Parquet file; the format follows the extension.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let lf = match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => LazyFrame::scan_parquet(path, ScanArgsParquet::default())?,
        _ => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .finish()?,
    };
    lf.collect()
        .with_context(|| format!("reading {}", path.display()))
}

/// Column as `f64`; nulls become NaN.
pub fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Column as `i64`; nulls are an error.
pub fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let series = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Int64)?;
    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| anyhow!("null in column `{name}` at row {row}")))
        .collect()
}

/// Optional string column, for label names.
pub fn str_column(df: &DataFrame, name: &str) -> Result<Option<Vec<String>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let series = column.cast(&DataType::String)?;
    Ok(Some(
        series
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_typed_columns_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coords.csv");
        fs::write(&path, "x,y,z,hemi,name\n1,0.5,0,0,a\n2,,1.5,1,b\n").unwrap();
        let df = read_table(&path).unwrap();
        assert_eq!(f64_column(&df, "x").unwrap(), vec![1.0, 2.0]);
        let y = f64_column(&df, "y").unwrap();
        assert_eq!(y[0], 0.5);
        assert!(y[1].is_nan());
        assert_eq!(i64_column(&df, "hemi").unwrap(), vec![0, 1]);
        assert_eq!(str_column(&df, "name").unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(str_column(&df, "missing").unwrap(), None);
        assert!(f64_column(&df, "w").is_err());
    }
}
