//! CSV table to YAML mapping conversion.
//!
//! The first column is the row index; every row becomes a mapping of column
//! name to cell value, keyed by its index cell.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read CSV \"{}\": {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("CSV \"{}\" has no index column", path.display())]
    NoColumns { path: PathBuf },
    #[error("cannot write \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV \"{}\" repeats index {index} on line {line}", path.display())]
    DuplicateIndex {
        path: PathBuf,
        index: String,
        line: u64,
    },
    #[error("\"{}\" would be overwritten by its own YAML conversion", path.display())]
    SameOutput { path: PathBuf },
    #[error("cannot serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Integer, then float, then `True`/`False`; empty cells are null.
fn parse_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(x) = cell.parse::<f64>() {
        return Value::from(x);
    }
    match cell {
        "True" | "true" => Value::Bool(true),
        "False" | "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

/// Reads a CSV table into `{index: {column: value}}`.
pub fn read_table(path: &Path) -> Result<Mapping, ConvertError> {
    let csv_err = |source| ConvertError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();
    if headers.is_empty() {
        return Err(ConvertError::NoColumns {
            path: path.to_path_buf(),
        });
    }

    let mut table = Mapping::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let index_cell = record.get(0).unwrap_or_default();
        let index = parse_cell(index_cell);
        if table.contains_key(&index) {
            return Err(ConvertError::DuplicateIndex {
                path: path.to_path_buf(),
                index: index_cell.trim().to_string(),
                line: record.position().map_or(0, |p| p.line()),
            });
        }
        let row: Mapping = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| {
                let value = record.get(i).map(parse_cell).unwrap_or(Value::Null);
                (Value::String(column.to_string()), value)
            })
            .collect();
        table.insert(index, Value::Mapping(row));
    }
    Ok(table)
}

/// Converts `path` to YAML written next to it with a `.yaml` extension.
///
/// Returns the path of the written file.
pub fn csv_to_yaml(path: &Path) -> Result<PathBuf, ConvertError> {
    let out = path.with_extension("yaml");
    if out == path {
        return Err(ConvertError::SameOutput {
            path: path.to_path_buf(),
        });
    }
    let table = read_table(path)?;
    let yaml = serde_yaml::to_string(&table)?;
    fs::write(&out, yaml).map_err(|source| ConvertError::Write {
        path: out.clone(),
        source,
    })?;
    info!(
        from = %path.display(),
        to = %out.display(),
        rows = table.len(),
        "converted CSV to YAML"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_parse_by_type() {
        assert_eq!(parse_cell("42"), Value::from(42));
        assert_eq!(parse_cell("0.5"), Value::from(0.5));
        assert_eq!(parse_cell("True"), Value::Bool(true));
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("Texas"), Value::String("Texas".into()));
    }

    #[test]
    fn rows_keyed_by_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("sites.csv");
        fs::write(&csv, "site,lat,lon,grid\nA,34.22,-102.75,True\nB,30.5,,False\n").unwrap();

        let out = csv_to_yaml(&csv).unwrap();
        assert_eq!(out, dir.path().join("sites.yaml"));

        let parsed: Mapping = serde_yaml::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let a = parsed.get("A").and_then(Value::as_mapping).unwrap();
        assert_eq!(a.get("lat").and_then(Value::as_f64), Some(34.22));
        assert_eq!(a.get("grid").and_then(Value::as_bool), Some(true));
        let b = parsed.get("B").and_then(Value::as_mapping).unwrap();
        assert_eq!(b.get("lon"), Some(&Value::Null));
    }

    #[test]
    fn numeric_index_kept_as_number() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("years.csv");
        fs::write(&csv, "year,CPI\n2020,258.811\n").unwrap();
        let table = read_table(&csv).unwrap();
        assert!(table.contains_key(Value::from(2020)));
    }

    #[test]
    fn repeated_index_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("dupes.csv");
        fs::write(&csv, "name,a\nA,1\nA,2\nB,3\n").unwrap();
        let err = csv_to_yaml(&csv).unwrap_err();
        match err {
            ConvertError::DuplicateIndex { index, line, .. } => {
                assert_eq!(index, "A");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("dupes.yaml").exists());
    }

    #[test]
    fn yaml_input_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("table.yaml");
        fs::write(&src, "name,a\nA,1\n").unwrap();
        let err = csv_to_yaml(&src).unwrap_err();
        assert!(matches!(err, ConvertError::SameOutput { .. }));
        assert_eq!(fs::read_to_string(&src).unwrap(), "name,a\nA,1\n");
    }

    #[test]
    fn missing_file() {
        let err = csv_to_yaml(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(matches!(err, ConvertError::Csv { .. }));
    }
}
