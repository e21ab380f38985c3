//! Cost-year adjustment with the CPI-U and CEPCI price indices.
//!
//! `value_to = value_from * index[to] / index[from]`. Bundled tables live in
//! `data/`; other tables can be read from any `year,<index>` CSV.

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const CPI_CSV: &str = include_str!("../data/cpi.csv");
const CEPCI_CSV: &str = include_str!("../data/cepci.csv");

/// Which price index moves costs between dollar years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostIndex {
    /// Consumer price index, all urban consumers.
    #[default]
    Cpi,
    /// Chemical Engineering Plant Cost Index.
    Cepci,
}

impl CostIndex {
    pub fn table(self) -> Result<IndexTable, InflationError> {
        match self {
            Self::Cpi => IndexTable::from_reader(CPI_CSV.as_bytes()),
            Self::Cepci => IndexTable::from_reader(CEPCI_CSV.as_bytes()),
        }
    }
}

#[derive(Debug, Error)]
pub enum InflationError {
    #[error("cannot read index table: {0}")]
    Csv(#[from] csv::Error),
    #[error("index table row {row}: {message}")]
    Parse { row: usize, message: String },
    #[error("no index value for {year} (table covers {first}..={last})")]
    MissingYear { year: i32, first: i32, last: i32 },
}

/// Index values keyed by year.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable {
    values: BTreeMap<i32, f64>,
}

impl IndexTable {
    /// Reads a two-column `year,<index>` CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InflationError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut values = BTreeMap::new();
        // columns are positional, the index name in the header is free
        for (i, record) in rdr.deserialize::<(i32, f64)>().enumerate() {
            let (year, value) = record?;
            if !(value.is_finite() && value > 0.0) {
                return Err(InflationError::Parse {
                    row: i + 2,
                    message: format!("index must be > 0, got {value}"),
                });
            }
            values.insert(year, value);
        }
        if values.is_empty() {
            return Err(InflationError::Parse {
                row: 0,
                message: "table is empty".into(),
            });
        }
        Ok(Self { values })
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.keys().copied()
    }

    fn value(&self, year: i32) -> Result<f64, InflationError> {
        self.get(year).ok_or_else(|| InflationError::MissingYear {
            year,
            first: self.values.keys().next().copied().unwrap_or_default(),
            last: self.values.keys().next_back().copied().unwrap_or_default(),
        })
    }

    /// Multiplier taking `from`-year dollars to `to`-year dollars.
    pub fn ratio(&self, from: i32, to: i32) -> Result<f64, InflationError> {
        Ok(self.value(to)? / self.value(from)?)
    }

    pub fn inflate(&self, value: f64, from: i32, to: i32) -> Result<f64, InflationError> {
        let ratio = self.ratio(from, to)?;
        debug!(from, to, ratio, "inflated cost");
        Ok(value * ratio)
    }
}

/// Converts `value` from `from`-year to `to`-year dollars with a bundled index.
pub fn inflate(index: CostIndex, value: f64, from: i32, to: i32) -> Result<f64, InflationError> {
    index.table()?.inflate(value, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bundled_tables_load() {
        let cpi = CostIndex::Cpi.table().unwrap();
        assert_eq!(cpi.get(2015), Some(237.017));
        assert_eq!(cpi.years().last(), Some(2023));
        let cepci = CostIndex::Cepci.table().unwrap();
        assert_eq!(cepci.get(2010), Some(550.8));
        assert_eq!(cepci.get(2022), Some(816.0));
    }

    #[test]
    fn cpi_2018_to_2022() {
        let v = inflate(CostIndex::Cpi, 100.0, 2018, 2022).unwrap();
        assert_relative_eq!(v, 100.0 * 292.655 / 251.107);
    }

    #[test]
    fn same_year_is_identity() {
        assert_relative_eq!(inflate(CostIndex::Cepci, 42.0, 2016, 2016).unwrap(), 42.0);
    }

    #[test]
    fn year_outside_table() {
        let err = inflate(CostIndex::Cpi, 1.0, 2001, 2020).unwrap_err();
        assert!(matches!(err, InflationError::MissingYear { year: 2001, .. }));
        assert!(err.to_string().contains("2015..=2023"));
    }

    #[test]
    fn custom_table() {
        let table = IndexTable::from_reader("year,IDX\n2000,100\n2010,150\n".as_bytes()).unwrap();
        assert_relative_eq!(table.ratio(2000, 2010).unwrap(), 1.5);
    }

    #[test]
    fn non_positive_index_rejected() {
        let err = IndexTable::from_reader("year,IDX\n2000,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, InflationError::Parse { row: 2, .. }));
    }

    #[test]
    fn index_names_deserialize_lowercase() {
        let idx: CostIndex = serde_yaml::from_str("cepci").unwrap();
        assert_eq!(idx, CostIndex::Cepci);
    }
}
