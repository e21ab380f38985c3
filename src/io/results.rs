//! JSON result store keyed by site.
//!
//! Results live at `<root>/<output_name>/<site_id>.json`, so results of many
//! sites can share one directory tree and be reloaded by a later run.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Site;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("cannot access \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid result file \"{}\": {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("result name \"{name}\" must be a plain file name")]
    InvalidName { name: String },
}

/// `"{lat:.3}_{lon:.3}_{year}"` of the site.
pub fn site_result_id(site: &Site) -> String {
    let d = &site.data;
    format!("{:.3}_{:.3}_{}", d.lat, d.lon, d.year)
}

/// Directory of saved results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `output_name` for `site_id` is stored.
    pub fn path(&self, output_name: &str, site_id: &str) -> Result<PathBuf, ResultsError> {
        for name in [output_name, site_id] {
            let plain = !name.is_empty()
                && !name.contains(['/', '\\'])
                && name != "."
                && name != "..";
            if !plain {
                return Err(ResultsError::InvalidName {
                    name: name.to_string(),
                });
            }
        }
        Ok(self.root.join(output_name).join(format!("{site_id}.json")))
    }

    /// Writes `value` as pretty JSON, creating folders as needed.
    pub fn save<T: Serialize>(
        &self,
        output_name: &str,
        site_id: &str,
        value: &T,
    ) -> Result<PathBuf, ResultsError> {
        let path = self.path(output_name, site_id)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ResultsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let file = fs::File::create(&path).map_err(|source| ResultsError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|source| {
            ResultsError::Json {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), "saved result");
        Ok(path)
    }

    pub fn load<T: DeserializeOwned>(
        &self,
        output_name: &str,
        site_id: &str,
    ) -> Result<T, ResultsError> {
        let path = self.path(output_name, site_id)?;
        let file = fs::File::open(&path).map_err(|source| ResultsError::Io {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ResultsError::Json {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded result");
        Ok(value)
    }

    pub fn exists(&self, output_name: &str, site_id: &str) -> bool {
        self.path(output_name, site_id)
            .is_ok_and(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantConfig;
    use crate::pipeline::{PlantReport, evaluate};
    use crate::registry::Registry;

    #[test]
    fn id_rounds_to_three_decimals() {
        let mut site = PlantConfig::from_preset("texas_hybrid").unwrap().site;
        site.data.lat = 34.22;
        site.data.lon = -102.75;
        site.data.year = 2013;
        assert_eq!(site_result_id(&site), "34.220_-102.750_2013");
    }

    #[test]
    fn report_round_trips_through_store() {
        let cfg = PlantConfig::from_preset("co2h_methanol").unwrap();
        let report = evaluate(&cfg, &Registry::builtin()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let path = store.save("plant_report", &report.site_id, &report).unwrap();
        assert!(path.starts_with(dir.path().join("plant_report")));
        assert!(store.exists("plant_report", &report.site_id));

        let loaded: PlantReport = store.load("plant_report", &report.site_id).unwrap();
        assert_eq!(loaded.site_id, report.site_id);
        assert_eq!(loaded.technologies.len(), report.technologies.len());
        let (a, b) = (&loaded.technologies[0], &report.technologies[0]);
        assert_eq!(a.models, b.models);
        approx::assert_relative_eq!(
            a.levelized_cost.unwrap(),
            b.levelized_cost.unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn missing_result_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let err = store.load::<f64>("lcoh", "1.000_2.000_2020").unwrap_err();
        assert!(matches!(err, ResultsError::Io { .. }));
        assert!(err.to_string().contains("lcoh"));
    }

    #[test]
    fn names_cannot_escape_root() {
        let store = ResultStore::new("/tmp/results");
        assert!(matches!(
            store.path("../etc", "x"),
            Err(ResultsError::InvalidName { .. })
        ));
        assert!(store.path("lcoe", "").is_err());
    }
}
