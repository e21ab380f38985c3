//! YAML plant configuration: loading, serialization, presets, and validation.
//!
//! A configuration has three top-level keys, `site`, `technologies`, and
//! `config`. Load one with [`PlantConfig::from_path`] or pick a bundled
//! preset with [`PlantConfig::from_preset`], then call
//! [`PlantConfig::validate`] before evaluating it.

mod financial;
mod options;
mod site;
mod technology;

pub use financial::{
    BatterySystem, DEBT_TYPES, DEPRECIATION_METHODS, FinModel, FinancialParameters, MACRS_PERIODS,
    Revenue, SystemCosts,
};
pub use options::{
    BATTERY_DISPATCH_POLICIES, CostInfo, DEFAULT_LOOK_AHEAD_PERIODS, DEFAULT_PROJECT_LIFE,
    DEFAULT_SOLVER, DispatchOptions, FinanceOptions, RunConfig, SOLVERS, SimulationOptions,
    TechnologySimulationOptions,
};
pub use site::{Site, SiteBoundaries, SiteData};
pub use technology::{ModelInputs, ModelSelection, TechnologyConfig};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::registry::Registry;

/// Validation finding with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"technologies.wind.fin_model.revenue.ppa_escalation"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to turn a file, string, or preset name into a [`PlantConfig`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format \"{}\" (expected .yaml, .yml, or .toml)", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("unknown preset \"{name}\", available: {}", PlantConfig::PRESETS.join(", "))]
    UnknownPreset { name: String },
}

/// Full plant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    /// Site location and resources.
    pub site: Site,
    /// Technology blocks keyed by name (`wind`, `pv`, `battery`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub technologies: BTreeMap<String, TechnologyConfig>,
    /// Run-level options.
    #[serde(default, skip_serializing_if = "RunConfig::is_empty")]
    pub config: RunConfig,
}

const TEXAS_HYBRID: &str = include_str!("../../configs/hopp_config_tx.yaml");
const SMR_METHANOL: &str = include_str!("../../configs/smr_methanol.yaml");
const CO2H_METHANOL: &str = include_str!("../../configs/co2h_methanol.yaml");
const NATURAL_GEOH2: &str = include_str!("../../configs/geo_h2_natural.yaml");
const COMBINED_GEOH2: &str = include_str!("../../configs/geo_h2_combined.yaml");

impl PlantConfig {
    /// Names accepted by [`PlantConfig::from_preset`].
    pub const PRESETS: &[&str] = &[
        "texas_hybrid",
        "smr_methanol",
        "co2h_methanol",
        "geo_h2_natural",
        "geo_h2_combined",
    ];

    /// Loads a bundled configuration by name.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownPreset`] for names not in [`Self::PRESETS`].
    pub fn from_preset(name: &str) -> Result<Self, LoadError> {
        let src = match name {
            "texas_hybrid" => TEXAS_HYBRID,
            "smr_methanol" => SMR_METHANOL,
            "co2h_methanol" => CO2H_METHANOL,
            "geo_h2_natural" => NATURAL_GEOH2,
            "geo_h2_combined" => COMBINED_GEOH2,
            _ => {
                return Err(LoadError::UnknownPreset {
                    name: name.to_string(),
                });
            }
        };
        debug!(preset = name, "loading bundled config");
        Self::from_yaml_str(src)
    }

    /// Loads a config file, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the file cannot be read, has an unknown
    /// extension, or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_file(path),
            Some("toml") => {
                let content = read(path)?;
                Self::from_toml_str(&content)
            }
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parses a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the file cannot be read or the YAML is invalid.
    pub fn from_yaml_file(path: &Path) -> Result<Self, LoadError> {
        let content = read(path)?;
        let cfg = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            technologies = cfg.technologies.len(),
            "loaded plant config"
        );
        Ok(cfg)
    }

    /// Parses a config from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the YAML is invalid or contains unknown fields.
    pub fn from_yaml_str(s: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parses a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(s)?)
    }

    /// Serializes the config back to YAML.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Operating horizon in years.
    pub fn project_life(&self) -> u32 {
        self.config.simulation_options.project_life()
    }

    /// Checks every constraint against the built-in model registry.
    ///
    /// An empty vector means the config is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        self.validate_with(&Registry::builtin())
    }

    /// Checks every constraint, resolving model keys in `registry`.
    pub fn validate_with(&self, registry: &Registry) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        self.site.validate(&mut errors);

        if self.technologies.is_empty() {
            errors.push(ConfigError::new("technologies", "at least one technology is required"));
        }
        let project_life = self.project_life();
        for (name, tech) in &self.technologies {
            tech.validate(name, project_life, registry, &mut errors);
        }

        self.config.validate(&mut errors);
        for name in self.config.simulation_options.technologies.keys() {
            if !self.technologies.contains_key(name) {
                errors.push(ConfigError::new(
                    format!("config.simulation_options.{name}"),
                    "refers to a technology that is not configured",
                ));
            }
        }

        debug!(errors = errors.len(), "validated plant config");
        errors
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn check_range(errors: &mut Vec<ConfigError>, field: &str, value: f64, lo: f64, hi: f64) {
    if !(lo..=hi).contains(&value) {
        errors.push(ConfigError::new(
            field,
            format!("must be in [{lo}, {hi}], got {value}"),
        ));
    }
}

pub(crate) fn check_percent(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    check_range(errors, field, value, 0.0, 100.0);
}

pub(crate) fn check_non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if value.is_nan() || value < 0.0 {
        errors.push(ConfigError::new(field, format!("must be >= 0, got {value}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_loads_and_validates() {
        for name in PlantConfig::PRESETS {
            let cfg = PlantConfig::from_preset(name).unwrap();
            let errors = cfg.validate();
            assert!(errors.is_empty(), "{name}: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = PlantConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.to_string().contains("unknown preset"));
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let yaml = "site:\n  data: {lat: 1.0, lon: 2.0, year: 2020}\nextras: 1\n";
        assert!(matches!(
            PlantConfig::from_yaml_str(yaml),
            Err(LoadError::Yaml(_))
        ));
    }

    #[test]
    fn missing_site_rejected() {
        let yaml = "technologies: {}\n";
        let err = PlantConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("site"), "{err}");
    }

    #[test]
    fn unsupported_extension() {
        let err = PlantConfig::from_path(Path::new("plant.json")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_names_path() {
        let err = PlantConfig::from_path(Path::new("/nonexistent/plant.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/plant.yaml"));
    }

    #[test]
    fn toml_parses() {
        let toml = r#"
[site.data]
lat = 35.2
lon = -101.9
year = 2012

[technologies.pv]
system_capacity_kw = 1000.0
model_name = "pysam"
"#;
        let cfg = PlantConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.site.data.year, 2012);
        assert_eq!(cfg.technologies["pv"].model_name.as_deref(), Some("pysam"));
        assert_eq!(
            cfg.technologies["pv"].parameter_f64("system_capacity_kw"),
            Some(1000.0)
        );
    }

    #[test]
    fn simulation_switch_for_unknown_technology() {
        let mut cfg = PlantConfig::from_preset("geo_h2_natural").unwrap();
        cfg.config
            .simulation_options
            .technologies
            .insert("wind".into(), TechnologySimulationOptions::default());
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "config.simulation_options.wind")
        );
    }

    #[test]
    fn check_helpers() {
        let mut errors = Vec::new();
        check_percent(&mut errors, "a", 100.0);
        check_percent(&mut errors, "b", 100.5);
        check_non_negative(&mut errors, "c", 0.0);
        check_non_negative(&mut errors, "d", f64::NAN);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["b", "d"]);
    }
}
