//! Technology blocks: physical parameters, model selection, and model inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::financial::{FinModel, check_year_array};
use super::{ConfigError, check_non_negative, check_percent};
use crate::registry::{ModelKind, Registry, TechnologyCategory};

/// Parameter keys that hold capacities or counts and must not be negative.
const NON_NEGATIVE_KEYS: &[&str] = &[
    "num_turbines",
    "turbine_rating_kw",
    "system_capacity_kw",
    "system_capacity_kwh",
    "interconnect_kw",
    "hub_height",
    "rotor_diameter",
    "device_rating_kw",
    "num_devices",
    "rating_kw",
];

/// Per-year parameter arrays inside a technology block.
const YEAR_ARRAY_KEYS: &[&str] = &["dc_degradation"];

/// Battery state-of-charge limits (%).
const SOC_KEYS: &[&str] = &["minimum_SOC", "maximum_SOC", "initial_SOC"];

/// One named technology in the `technologies` mapping.
///
/// Known keys are typed; every other key is kept verbatim in
/// [`TechnologyConfig::parameters`] so nothing is lost on a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnologyConfig {
    /// Performance model selected from the registry (`None` uses the default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Financial model block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fin_model: Option<FinModel>,
    /// In-process performance model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_model: Option<ModelSelection>,
    /// In-process cost model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_model: Option<ModelSelection>,
    /// In-process financial model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_model: Option<ModelSelection>,
    /// Inputs for the in-process models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_inputs: Option<ModelInputs>,
    /// Physical parameters (capacities, turbine counts, degradation, ...).
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Value>,
}

/// Registry key of a selected model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSelection {
    pub model: String,
}

/// Stage-specific inputs; `shared_parameters` apply to every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelInputs {
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub shared_parameters: Mapping,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub performance_parameters: Mapping,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub cost_parameters: Mapping,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub finance_parameters: Mapping,
}

impl ModelInputs {
    /// Shared parameters overlaid with the parameters of one stage.
    ///
    /// Stage values win over shared values with the same key.
    pub fn merged(&self, kind: ModelKind) -> Mapping {
        let Some(stage) = self.stage(kind) else {
            return self.shared_parameters.clone();
        };
        let mut merged = self.shared_parameters.clone();
        for (k, v) in stage {
            if merged.insert(k.clone(), v.clone()).is_some() {
                tracing::debug!(key = ?k, stage = %kind, "stage parameter overrides shared value");
            }
        }
        merged
    }
}

impl ModelInputs {
    /// Parameters given for `kind` alone.
    pub fn stage(&self, kind: ModelKind) -> Option<&Mapping> {
        match kind {
            ModelKind::Performance => Some(&self.performance_parameters),
            ModelKind::Cost => Some(&self.cost_parameters),
            ModelKind::Finance => Some(&self.finance_parameters),
            ModelKind::Lca => None,
        }
    }
}

impl TechnologyConfig {
    /// Category of a block from its key in the `technologies` mapping.
    pub fn category(name: &str) -> Option<TechnologyCategory> {
        TechnologyCategory::from_name(name)
    }

    /// Numeric physical parameter by key.
    pub fn parameter_f64(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(Value::as_f64)
    }

    /// Rated power (kW) for the electricity technologies.
    pub fn capacity_kw(&self, category: TechnologyCategory) -> Option<f64> {
        match category {
            TechnologyCategory::Wind => {
                match (
                    self.parameter_f64("num_turbines"),
                    self.parameter_f64("turbine_rating_kw"),
                ) {
                    (Some(n), Some(rating)) => Some(n * rating),
                    _ => self.parameter_f64("system_capacity_kw"),
                }
            }
            TechnologyCategory::Pv | TechnologyCategory::Battery => {
                self.parameter_f64("system_capacity_kw")
            }
            TechnologyCategory::Grid => self.parameter_f64("interconnect_kw"),
            TechnologyCategory::Wave => match (
                self.parameter_f64("num_devices"),
                self.parameter_f64("device_rating_kw"),
            ) {
                (Some(n), Some(rating)) => Some(n * rating),
                _ => None,
            },
            _ => None,
        }
    }

    /// Energy capacity (kWh) of a storage block.
    pub fn storage_capacity_kwh(&self) -> Option<f64> {
        self.parameter_f64("system_capacity_kwh")
    }

    /// Registry key selected for `kind`, if the block names one.
    pub fn selected_model(&self, kind: ModelKind) -> Option<&str> {
        match kind {
            ModelKind::Performance => self
                .performance_model
                .as_ref()
                .map(|s| s.model.as_str())
                .or(self.model_name.as_deref()),
            ModelKind::Cost => self.cost_model.as_ref().map(|s| s.model.as_str()),
            ModelKind::Finance => self.financial_model.as_ref().map(|s| s.model.as_str()),
            ModelKind::Lca => None,
        }
    }

    /// Appends validation errors for the block called `name`.
    pub(crate) fn validate(
        &self,
        name: &str,
        project_life: u32,
        registry: &Registry,
        errors: &mut Vec<ConfigError>,
    ) {
        let path = format!("technologies.{name}");

        let category = Self::category(name);
        if category.is_none() {
            errors.push(ConfigError::new(
                path.clone(),
                format!(
                    "unsupported technology \"{name}\", available: {}",
                    TechnologyCategory::NAMES.join(", ")
                ),
            ));
        }

        match (&self.fin_model, &self.financial_model) {
            (Some(fm), _) => fm.validate(&format!("{path}.fin_model"), project_life, errors),
            (None, Some(sel)) => {
                let external = category
                    .and_then(|c| registry.resolve(c, ModelKind::Finance, &sel.model).ok())
                    .is_some_and(|entry| !entry.is_in_process());
                if external {
                    errors.push(ConfigError::new(
                        format!("{path}.fin_model"),
                        format!(
                            "missing; external financial_model \"{}\" does not replace fin_model",
                            sel.model
                        ),
                    ));
                }
            }
            (None, None) => errors.push(ConfigError::new(
                format!("{path}.fin_model"),
                "missing; every technology needs a fin_model block or a financial_model selection",
            )),
        }

        if self.model_name.is_some() && self.performance_model.is_some() {
            errors.push(ConfigError::new(
                format!("{path}.model_name"),
                "cannot be combined with performance_model",
            ));
        }

        if let Some(category) = category {
            let selections = [
                ("model_name", ModelKind::Performance, self.model_name.as_deref()),
                (
                    "performance_model.model",
                    ModelKind::Performance,
                    self.performance_model.as_ref().map(|s| s.model.as_str()),
                ),
                (
                    "cost_model.model",
                    ModelKind::Cost,
                    self.cost_model.as_ref().map(|s| s.model.as_str()),
                ),
                (
                    "financial_model.model",
                    ModelKind::Finance,
                    self.financial_model.as_ref().map(|s| s.model.as_str()),
                ),
            ];
            for (key, kind, selected) in selections {
                let Some(model) = selected else {
                    continue;
                };
                if let Err(e) = registry.resolve(category, kind, model) {
                    errors.push(ConfigError::new(format!("{path}.{key}"), e.to_string()));
                }
            }
        }

        let has_models = self.performance_model.is_some()
            || self.cost_model.is_some()
            || self.financial_model.is_some();
        if has_models && self.model_inputs.is_none() {
            errors.push(ConfigError::new(
                format!("{path}.model_inputs"),
                "required when performance_model, cost_model, or financial_model is set",
            ));
        }

        self.validate_parameters(&path, project_life, errors);
    }

    fn validate_parameters(&self, path: &str, project_life: u32, errors: &mut Vec<ConfigError>) {
        for key in NON_NEGATIVE_KEYS {
            match self.parameters.get(*key) {
                None => {}
                Some(v) => match v.as_f64() {
                    Some(x) => check_non_negative(errors, &format!("{path}.{key}"), x),
                    None => errors.push(ConfigError::new(
                        format!("{path}.{key}"),
                        "must be a number",
                    )),
                },
            }
        }

        for key in YEAR_ARRAY_KEYS {
            let Some(v) = self.parameters.get(*key) else {
                continue;
            };
            match numeric_sequence(v) {
                Some(values) => {
                    check_year_array(errors, &format!("{path}.{key}"), &values, project_life);
                }
                None => errors.push(ConfigError::new(
                    format!("{path}.{key}"),
                    "must be a list of numbers",
                )),
            }
        }

        for key in SOC_KEYS {
            if let Some(x) = self.parameter_f64(key) {
                check_percent(errors, &format!("{path}.{key}"), x);
            }
        }
        let soc_bounds = (
            self.parameter_f64("minimum_SOC"),
            self.parameter_f64("maximum_SOC"),
        );
        if let (Some(lo), Some(hi)) = soc_bounds {
            if lo <= hi {
                return;
            }
            errors.push(ConfigError::new(
                format!("{path}.minimum_SOC"),
                "must be <= maximum_SOC",
            ));
        }
    }
}

fn numeric_sequence(v: &Value) -> Option<Vec<f64>> {
    v.as_sequence()?.iter().map(Value::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(yaml: &str) -> TechnologyConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn errors_for(name: &str, tech: &TechnologyConfig) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        tech.validate(name, 25, &Registry::builtin(), &mut errors);
        errors
    }

    #[test]
    fn unknown_keys_are_kept_as_parameters() {
        let tech = block("num_turbines: 10\nturbine_rating_kw: 6000\nlayout_mode: basicgrid\n");
        assert_eq!(tech.parameter_f64("num_turbines"), Some(10.0));
        assert_eq!(
            tech.parameters.get("layout_mode").and_then(Value::as_str),
            Some("basicgrid")
        );
        assert_eq!(tech.capacity_kw(TechnologyCategory::Wind), Some(60_000.0));
    }

    #[test]
    fn missing_fin_model_rejected() {
        let tech = block("system_capacity_kw: 100\n");
        let errors = errors_for("pv", &tech);
        let err = errors
            .iter()
            .find(|e| e.field == "technologies.pv.fin_model")
            .map(|e| e.message.clone())
            .unwrap_or_default();
        assert!(err.contains("missing"), "{errors:?}");
    }

    #[test]
    fn external_financial_model_needs_fin_model() {
        let tech = block(
            "system_capacity_kw: 100\nfinancial_model:\n  model: pysam_singleowner\nmodel_inputs: {}\n",
        );
        let errors = errors_for("wind", &tech);
        let err = errors
            .iter()
            .find(|e| e.field == "technologies.wind.fin_model")
            .map(|e| e.message.clone())
            .unwrap_or_default();
        assert!(err.contains("pysam_singleowner"), "{errors:?}");
    }

    #[test]
    fn financial_model_replaces_fin_model() {
        let tech = block(
            "financial_model:\n  model: natural_geoh2_financial\nmodel_inputs:\n  shared_parameters:\n    well_lifetime: 30\n",
        );
        let errors = errors_for("geoh2", &tech);
        assert!(
            errors.iter().all(|e| e.field != "technologies.geoh2.fin_model"),
            "{errors:?}"
        );
    }

    #[test]
    fn unknown_model_name_is_unsupported() {
        let tech = block("model_name: windy_mcwindface\n");
        let errors = errors_for("wind", &tech);
        let err = errors
            .iter()
            .find(|e| e.field == "technologies.wind.model_name")
            .map(|e| e.message.clone())
            .unwrap_or_default();
        assert!(err.contains("unsupported model"), "{errors:?}");
    }

    #[test]
    fn unknown_technology_rejected() {
        let tech = block("system_capacity_kw: 1\n");
        let errors = errors_for("fusion", &tech);
        assert!(errors.iter().any(|e| e.field == "technologies.fusion"));
    }

    #[test]
    fn negative_capacity_rejected() {
        let tech = block("system_capacity_kw: -5\n");
        let errors = errors_for("pv", &tech);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "technologies.pv.system_capacity_kw")
        );
    }

    #[test]
    fn soc_limits_checked() {
        let tech = block("minimum_SOC: 80\nmaximum_SOC: 20\ninitial_SOC: 150\n");
        let errors = errors_for("battery", &tech);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "technologies.battery.minimum_SOC")
        );
        assert!(
            errors
                .iter()
                .any(|e| e.field == "technologies.battery.initial_SOC")
        );
    }

    #[test]
    fn degradation_array_length() {
        let tech = block("dc_degradation: [0.5, 0.5]\n");
        let errors = errors_for("pv", &tech);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "technologies.pv.dc_degradation")
        );
    }

    #[test]
    fn stage_parameters_override_shared() {
        let inputs: ModelInputs = serde_yaml::from_str(
            "shared_parameters:\n  a: 1\n  b: 2\ncost_parameters:\n  b: 3\n",
        )
        .unwrap();
        let merged = inputs.merged(ModelKind::Cost);
        assert_eq!(merged.get("a").and_then(Value::as_f64), Some(1.0));
        assert_eq!(merged.get("b").and_then(Value::as_f64), Some(3.0));
        let perf = inputs.merged(ModelKind::Performance);
        assert_eq!(perf.get("b").and_then(Value::as_f64), Some(2.0));
    }
}
