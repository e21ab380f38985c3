//! In-process performance, cost, and financial models.
//!
//! Each technology stage is a trait object built from the technology block
//! by the [`registry`](crate::registry). Performance models produce hourly
//! series over one year; cost models turn those into CapEx and OpEx; finance
//! models levelize the result per unit of the main commodity.

pub mod cost_info;
pub mod electrowinning;
pub mod finance;
pub mod geoh2;
pub mod methanol;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::config::{RunConfig, TechnologyConfig};
use crate::registry::{ModelKind, TechnologyCategory};

/// Hours in the simulated year; every hourly series has this length.
pub const HOURS_PER_YEAR: usize = 8760;

/// Failure while building or running a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid inputs for {model}: {source}")]
    Inputs {
        model: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{model}: unknown {kind} inputs: {keys}")]
    UnknownInputs {
        model: &'static str,
        kind: ModelKind,
        keys: String,
    },
    #[error("{model}: {field} {message}")]
    InvalidInput {
        model: &'static str,
        field: &'static str,
        message: String,
    },
    #[error("{model} needs performance results from an upstream model")]
    MissingPerformance { model: &'static str },
    #[error("{model} needs the {flow} series from the performance model")]
    MissingFlow {
        model: &'static str,
        flow: &'static str,
    },
    #[error("{model}: annual production is {total}, cannot levelize")]
    NoProduction { model: &'static str, total: f64 },
}

/// Everything a model builder may read.
#[derive(Debug, Clone, Copy)]
pub struct ModelContext<'a> {
    /// Technology block name.
    pub technology: &'a str,
    pub category: TechnologyCategory,
    pub config: &'a TechnologyConfig,
    pub run: &'a RunConfig,
}

impl ModelContext<'_> {
    /// Shared inputs merged with the inputs of `kind`.
    pub fn inputs(&self, kind: ModelKind) -> Mapping {
        self.config
            .model_inputs
            .as_ref()
            .map(|i| i.merged(kind))
            .unwrap_or_default()
    }

    /// Deserializes the merged inputs of `kind` into a typed config.
    ///
    /// Keys under the stage's own parameters must all be read by the model.
    /// Shared parameters may hold keys meant for other stages.
    pub fn parse_inputs<T: DeserializeOwned + Serialize>(
        &self,
        model: &'static str,
        kind: ModelKind,
    ) -> Result<T, ModelError> {
        let parsed: T = parse_inputs(model, self.inputs(kind))?;
        let Some(stage) = self.config.model_inputs.as_ref().and_then(|i| i.stage(kind)) else {
            return Ok(parsed);
        };
        let known = serde_yaml::to_value(&parsed).map_err(|source| ModelError::Inputs { model, source })?;
        let unknown: Vec<String> = stage
            .keys()
            .filter(|k| known.as_mapping().is_none_or(|m| !m.contains_key(*k)))
            .map(|k| match k.as_str() {
                Some(key) => key.to_string(),
                None => format!("{k:?}"),
            })
            .collect();
        if unknown.is_empty() {
            Ok(parsed)
        } else {
            Err(ModelError::UnknownInputs {
                model,
                kind,
                keys: unknown.join(", "),
            })
        }
    }
}

/// Deserializes a parameter mapping into a typed model config.
pub fn parse_inputs<T: DeserializeOwned>(
    model: &'static str,
    inputs: Mapping,
) -> Result<T, ModelError> {
    serde_yaml::from_value(Value::Mapping(inputs)).map_err(|source| ModelError::Inputs { model, source })
}

/// Hourly production plus named side flows of one technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceOutput {
    /// Main commodity, e.g. `"methanol"` or `"hydrogen"`.
    pub commodity: String,
    /// Unit of the hourly production series.
    pub unit: String,
    /// Hourly production, [`HOURS_PER_YEAR`] entries.
    pub production: Vec<f64>,
    /// Hourly consumption, emission, and co-product series.
    pub flows: BTreeMap<String, Vec<f64>>,
    /// Annual scalars such as catalyst volumes.
    pub annual: BTreeMap<String, f64>,
}

impl PerformanceOutput {
    pub fn new(commodity: &str, unit: &str, production: Vec<f64>) -> Self {
        Self {
            commodity: commodity.to_string(),
            unit: unit.to_string(),
            production,
            flows: BTreeMap::new(),
            annual: BTreeMap::new(),
        }
    }

    /// Total production over the year.
    pub fn annual_production(&self) -> f64 {
        self.production.iter().sum()
    }

    /// Yearly total of a named flow.
    pub fn flow_total(&self, name: &str) -> Option<f64> {
        self.flows.get(name).map(|s| s.iter().sum())
    }

    pub(crate) fn require_flow(&self, model: &'static str, flow: &'static str) -> Result<f64, ModelError> {
        self.flow_total(flow)
            .ok_or(ModelError::MissingFlow { model, flow })
    }

    pub(crate) fn require_annual(&self, model: &'static str, key: &'static str) -> Result<f64, ModelError> {
        self.annual
            .get(key)
            .copied()
            .ok_or(ModelError::MissingFlow { model, flow: key })
    }
}

/// Capital and operating cost of one technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostOutput {
    /// Capital expenditure (USD).
    pub capex: f64,
    /// Fixed operating expenditure (USD/year).
    pub fixed_opex: f64,
    /// Variable operating expenditure (USD/year).
    pub variable_opex: f64,
    /// Total operating expenditure (USD/year).
    pub opex: f64,
    /// Dollar year of the figures, when the model states one.
    pub cost_year: Option<i32>,
    /// Feedstock costs, co-product revenue, and other itemized amounts.
    pub items: BTreeMap<String, f64>,
}

impl CostOutput {
    /// Multiplies every monetary amount by `ratio` and relabels the dollar year.
    pub fn rescale(&mut self, ratio: f64, year: i32) {
        self.capex *= ratio;
        self.fixed_opex *= ratio;
        self.variable_opex *= ratio;
        self.opex *= ratio;
        for v in self.items.values_mut() {
            *v *= ratio;
        }
        self.cost_year = Some(year);
    }

    pub(crate) fn require_item(&self, model: &'static str, key: &'static str) -> Result<f64, ModelError> {
        self.items
            .get(key)
            .copied()
            .ok_or(ModelError::MissingFlow { model, flow: key })
    }
}

/// Levelized cost of the main commodity and its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceOutput {
    pub levelized_cost: f64,
    /// e.g. `"USD/kg"`.
    pub unit: String,
    pub breakdown: BTreeMap<String, f64>,
}

pub trait PerformanceModel {
    fn name(&self) -> &'static str;
    fn compute(&self) -> Result<PerformanceOutput, ModelError>;
}

pub trait CostModel {
    fn name(&self) -> &'static str;
    fn compute(&self, performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError>;
}

pub trait FinanceModel {
    fn name(&self) -> &'static str;
    fn compute(
        &self,
        performance: Option<&PerformanceOutput>,
        cost: &CostOutput,
    ) -> Result<FinanceOutput, ModelError>;
}

/// A series holding `value` for every hour of the year.
pub fn constant_series(value: f64) -> Vec<f64> {
    vec![value; HOURS_PER_YEAR]
}

/// Element-wise `series * ratio`.
pub fn scaled(series: &[f64], ratio: f64) -> Vec<f64> {
    series.iter().map(|x| x * ratio).collect()
}

/// Rejects zero or negative annual production before dividing by it.
pub(crate) fn positive_production(model: &'static str, total: f64) -> Result<f64, ModelError> {
    if total > 0.0 && total.is_finite() {
        Ok(total)
    } else {
        Err(ModelError::NoProduction { model, total })
    }
}
