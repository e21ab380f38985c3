//! Methanol plants: steam methane reforming (SMR) and CO2 hydrogenation (CO2H).
//!
//! Both routes share the production profile, the NETL total overnight cost
//! (TOC) CapEx scaling, and the TASC / fixed charge rate financing
//! (NETL-PUB-22580). The route modules add their own feedstocks.

pub mod co2h;
pub mod smr;

use serde::{Deserialize, Serialize};

use super::{CostOutput, ModelError, PerformanceOutput, constant_series, positive_production};

/// Nameplate capacity when none is given (kg/year).
pub const DEFAULT_PLANT_CAPACITY_KGPY: f64 = 1.0e8;
/// Fraction of nameplate realized when none is given.
pub const DEFAULT_CAPACITY_FACTOR: f64 = 0.85;
/// NETL-PUB-22580, Exhibit 3-7.
pub const DEFAULT_FIXED_CHARGE_RATE: f64 = 0.0707;
/// NETL-PUB-22580, Exhibit 3-5.
pub const DEFAULT_TASC_TOC_MULTIPLIER: f64 = 1.093;

fn default_capacity() -> f64 {
    DEFAULT_PLANT_CAPACITY_KGPY
}

fn default_capacity_factor() -> f64 {
    DEFAULT_CAPACITY_FACTOR
}

fn default_fixed_charge_rate() -> f64 {
    DEFAULT_FIXED_CHARGE_RATE
}

fn default_tasc_toc_multiplier() -> f64 {
    DEFAULT_TASC_TOC_MULTIPLIER
}

/// Inputs common to every methanol performance model. Ratios are per kg methanol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethanolPerformanceInputs {
    #[serde(default = "default_capacity")]
    pub plant_capacity_kgpy: f64,
    #[serde(default = "default_capacity_factor")]
    pub capacity_factor: f64,
    #[serde(default)]
    pub co2e_emit_ratio: f64,
    #[serde(default)]
    pub h2o_consume_ratio: f64,
    #[serde(default)]
    pub h2_consume_ratio: f64,
    #[serde(default)]
    pub co2_consume_ratio: f64,
    #[serde(default)]
    pub elec_consume_ratio: f64,
}

impl MethanolPerformanceInputs {
    pub(crate) fn check(&self, model: &'static str) -> Result<(), ModelError> {
        if self.plant_capacity_kgpy.is_nan() || self.plant_capacity_kgpy < 0.0 {
            return Err(ModelError::InvalidInput {
                model,
                field: "plant_capacity_kgpy",
                message: format!("must be >= 0, got {}", self.plant_capacity_kgpy),
            });
        }
        if !(0.0..=1.0).contains(&self.capacity_factor) {
            return Err(ModelError::InvalidInput {
                model,
                field: "capacity_factor",
                message: format!("must be in [0, 1], got {}", self.capacity_factor),
            });
        }
        Ok(())
    }

    /// Flat hourly methanol output (kg/h).
    pub fn hourly_production(&self) -> Vec<f64> {
        constant_series(self.plant_capacity_kgpy * self.capacity_factor / 8760.0)
    }
}

/// Inputs common to every methanol cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethanolCostInputs {
    /// TOC slope (USD per kg/year of capacity).
    pub toc_kg_y: f64,
    /// Fixed operating cost slope (USD/year per kg/year of capacity).
    #[serde(rename = "foc_kg_y^2", alias = "foc_kg_y2")]
    pub foc_kg_y2: f64,
    /// Variable operating cost (USD/kg).
    pub voc_kg: f64,
    #[serde(default = "default_capacity")]
    pub plant_capacity_kgpy: f64,
    /// Dollar year of the cost coefficients.
    #[serde(default)]
    pub cost_year: Option<i32>,
}

impl MethanolCostInputs {
    /// TOC CapEx and the fixed/variable OpEx split.
    pub(crate) fn plant_costs(&self, performance: &PerformanceOutput) -> CostOutput {
        let capex = self.plant_capacity_kgpy * self.toc_kg_y;
        let fixed_opex = self.plant_capacity_kgpy * self.foc_kg_y2;
        let variable_opex = performance.annual_production() * self.voc_kg;
        CostOutput {
            capex,
            fixed_opex,
            variable_opex,
            opex: fixed_opex + variable_opex,
            cost_year: self.cost_year,
            items: Default::default(),
        }
    }
}

/// Inputs common to every methanol finance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethanolFinanceInputs {
    #[serde(default = "default_fixed_charge_rate")]
    pub fixed_charge_rate: f64,
    #[serde(default = "default_tasc_toc_multiplier")]
    pub tasc_toc_multiplier: f64,
}

/// Plant-only levelized cost shares (USD/kg) before feedstocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlantShares {
    pub total_kg: f64,
    pub capex: f64,
    pub fopex: f64,
    pub vopex: f64,
}

impl MethanolFinanceInputs {
    pub(crate) fn plant_shares(
        &self,
        model: &'static str,
        performance: &PerformanceOutput,
        cost: &CostOutput,
    ) -> Result<PlantShares, ModelError> {
        let total_kg = positive_production(model, performance.annual_production())?;
        Ok(PlantShares {
            total_kg,
            capex: cost.capex * self.fixed_charge_rate * self.tasc_toc_multiplier / total_kg,
            fopex: cost.fixed_opex / total_kg,
            vopex: cost.variable_opex / total_kg,
        })
    }
}
