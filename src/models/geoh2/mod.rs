//! Geologic hydrogen wells.
//!
//! `natural` draws accumulated hydrogen from a reservoir; `combined` adds
//! hydrogen generated by stimulated serpentinization of iron-bearing rock.
//! Both share one cost and one finance model.

pub mod combined;
pub mod natural;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::finance::{NETL_ATWACC, NETL_EFFECTIVE_TAX_RATE, fixed_charge_rate};
use super::{
    CostModel, CostOutput, FinanceModel, FinanceOutput, ModelContext, ModelError, PerformanceOutput,
    positive_production,
};
use crate::registry::ModelKind;

/// Contracting share of the bare erected cost.
const CONTRACTING_FRACTION: f64 = 0.20;
/// Contingency share of the EPC cost.
const CONTINGENCY_FRACTION: f64 = 0.50;
/// Pre-production cost as a share of fixed OpEx.
const PREPRODUCTION_FRACTION: f64 = 0.50;
const TASC_TOC_MULTIPLIER: f64 = 1.10;

fn check_lifetime(model: &'static str, years: u32) -> Result<u32, ModelError> {
    if years == 0 {
        return Err(ModelError::InvalidInput {
            model,
            field: "well_lifetime",
            message: "must be >= 1 year".into(),
        });
    }
    Ok(years)
}

/// Expected wellhead hydrogen concentration (%) from site prospectivity.
pub fn wellhead_h2_concentration(prospectivity: f64) -> f64 {
    58.929_817_51 * prospectivity.powf(2.460_718_753)
}

/// Lifetime-average wellhead gas flow (kg/h), capped by what the reservoir holds.
pub fn lifetime_wellhead_flow(initial_flow: f64, reservoir_tonnes: f64, lifetime: u32) -> f64 {
    let reservoir_limited = reservoir_tonnes / f64::from(lifetime) * 1000.0 / 8760.0;
    initial_flow.min(reservoir_limited)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoH2CostInputs {
    /// Well lifetime (years).
    pub well_lifetime: u32,
    /// Dollar year of the inputs.
    pub cost_year: i32,
    /// USD.
    pub test_drill_cost: f64,
    /// USD.
    pub permit_fees: f64,
    /// acre.
    pub acreage: f64,
    /// USD/acre.
    pub rights_cost: f64,
    /// USD.
    #[serde(default)]
    pub acquisition_cost: f64,
    /// USD.
    pub completion_cost: f64,
    /// Chance a drilled well succeeds (%).
    pub success_chance: f64,
    /// USD/year.
    pub fixed_opex: f64,
    /// USD/kg.
    pub variable_opex: f64,
}

/// Per-well capital with NETL multipliers.
pub struct GeoH2Cost {
    key: &'static str,
    inputs: GeoH2CostInputs,
}

impl GeoH2Cost {
    pub fn new(key: &'static str, inputs: GeoH2CostInputs) -> Self {
        Self { key, inputs }
    }

    pub fn build_natural(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        Self::build(natural::COST_KEY, ctx)
    }

    pub fn build_combined(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        Self::build(combined::COST_KEY, ctx)
    }

    fn build(key: &'static str, ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        let inputs = ctx.parse_inputs(key, ModelKind::Cost)?;
        Ok(Box::new(Self::new(key, inputs)))
    }
}

impl CostModel for GeoH2Cost {
    fn name(&self) -> &'static str {
        self.key
    }

    fn compute(&self, performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError> {
        let i = &self.inputs;
        check_lifetime(self.key, i.well_lifetime)?;
        if !(i.success_chance > 0.0 && i.success_chance <= 100.0) {
            return Err(ModelError::InvalidInput {
                model: self.key,
                field: "success_chance",
                message: format!("must be in (0, 100], got {}", i.success_chance),
            });
        }
        let perf = performance.ok_or(ModelError::MissingPerformance { model: self.key })?;

        // every successful well pays for the dry holes before it
        let per_well = i.test_drill_cost + i.permit_fees + i.acreage * i.rights_cost;
        let bare = per_well / i.success_chance * 100.0 + i.completion_cost;

        let epc = bare * (1.0 + CONTRACTING_FRACTION);
        let total_plant = epc * (1.0 + CONTINGENCY_FRACTION);
        let total_overnight = total_plant + i.fixed_opex * PREPRODUCTION_FRACTION;
        let capex = total_overnight * TASC_TOC_MULTIPLIER;

        let production = perf.annual_production();
        debug!(model = self.key, bare, capex, "computed well capital");
        Ok(CostOutput {
            capex,
            fixed_opex: i.fixed_opex,
            variable_opex: i.variable_opex,
            opex: i.fixed_opex + i.variable_opex * production,
            cost_year: Some(i.cost_year),
            items: BTreeMap::from([("bare_capital_cost".to_string(), bare)]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoH2FinanceInputs {
    /// Well lifetime (years).
    pub well_lifetime: u32,
}

/// Levelized cost of hydrogen with the NETL fixed charge rate.
///
/// `Variable_OpEx` is a per-kg cost here, so it enters the LCOH directly.
pub struct GeoH2Finance {
    key: &'static str,
    inputs: GeoH2FinanceInputs,
}

impl GeoH2Finance {
    pub fn new(key: &'static str, inputs: GeoH2FinanceInputs) -> Self {
        Self { key, inputs }
    }

    pub fn build_natural(ctx: &ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError> {
        Self::build(natural::FINANCE_KEY, ctx)
    }

    pub fn build_combined(ctx: &ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError> {
        Self::build(combined::FINANCE_KEY, ctx)
    }

    fn build(key: &'static str, ctx: &ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(key, ModelKind::Finance)?;
        Ok(Box::new(Self::new(key, inputs)))
    }
}

impl FinanceModel for GeoH2Finance {
    fn name(&self) -> &'static str {
        self.key
    }

    fn compute(
        &self,
        performance: Option<&PerformanceOutput>,
        cost: &CostOutput,
    ) -> Result<FinanceOutput, ModelError> {
        let lifetime = check_lifetime(self.key, self.inputs.well_lifetime)?;
        let perf = performance.ok_or(ModelError::MissingPerformance { model: self.key })?;
        let production = positive_production(self.key, perf.annual_production())?;

        let fcr = fixed_charge_rate(NETL_ATWACC, NETL_EFFECTIVE_TAX_RATE, lifetime);
        let capex_share = cost.capex * fcr / production;
        let fopex_share = cost.fixed_opex / production;
        let vopex_share = cost.variable_opex;

        Ok(FinanceOutput {
            levelized_cost: capex_share + fopex_share + vopex_share,
            unit: "USD/kg".into(),
            breakdown: BTreeMap::from([
                ("LCOH_capex".to_string(), capex_share),
                ("LCOH_fopex".to_string(), fopex_share),
                ("LCOH_vopex".to_string(), vopex_share),
                ("fixed_charge_rate".to_string(), fcr),
            ]),
        })
    }
}
