//! CO2 hydrogenation methanol plant.
//!
//! Buys hydrogen and electricity from upstream technologies, so the finance
//! model takes their levelized costs (`lcoh`, `lcoe`) as inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MethanolCostInputs, MethanolFinanceInputs, MethanolPerformanceInputs};
use crate::models::{
    CostModel, CostOutput, FinanceModel, FinanceOutput, ModelContext, ModelError, PerformanceModel,
    PerformanceOutput, scaled,
};
use crate::registry::ModelKind;

/// MJ per MMBtu.
const MJ_PER_MMBTU: f64 = 1055.056;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2hPerformanceInputs {
    #[serde(flatten)]
    pub base: MethanolPerformanceInputs,
    /// ft³ synthesis catalyst per kg methanol.
    pub meoh_syn_cat_consume_ratio: f64,
    /// kg natural gas per kg methanol.
    pub ng_consume_ratio: f64,
}

pub struct Co2hPerformance {
    inputs: Co2hPerformanceInputs,
}

impl Co2hPerformance {
    pub const KEY: &'static str = "co2h_methanol_performance";

    pub fn new(inputs: Co2hPerformanceInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn PerformanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Performance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl PerformanceModel for Co2hPerformance {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(&self) -> Result<PerformanceOutput, ModelError> {
        let i = &self.inputs;
        i.base.check(Self::KEY)?;
        let meoh = i.base.hourly_production();
        let total: f64 = meoh.iter().sum();

        let mut out = PerformanceOutput::new("methanol", "kg/h", meoh);
        let flows = [
            ("co2e_emissions", i.base.co2e_emit_ratio),
            ("h2o_consumption", i.base.h2o_consume_ratio),
            ("ng_consumption", i.ng_consume_ratio),
            ("carbon_dioxide", i.base.co2_consume_ratio),
            ("hydrogen", i.base.h2_consume_ratio),
            ("electricity", i.base.elec_consume_ratio),
        ];
        for (name, ratio) in flows {
            out.flows.insert(name.to_string(), scaled(&out.production, ratio));
        }
        out.annual.insert(
            "meoh_syn_cat_consumption".into(),
            total * i.meoh_syn_cat_consume_ratio,
        );
        debug!(model = Self::KEY, annual_kg = total, "computed methanol production");
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2hCostInputs {
    #[serde(flatten)]
    pub base: MethanolCostInputs,
    /// Natural gas lower heating value (MJ/kg).
    pub ng_lhv: f64,
    /// USD/ft³.
    pub meoh_syn_cat_price: f64,
    /// USD/MMBtu.
    pub ng_price: f64,
    /// USD/kg.
    pub co2_price: f64,
}

pub struct Co2hCost {
    inputs: Co2hCostInputs,
}

impl Co2hCost {
    pub const KEY: &'static str = "co2h_methanol_cost";

    pub fn new(inputs: Co2hCostInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Cost)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl CostModel for Co2hCost {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(&self, performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError> {
        let perf = performance.ok_or(ModelError::MissingPerformance { model: Self::KEY })?;
        let i = &self.inputs;
        let mut out = i.base.plant_costs(perf);

        let syn_cat = perf.require_annual(Self::KEY, "meoh_syn_cat_consumption")?;
        let ng_kg = perf.require_flow(Self::KEY, "ng_consumption")?;
        let co2_kg = perf.require_flow(Self::KEY, "carbon_dioxide")?;
        let lhv_mmbtu = i.ng_lhv / MJ_PER_MMBTU;

        out.items = BTreeMap::from([
            ("meoh_syn_cat_cost".to_string(), syn_cat * i.meoh_syn_cat_price),
            ("ng_cost".to_string(), ng_kg * lhv_mmbtu * i.ng_price),
            ("co2_cost".to_string(), co2_kg * i.co2_price),
        ]);
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2hFinanceInputs {
    #[serde(flatten)]
    pub base: MethanolFinanceInputs,
    /// Levelized cost of the purchased electricity (USD/kWh).
    pub lcoe: f64,
    /// Levelized cost of the purchased hydrogen (USD/kg).
    pub lcoh: f64,
}

pub struct Co2hFinance {
    inputs: Co2hFinanceInputs,
}

impl Co2hFinance {
    pub const KEY: &'static str = "co2h_methanol_financial";

    pub fn new(inputs: Co2hFinanceInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Finance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl FinanceModel for Co2hFinance {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(
        &self,
        performance: Option<&PerformanceOutput>,
        cost: &CostOutput,
    ) -> Result<FinanceOutput, ModelError> {
        let perf = performance.ok_or(ModelError::MissingPerformance { model: Self::KEY })?;
        let shares = self.inputs.base.plant_shares(Self::KEY, perf, cost)?;
        let kg = shares.total_kg;

        let elec = self.inputs.lcoe * perf.require_flow(Self::KEY, "electricity")? / kg;
        let h2 = self.inputs.lcoh * perf.require_flow(Self::KEY, "hydrogen")? / kg;
        let syn_cat = cost.require_item(Self::KEY, "meoh_syn_cat_cost")? / kg;
        let ng = cost.require_item(Self::KEY, "ng_cost")? / kg;
        let co2 = cost.require_item(Self::KEY, "co2_cost")? / kg;

        // variable OpEx already contains the catalyst
        let vopex = shares.vopex - syn_cat;
        let meoh = shares.capex + shares.fopex + vopex + syn_cat;
        let lcom = meoh + ng + elec + h2 + co2;

        let breakdown = BTreeMap::from([
            ("LCOM_meoh_capex".to_string(), shares.capex),
            ("LCOM_meoh_fopex".to_string(), shares.fopex),
            ("LCOM_meoh_vopex".to_string(), vopex),
            ("LCOM_meoh_syn_cat".to_string(), syn_cat),
            ("LCOM_meoh".to_string(), meoh),
            ("LCOM_ng".to_string(), ng),
            ("LCOM_elec".to_string(), elec),
            ("LCOM_h2".to_string(), h2),
            ("LCOM_co2".to_string(), co2),
        ]);
        Ok(FinanceOutput {
            levelized_cost: lcom,
            unit: "USD/kg".into(),
            breakdown,
        })
    }
}
