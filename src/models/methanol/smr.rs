//! Steam methane reforming methanol plant.
//!
//! Consumes LNG and catalysts, exports surplus electricity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MethanolCostInputs, MethanolFinanceInputs, MethanolPerformanceInputs};
use crate::models::{
    CostModel, CostOutput, FinanceModel, FinanceOutput, ModelContext, ModelError, PerformanceModel,
    PerformanceOutput, scaled,
};
use crate::registry::ModelKind;

/// MMBtu per GJ as applied to the LNG cost.
const MMBTU_PER_GJ: f64 = 1.055;
/// LNG lower heating value (GJ/kg).
const LNG_LHV_GJ_PER_KG: f64 = 0.0201;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmrPerformanceInputs {
    #[serde(flatten)]
    pub base: MethanolPerformanceInputs,
    /// ft³ synthesis catalyst per kg methanol.
    pub meoh_syn_cat_consume_ratio: f64,
    /// ft³ ATR catalyst per kg methanol.
    pub meoh_atr_cat_consume_ratio: f64,
    /// kg LNG per kg methanol.
    pub lng_consume_ratio: f64,
    /// kWh exported per kg methanol.
    pub elec_produce_ratio: f64,
}

pub struct SmrPerformance {
    inputs: SmrPerformanceInputs,
}

impl SmrPerformance {
    pub const KEY: &'static str = "smr_methanol_performance";

    pub fn new(inputs: SmrPerformanceInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn PerformanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Performance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl PerformanceModel for SmrPerformance {
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
            ("co2_consumption", i.base.co2_consume_ratio),
            ("h2o_consumption", i.base.h2o_consume_ratio),
            ("h2_consumption", i.base.h2_consume_ratio),
            ("co2e_emissions", i.base.co2e_emit_ratio),
            ("elec_consumption", i.base.elec_consume_ratio),
            ("lng_consumption", i.lng_consume_ratio),
            ("electricity", i.elec_produce_ratio),
        ];
        for (name, ratio) in flows {
            out.flows.insert(name.to_string(), scaled(&out.production, ratio));
        }
        out.annual.insert(
            "meoh_syn_cat_consumption".into(),
            total * i.meoh_syn_cat_consume_ratio,
        );
        out.annual.insert(
            "meoh_atr_cat_consumption".into(),
            total * i.meoh_atr_cat_consume_ratio,
        );
        debug!(model = Self::KEY, annual_kg = total, "computed methanol production");
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmrCostInputs {
    #[serde(flatten)]
    pub base: MethanolCostInputs,
    /// USD/ft³.
    pub meoh_syn_cat_price: f64,
    /// USD/ft³.
    pub meoh_atr_cat_price: f64,
    /// USD/MMBtu.
    pub lng_price: f64,
    /// USD/kWh.
    pub elec_sales_price: f64,
}

pub struct SmrCost {
    inputs: SmrCostInputs,
}

impl SmrCost {
    pub const KEY: &'static str = "smr_methanol_cost";

    pub fn new(inputs: SmrCostInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Cost)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl CostModel for SmrCost {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(&self, performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError> {
        let perf = performance.ok_or(ModelError::MissingPerformance { model: Self::KEY })?;
        let i = &self.inputs;
        let mut out = i.base.plant_costs(perf);

        let syn_cat = perf.require_annual(Self::KEY, "meoh_syn_cat_consumption")?;
        let atr_cat = perf.require_annual(Self::KEY, "meoh_atr_cat_consumption")?;
        let lng_kg = perf.require_flow(Self::KEY, "lng_consumption")?;
        let elec_kwh = perf.require_flow(Self::KEY, "electricity")?;

        out.items = BTreeMap::from([
            ("meoh_syn_cat_cost".to_string(), syn_cat * i.meoh_syn_cat_price),
            ("meoh_atr_cat_cost".to_string(), atr_cat * i.meoh_atr_cat_price),
            (
                "lng_cost".to_string(),
                lng_kg * MMBTU_PER_GJ * LNG_LHV_GJ_PER_KG * i.lng_price,
            ),
            ("elec_revenue".to_string(), elec_kwh * i.elec_sales_price),
        ]);
        Ok(out)
    }
}

pub struct SmrFinance {
    inputs: MethanolFinanceInputs,
}

impl SmrFinance {
    pub const KEY: &'static str = "smr_methanol_financial";

    pub fn new(inputs: MethanolFinanceInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Finance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl FinanceModel for SmrFinance {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(
        &self,
        performance: Option<&PerformanceOutput>,
        cost: &CostOutput,
    ) -> Result<FinanceOutput, ModelError> {
        let perf = performance.ok_or(ModelError::MissingPerformance { model: Self::KEY })?;
        let shares = self.inputs.plant_shares(Self::KEY, perf, cost)?;
        let per_kg = |key: &'static str| -> Result<f64, ModelError> {
            Ok(cost.require_item(Self::KEY, key)? / shares.total_kg)
        };

        let syn_cat = per_kg("meoh_syn_cat_cost")?;
        let atr_cat = per_kg("meoh_atr_cat_cost")?;
        let ng = per_kg("lng_cost")?;
        let elec = -per_kg("elec_revenue")?;
        // variable OpEx already contains the catalysts
        let vopex = shares.vopex - (syn_cat + atr_cat);
        let meoh = shares.capex + shares.fopex + vopex + syn_cat + atr_cat;
        let lcom = meoh + ng + elec;

        let breakdown = BTreeMap::from([
            ("LCOM_meoh_capex".to_string(), shares.capex),
            ("LCOM_meoh_fopex".to_string(), shares.fopex),
            ("LCOM_meoh_vopex".to_string(), vopex),
            ("LCOM_meoh_syn_cat".to_string(), syn_cat),
            ("LCOM_meoh_atr_cat".to_string(), atr_cat),
            ("LCOM_meoh".to_string(), meoh),
            ("LCOM_ng".to_string(), ng),
            ("LCOM_elec".to_string(), elec),
        ]);
        Ok(FinanceOutput {
            levelized_cost: lcom,
            unit: "USD/kg".into(),
            breakdown,
        })
    }
}
