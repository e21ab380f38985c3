//! Installed-cost model for wind, PV, and battery blocks.
//!
//! Reads the run-wide `config.cost_info` assumptions and the capacity of the
//! technology block. The figures have no stated dollar year.

use std::collections::BTreeMap;

use super::{CostModel, CostOutput, ModelContext, ModelError, PerformanceOutput};
use crate::config::CostInfo;
use crate::registry::TechnologyCategory;

pub const KEY: &str = "cost_info";

/// Capacity of the block the costs apply to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Wind or PV rated power (kW).
    Generator { kw: f64 },
    /// Battery power (kW) and energy (kWh).
    Storage { kw: f64, kwh: f64 },
}

pub struct CostInfoCost {
    category: TechnologyCategory,
    sizing: Sizing,
    assumptions: CostInfo,
}

impl CostInfoCost {
    pub fn new(category: TechnologyCategory, sizing: Sizing, assumptions: CostInfo) -> Self {
        Self {
            category,
            sizing,
            assumptions,
        }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        let assumptions = ctx.run.cost_info.clone().ok_or(ModelError::InvalidInput {
            model: KEY,
            field: "cost_info",
            message: "config.cost_info is not set".into(),
        })?;
        let kw = ctx
            .config
            .capacity_kw(ctx.category)
            .ok_or(ModelError::InvalidInput {
                model: KEY,
                field: "system_capacity_kw",
                message: format!("{} block has no rated capacity", ctx.technology),
            })?;
        let sizing = match ctx.category {
            TechnologyCategory::Battery => Sizing::Storage {
                kw,
                kwh: ctx.config.storage_capacity_kwh().ok_or(ModelError::InvalidInput {
                    model: KEY,
                    field: "system_capacity_kwh",
                    message: format!("{} block has no energy capacity", ctx.technology),
                })?,
            },
            _ => Sizing::Generator { kw },
        };
        Ok(Box::new(Self::new(ctx.category, sizing, assumptions)))
    }

    fn assumption(&self, field: &'static str, value: Option<f64>) -> Result<f64, ModelError> {
        value.ok_or(ModelError::InvalidInput {
            model: KEY,
            field,
            message: "missing from config.cost_info".into(),
        })
    }
}

impl CostModel for CostInfoCost {
    fn name(&self) -> &'static str {
        KEY
    }

    fn compute(&self, _performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError> {
        let a = &self.assumptions;
        let (capex, fixed_opex, items) = match (self.category, self.sizing) {
            (TechnologyCategory::Wind, Sizing::Generator { kw }) => {
                let per_mw = self.assumption("wind_installed_cost_mw", a.wind_installed_cost_mw)?;
                let om = self.assumption("wind_om_per_kw", a.wind_om_per_kw)?;
                (kw / 1000.0 * per_mw, kw * om, BTreeMap::new())
            }
            (TechnologyCategory::Pv, Sizing::Generator { kw }) => {
                let per_mw = self.assumption("solar_installed_cost_mw", a.solar_installed_cost_mw)?;
                let om = self.assumption("pv_om_per_kw", a.pv_om_per_kw)?;
                (kw / 1000.0 * per_mw, kw * om, BTreeMap::new())
            }
            (TechnologyCategory::Battery, Sizing::Storage { kw, kwh }) => {
                let per_mwh =
                    self.assumption("storage_installed_cost_mwh", a.storage_installed_cost_mwh)?;
                let per_mw =
                    self.assumption("storage_installed_cost_mw", a.storage_installed_cost_mw)?;
                let om = self.assumption("battery_om_per_kw", a.battery_om_per_kw)?;
                let energy = kwh / 1000.0 * per_mwh;
                let power = kw / 1000.0 * per_mw;
                let items = BTreeMap::from([
                    ("energy_capex".to_string(), energy),
                    ("power_capex".to_string(), power),
                ]);
                (energy + power, kw * om, items)
            }
            (category, _) => {
                return Err(ModelError::InvalidInput {
                    model: KEY,
                    field: "category",
                    message: format!("no cost_info assumptions for {category}"),
                });
            }
        };
        Ok(CostOutput {
            capex,
            fixed_opex,
            opex: fixed_opex,
            items,
            ..CostOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assumptions() -> CostInfo {
        CostInfo {
            wind_installed_cost_mw: Some(1_382_000.0),
            solar_installed_cost_mw: Some(1_044_000.0),
            storage_installed_cost_mwh: Some(315_000.0),
            storage_installed_cost_mw: Some(640_000.0),
            wind_om_per_kw: Some(43.0),
            pv_om_per_kw: Some(18.0),
            battery_om_per_kw: Some(9.1),
        }
    }

    #[test]
    fn wind_capex_scales_with_megawatts() {
        let cost = CostInfoCost::new(
            TechnologyCategory::Wind,
            Sizing::Generator { kw: 60_000.0 },
            assumptions(),
        )
        .compute(None)
        .unwrap();
        assert_relative_eq!(cost.capex, 60.0 * 1_382_000.0);
        assert_relative_eq!(cost.opex, 60_000.0 * 43.0);
        assert_eq!(cost.cost_year, None);
    }

    #[test]
    fn battery_splits_energy_and_power() {
        let cost = CostInfoCost::new(
            TechnologyCategory::Battery,
            Sizing::Storage {
                kw: 20_000.0,
                kwh: 80_000.0,
            },
            assumptions(),
        )
        .compute(None)
        .unwrap();
        assert_relative_eq!(cost.items["energy_capex"], 80.0 * 315_000.0);
        assert_relative_eq!(cost.items["power_capex"], 20.0 * 640_000.0);
        assert_relative_eq!(cost.capex, 80.0 * 315_000.0 + 20.0 * 640_000.0);
        assert_relative_eq!(cost.fixed_opex, 20_000.0 * 9.1);
    }

    #[test]
    fn missing_assumption_named() {
        let mut a = assumptions();
        a.pv_om_per_kw = None;
        let err = CostInfoCost::new(TechnologyCategory::Pv, Sizing::Generator { kw: 1.0 }, a)
            .compute(None)
            .unwrap_err();
        assert!(err.to_string().contains("pv_om_per_kw"));
    }
}
