//! Natural geologic hydrogen: accumulated gas only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_lifetime, lifetime_wellhead_flow, wellhead_h2_concentration};
use crate::models::{
    ModelContext, ModelError, PerformanceModel, PerformanceOutput, constant_series,
};
use crate::registry::ModelKind;

pub const PERFORMANCE_KEY: &str = "natural_geoh2_performance";
pub const COST_KEY: &str = "natural_geoh2_cost";
pub const FINANCE_KEY: &str = "natural_geoh2_financial";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalGeoH2Inputs {
    /// Well lifetime (years).
    pub well_lifetime: u32,
    /// Site prospectivity score (0-1).
    pub site_prospectivity: f64,
    /// Initial wellhead gas flow (kg/h).
    pub initial_wellhead_flow: f64,
    /// Recoverable gas in the reservoir (tonnes).
    pub gas_reservoir_size: f64,
}

impl NaturalGeoH2Inputs {
    /// Accumulated hydrogen flow (kg/h) with the concentration and gas flow behind it.
    pub(crate) fn accumulated(&self, model: &'static str) -> Result<Accumulated, ModelError> {
        let lifetime = check_lifetime(model, self.well_lifetime)?;
        if !(0.0..=1.0).contains(&self.site_prospectivity) {
            return Err(ModelError::InvalidInput {
                model,
                field: "site_prospectivity",
                message: format!("must be in [0, 1], got {}", self.site_prospectivity),
            });
        }
        let concentration = wellhead_h2_concentration(self.site_prospectivity);
        let gas_flow =
            lifetime_wellhead_flow(self.initial_wellhead_flow, self.gas_reservoir_size, lifetime);
        Ok(Accumulated {
            concentration,
            gas_flow,
            hydrogen: concentration / 100.0 * gas_flow,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Accumulated {
    /// %.
    pub concentration: f64,
    /// kg/h.
    pub gas_flow: f64,
    /// kg/h.
    pub hydrogen: f64,
}

impl Accumulated {
    pub(crate) fn into_output(self, hydrogen: f64) -> PerformanceOutput {
        let mut out = PerformanceOutput::new("hydrogen", "kg/h", constant_series(hydrogen));
        out.flows
            .insert("hydrogen_accumulated".into(), constant_series(self.hydrogen));
        out.annual
            .insert("wellhead_h2_conc".into(), self.concentration);
        out.annual
            .insert("lifetime_wellhead_flow".into(), self.gas_flow);
        out
    }
}

pub struct NaturalGeoH2Performance {
    inputs: NaturalGeoH2Inputs,
}

impl NaturalGeoH2Performance {
    pub fn new(inputs: NaturalGeoH2Inputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn PerformanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(PERFORMANCE_KEY, ModelKind::Performance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl PerformanceModel for NaturalGeoH2Performance {
    fn name(&self) -> &'static str {
        PERFORMANCE_KEY
    }

    fn compute(&self) -> Result<PerformanceOutput, ModelError> {
        let acc = self.inputs.accumulated(PERFORMANCE_KEY)?;
        debug!(
            model = PERFORMANCE_KEY,
            concentration_pct = acc.concentration,
            hydrogen_kg_per_h = acc.hydrogen,
            "computed accumulated hydrogen"
        );
        Ok(acc.into_output(acc.hydrogen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hydrogen_is_concentration_times_flow() {
        let out = NaturalGeoH2Performance::new(NaturalGeoH2Inputs {
            well_lifetime: 30,
            site_prospectivity: 0.7,
            initial_wellhead_flow: 4_000.0,
            gas_reservoir_size: 1.0e6,
        })
        .compute()
        .unwrap();

        let conc = 58.929_817_51 * 0.7_f64.powf(2.460_718_753);
        let flow = 4_000.0_f64.min(1.0e6 / 30.0 * 1000.0 / 8760.0);
        assert_relative_eq!(out.annual["wellhead_h2_conc"], conc);
        assert_relative_eq!(out.annual["lifetime_wellhead_flow"], flow);
        assert_relative_eq!(out.production[0], conc / 100.0 * flow);
        assert_eq!(out.production.len(), 8760);
        assert_eq!(out.production, out.flows["hydrogen_accumulated"]);
    }

    #[test]
    fn prospectivity_out_of_range() {
        let err = NaturalGeoH2Performance::new(NaturalGeoH2Inputs {
            well_lifetime: 30,
            site_prospectivity: 1.5,
            initial_wellhead_flow: 1.0,
            gas_reservoir_size: 1.0,
        })
        .compute()
        .unwrap_err();
        assert!(err.to_string().contains("site_prospectivity"));
    }
}
