//! Natural plus stimulated geologic hydrogen.
//!
//! Stimulated hydrogen comes from serpentinization of Fe(II) in the rock
//! between the caprock and the borehole bottom, modelled as shrinking
//! reactive grains.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::natural::NaturalGeoH2Inputs;
use crate::models::{
    ModelContext, ModelError, PerformanceModel, PerformanceOutput, constant_series,
};
use crate::registry::ModelKind;

pub const PERFORMANCE_KEY: &str = "combined_geoh2_performance";
pub const COST_KEY: &str = "combined_geoh2_cost";
pub const FINANCE_KEY: &str = "combined_geoh2_financial";

/// Molar mass of iron (g/mol).
const M_FE: f64 = 55.8;
/// Hydrogen yield per mole of oxidized iron, as mass of H (g/mol).
const M_H2: f64 = 1.00;
const SECONDS_PER_YEAR: f64 = 3600.0 * 8760.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedGeoH2Inputs {
    #[serde(flatten)]
    pub natural: NaturalGeoH2Inputs,
    /// Rock grain size (m).
    pub grain_size: f64,
    /// Serpentinization rate (1/s).
    pub serp_rate: f64,
    /// Caprock depth (m).
    pub caprock_depth: f64,
    /// Borehole depth (m).
    pub borehole_depth: f64,
    /// Injection to production well distance (m).
    pub inj_prod_distance: f64,
    /// Width of the reacting zone (m).
    pub reaction_zone_width: f64,
    /// Rock bulk density (kg/m³).
    pub bulk_density: f64,
    /// Fe(II) content of the rock (wt %).
    #[serde(rename = "iron_II_conc")]
    pub iron_ii_conc: f64,
}

impl CombinedGeoH2Inputs {
    /// Cumulative stimulated hydrogen (kg) at the end of each year.
    pub fn cumulative_stimulated(&self) -> Vec<f64> {
        let grain = self.grain_size;
        let pen_rate = grain * self.serp_rate;
        let height = self.borehole_depth - self.caprock_depth;
        let rock_volume = height * self.inj_prod_distance * self.reaction_zone_width;
        let n_grains = rock_volume / grain.powi(3);

        (1..=self.natural.well_lifetime)
            .map(|year| {
                let elapsed = f64::from(year) * SECONDS_PER_YEAR;
                let core = (grain - 2.0 * pen_rate * elapsed).max(0.0);
                let reacted_volume = n_grains * (grain.powi(3) - core.powi(3));
                let reacted_mass = reacted_volume * self.bulk_density * self.iron_ii_conc / 100.0;
                reacted_mass * M_H2 / M_FE
            })
            .collect()
    }

    fn check(&self) -> Result<(), ModelError> {
        let positive = [
            ("grain_size", self.grain_size),
            ("bulk_density", self.bulk_density),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ModelError::InvalidInput {
                    model: PERFORMANCE_KEY,
                    field,
                    message: format!("must be > 0, got {value}"),
                });
            }
        }
        if self.borehole_depth < self.caprock_depth {
            return Err(ModelError::InvalidInput {
                model: PERFORMANCE_KEY,
                field: "borehole_depth",
                message: "must not be shallower than caprock_depth".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.iron_ii_conc) {
            return Err(ModelError::InvalidInput {
                model: PERFORMANCE_KEY,
                field: "iron_II_conc",
                message: format!("must be in [0, 100], got {}", self.iron_ii_conc),
            });
        }
        Ok(())
    }
}

pub struct CombinedGeoH2Performance {
    inputs: CombinedGeoH2Inputs,
}

impl CombinedGeoH2Performance {
    pub fn new(inputs: CombinedGeoH2Inputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn PerformanceModel>, ModelError> {
        let inputs = ctx.parse_inputs(PERFORMANCE_KEY, ModelKind::Performance)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl PerformanceModel for CombinedGeoH2Performance {
    fn name(&self) -> &'static str {
        PERFORMANCE_KEY
    }

    fn compute(&self) -> Result<PerformanceOutput, ModelError> {
        let acc = self.inputs.natural.accumulated(PERFORMANCE_KEY)?;
        self.inputs.check()?;

        let lifetime = f64::from(self.inputs.natural.well_lifetime);
        let cumulative = self.inputs.cumulative_stimulated();
        let total_stimulated = cumulative.last().copied().unwrap_or(0.0);
        let stimulated = total_stimulated / lifetime / 8760.0;
        debug!(
            model = PERFORMANCE_KEY,
            accumulated_kg_per_h = acc.hydrogen,
            stimulated_kg_per_h = stimulated,
            "computed combined hydrogen"
        );

        let mut out = acc.into_output(acc.hydrogen + stimulated);
        out.flows
            .insert("hydrogen_produced".into(), constant_series(stimulated));
        out.annual
            .insert("stimulated_hydrogen_lifetime_kg".into(), total_stimulated);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs() -> CombinedGeoH2Inputs {
        CombinedGeoH2Inputs {
            natural: NaturalGeoH2Inputs {
                well_lifetime: 30,
                site_prospectivity: 0.7,
                initial_wellhead_flow: 4_000.0,
                gas_reservoir_size: 1.0e6,
            },
            grain_size: 1e-4,
            serp_rate: 1e-9,
            caprock_depth: 500.0,
            borehole_depth: 1500.0,
            inj_prod_distance: 100.0,
            reaction_zone_width: 10.0,
            bulk_density: 2_900.0,
            iron_ii_conc: 5.0,
        }
    }

    #[test]
    fn cumulative_is_monotonic_and_bounded() {
        let cumulative = inputs().cumulative_stimulated();
        assert_eq!(cumulative.len(), 30);
        assert!(cumulative.windows(2).all(|w| w[1] >= w[0]));
        // fully reacted rock is the ceiling
        let volume = 1000.0 * 100.0 * 10.0;
        let ceiling = volume * 2_900.0 * 0.05 / 55.8;
        let last = cumulative.last().copied().unwrap_or_default();
        assert!(last <= ceiling * (1.0 + 1e-9));
    }

    #[test]
    fn grains_fully_reacted_after_core_vanishes() {
        // pen_rate = 1e-13 m/s, core gone after grain / (2 * pen_rate) s, about 15.9 years
        let cumulative = inputs().cumulative_stimulated();
        let ceiling = 1_000_000.0 * 2_900.0 * 0.05 / 55.8;
        assert_relative_eq!(cumulative[20], ceiling, max_relative = 1e-9);
    }

    #[test]
    fn combined_adds_to_natural() {
        let out = CombinedGeoH2Performance::new(inputs()).compute().unwrap();
        let accumulated = out.flows["hydrogen_accumulated"][0];
        let produced = out.flows["hydrogen_produced"][0];
        assert!(produced > 0.0);
        assert_relative_eq!(out.production[0], accumulated + produced);
    }

    #[test]
    fn inverted_depths_rejected() {
        let mut i = inputs();
        i.borehole_depth = 100.0;
        let err = CombinedGeoH2Performance::new(i).compute().unwrap_err();
        assert!(err.to_string().contains("borehole_depth"));
    }
}
