//! Capital cost of iron electrowinning.
//!
//! Stinn & Allanore (2020), "Estimating the Capital Costs of Electrowinning
//! Processes", Electrochem. Soc. Interface 29 44. Results are direct capital
//! costs in 2018 USD.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CostModel, CostOutput, ModelContext, ModelError, PerformanceOutput};
use crate::registry::ModelKind;

/// Dollar year of the fitted coefficients.
pub const COST_YEAR: i32 = 2018;

/// Fitted coefficients of the cost correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StinnCoefficients {
    pub alpha_1_numerator: f64,
    pub alpha_1_denominator: f64,
    pub alpha_1_temp_offset: f64,
    pub alpha_2_numerator: f64,
    pub alpha_2_denominator: f64,
    pub alpha_2_temp_offset: f64,
    pub alpha_3: f64,
}

impl Default for StinnCoefficients {
    fn default() -> Self {
        Self {
            alpha_1_numerator: 51_010.0,
            alpha_1_denominator: -3.823e-3,
            alpha_1_temp_offset: 631.0,
            alpha_2_numerator: 5_634_000.0,
            alpha_2_denominator: -7.813e-3,
            alpha_2_temp_offset: 349.0,
            alpha_3: 750_000.0,
        }
    }
}

fn default_faraday() -> f64 {
    96_485.0
}

/// Operating point of the electrowinning cell house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StinnInputs {
    /// Electrolysis temperature (°C).
    pub electrolysis_temp: f64,
    pub pressure: f64,
    /// Production rate (kg/s).
    pub production_rate: f64,
    /// Moles of electrons per mole of product.
    pub electron_moles: f64,
    /// C/mol.
    #[serde(default = "default_faraday")]
    pub faraday_const: f64,
    /// A/m².
    pub current_density: f64,
    /// m².
    pub electrode_area: f64,
    /// 0-1.
    pub current_efficiency: f64,
    /// Product molar mass (kg/mol).
    pub molar_mass: f64,
    /// Installed power (MW).
    pub installed_capacity: f64,
    /// V.
    pub cell_voltage: f64,
    pub rectifier_lines: f64,
    #[serde(default)]
    pub coefficients: StinnCoefficients,
}

/// Pre-costs and electrowinning costs (2018 USD).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectrowinningCosts {
    pub pre_costs: f64,
    pub electrowinning_costs: f64,
}

impl ElectrowinningCosts {
    pub fn total(&self) -> f64 {
        self.pre_costs + self.electrowinning_costs
    }
}

impl StinnInputs {
    pub fn costs(&self) -> ElectrowinningCosts {
        let c = &self.coefficients;
        let t = self.electrolysis_temp;
        let term1 =
            c.alpha_1_numerator / (1.0 + (c.alpha_1_denominator * (t - c.alpha_1_temp_offset)).exp());
        let term2 =
            c.alpha_2_numerator / (1.0 + (c.alpha_2_denominator * (t - c.alpha_2_temp_offset)).exp());

        let pre_costs = term1 * self.pressure.powf(0.8);
        let handling = ((self.production_rate * self.electron_moles * self.faraday_const)
            / (self.current_density
                * self.electrode_area
                * self.current_efficiency
                * self.molar_mass))
            .powf(0.9);
        let rectifying = c.alpha_3
            * self.installed_capacity
            * self.cell_voltage.powf(0.15)
            * self.rectifier_lines.powf(0.5);

        ElectrowinningCosts {
            pre_costs,
            electrowinning_costs: term2 * handling + rectifying,
        }
    }

    fn check(&self) -> Result<(), ModelError> {
        let denominators = [
            ("current_density", self.current_density),
            ("electrode_area", self.electrode_area),
            ("current_efficiency", self.current_efficiency),
            ("molar_mass", self.molar_mass),
        ];
        for (field, value) in denominators {
            if value.is_nan() || value <= 0.0 {
                return Err(ModelError::InvalidInput {
                    model: StinnCost::KEY,
                    field,
                    message: format!("must be > 0, got {value}"),
                });
            }
        }
        Ok(())
    }
}

pub struct StinnCost {
    inputs: StinnInputs,
}

impl StinnCost {
    pub const KEY: &'static str = "stinn_electrowinning_cost";

    pub fn new(inputs: StinnInputs) -> Self {
        Self { inputs }
    }

    pub fn build(ctx: &ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError> {
        let inputs = ctx.parse_inputs(Self::KEY, ModelKind::Cost)?;
        Ok(Box::new(Self::new(inputs)))
    }
}

impl CostModel for StinnCost {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    fn compute(&self, _performance: Option<&PerformanceOutput>) -> Result<CostOutput, ModelError> {
        self.inputs.check()?;
        let costs = self.inputs.costs();
        Ok(CostOutput {
            capex: costs.total(),
            cost_year: Some(COST_YEAR),
            items: BTreeMap::from([
                ("pre_costs".to_string(), costs.pre_costs),
                ("electrowinning_costs".to_string(), costs.electrowinning_costs),
            ]),
            ..CostOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs() -> StinnInputs {
        StinnInputs {
            electrolysis_temp: 1000.0,
            pressure: 1.5,
            production_rate: 1.0,
            electron_moles: 3.0,
            faraday_const: 96_485.0,
            current_density: 5000.0,
            electrode_area: 30.0,
            current_efficiency: 0.95,
            molar_mass: 0.018,
            installed_capacity: 500.0,
            cell_voltage: 4.18,
            rectifier_lines: 3.0,
            coefficients: StinnCoefficients::default(),
        }
    }

    #[test]
    fn reference_operating_point() {
        let costs = inputs().costs();
        let term1 = 51_010.0 / (1.0 + (-3.823e-3_f64 * 369.0).exp());
        assert_relative_eq!(costs.pre_costs, term1 * 1.5_f64.powf(0.8));

        let term2 = 5_634_000.0 / (1.0 + (-7.813e-3_f64 * 651.0).exp());
        let handling = (3.0 * 96_485.0 / (5000.0 * 30.0 * 0.95 * 0.018_f64)).powf(0.9);
        let rectifying = 750_000.0 * 500.0 * 4.18_f64.powf(0.15) * 3.0_f64.sqrt();
        assert_relative_eq!(
            costs.electrowinning_costs,
            term2 * handling + rectifying,
            max_relative = 1e-12
        );
    }

    #[test]
    fn capex_is_total_in_2018_dollars() {
        let cost = StinnCost::new(inputs()).compute(None).unwrap();
        assert_relative_eq!(cost.capex, inputs().costs().total());
        assert_eq!(cost.cost_year, Some(COST_YEAR));
        assert_eq!(cost.opex, 0.0);
    }

    #[test]
    fn coefficients_default_when_omitted() {
        let yaml = "electrolysis_temp: 1000\npressure: 1.5\nproduction_rate: 1\n\
                    electron_moles: 3\ncurrent_density: 5000\nelectrode_area: 30\n\
                    current_efficiency: 0.95\nmolar_mass: 0.018\ninstalled_capacity: 500\n\
                    cell_voltage: 4.18\nrectifier_lines: 3\n";
        let m: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
        let parsed: StinnInputs = crate::models::parse_inputs(StinnCost::KEY, m).unwrap();
        assert_eq!(parsed, inputs());
    }

    #[test]
    fn zero_area_rejected() {
        let mut i = inputs();
        i.electrode_area = 0.0;
        assert!(StinnCost::new(i).compute(None).is_err());
    }
}
