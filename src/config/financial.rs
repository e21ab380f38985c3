//! Per-technology financial model block (`fin_model`).
//!
//! Each sub-block has a fixed shape; unknown keys are rejected at parse time.
//! Arrays indexed by operating year may hold a single value (applied to every
//! year) or exactly one value per year of the project life.

use serde::{Deserialize, Serialize};

use super::{ConfigError, check_non_negative, check_percent};

/// Financial parameters attached to one technology block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinModel {
    /// Battery replacement settings.
    pub battery_system: BatterySystem,
    /// Operation and maintenance cost schedule.
    pub system_costs: SystemCosts,
    /// Whether the lifetime output model is used (0 or 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_use_lifetime_output: Option<u8>,
    /// Tax, debt, and depreciation parameters.
    pub financial_parameters: FinancialParameters,
    /// Capacity credit per year (%).
    pub cp_capacity_credit_percent: Vec<f64>,
    /// Annual output degradation per year (%).
    pub degradation: Vec<f64>,
    /// Revenue terms.
    pub revenue: Revenue,
}

/// Battery bank replacement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatterySystem {
    /// Replacement schedule as percent of bank per year.
    pub batt_replacement_schedule_percent: Vec<f64>,
    /// Bank replacement flags per year.
    pub batt_bank_replacement: Vec<f64>,
    /// Replacement option: 0 none, 1 capacity-based, 2 user schedule.
    pub batt_replacement_option: u8,
    /// Computed bank capacity (kWh).
    pub batt_computed_bank_capacity: f64,
    /// Meter position: 0 behind, 1 front of meter.
    pub batt_meter_position: u8,
}

/// O&M cost schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemCosts {
    /// Fixed O&M ($/year) per year.
    pub om_fixed: Vec<f64>,
    /// Production-based O&M ($/MWh) per year.
    pub om_production: Vec<f64>,
    /// Capacity-based O&M ($/kW-year) per year.
    pub om_capacity: Vec<f64>,
    /// Battery fixed O&M ($/year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_batt_fixed_cost: Option<f64>,
    /// Battery variable O&M ($/MWh) per year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_batt_variable_cost: Option<Vec<f64>>,
    /// Battery capacity O&M ($/kWh-year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_batt_capacity_cost: Option<f64>,
    /// Battery replacement cost ($/kWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_batt_replacement_cost: Option<f64>,
    /// Replacement cost escalation (%/year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub om_replacement_cost_escal: Option<f64>,
}

/// Tax, debt, and depreciation parameters. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinancialParameters {
    pub inflation_rate: f64,
    pub real_discount_rate: f64,
    pub federal_tax_rate: f64,
    pub state_tax_rate: f64,
    pub property_tax_rate: f64,
    pub insurance_rate: f64,
    pub debt_percent: f64,
    pub term_int_rate: f64,
    pub months_working_reserve: f64,
    pub analysis_start_year: i32,
    pub installation_months: u32,
    pub sales_tax_rate_state: f64,
    pub admin_expense_percent_of_sales: f64,
    pub capital_gains_tax_rate: f64,
    /// `"Revolving debt"` or `"One time loan"`.
    pub debt_type: String,
    /// `"MACRS"` or `"Straight line"`.
    pub depreciation_method: String,
    /// Depreciation period (years).
    pub depreciation_period: u32,
}

/// Revenue terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Revenue {
    /// PPA price per year ($/kWh).
    pub ppa_price_input: Vec<f64>,
    /// PPA escalation (%/year).
    pub ppa_escalation: f64,
}

/// Accepted `debt_type` values.
pub const DEBT_TYPES: &[&str] = &["Revolving debt", "One time loan"];

/// Accepted `depreciation_method` values.
pub const DEPRECIATION_METHODS: &[&str] = &["MACRS", "Straight line"];

/// MACRS schedules are only published for these recovery periods.
pub const MACRS_PERIODS: &[u32] = &[3, 5, 7, 10, 15, 20];

impl FinancialParameters {
    /// Returns every percentage-valued field with its key name.
    pub fn percent_fields(&self) -> [(&'static str, f64); 11] {
        [
            ("inflation_rate", self.inflation_rate),
            ("real_discount_rate", self.real_discount_rate),
            ("federal_tax_rate", self.federal_tax_rate),
            ("state_tax_rate", self.state_tax_rate),
            ("property_tax_rate", self.property_tax_rate),
            ("insurance_rate", self.insurance_rate),
            ("debt_percent", self.debt_percent),
            ("term_int_rate", self.term_int_rate),
            ("sales_tax_rate_state", self.sales_tax_rate_state),
            ("admin_expense_percent_of_sales", self.admin_expense_percent_of_sales),
            ("capital_gains_tax_rate", self.capital_gains_tax_rate),
        ]
    }

    /// Nominal discount rate (fraction) from the real rate and inflation.
    pub fn nominal_discount_rate(&self) -> f64 {
        (1.0 + self.real_discount_rate / 100.0) * (1.0 + self.inflation_rate / 100.0) - 1.0
    }

    fn validate(&self, path: &str, errors: &mut Vec<ConfigError>) {
        for (key, value) in self.percent_fields() {
            check_percent(errors, &format!("{path}.{key}"), value);
        }
        check_non_negative(
            errors,
            &format!("{path}.months_working_reserve"),
            self.months_working_reserve,
        );
        if !DEBT_TYPES.contains(&self.debt_type.as_str()) {
            errors.push(ConfigError::new(
                format!("{path}.debt_type"),
                format!(
                    "must be one of {}, got \"{}\"",
                    DEBT_TYPES.join(", "),
                    self.debt_type
                ),
            ));
        }
        if !DEPRECIATION_METHODS.contains(&self.depreciation_method.as_str()) {
            errors.push(ConfigError::new(
                format!("{path}.depreciation_method"),
                format!(
                    "must be one of {}, got \"{}\"",
                    DEPRECIATION_METHODS.join(", "),
                    self.depreciation_method
                ),
            ));
        } else if self.depreciation_method == "MACRS"
            && !MACRS_PERIODS.contains(&self.depreciation_period)
        {
            errors.push(ConfigError::new(
                format!("{path}.depreciation_period"),
                format!(
                    "MACRS requires one of {:?} years, got {}",
                    MACRS_PERIODS, self.depreciation_period
                ),
            ));
        }
        if self.depreciation_period == 0 {
            errors.push(ConfigError::new(
                format!("{path}.depreciation_period"),
                "must be > 0",
            ));
        }
    }
}

/// Checks that a per-year array has one entry or one entry per project year.
pub(crate) fn check_year_array(
    errors: &mut Vec<ConfigError>,
    path: &str,
    values: &[f64],
    project_life: u32,
) {
    let n = values.len();
    if n != 1 && n != project_life as usize {
        errors.push(ConfigError::new(
            path,
            format!("expected 1 or {project_life} entries (one per operating year), got {n}"),
        ));
    }
}

impl FinModel {
    /// Appends validation errors; `path` is the dotted prefix of this block.
    pub(crate) fn validate(&self, path: &str, project_life: u32, errors: &mut Vec<ConfigError>) {
        self.financial_parameters
            .validate(&format!("{path}.financial_parameters"), errors);

        for (i, v) in self.cp_capacity_credit_percent.iter().enumerate() {
            check_percent(errors, &format!("{path}.cp_capacity_credit_percent[{i}]"), *v);
        }
        for (i, v) in self.degradation.iter().enumerate() {
            check_percent(errors, &format!("{path}.degradation[{i}]"), *v);
        }

        let bs = &self.battery_system;
        for (i, v) in bs.batt_replacement_schedule_percent.iter().enumerate() {
            check_percent(
                errors,
                &format!("{path}.battery_system.batt_replacement_schedule_percent[{i}]"),
                *v,
            );
        }
        if bs.batt_replacement_option > 2 {
            errors.push(ConfigError::new(
                format!("{path}.battery_system.batt_replacement_option"),
                "must be 0, 1, or 2",
            ));
        }
        if bs.batt_meter_position > 1 {
            errors.push(ConfigError::new(
                format!("{path}.battery_system.batt_meter_position"),
                "must be 0 or 1",
            ));
        }
        check_non_negative(
            errors,
            &format!("{path}.battery_system.batt_computed_bank_capacity"),
            bs.batt_computed_bank_capacity,
        );

        let year_arrays: [(&str, &[f64]); 7] = [
            ("cp_capacity_credit_percent", &self.cp_capacity_credit_percent),
            ("degradation", &self.degradation),
            ("system_costs.om_fixed", &self.system_costs.om_fixed),
            ("system_costs.om_production", &self.system_costs.om_production),
            ("system_costs.om_capacity", &self.system_costs.om_capacity),
            ("revenue.ppa_price_input", &self.revenue.ppa_price_input),
            (
                "battery_system.batt_replacement_schedule_percent",
                &self.battery_system.batt_replacement_schedule_percent,
            ),
        ];
        for (key, values) in year_arrays {
            check_year_array(errors, &format!("{path}.{key}"), values, project_life);
        }
        if let Some(values) = &self.system_costs.om_batt_variable_cost {
            check_year_array(
                errors,
                &format!("{path}.system_costs.om_batt_variable_cost"),
                values,
                project_life,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fin_model() -> FinModel {
        FinModel {
            battery_system: BatterySystem {
                batt_replacement_schedule_percent: vec![0.0],
                batt_bank_replacement: vec![0.0],
                batt_replacement_option: 0,
                batt_computed_bank_capacity: 0.0,
                batt_meter_position: 0,
            },
            system_costs: SystemCosts {
                om_fixed: vec![1.0],
                om_production: vec![2.0],
                om_capacity: vec![0.0],
                om_batt_fixed_cost: Some(0.0),
                om_batt_variable_cost: Some(vec![0.75]),
                om_batt_capacity_cost: None,
                om_batt_replacement_cost: None,
                om_replacement_cost_escal: None,
            },
            system_use_lifetime_output: Some(0),
            financial_parameters: FinancialParameters {
                inflation_rate: 2.5,
                real_discount_rate: 6.4,
                federal_tax_rate: 21.0,
                state_tax_rate: 4.0,
                property_tax_rate: 1.0,
                insurance_rate: 0.5,
                debt_percent: 68.5,
                term_int_rate: 6.0,
                months_working_reserve: 1.0,
                analysis_start_year: 2025,
                installation_months: 12,
                sales_tax_rate_state: 4.5,
                admin_expense_percent_of_sales: 1.0,
                capital_gains_tax_rate: 15.0,
                debt_type: "Revolving debt".into(),
                depreciation_method: "MACRS".into(),
                depreciation_period: 5,
            },
            cp_capacity_credit_percent: vec![0.0],
            degradation: vec![0.0],
            revenue: Revenue {
                ppa_price_input: vec![0.01],
                ppa_escalation: 1.0,
            },
        }
    }

    fn errors_for(fm: &FinModel) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        fm.validate("fin", 25, &mut errors);
        errors
    }

    #[test]
    fn default_block_is_valid() {
        let errors = errors_for(&fin_model());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn debt_percent_above_hundred() {
        let mut fm = fin_model();
        fm.financial_parameters.debt_percent = 120.0;
        let errors = errors_for(&fm);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fin.financial_parameters.debt_percent")
        );
    }

    #[test]
    fn negative_capital_gains_rate() {
        let mut fm = fin_model();
        fm.financial_parameters.capital_gains_tax_rate = -1.0;
        let errors = errors_for(&fm);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fin.financial_parameters.capital_gains_tax_rate")
        );
    }

    #[test]
    fn year_array_length_mismatch() {
        let mut fm = fin_model();
        fm.degradation = vec![0.5; 10];
        let errors = errors_for(&fm);
        assert!(errors.iter().any(|e| e.field == "fin.degradation"));

        fm.degradation = vec![0.5; 25];
        assert!(errors_for(&fm).is_empty());
    }

    #[test]
    fn macrs_period_must_be_published() {
        let mut fm = fin_model();
        fm.financial_parameters.depreciation_period = 6;
        let errors = errors_for(&fm);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fin.financial_parameters.depreciation_period")
        );

        fm.financial_parameters.depreciation_method = "Straight line".into();
        assert!(errors_for(&fm).is_empty());
    }

    #[test]
    fn unknown_debt_type() {
        let mut fm = fin_model();
        fm.financial_parameters.debt_type = "Balloon".into();
        let errors = errors_for(&fm);
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fin.financial_parameters.debt_type")
        );
    }

    #[test]
    fn nominal_discount_rate_combines_inflation() {
        let fp = fin_model().financial_parameters;
        let expected = 1.064 * 1.025 - 1.0;
        assert!((fp.nominal_discount_rate() - expected).abs() < 1e-12);
    }
}
