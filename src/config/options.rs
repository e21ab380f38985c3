//! Run-level options: simulation switches, dispatch settings, and cost assumptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ConfigError, check_non_negative};
use crate::inflation::CostIndex;

/// Project life used when `simulation_options.project_life` is not given (years).
pub const DEFAULT_PROJECT_LIFE: u32 = 25;

/// Battery dispatch policies understood by the dispatch engine.
pub const BATTERY_DISPATCH_POLICIES: &[&str] = &[
    "simple",
    "one_cycle_heuristic",
    "heuristic",
    "load_following_heuristic",
    "convex_LV",
    "non_convex_LV",
];

/// Optimisation back-ends the dispatch engine can call.
pub const SOLVERS: &[&str] = &["cbc", "glpk", "gurobi", "xpress", "cplex"];

/// The `config` block: everything that applies to the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "SimulationOptions::is_empty")]
    pub simulation_options: SimulationOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_options: Option<DispatchOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_info: Option<CostInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_options: Option<FinanceOptions>,
}

/// Simulation switches, global and per technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Operating horizon (years).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_life: Option<u32>,
    /// Per-technology switches keyed by technology name.
    #[serde(flatten)]
    pub technologies: BTreeMap<String, TechnologySimulationOptions>,
}

impl SimulationOptions {
    /// Whether nothing is set, so the block can be left out of the YAML.
    pub fn is_empty(&self) -> bool {
        self.project_life.is_none() && self.technologies.is_empty()
    }

    /// Operating horizon, falling back to [`DEFAULT_PROJECT_LIFE`].
    pub fn project_life(&self) -> u32 {
        self.project_life.unwrap_or(DEFAULT_PROJECT_LIFE)
    }

    /// Whether the financial evaluation of `technology` is switched off.
    pub fn skip_financial(&self, technology: &str) -> bool {
        self.technologies
            .get(technology)
            .is_some_and(|o| o.skip_financial.unwrap_or(false))
    }
}

/// Switches for one technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechnologySimulationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_financial: Option<bool>,
}

/// Battery dispatch settings handed to the dispatch solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchOptions {
    /// Dispatch policy name.
    pub battery_dispatch: String,
    /// Optimisation back-end (`cbc` when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
    /// Look-ahead horizon in hours (48 when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_look_ahead_periods: Option<u32>,
    /// Allow charging from the grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_charging: Option<bool>,
    /// Restrict charging to PV output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_charging_only: Option<bool>,
    /// Count battery cycles in the objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_lifecycle_count: Option<bool>,
    /// Hours to advance between solves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_roll_periods: Option<u32>,
    /// Discount applied to later look-ahead periods (0-1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_weighting_factor: Option<f64>,
}

/// Solver used when `dispatch_options.solver` is absent.
pub const DEFAULT_SOLVER: &str = "cbc";

/// Look-ahead horizon used when `dispatch_options.n_look_ahead_periods` is absent (hours).
pub const DEFAULT_LOOK_AHEAD_PERIODS: u32 = 48;

impl DispatchOptions {
    pub fn solver(&self) -> &str {
        self.solver.as_deref().unwrap_or(DEFAULT_SOLVER)
    }

    pub fn look_ahead_periods(&self) -> u32 {
        self.n_look_ahead_periods
            .unwrap_or(DEFAULT_LOOK_AHEAD_PERIODS)
    }
}

/// Installed and O&M cost assumptions shared by the electricity technologies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostInfo {
    /// Wind installed cost ($/MW).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_installed_cost_mw: Option<f64>,
    /// PV installed cost ($/MW).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_installed_cost_mw: Option<f64>,
    /// Storage energy installed cost ($/MWh).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_installed_cost_mwh: Option<f64>,
    /// Storage power installed cost ($/MW).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_installed_cost_mw: Option<f64>,
    /// Wind O&M ($/kW-year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_om_per_kw: Option<f64>,
    /// PV O&M ($/kW-year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_om_per_kw: Option<f64>,
    /// Battery O&M ($/kW-year).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_om_per_kw: Option<f64>,
}

impl CostInfo {
    fn fields(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("wind_installed_cost_mw", self.wind_installed_cost_mw),
            ("solar_installed_cost_mw", self.solar_installed_cost_mw),
            ("storage_installed_cost_mwh", self.storage_installed_cost_mwh),
            ("storage_installed_cost_mw", self.storage_installed_cost_mw),
            ("wind_om_per_kw", self.wind_om_per_kw),
            ("pv_om_per_kw", self.pv_om_per_kw),
            ("battery_om_per_kw", self.battery_om_per_kw),
        ]
    }
}

/// Dollar-year normalisation for reported costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinanceOptions {
    /// All costs are reported in this year's dollars.
    pub target_dollar_year: i32,
    /// Index used to move costs between years (CPI when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_index: Option<CostIndex>,
}

impl FinanceOptions {
    pub fn index(&self) -> CostIndex {
        self.cost_index.unwrap_or_default()
    }
}

impl RunConfig {
    /// Whether no run option is set.
    pub fn is_empty(&self) -> bool {
        self.simulation_options.is_empty()
            && self.dispatch_options.is_none()
            && self.cost_info.is_none()
            && self.finance_options.is_none()
    }

    pub(crate) fn validate(&self, errors: &mut Vec<ConfigError>) {
        if self.simulation_options.project_life == Some(0) {
            errors.push(ConfigError::new(
                "config.simulation_options.project_life",
                "must be > 0",
            ));
        }

        if let Some(d) = &self.dispatch_options {
            if !BATTERY_DISPATCH_POLICIES.contains(&d.battery_dispatch.as_str()) {
                errors.push(ConfigError::new(
                    "config.dispatch_options.battery_dispatch",
                    format!(
                        "unknown policy \"{}\", available: {}",
                        d.battery_dispatch,
                        BATTERY_DISPATCH_POLICIES.join(", ")
                    ),
                ));
            }
            if !SOLVERS.contains(&d.solver()) {
                errors.push(ConfigError::new(
                    "config.dispatch_options.solver",
                    format!(
                        "unknown solver \"{}\", available: {}",
                        d.solver(),
                        SOLVERS.join(", ")
                    ),
                ));
            }
            let look_ahead = d.look_ahead_periods();
            if look_ahead == 0 {
                errors.push(ConfigError::new(
                    "config.dispatch_options.n_look_ahead_periods",
                    "must be > 0",
                ));
            }
            if d
                .n_roll_periods
                .is_some_and(|roll| roll == 0 || roll > look_ahead)
            {
                errors.push(ConfigError::new(
                    "config.dispatch_options.n_roll_periods",
                    "must be in [1, n_look_ahead_periods]",
                ));
            }
            if d
                .time_weighting_factor
                .is_some_and(|w| !(0.0..=1.0).contains(&w))
            {
                errors.push(ConfigError::new(
                    "config.dispatch_options.time_weighting_factor",
                    "must be in [0.0, 1.0]",
                ));
            }
            if d.grid_charging == Some(true) && d.pv_charging_only == Some(true) {
                errors.push(ConfigError::new(
                    "config.dispatch_options.pv_charging_only",
                    "cannot be combined with grid_charging",
                ));
            }
        }

        if let Some(ci) = &self.cost_info {
            for (key, value) in ci.fields() {
                if let Some(v) = value {
                    check_non_negative(errors, &format!("config.cost_info.{key}"), v);
                }
            }
        }
    }
}
