//! Technology-model registry.
//!
//! Maps `(category, kind, key)` to a model entry. Entries with a builder run
//! in-process; the rest are carried by name for the external simulation
//! engine (PySAM, FLORIS, GREET, ...) and only take part in validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::cost_info::{self, CostInfoCost};
use crate::models::electrowinning::StinnCost;
use crate::models::geoh2::combined::{self, CombinedGeoH2Performance};
use crate::models::geoh2::natural::{self, NaturalGeoH2Performance};
use crate::models::geoh2::{GeoH2Cost, GeoH2Finance};
use crate::models::methanol::co2h::{Co2hCost, Co2hFinance, Co2hPerformance};
use crate::models::methanol::smr::{SmrCost, SmrFinance, SmrPerformance};
use crate::models::{CostModel, FinanceModel, ModelContext, ModelError, PerformanceModel};

/// Kind of technology a block describes, derived from the block name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnologyCategory {
    Wind,
    Pv,
    Battery,
    Grid,
    Wave,
    Electrolyzer,
    Methanol,
    GeologicHydrogen,
    Iron,
}

impl TechnologyCategory {
    /// Block names accepted in the `technologies` mapping.
    pub const NAMES: &[&str] = &[
        "wind",
        "pv",
        "solar",
        "battery",
        "grid",
        "wave",
        "electrolyzer",
        "hydrogen",
        "methanol",
        "geoh2",
        "geo_h2",
        "geologic_hydrogen",
        "iron",
    ];

    pub const ALL: [TechnologyCategory; 9] = [
        Self::Wind,
        Self::Pv,
        Self::Battery,
        Self::Grid,
        Self::Wave,
        Self::Electrolyzer,
        Self::Methanol,
        Self::GeologicHydrogen,
        Self::Iron,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wind" => Some(Self::Wind),
            "pv" | "solar" => Some(Self::Pv),
            "battery" => Some(Self::Battery),
            "grid" => Some(Self::Grid),
            "wave" => Some(Self::Wave),
            "electrolyzer" | "hydrogen" => Some(Self::Electrolyzer),
            "methanol" => Some(Self::Methanol),
            "geoh2" | "geo_h2" | "geologic_hydrogen" => Some(Self::GeologicHydrogen),
            "iron" => Some(Self::Iron),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wind => "wind",
            Self::Pv => "pv",
            Self::Battery => "battery",
            Self::Grid => "grid",
            Self::Wave => "wave",
            Self::Electrolyzer => "electrolyzer",
            Self::Methanol => "methanol",
            Self::GeologicHydrogen => "geologic_hydrogen",
            Self::Iron => "iron",
        }
    }
}

impl fmt::Display for TechnologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation stage a model covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Performance,
    Cost,
    Finance,
    Lca,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Performance => "performance",
            Self::Cost => "cost",
            Self::Finance => "finance",
            Self::Lca => "lca",
        })
    }
}

pub type PerformanceBuilder =
    fn(&ModelContext<'_>) -> Result<Box<dyn PerformanceModel>, ModelError>;
pub type CostBuilder = fn(&ModelContext<'_>) -> Result<Box<dyn CostModel>, ModelError>;
pub type FinanceBuilder = fn(&ModelContext<'_>) -> Result<Box<dyn FinanceModel>, ModelError>;

/// How an entry is instantiated.
#[derive(Clone, Copy)]
pub enum Builder {
    /// Provided by the external simulation engine.
    External,
    Performance(PerformanceBuilder),
    Cost(CostBuilder),
    Finance(FinanceBuilder),
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::External => "External",
            Self::Performance(_) => "Performance(..)",
            Self::Cost(_) => "Cost(..)",
            Self::Finance(_) => "Finance(..)",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelEntry {
    pub key: &'static str,
    pub category: TechnologyCategory,
    pub kind: ModelKind,
    pub description: &'static str,
    /// Used when a block does not select a model of this kind.
    pub is_default: bool,
    pub builder: Builder,
}

impl ModelEntry {
    pub fn is_in_process(&self) -> bool {
        !matches!(self.builder, Builder::External)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unsupported model \"{key}\" for {category} {kind}, available: {available}")]
    UnsupportedModel {
        key: String,
        category: TechnologyCategory,
        kind: ModelKind,
        available: String,
    },
    #[error("model \"{key}\" runs in the external simulation engine")]
    External { key: &'static str },
    #[error("model \"{key}\" is registered as {actual}, not {expected}")]
    WrongKind {
        key: &'static str,
        expected: ModelKind,
        actual: ModelKind,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

const fn external(
    category: TechnologyCategory,
    kind: ModelKind,
    key: &'static str,
    description: &'static str,
    is_default: bool,
) -> ModelEntry {
    ModelEntry {
        key,
        category,
        kind,
        description,
        is_default,
        builder: Builder::External,
    }
}

const fn in_process(
    category: TechnologyCategory,
    kind: ModelKind,
    key: &'static str,
    description: &'static str,
    is_default: bool,
    builder: Builder,
) -> ModelEntry {
    ModelEntry {
        key,
        category,
        kind,
        description,
        is_default,
        builder,
    }
}

use ModelKind::{Cost, Finance, Lca, Performance};
use TechnologyCategory as Tc;

const BUILTIN: &[ModelEntry] = &[
    external(Tc::Wind, Performance, "pysam", "PySAM Windpower", true),
    external(Tc::Wind, Performance, "floris", "FLORIS wake model", false),
    in_process(
        Tc::Wind,
        Cost,
        cost_info::KEY,
        "installed and O&M cost from config.cost_info",
        true,
        Builder::Cost(CostInfoCost::build),
    ),
    external(Tc::Wind, Cost, "atb", "NREL ATB cost curves", false),
    external(Tc::Wind, Finance, "pysam_singleowner", "PySAM Single Owner", true),
    external(Tc::Pv, Performance, "pysam", "PySAM Pvwatts", true),
    in_process(
        Tc::Pv,
        Cost,
        cost_info::KEY,
        "installed and O&M cost from config.cost_info",
        true,
        Builder::Cost(CostInfoCost::build),
    ),
    external(Tc::Pv, Cost, "atb", "NREL ATB cost curves", false),
    external(Tc::Pv, Finance, "pysam_singleowner", "PySAM Single Owner", true),
    external(Tc::Battery, Performance, "pysam", "PySAM BatteryStateful", true),
    in_process(
        Tc::Battery,
        Cost,
        cost_info::KEY,
        "energy, power, and O&M cost from config.cost_info",
        true,
        Builder::Cost(CostInfoCost::build),
    ),
    external(Tc::Battery, Finance, "pysam_singleowner", "PySAM Single Owner", true),
    external(Tc::Grid, Performance, "grid", "interconnect-limited grid exchange", true),
    external(Tc::Wave, Performance, "marine_hydrokinetic", "MHK wave energy converter", true),
    external(Tc::Wave, Cost, "mhk_cost", "MHK cost model", true),
    external(
        Tc::Electrolyzer,
        Performance,
        "pem_electrolyzer_performance",
        "PEM electrolyzer stack",
        true,
    ),
    external(
        Tc::Electrolyzer,
        Performance,
        "eco_pem_electrolyzer_performance",
        "ECO tools PEM electrolyzer",
        false,
    ),
    external(Tc::Electrolyzer, Cost, "pem_electrolyzer_cost", "PEM electrolyzer cost", true),
    external(
        Tc::Electrolyzer,
        Cost,
        "eco_pem_electrolyzer_cost",
        "ECO tools PEM electrolyzer cost",
        false,
    ),
    external(
        Tc::Electrolyzer,
        Finance,
        "pem_electrolyzer_financial",
        "PEM electrolyzer finance",
        true,
    ),
    external(Tc::Electrolyzer, Lca, "greet", "GREET life-cycle emissions", true),
    in_process(
        Tc::Methanol,
        Performance,
        SmrPerformance::KEY,
        "steam methane reforming methanol",
        true,
        Builder::Performance(SmrPerformance::build),
    ),
    in_process(
        Tc::Methanol,
        Cost,
        SmrCost::KEY,
        "SMR methanol TOC, OpEx, feedstocks",
        true,
        Builder::Cost(SmrCost::build),
    ),
    in_process(
        Tc::Methanol,
        Finance,
        SmrFinance::KEY,
        "SMR levelized cost of methanol",
        true,
        Builder::Finance(SmrFinance::build),
    ),
    in_process(
        Tc::Methanol,
        Performance,
        Co2hPerformance::KEY,
        "CO2 hydrogenation methanol",
        false,
        Builder::Performance(Co2hPerformance::build),
    ),
    in_process(
        Tc::Methanol,
        Cost,
        Co2hCost::KEY,
        "CO2H methanol TOC, OpEx, feedstocks",
        false,
        Builder::Cost(Co2hCost::build),
    ),
    in_process(
        Tc::Methanol,
        Finance,
        Co2hFinance::KEY,
        "CO2H levelized cost of methanol",
        false,
        Builder::Finance(Co2hFinance::build),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Performance,
        natural::PERFORMANCE_KEY,
        "accumulated natural hydrogen",
        true,
        Builder::Performance(NaturalGeoH2Performance::build),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Cost,
        natural::COST_KEY,
        "per-well capital with NETL multipliers",
        true,
        Builder::Cost(GeoH2Cost::build_natural),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Finance,
        natural::FINANCE_KEY,
        "levelized cost of hydrogen, NETL fixed charge rate",
        true,
        Builder::Finance(GeoH2Finance::build_natural),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Performance,
        combined::PERFORMANCE_KEY,
        "natural plus stimulated hydrogen",
        false,
        Builder::Performance(CombinedGeoH2Performance::build),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Cost,
        combined::COST_KEY,
        "per-well capital with NETL multipliers",
        false,
        Builder::Cost(GeoH2Cost::build_combined),
    ),
    in_process(
        Tc::GeologicHydrogen,
        Finance,
        combined::FINANCE_KEY,
        "levelized cost of hydrogen, NETL fixed charge rate",
        false,
        Builder::Finance(GeoH2Finance::build_combined),
    ),
    external(
        Tc::GeologicHydrogen,
        Performance,
        "stimulated_geoh2_performance",
        "stimulated hydrogen only",
        false,
    ),
    external(
        Tc::GeologicHydrogen,
        Cost,
        "stimulated_geoh2_cost",
        "stimulated well cost",
        false,
    ),
    external(
        Tc::GeologicHydrogen,
        Finance,
        "stimulated_geoh2_financial",
        "stimulated well finance",
        false,
    ),
    external(
        Tc::Iron,
        Performance,
        "rosner_iron_performance",
        "direct reduced iron plant",
        true,
    ),
    external(
        Tc::Iron,
        Performance,
        "martin_ore_performance",
        "iron ore mine and pellet plant",
        false,
    ),
    in_process(
        Tc::Iron,
        Cost,
        StinnCost::KEY,
        "electrowinning capital cost, 2018 USD",
        true,
        Builder::Cost(StinnCost::build),
    ),
    external(Tc::Iron, Cost, "rosner_iron_cost", "direct reduced iron cost", false),
    external(
        Tc::Iron,
        Finance,
        "rosner_iron_financial",
        "direct reduced iron finance",
        true,
    ),
];

/// Catalog of the models a configuration may select.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<ModelEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Every model this crate knows about.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.to_vec(),
        }
    }

    /// An empty registry, filled with [`Registry::register`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces the entry with the same category, kind, and key.
    ///
    /// A new default demotes the previous default of its category and kind.
    pub fn register(&mut self, entry: ModelEntry) {
        if entry.is_default {
            for e in &mut self.entries {
                if e.category == entry.category && e.kind == entry.kind {
                    e.is_default = false;
                }
            }
        }
        match self.entries.iter_mut().find(|e| {
            e.category == entry.category && e.kind == entry.kind && e.key == entry.key
        }) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Entries of one category, in registration order.
    pub fn for_category(&self, category: TechnologyCategory) -> impl Iterator<Item = &ModelEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Looks up `key` among the models of `category` and `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnsupportedModel`] listing the valid keys.
    pub fn resolve(
        &self,
        category: TechnologyCategory,
        kind: ModelKind,
        key: &str,
    ) -> Result<&ModelEntry, RegistryError> {
        let found = self
            .entries
            .iter()
            .find(|e| e.category == category && e.kind == kind && e.key == key);
        match found {
            Some(entry) => {
                debug!(%category, %kind, key, in_process = entry.is_in_process(), "resolved model");
                Ok(entry)
            }
            None => {
                let available: Vec<&str> = self
                    .entries
                    .iter()
                    .filter(|e| e.category == category && e.kind == kind)
                    .map(|e| e.key)
                    .collect();
                Err(RegistryError::UnsupportedModel {
                    key: key.to_string(),
                    category,
                    kind,
                    available: if available.is_empty() {
                        "none".to_string()
                    } else {
                        available.join(", ")
                    },
                })
            }
        }
    }

    pub fn default_for(&self, category: TechnologyCategory, kind: ModelKind) -> Option<&ModelEntry> {
        self.entries
            .iter()
            .find(|e| e.category == category && e.kind == kind && e.is_default)
    }

    /// The selected model, or the default when `key` is `None`.
    pub fn resolve_or_default(
        &self,
        category: TechnologyCategory,
        kind: ModelKind,
        key: Option<&str>,
    ) -> Result<Option<&ModelEntry>, RegistryError> {
        match key {
            Some(key) => self.resolve(category, kind, key).map(Some),
            None => Ok(self.default_for(category, kind)),
        }
    }

    pub fn build_performance(
        &self,
        entry: &ModelEntry,
        ctx: &ModelContext<'_>,
    ) -> Result<Box<dyn PerformanceModel>, RegistryError> {
        match entry.builder {
            Builder::Performance(build) => Ok(build(ctx)?),
            Builder::External => Err(RegistryError::External { key: entry.key }),
            _ => Err(wrong_kind(entry, ModelKind::Performance)),
        }
    }

    pub fn build_cost(
        &self,
        entry: &ModelEntry,
        ctx: &ModelContext<'_>,
    ) -> Result<Box<dyn CostModel>, RegistryError> {
        match entry.builder {
            Builder::Cost(build) => Ok(build(ctx)?),
            Builder::External => Err(RegistryError::External { key: entry.key }),
            _ => Err(wrong_kind(entry, ModelKind::Cost)),
        }
    }

    pub fn build_finance(
        &self,
        entry: &ModelEntry,
        ctx: &ModelContext<'_>,
    ) -> Result<Box<dyn FinanceModel>, RegistryError> {
        match entry.builder {
            Builder::Finance(build) => Ok(build(ctx)?),
            Builder::External => Err(RegistryError::External { key: entry.key }),
            _ => Err(wrong_kind(entry, ModelKind::Finance)),
        }
    }
}

fn wrong_kind(entry: &ModelEntry, expected: ModelKind) -> RegistryError {
    RegistryError::WrongKind {
        key: entry.key,
        expected,
        actual: entry.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn category_aliases() {
        assert_eq!(TechnologyCategory::from_name("solar"), Some(TechnologyCategory::Pv));
        assert_eq!(
            TechnologyCategory::from_name("geoh2"),
            Some(TechnologyCategory::GeologicHydrogen)
        );
        assert_eq!(
            TechnologyCategory::from_name("hydrogen"),
            Some(TechnologyCategory::Electrolyzer)
        );
        assert_eq!(TechnologyCategory::from_name("fusion"), None);
        for name in TechnologyCategory::NAMES {
            assert!(TechnologyCategory::from_name(name).is_some(), "{name}");
        }
    }

    #[test]
    fn unknown_key_lists_alternatives() {
        let reg = Registry::builtin();
        let err = reg
            .resolve(TechnologyCategory::Wind, ModelKind::Performance, "windy")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unsupported model"), "{msg}");
        assert!(msg.contains("floris"), "{msg}");
    }

    #[test]
    fn key_of_another_category_is_unsupported() {
        let reg = Registry::builtin();
        assert!(
            reg.resolve(
                TechnologyCategory::Wind,
                ModelKind::Cost,
                StinnCost::KEY
            )
            .is_err()
        );
    }

    #[test]
    fn one_default_at_most_per_slot() {
        let reg = Registry::builtin();
        let mut seen = BTreeSet::new();
        for e in reg.entries().iter().filter(|e| e.is_default) {
            assert!(seen.insert((e.category, e.kind)), "{} {}", e.category, e.kind);
        }
    }

    #[test]
    fn builders_match_kinds() {
        for e in Registry::builtin().entries() {
            let ok = match e.builder {
                Builder::External => true,
                Builder::Performance(_) => e.kind == ModelKind::Performance,
                Builder::Cost(_) => e.kind == ModelKind::Cost,
                Builder::Finance(_) => e.kind == ModelKind::Finance,
            };
            assert!(ok, "{}", e.key);
        }
    }

    #[test]
    fn defaults_resolve() {
        let reg = Registry::builtin();
        let entry = reg
            .resolve_or_default(TechnologyCategory::Methanol, ModelKind::Performance, None)
            .unwrap()
            .unwrap();
        assert_eq!(entry.key, SmrPerformance::KEY);
        assert!(
            reg.resolve_or_default(TechnologyCategory::Grid, ModelKind::Cost, None)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn register_replaces_default() {
        let mut reg = Registry::builtin();
        reg.register(ModelEntry {
            key: "custom",
            category: TechnologyCategory::Wind,
            kind: ModelKind::Performance,
            description: "test",
            is_default: true,
            builder: Builder::External,
        });
        let default = reg
            .default_for(TechnologyCategory::Wind, ModelKind::Performance)
            .unwrap();
        assert_eq!(default.key, "custom");
        assert_eq!(
            reg.for_category(TechnologyCategory::Wind)
                .filter(|e| e.kind == ModelKind::Performance && e.is_default)
                .count(),
            1
        );
    }
}
