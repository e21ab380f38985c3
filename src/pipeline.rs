//! Per-technology evaluation: performance, cost, cost-year adjustment, finance.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PlantConfig, TechnologyConfig};
use crate::inflation::{IndexTable, InflationError};
use crate::io::results::site_result_id;
use crate::models::finance::annualized_cost;
use crate::models::{CostOutput, FinanceOutput, ModelContext, ModelError, PerformanceOutput, cost_info};
use crate::registry::{ModelEntry, ModelKind, Registry, RegistryError, TechnologyCategory};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config has {} error(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ConfigError>),
    #[error("{technology}: {source}")]
    Registry {
        technology: String,
        #[source]
        source: RegistryError,
    },
    #[error("{technology}: {source}")]
    Model {
        technology: String,
        #[source]
        source: ModelError,
    },
    #[error("{technology}: cannot convert {from} dollars to {to}: {source}")]
    Inflation {
        technology: String,
        from: i32,
        to: i32,
        #[source]
        source: InflationError,
    },
    #[error("cannot load cost index: {0}")]
    IndexTable(#[source] InflationError),
}

fn summarize(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Results for one technology block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyReport {
    pub name: String,
    pub category: TechnologyCategory,
    /// Model used at each stage, in-process or not.
    pub models: Vec<StageModel>,
    pub commodity: Option<String>,
    /// Yearly total of the main commodity.
    pub annual_production: Option<f64>,
    pub production_unit: Option<String>,
    /// USD.
    pub capex: Option<f64>,
    /// USD/year.
    pub opex: Option<f64>,
    pub cost_year: Option<i32>,
    pub levelized_cost: Option<f64>,
    pub levelized_unit: Option<String>,
    /// CapEx annualized at the nominal discount rate of `fin_model`, plus OpEx (USD/year).
    pub annualized_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub performance_annual: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cost_items: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub finance_breakdown: BTreeMap<String, f64>,
}

/// Model selected for one evaluation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageModel {
    pub kind: ModelKind,
    pub key: String,
    /// Left to the external simulation engine.
    #[serde(default)]
    pub external: bool,
}

impl TechnologyReport {
    fn new(name: &str, category: TechnologyCategory) -> Self {
        Self {
            name: name.to_string(),
            category,
            models: Vec::new(),
            commodity: None,
            annual_production: None,
            production_unit: None,
            capex: None,
            opex: None,
            cost_year: None,
            levelized_cost: None,
            levelized_unit: None,
            annualized_cost: None,
            performance_annual: BTreeMap::new(),
            cost_items: BTreeMap::new(),
            finance_breakdown: BTreeMap::new(),
        }
    }

    /// Key of the model used for `kind`.
    pub fn model(&self, kind: ModelKind) -> Option<&str> {
        self.models
            .iter()
            .find(|m| m.kind == kind)
            .map(|m| m.key.as_str())
    }

    /// Whether any stage was left to the external engine.
    pub fn is_external(&self, kind: ModelKind) -> bool {
        self.models.iter().any(|m| m.kind == kind && m.external)
    }

    fn record_model(&mut self, entry: &ModelEntry) {
        self.models.push(StageModel {
            kind: entry.kind,
            key: entry.key.to_string(),
            external: !entry.is_in_process(),
        });
    }

    fn record_performance(&mut self, perf: &PerformanceOutput) {
        self.commodity = Some(perf.commodity.clone());
        self.annual_production = Some(perf.annual_production());
        self.production_unit = Some(perf.unit.trim_end_matches("/h").to_string());
        self.performance_annual = perf.annual.clone();
    }

    fn record_cost(&mut self, cost: &CostOutput) {
        self.capex = Some(cost.capex);
        self.opex = Some(cost.opex);
        self.cost_year = cost.cost_year;
        self.cost_items = cost.items.clone();
    }

    fn record_finance(&mut self, fin: FinanceOutput) {
        self.levelized_cost = Some(fin.levelized_cost);
        self.levelized_unit = Some(fin.unit);
        self.finance_breakdown = fin.breakdown;
    }
}

/// Results for the whole plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantReport {
    /// `"{lat}_{lon}_{year}"` of the site.
    pub site_id: String,
    /// Dollar year every cost was converted to, when requested.
    pub dollar_year: Option<i32>,
    /// Sorted by technology name.
    pub technologies: Vec<TechnologyReport>,
}

impl PlantReport {
    pub fn total_capex(&self) -> f64 {
        self.technologies.iter().filter_map(|t| t.capex).sum()
    }

    pub fn total_opex(&self) -> f64 {
        self.technologies.iter().filter_map(|t| t.opex).sum()
    }

    pub fn technology(&self, name: &str) -> Option<&TechnologyReport> {
        self.technologies.iter().find(|t| t.name == name)
    }
}

fn or_dash(value: Option<f64>, precision: usize, unit: Option<&str>) -> String {
    match value {
        Some(v) => format!("{v:.precision$} {}", unit.unwrap_or("")).trim_end().to_string(),
        None => "-".to_string(),
    }
}

impl fmt::Display for PlantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Plant Report ---")?;
        writeln!(f, "Site:                  {}", self.site_id)?;
        if let Some(year) = self.dollar_year {
            writeln!(f, "Dollar year:           {year}")?;
        }
        for t in &self.technologies {
            writeln!(f)?;
            writeln!(f, "[{}] {}", t.category, t.name)?;
            let models: Vec<String> = t
                .models
                .iter()
                .map(|m| {
                    if m.external {
                        format!("{}={} (external)", m.kind, m.key)
                    } else {
                        format!("{}={}", m.kind, m.key)
                    }
                })
                .collect();
            writeln!(f, "  Models:              {}", models.join(", "))?;
            writeln!(
                f,
                "  Annual production:   {}",
                or_dash(t.annual_production, 1, t.production_unit.as_deref())
            )?;
            writeln!(f, "  CapEx:               {}", or_dash(t.capex, 2, Some("USD")))?;
            writeln!(f, "  OpEx:                {}", or_dash(t.opex, 2, Some("USD/year")))?;
            if let Some(annual) = t.annualized_cost {
                writeln!(f, "  Annualized cost:     {annual:.2} USD/year")?;
            }
            writeln!(
                f,
                "  Levelized cost:      {}",
                or_dash(t.levelized_cost, 4, t.levelized_unit.as_deref())
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total CapEx:           {:.2} USD", self.total_capex())?;
        write!(f, "Total OpEx:            {:.2} USD/year", self.total_opex())
    }
}

/// Validates `config` and evaluates every technology with the models it selects.
///
/// Stages backed by the external simulation engine are recorded by key and
/// skipped. Costs that state a dollar year are converted to
/// `config.finance_options.target_dollar_year` before the finance stage.
///
/// # Errors
///
/// Returns [`PipelineError::Invalid`] with every validation finding, or the
/// first registry, model, or inflation failure.
pub fn evaluate(config: &PlantConfig, registry: &Registry) -> Result<PlantReport, PipelineError> {
    let errors = config.validate_with(registry);
    if !errors.is_empty() {
        return Err(PipelineError::Invalid(errors));
    }

    let finance_options = config.config.finance_options.as_ref();
    let index = finance_options
        .map(|fo| fo.index().table())
        .transpose()
        .map_err(PipelineError::IndexTable)?;
    let target_year = finance_options.map(|fo| fo.target_dollar_year);

    let mut technologies = Vec::with_capacity(config.technologies.len());
    for (name, tech) in &config.technologies {
        let Some(category) = TechnologyConfig::category(name) else {
            warn!(technology = %name, "skipping block with unknown category");
            continue;
        };
        let ctx = ModelContext {
            technology: name,
            category,
            config: tech,
            run: &config.config,
        };
        let target = index.as_ref().zip(target_year);
        let report = evaluate_technology(&ctx, registry, target, config.project_life())?;
        info!(
            technology = %name,
            capex = report.capex,
            levelized_cost = report.levelized_cost,
            "evaluated technology"
        );
        technologies.push(report);
    }

    Ok(PlantReport {
        site_id: site_result_id(&config.site),
        dollar_year: target_year,
        technologies,
    })
}

fn resolve<'r>(
    ctx: &ModelContext<'_>,
    registry: &'r Registry,
    kind: ModelKind,
) -> Result<Option<&'r ModelEntry>, PipelineError> {
    registry
        .resolve_or_default(ctx.category, kind, ctx.config.selected_model(kind))
        .map_err(|source| registry_error(ctx, source))
}

fn registry_error(ctx: &ModelContext<'_>, source: RegistryError) -> PipelineError {
    match source {
        RegistryError::Model(source) => PipelineError::Model {
            technology: ctx.technology.to_string(),
            source,
        },
        source => PipelineError::Registry {
            technology: ctx.technology.to_string(),
            source,
        },
    }
}

fn model_error(ctx: &ModelContext<'_>, source: ModelError) -> PipelineError {
    PipelineError::Model {
        technology: ctx.technology.to_string(),
        source,
    }
}

fn evaluate_technology(
    ctx: &ModelContext<'_>,
    registry: &Registry,
    target: Option<(&IndexTable, i32)>,
    project_life: u32,
) -> Result<TechnologyReport, PipelineError> {
    let mut report = TechnologyReport::new(ctx.technology, ctx.category);

    let performance = match resolve(ctx, registry, ModelKind::Performance)? {
        Some(entry) => {
            report.record_model(entry);
            if entry.is_in_process() {
                let model = registry
                    .build_performance(entry, ctx)
                    .map_err(|e| registry_error(ctx, e))?;
                let perf = model.compute().map_err(|e| model_error(ctx, e))?;
                report.record_performance(&perf);
                Some(perf)
            } else {
                debug!(technology = ctx.technology, model = entry.key, "performance runs externally");
                None
            }
        }
        None => None,
    };

    let cost = match cost_entry(ctx, registry)? {
        Some(entry) => {
            report.record_model(entry);
            if entry.is_in_process() {
                let model = registry.build_cost(entry, ctx).map_err(|e| registry_error(ctx, e))?;
                let mut cost = model
                    .compute(performance.as_ref())
                    .map_err(|e| model_error(ctx, e))?;
                if let Some((index, to)) = target {
                    adjust_cost_year(ctx, &mut cost, index, to)?;
                }
                report.record_cost(&cost);
                Some(cost)
            } else {
                debug!(technology = ctx.technology, model = entry.key, "cost runs externally");
                None
            }
        }
        None => None,
    };

    if let (Some(fin_model), Some(cost)) = (&ctx.config.fin_model, &cost) {
        let rate = fin_model.financial_parameters.nominal_discount_rate();
        report.annualized_cost = Some(annualized_cost(cost.capex, cost.opex, rate, project_life));
    }

    if ctx.run.simulation_options.skip_financial(ctx.technology) {
        debug!(technology = ctx.technology, "financial evaluation switched off");
        return Ok(report);
    }

    if let Some(entry) = resolve(ctx, registry, ModelKind::Finance)? {
        report.record_model(entry);
        if !entry.is_in_process() {
            debug!(technology = ctx.technology, model = entry.key, "finance runs externally");
        } else if let Some(cost) = &cost {
            let model = registry
                .build_finance(entry, ctx)
                .map_err(|e| registry_error(ctx, e))?;
            let fin = model
                .compute(performance.as_ref(), cost)
                .map_err(|e| model_error(ctx, e))?;
            report.record_finance(fin);
        } else {
            warn!(
                technology = ctx.technology,
                model = entry.key,
                "no in-process cost result, skipping finance"
            );
        }
    }

    Ok(report)
}

/// The cost entry to run; the default `cost_info` model needs `config.cost_info`.
fn cost_entry<'r>(
    ctx: &ModelContext<'_>,
    registry: &'r Registry,
) -> Result<Option<&'r ModelEntry>, PipelineError> {
    let entry = resolve(ctx, registry, ModelKind::Cost)?;
    let implicit = ctx.config.selected_model(ModelKind::Cost).is_none();
    match entry {
        Some(e) if implicit && e.key == cost_info::KEY && ctx.run.cost_info.is_none() => {
            debug!(technology = ctx.technology, "no cost_info, skipping default cost model");
            Ok(None)
        }
        other => Ok(other),
    }
}

fn adjust_cost_year(
    ctx: &ModelContext<'_>,
    cost: &mut CostOutput,
    index: &IndexTable,
    to: i32,
) -> Result<(), PipelineError> {
    let Some(from) = cost.cost_year else {
        return Ok(());
    };
    if from == to {
        return Ok(());
    }
    let ratio = index
        .ratio(from, to)
        .map_err(|source| PipelineError::Inflation {
            technology: ctx.technology.to_string(),
            from,
            to,
            source,
        })?;
    debug!(technology = ctx.technology, from, to, ratio, "converted cost year");
    cost.rescale(ratio, to);
    Ok(())
}

/// Technologies whose blocks can run entirely in-process.
pub fn in_process_technologies<'a>(
    config: &'a PlantConfig,
    registry: &Registry,
) -> Vec<(&'a str, &'a TechnologyConfig)> {
    config
        .technologies
        .iter()
        .filter(|(name, tech)| {
            TechnologyConfig::category(name).is_some_and(|category| {
                [ModelKind::Performance, ModelKind::Cost, ModelKind::Finance]
                    .into_iter()
                    .all(|kind| {
                        registry
                            .resolve_or_default(category, kind, tech.selected_model(kind))
                            .ok()
                            .flatten()
                            .is_none_or(ModelEntry::is_in_process)
                    })
            })
        })
        .map(|(name, tech)| (name.as_str(), tech))
        .collect()
}
