//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;

use hybrid_plant::config::{PlantConfig, TechnologyConfig};
use hybrid_plant::pipeline::{PlantReport, evaluate};
use hybrid_plant::registry::Registry;

/// Bundled wind, solar, and storage hybrid.
pub fn texas_hybrid() -> PlantConfig {
    PlantConfig::from_preset("texas_hybrid").expect("texas_hybrid preset should load")
}

/// Bundled preset by name.
pub fn preset(name: &str) -> PlantConfig {
    PlantConfig::from_preset(name).unwrap_or_else(|e| panic!("preset {name} should load: {e}"))
}

/// Electrowinning iron block costed in-process; performance and finance run externally.
const IRON_BLOCK: &str = "\
cost_model:
  model: stinn_electrowinning_cost
model_inputs:
  cost_parameters:
    electrolysis_temp: 1000.0
    pressure: 1.5
    production_rate: 1.0
    electron_moles: 3.0
    current_density: 5000.0
    electrode_area: 30.0
    current_efficiency: 0.95
    molar_mass: 0.018
    installed_capacity: 500.0
    cell_voltage: 4.18
    rectifier_lines: 3.0
";

/// Texas site with a single iron electrowinning block.
pub fn iron_electrowinning() -> PlantConfig {
    let mut cfg = texas_hybrid();
    let fin_model = cfg.technologies["wind"].fin_model.clone();
    let mut iron: TechnologyConfig =
        serde_yaml::from_str(IRON_BLOCK).expect("iron block should parse");
    iron.fin_model = fin_model;
    cfg.technologies = [("iron".to_string(), iron)].into_iter().collect();
    cfg.config.dispatch_options = None;
    cfg.config.cost_info = None;
    cfg
}

/// Evaluates a config against the built-in registry.
pub fn evaluate_builtin(config: &PlantConfig) -> PlantReport {
    evaluate(config, &Registry::builtin()).expect("evaluation should succeed")
}

/// Writes `config` as YAML to `dir/name` and returns the path.
pub fn write_yaml(dir: &Path, name: &str, config: &PlantConfig) -> std::path::PathBuf {
    let path = dir.join(name);
    let yaml = config.to_yaml_string().expect("config should serialize");
    std::fs::write(&path, yaml).expect("config file should be writable");
    path
}

/// Field paths of every validation error.
pub fn error_fields(config: &PlantConfig) -> Vec<String> {
    config.validate().into_iter().map(|e| e.field).collect()
}

/// Source text of a bundled preset.
pub fn preset_source(name: &str) -> String {
    let file = match name {
        "texas_hybrid" => "hopp_config_tx",
        other => other,
    };
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join(format!("{file}.yaml"));
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("{} should be readable: {e}", path.display()))
}

/// Dotted paths of every mapping key in a YAML document.
pub fn key_paths(yaml: &str) -> BTreeSet<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("YAML should parse");
    let mut paths = BTreeSet::new();
    collect_keys(&value, "", &mut paths);
    paths
}

fn collect_keys(value: &serde_yaml::Value, prefix: &str, out: &mut BTreeSet<String>) {
    let Some(map) = value.as_mapping() else {
        return;
    };
    for (k, v) in map {
        let key = match k.as_str() {
            Some(s) => s.to_string(),
            None => serde_yaml::to_string(k).unwrap_or_default().trim().to_string(),
        };
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        collect_keys(v, &path, out);
        out.insert(path);
    }
}
