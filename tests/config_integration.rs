//! Integration tests for loading, serializing, and validating plant configs.

mod common;

use hybrid_plant::config::{LoadError, PlantConfig};

#[test]
fn every_preset_validates() {
    for name in PlantConfig::PRESETS {
        let cfg = common::preset(name);
        let errors = cfg.validate();
        assert!(errors.is_empty(), "{name}: {errors:?}");
    }
}

#[test]
fn texas_hybrid_has_four_technologies() {
    let cfg = common::texas_hybrid();
    let names: Vec<&str> = cfg.technologies.keys().map(String::as_str).collect();
    assert_eq!(names, ["battery", "grid", "pv", "wind"]);
    assert_eq!(cfg.project_life(), 25);
    let boundaries = cfg.site.data.site_boundaries.as_ref().unwrap();
    assert!(boundaries.area() > 0.0);
}

#[test]
fn yaml_round_trip_preserves_config() {
    let cfg = common::texas_hybrid();
    let yaml = cfg.to_yaml_string().unwrap();
    let back = PlantConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn yaml_round_trip_keeps_exact_keys() {
    for name in PlantConfig::PRESETS {
        let before = common::key_paths(&common::preset_source(name));
        let yaml = common::preset(name).to_yaml_string().unwrap();
        let after = common::key_paths(&yaml);
        let invented: Vec<_> = after.difference(&before).collect();
        let dropped: Vec<_> = before.difference(&after).collect();
        assert!(invented.is_empty(), "{name} invented {invented:?}");
        assert!(dropped.is_empty(), "{name} dropped {dropped:?}");
    }
}

#[test]
fn file_round_trip_through_path() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = common::preset("geo_h2_combined");
    let path = common::write_yaml(dir.path(), "plant.yml", &cfg);
    let loaded = PlantConfig::from_path(&path).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn debt_percent_out_of_bounds() {
    let mut cfg = common::texas_hybrid();
    let wind = cfg.technologies.get_mut("wind").unwrap();
    wind.fin_model.as_mut().unwrap().financial_parameters.debt_percent = 101.0;
    let fields = common::error_fields(&cfg);
    assert_eq!(
        fields,
        ["technologies.wind.fin_model.financial_parameters.debt_percent"]
    );
}

#[test]
fn negative_capital_gains_rate_rejected() {
    let mut cfg = common::texas_hybrid();
    let pv = cfg.technologies.get_mut("pv").unwrap();
    pv.fin_model
        .as_mut()
        .unwrap()
        .financial_parameters
        .capital_gains_tax_rate = -0.5;
    let fields = common::error_fields(&cfg);
    assert!(
        fields
            .iter()
            .any(|f| f == "technologies.pv.fin_model.financial_parameters.capital_gains_tax_rate"),
        "{fields:?}"
    );
}

#[test]
fn missing_fin_model_is_reported_per_technology() {
    let mut cfg = common::texas_hybrid();
    for name in ["battery", "grid"] {
        cfg.technologies.get_mut(name).unwrap().fin_model = None;
    }
    let fields = common::error_fields(&cfg);
    assert!(fields.contains(&"technologies.battery.fin_model".to_string()));
    assert!(fields.contains(&"technologies.grid.fin_model".to_string()));
    assert!(!fields.contains(&"technologies.wind.fin_model".to_string()));
}

#[test]
fn unknown_fin_model_key_fails_to_parse() {
    let cfg = common::texas_hybrid();
    let yaml = cfg
        .to_yaml_string()
        .unwrap()
        .replacen("ppa_escalation:", "ppa_escalator:", 1);
    let err = PlantConfig::from_yaml_str(&yaml).unwrap_err();
    assert!(matches!(err, LoadError::Yaml(_)));
    assert!(err.to_string().contains("ppa_escalator"), "{err}");
}

#[test]
fn unsupported_model_lists_alternatives() {
    let mut cfg = common::preset("smr_methanol");
    let methanol = cfg.technologies.get_mut("methanol").unwrap();
    methanol.cost_model.as_mut().unwrap().model = "atb".into();
    let errors = cfg.validate();
    let err = errors
        .iter()
        .find(|e| e.field == "technologies.methanol.cost_model.model")
        .unwrap();
    assert!(err.message.contains("unsupported model"), "{}", err.message);
    assert!(err.message.contains("smr_methanol_cost"), "{}", err.message);
}

#[test]
fn battery_dispatch_policy_checked() {
    let mut cfg = common::texas_hybrid();
    if let Some(d) = cfg.config.dispatch_options.as_mut() {
        d.battery_dispatch = "greedy".into();
    }
    assert_eq!(
        common::error_fields(&cfg),
        ["config.dispatch_options.battery_dispatch"]
    );
}
