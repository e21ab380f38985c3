use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hybrid_plant::config::{LoadError, PlantConfig};
use hybrid_plant::inflation::CostIndex;
use hybrid_plant::registry::TechnologyCategory;

/// Load, validate, and evaluate hybrid plant configurations.
#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a configuration and list every problem found.
    #[clap(name = "validate")]
    Validate(SourceArgs),

    /// Evaluate every technology and print the plant report.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// List the models a configuration may select.
    #[clap(name = "models")]
    Models(ModelsArgs),

    /// Convert a CSV table into a YAML mapping next to it.
    #[clap(name = "convert")]
    Convert(ConvertArgs),

    /// Move a cost between dollar years.
    #[clap(name = "inflate")]
    Inflate(InflateArgs),
}

/// Where the configuration comes from; `texas_hybrid` when neither is given.
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Config file (`.yaml`, `.yml`, or `.toml`).
    #[clap(conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Bundled config to use instead of a file.
    #[clap(long, env = "HYBRID_PLANT_PRESET")]
    pub preset: Option<String>,
}

impl SourceArgs {
    pub fn load(&self) -> Result<PlantConfig, LoadError> {
        match (&self.config, &self.preset) {
            (Some(path), _) => PlantConfig::from_path(path),
            (None, Some(name)) => PlantConfig::from_preset(name),
            (None, None) => PlantConfig::from_preset("texas_hybrid"),
        }
    }
}

#[derive(clap::Args)]
pub struct RunArgs {
    #[clap(flatten)]
    pub source: SourceArgs,

    /// Also write one CSV row per technology to this file.
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// Save the report as `<dir>/plant_report/<site id>.json`.
    #[clap(long)]
    pub save_dir: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[clap(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ModelsArgs {
    /// Only list models of this technology (block names and aliases accepted).
    #[clap(long, value_parser = parse_category)]
    pub category: Option<TechnologyCategory>,
}

#[derive(clap::Args)]
pub struct ConvertArgs {
    /// CSV file whose first column is the row index.
    pub csv: PathBuf,
}

#[derive(clap::Args)]
pub struct InflateArgs {
    /// Amount in `from`-year dollars.
    #[clap(long, allow_negative_numbers = true)]
    pub value: f64,

    #[clap(long)]
    pub from: i32,

    #[clap(long)]
    pub to: i32,

    /// `cpi` or `cepci`.
    #[clap(long, default_value = "cpi", value_parser = parse_index)]
    pub index: CostIndex,
}

fn parse_category(s: &str) -> Result<TechnologyCategory, String> {
    TechnologyCategory::from_name(s).ok_or_else(|| {
        format!(
            "unknown technology \"{s}\", available: {}",
            TechnologyCategory::NAMES.join(", ")
        )
    })
}

fn parse_index(s: &str) -> Result<CostIndex, String> {
    match s.to_ascii_lowercase().as_str() {
        "cpi" => Ok(CostIndex::Cpi),
        "cepci" => Ok(CostIndex::Cepci),
        _ => Err(format!("unknown cost index \"{s}\", expected cpi or cepci")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn run_with_preset() {
        let args = Args::try_parse_from(["hybrid-plant", "run", "--preset", "smr_methanol", "--json"])
            .unwrap();
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.source.preset.as_deref(), Some("smr_methanol"));
        assert!(run.json);
    }

    #[test]
    fn config_and_preset_conflict() {
        let res = Args::try_parse_from(["hybrid-plant", "validate", "plant.yaml", "--preset", "x"]);
        assert!(res.is_err());
    }

    #[test]
    fn category_alias_accepted() {
        let args = Args::try_parse_from(["hybrid-plant", "models", "--category", "geoh2"]).unwrap();
        let Command::Models(m) = args.command else {
            panic!("expected models");
        };
        assert_eq!(m.category, Some(TechnologyCategory::GeologicHydrogen));
    }

    #[test]
    fn inflate_index_parsed() {
        let args = Args::try_parse_from([
            "hybrid-plant",
            "inflate",
            "--value",
            "100",
            "--from",
            "2018",
            "--to",
            "2022",
            "--index",
            "CEPCI",
        ])
        .unwrap();
        let Command::Inflate(i) = args.command else {
            panic!("expected inflate");
        };
        assert_eq!(i.index, CostIndex::Cepci);
        assert_eq!(i.from, 2018);
    }
}
