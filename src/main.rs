//! Hybrid plant command-line entry point.

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use hybrid_plant::inflation;
use hybrid_plant::io::convert::csv_to_yaml;
use hybrid_plant::io::export::export_csv;
use hybrid_plant::io::results::ResultStore;
use hybrid_plant::pipeline::{PipelineError, evaluate, in_process_technologies};
use hybrid_plant::registry::{Registry, TechnologyCategory};

use crate::cli::{Args, Command, ConvertArgs, InflateArgs, ModelsArgs, RunArgs, SourceArgs};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    hybrid_plant::logging::init(args.verbose);

    match args.command {
        Command::Validate(source) => validate(&source),
        Command::Run(run_args) => run(&run_args),
        Command::Models(models_args) => models(&models_args),
        Command::Convert(convert_args) => convert(&convert_args),
        Command::Inflate(inflate_args) => inflate(&inflate_args),
    }
}

fn validate(source: &SourceArgs) -> anyhow::Result<()> {
    let config = source.load().context("failed to load config")?;
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("config has {} error(s)", errors.len());
    }
    let in_process = in_process_technologies(&config, &Registry::builtin());
    println!(
        "ok: {} technologies, {} fully in-process",
        config.technologies.len(),
        in_process.len()
    );
    for (name, _) in &in_process {
        info!(technology = name, "every stage runs in-process");
    }
    Ok(())
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let config = args.source.load().context("failed to load config")?;
    let registry = Registry::builtin();
    let report = match evaluate(&config, &registry) {
        Ok(report) => report,
        Err(PipelineError::Invalid(errors)) => {
            for e in &errors {
                eprintln!("{e}");
            }
            bail!("config has {} error(s)", errors.len());
        }
        Err(e) => return Err(e).context("evaluation failed"),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{report}");
    }

    if let Some(path) = &args.csv {
        export_csv(&report, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        eprintln!("Report written to {}", path.display());
    }

    if let Some(dir) = &args.save_dir {
        let path = ResultStore::new(dir)
            .save("plant_report", &report.site_id, &report)
            .context("failed to save report")?;
        info!(path = %path.display(), "report saved");
    }
    Ok(())
}

fn models(args: &ModelsArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let categories: Vec<TechnologyCategory> = match args.category {
        Some(c) => vec![c],
        None => TechnologyCategory::ALL.to_vec(),
    };
    println!(
        "{:<18} {:<12} {:<32} {:<8} {:<10} DESCRIPTION",
        "TECHNOLOGY", "KIND", "MODEL", "DEFAULT", "RUNS"
    );
    for category in categories {
        for entry in registry.for_category(category) {
            println!(
                "{:<18} {:<12} {:<32} {:<8} {:<10} {}",
                category.as_str(),
                entry.kind.to_string(),
                entry.key,
                if entry.is_default { "*" } else { "" },
                if entry.is_in_process() { "in-process" } else { "external" },
                entry.description
            );
        }
    }
    Ok(())
}

fn convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let out = csv_to_yaml(&args.csv)
        .with_context(|| format!("failed to convert {}", args.csv.display()))?;
    println!("{}", out.display());
    Ok(())
}

fn inflate(args: &InflateArgs) -> anyhow::Result<()> {
    let value = inflation::inflate(args.index, args.value, args.from, args.to)
        .context("cost year conversion failed")?;
    println!("{value:.2}");
    Ok(())
}
