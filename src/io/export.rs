//! CSV export of the plant report, one row per technology.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::pipeline::{PlantReport, TechnologyReport};

/// Column header for the per-technology CSV export.
const HEADER: &str = "site_id,technology,category,performance_model,cost_model,\
                      finance_model,annual_production,production_unit,capex_usd,\
                      opex_usd_per_year,cost_year,annualized_cost_usd_per_year,\
                      levelized_cost,levelized_unit";

/// Exports the plant report to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(report: &PlantReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(report, buf)
}

/// Writes the plant report as CSV to any writer.
///
/// Stages that did not run are written as empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(report: &PlantReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for t in &report.technologies {
        wtr.write_record(&row(&report.site_id, t))?;
    }

    wtr.flush()?;
    Ok(())
}

fn row(site_id: &str, t: &TechnologyReport) -> [String; 14] {
    use crate::registry::ModelKind;

    let number = |v: Option<f64>, precision: usize| {
        v.map(|x| format!("{x:.precision$}")).unwrap_or_default()
    };
    let model = |kind| t.model(kind).unwrap_or_default().to_string();
    [
        site_id.to_string(),
        t.name.clone(),
        t.category.to_string(),
        model(ModelKind::Performance),
        model(ModelKind::Cost),
        model(ModelKind::Finance),
        number(t.annual_production, 4),
        t.production_unit.clone().unwrap_or_default(),
        number(t.capex, 2),
        number(t.opex, 2),
        t.cost_year.map(|y| y.to_string()).unwrap_or_default(),
        number(t.annualized_cost, 2),
        number(t.levelized_cost, 6),
        t.levelized_unit.clone().unwrap_or_default(),
    ]
}
