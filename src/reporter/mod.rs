pub(crate) mod serialize;

use crate::app::aggregate::Results;
use crate::app::cleanup::Sweep;
use crate::app::report::Report;
use crate::app::Summary;
use crate::error::Result;
use serde_derive::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn log_results(label: &str, results: &Results) {
    info!(
        "{}: {} installations stable, {} failed",
        label, results.successes, results.errors
    );
    info!(
        "{}: time to stable min {:.2}s, median {:.2}s, max {:.2}s",
        label, results.min, results.median, results.max
    );
}

pub fn log_sweep(label: &str, sweep: &Sweep) {
    if sweep.vanished > 0 {
        warn!(
            "{}: {} installations deleted, {} were already gone",
            label, sweep.deleted, sweep.vanished
        );
    } else {
        info!("{}: {} installations deleted", label, sweep.deleted);
    }
}

#[derive(Serialize)]
struct Row<'a> {
    id: &'a str,
    dns: &'a str,
    outcome: &'static str,
    #[serde(with = "serialize::epoch_millis")]
    observed_at: i64,
    seconds: Option<f64>,
    message: Option<&'a str>,
}

#[derive(Serialize)]
struct Document<'a> {
    generated_at: String,
    results: &'a Results,
    runs: &'a [Results],
    cleanup: &'a [Sweep],
    installations: Vec<Row<'a>>,
}

impl<'a> From<&'a Report> for Row<'a> {
    fn from(report: &'a Report) -> Self {
        let installation = report.installation();
        let (outcome, observed_at, message) = match report {
            Report::Completed { completed_at, .. } => ("completed", *completed_at, None),
            Report::Failed {
                observed_at,
                message,
                ..
            } => ("failed", *observed_at, Some(message.as_str())),
        };
        Row {
            id: installation.id.as_str(),
            dns: installation.dns.as_str(),
            outcome,
            observed_at,
            seconds: report.duration_millis().map(|millis| millis as f64 / 1000.0),
            message,
        }
    }
}

/// Writes the summary and one row per installation outcome as pretty JSON.
pub fn write_report(path: &Path, summary: &Summary) -> Result<()> {
    let document = Document {
        generated_at: chrono::Local::now().to_rfc3339(),
        results: &summary.results,
        runs: &summary.runs,
        cleanup: &summary.sweeps,
        installations: summary.reports.iter().map(Row::from).collect(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &document)?;
    info!("Report written to {}", path.display());
    Ok(())
}
