//! CSV export of the per-region counters.

use crate::error::Error;
use crate::reconcile::RunReport;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One exported line: a region, its target and its counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RegionRow<'a> {
    region: &'a str,
    target_name: &'a str,
    target_id: &'a str,
    #[serde(rename = "VNets")]
    vnets: usize,
    subnets: usize,
    processed: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    excluded: usize,
    already_conformant: usize,
    what_if: bool,
    timestamp: &'a str,
}

/// `<prefix>_<YYYY-MM-DD_HHMMSS>.csv` in the working directory.
pub fn default_export_path(prefix: &str, now: &DateTime<Tz>) -> PathBuf {
    PathBuf::from(format!("{prefix}_{}.csv", now.format("%Y-%m-%d_%H%M%S")))
}

/// An export is only written when something needed a change.
pub fn should_export(report: &RunReport, requested: bool) -> bool {
    requested && report.has_processed()
}

/// Write one row per region; returns the number of rows.
pub fn write_report<W: Write>(
    report: &RunReport,
    output: W,
    now: &DateTime<Tz>,
) -> Result<usize, csv::Error> {
    let timestamp = now.format("%Y-%m-%d %H:%M:%S %Z").to_string();
    let mut writer = csv::Writer::from_writer(output);
    let mut rows = 0;

    for (region, c) in report.statistics.regions() {
        let target = report.targets.get(region);
        writer.serialize(RegionRow {
            region,
            target_name: target.map(|t| t.name.as_str()).unwrap_or(""),
            target_id: target.map(|t| t.id.as_str()).unwrap_or(""),
            vnets: c.vnets,
            subnets: c.subnets,
            processed: c.processed,
            succeeded: c.succeeded,
            failed: c.failed,
            skipped: c.skipped,
            excluded: c.excluded,
            already_conformant: c.already_conformant,
            what_if: report.preview,
            timestamp: &timestamp,
        })?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

/// Export the report to `path`.
pub fn export_report(report: &RunReport, path: &Path, now: &DateTime<Tz>) -> Result<usize, Error> {
    let export_error = |message: String| Error::Export {
        path: path.display().to_string(),
        message,
    };
    let file = File::create(path).map_err(|e| export_error(e.to_string()))?;
    let rows = write_report(report, file, now).map_err(|e| export_error(e.to_string()))?;
    log::info!("Exported {} region row(s) to {}", rows, path.display());
    Ok(rows)
}
