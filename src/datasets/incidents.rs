//! Incident CSV exports
//!
//! Incident exports name their columns after the upstream alerting tool:
//! `timestamp, category, severity, status, description[, reported_by]`.
//! Rows are mapped onto [`NewIncident`] so they can be appended to
//! `cyber_incidents`.

use crate::database::NewIncident;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Reporter recorded for rows of an export without a `reported_by` column
pub const DEFAULT_REPORTER: &str = "system";

/// One row of an incident export
///
/// Columns outside this set are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentCsvRow {
    pub timestamp: String,
    pub category: String,
    pub severity: String,
    pub status: String,
    pub description: String,
    #[serde(default)]
    pub reported_by: Option<String>,
}

impl IncidentCsvRow {
    /// Map the export row onto the table columns
    ///
    /// `fallback_reporter` is only applied when the export has no
    /// `reported_by` column at all; an empty cell in a present column is
    /// stored as NULL.
    pub fn into_new_incident(self, fallback_reporter: Option<&str>) -> NewIncident {
        let reported_by = match fallback_reporter {
            Some(reporter) => Some(reporter.to_string()),
            None => self.reported_by,
        };
        NewIncident {
            date: self.timestamp,
            incident_type: self.category,
            severity: self.severity,
            status: self.status,
            description: self.description,
            reported_by,
        }
    }
}

/// Read an incident export (plain, `.gz` or `.bz2`) into insertable records
pub fn read_incident_csv(path: &Path, default_reporter: &str) -> Result<Vec<NewIncident>> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert path to string: {}", path.display()))?;
    let reader = oneio::get_reader(path_str)
        .map_err(|e| anyhow!("Failed to open incident export {}: {}", path_str, e))?;
    parse_incident_csv(reader, default_reporter)
}

/// Parse incident CSV content from any reader
pub fn parse_incident_csv<R: std::io::Read>(
    reader: R,
    default_reporter: &str,
) -> Result<Vec<NewIncident>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let has_reporter = rdr
        .headers()
        .map_err(|e| anyhow!("Failed to read incident export header: {}", e))?
        .iter()
        .any(|h| h == "reported_by");
    let fallback = if has_reporter {
        None
    } else {
        debug!(
            "incident export has no reported_by column, using '{}'",
            default_reporter
        );
        Some(default_reporter)
    };

    let mut res = vec![];
    for (idx, row) in rdr.deserialize::<IncidentCsvRow>().enumerate() {
        // header is line 1
        let row = row.map_err(|e| anyhow!("Invalid incident row at line {}: {}", idx + 2, e))?;
        res.push(row.into_new_incident(fallback));
    }
    Ok(res)
}
