//! IT ticket CSV exports
//!
//! Helpdesk exports carry `ticket_id, priority, status, description,
//! created_at, resolution_time_hours, assigned_to` (and sometimes a
//! `category`, which is ignored). The columns the `it_tickets` table needs
//! but the export lacks are derived here.

use crate::database::{NewTicket, TICKET_TIME_FORMAT};
use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use std::path::Path;

/// Category assigned to every imported ticket
pub const IMPORTED_CATEGORY: &str = "General";

/// Subject used when a ticket has no description
pub const NO_SUBJECT: &str = "No Subject";

/// Status that marks a ticket as closed out
pub const RESOLVED_STATUS: &str = "Resolved";

/// One row of a ticket export
#[derive(Debug, Clone, Deserialize)]
pub struct TicketCsvRow {
    pub ticket_id: String,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolution_time_hours: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl TicketCsvRow {
    /// Derive the table columns for this row
    pub fn into_new_ticket(self) -> Result<NewTicket> {
        let subject = derive_subject(self.description.as_deref());
        let resolved_date = derive_resolved_date(
            &self.status,
            self.created_at.as_deref(),
            self.resolution_time_hours.as_deref(),
        )?;

        Ok(NewTicket {
            ticket_id: self.ticket_id,
            priority: self.priority,
            status: self.status,
            category: IMPORTED_CATEGORY.to_string(),
            subject,
            description: self.description,
            created_date: self.created_at,
            resolved_date,
            assigned_to: self.assigned_to,
        })
    }
}

/// First two whitespace-separated words of the description
pub fn derive_subject(description: Option<&str>) -> String {
    match description {
        Some(d) if !d.trim().is_empty() => {
            d.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
        }
        _ => NO_SUBJECT.to_string(),
    }
}

/// `created_at + resolution_time_hours` for resolved tickets, `None` otherwise
pub fn derive_resolved_date(
    status: &str,
    created_at: Option<&str>,
    resolution_hours: Option<&str>,
) -> Result<Option<String>> {
    if status != RESOLVED_STATUS {
        return Ok(None);
    }

    let created = created_at.ok_or_else(|| anyhow!("resolved ticket has no created_at"))?;
    let created = NaiveDateTime::parse_from_str(created, TICKET_TIME_FORMAT)
        .map_err(|e| anyhow!("Invalid created_at '{}': {}", created, e))?;
    let hours = parse_hours(
        resolution_hours.ok_or_else(|| anyhow!("resolved ticket has no resolution_time_hours"))?,
    )?;

    let resolved = Duration::try_hours(hours)
        .and_then(|delta| created.checked_add_signed(delta))
        .ok_or_else(|| anyhow!("resolution time of {} hours is out of range", hours))?;
    Ok(Some(resolved.format(TICKET_TIME_FORMAT).to_string()))
}

/// Parse an hour count, truncating fractional exports such as `"5.0"`
fn parse_hours(value: &str) -> Result<i64> {
    let value = value.trim();
    if let Ok(hours) = value.parse::<i64>() {
        return Ok(hours);
    }
    match value.parse::<f64>() {
        Ok(hours) if hours.is_finite() => Ok(hours.trunc() as i64),
        _ => Err(anyhow!("Invalid resolution_time_hours '{}'", value)),
    }
}

/// Read a ticket export (plain, `.gz` or `.bz2`) into insertable records
pub fn read_ticket_csv(path: &Path) -> Result<Vec<NewTicket>> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert path to string: {}", path.display()))?;
    let reader = oneio::get_reader(path_str)
        .map_err(|e| anyhow!("Failed to open ticket export {}: {}", path_str, e))?;
    parse_ticket_csv(reader)
}

/// Parse ticket CSV content from any reader
pub fn parse_ticket_csv<R: std::io::Read>(reader: R) -> Result<Vec<NewTicket>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut res = vec![];
    for (idx, row) in rdr.deserialize::<TicketCsvRow>().enumerate() {
        let line = idx + 2;
        let row = row.map_err(|e| anyhow!("Invalid ticket row at line {}: {}", line, e))?;
        let ticket = row
            .into_new_ticket()
            .map_err(|e| anyhow!("Invalid ticket row at line {}: {}", line, e))?;
        res.push(ticket);
    }
    Ok(res)
}
