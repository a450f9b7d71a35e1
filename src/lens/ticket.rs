//! Ticket lens
//!
//! Table rows, report formatting and the name-based field setter used by the
//! `ticket` commands.

use crate::database::{GroupCount, SecopsDatabase, Ticket, TicketField};
use crate::lens::utils::{
    or_dash, render_group_counts, render_records, truncate_text, OutputFormat,
    DEFAULT_TEXT_MAX_LEN,
};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;
use tabled::Tabled;

/// Display row for a ticket
#[derive(Debug, Clone, Tabled)]
pub struct TicketRow {
    pub id: i64,
    pub ticket_id: String,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub subject: String,
    pub created_date: String,
    pub resolved_date: String,
    pub assigned_to: String,
}

impl TicketRow {
    pub fn from_ticket(ticket: &Ticket, truncate: bool) -> Self {
        let subject = if truncate {
            truncate_text(&ticket.subject, DEFAULT_TEXT_MAX_LEN)
        } else {
            ticket.subject.clone()
        };
        TicketRow {
            id: ticket.id,
            ticket_id: ticket.ticket_id.clone(),
            priority: ticket.priority.clone(),
            status: ticket.status.clone(),
            category: ticket.category.clone(),
            subject,
            created_date: or_dash(&ticket.created_date),
            resolved_date: or_dash(&ticket.resolved_date),
            assigned_to: or_dash(&ticket.assigned_to),
        }
    }
}

/// Grouped-count reports over tickets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TicketReport {
    ByPriority,
    ByStatus,
}

impl TicketReport {
    pub fn label(&self) -> &'static str {
        match self {
            TicketReport::ByPriority => "priority",
            TicketReport::ByStatus => "status",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TicketReport::ByPriority => "Tickets by Priority",
            TicketReport::ByStatus => "Tickets by Status",
        }
    }
}

#[derive(Debug, Serialize)]
struct AverageResolution {
    avg_resolution_hours: Option<f64>,
}

pub struct TicketLens<'a> {
    db: &'a SecopsDatabase,
}

impl<'a> TicketLens<'a> {
    pub fn new(db: &'a SecopsDatabase) -> Self {
        Self { db }
    }

    pub fn report(&self, report: TicketReport) -> Result<Vec<GroupCount>> {
        let repo = self.db.tickets();
        match report {
            TicketReport::ByPriority => repo.count_by_priority(),
            TicketReport::ByStatus => repo.count_by_status(),
        }
    }

    /// Set a field given by name
    ///
    /// The name is checked against [`TicketField`] before anything reaches
    /// the database.
    pub fn update_field_by_name(
        &self,
        id: i64,
        field_name: &str,
        value: &str,
    ) -> Result<usize> {
        let field = TicketField::from_str(field_name).map_err(|e| anyhow!(e))?;
        self.db.tickets().update_field(id, field, value)
    }

    pub fn format_tickets(
        &self,
        tickets: &[Ticket],
        format: OutputFormat,
        truncate: bool,
    ) -> String {
        render_records(tickets, format, |t| TicketRow::from_ticket(t, truncate))
    }

    pub fn format_report(
        &self,
        report: TicketReport,
        counts: &[GroupCount],
        format: OutputFormat,
    ) -> String {
        render_group_counts(report.label(), counts, format)
    }

    pub fn format_average(&self, hours: Option<f64>, format: OutputFormat) -> String {
        if format.is_json() {
            let value = AverageResolution {
                avg_resolution_hours: hours,
            };
            return match format {
                OutputFormat::JsonPretty => serde_json::to_string_pretty(&value),
                _ => serde_json::to_string(&value),
            }
            .unwrap_or_default();
        }
        match hours {
            Some(h) => format!("Average resolution time: {:.2} hours", h),
            None => "Average resolution time: no resolved tickets".to_string(),
        }
    }
}
