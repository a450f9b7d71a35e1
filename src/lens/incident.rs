//! Incident lens
//!
//! Table rows and report formatting for the `incident` commands.

use crate::database::{GroupCount, Incident, SecopsDatabase};
use crate::lens::utils::{
    or_dash, render_group_counts, render_records, truncate_text, OutputFormat,
    DEFAULT_TEXT_MAX_LEN,
};
use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

/// Display row for an incident
#[derive(Debug, Clone, Tabled)]
pub struct IncidentRow {
    pub id: i64,
    pub date: String,
    pub incident_type: String,
    pub severity: String,
    pub status: String,
    pub description: String,
    pub reported_by: String,
}

impl IncidentRow {
    pub fn from_incident(incident: &Incident, truncate: bool) -> Self {
        let description = if truncate {
            truncate_text(&incident.description, DEFAULT_TEXT_MAX_LEN)
        } else {
            incident.description.clone()
        };
        IncidentRow {
            id: incident.id,
            date: incident.date.clone(),
            incident_type: incident.incident_type.clone(),
            severity: incident.severity.clone(),
            status: incident.status.clone(),
            description,
            reported_by: or_dash(&incident.reported_by),
        }
    }
}

/// Grouped-count reports over incidents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncidentReport {
    /// Incidents per type
    ByType,
    /// High severity incidents per status
    HighSeverityByStatus,
    /// Types with more than the given number of incidents
    TypesOver(u64),
}

impl IncidentReport {
    /// Name of the grouped column
    pub fn label(&self) -> &'static str {
        match self {
            IncidentReport::ByType | IncidentReport::TypesOver(_) => "incident_type",
            IncidentReport::HighSeverityByStatus => "status",
        }
    }

    pub fn title(&self) -> String {
        match self {
            IncidentReport::ByType => "Incidents by Type".to_string(),
            IncidentReport::HighSeverityByStatus => {
                "High Severity Incidents by Status".to_string()
            }
            IncidentReport::TypesOver(n) => format!("Incident Types with Many Cases (>{})", n),
        }
    }
}

pub struct IncidentLens<'a> {
    db: &'a SecopsDatabase,
}

impl<'a> IncidentLens<'a> {
    pub fn new(db: &'a SecopsDatabase) -> Self {
        Self { db }
    }

    /// Run one of the grouped-count reports
    pub fn report(&self, report: IncidentReport) -> Result<Vec<GroupCount>> {
        let repo = self.db.incidents();
        match report {
            IncidentReport::ByType => repo.count_by_type(),
            IncidentReport::HighSeverityByStatus => repo.count_high_severity_by_status(),
            IncidentReport::TypesOver(threshold) => repo.types_with_min_count(threshold),
        }
    }

    pub fn format_incidents(
        &self,
        incidents: &[Incident],
        format: OutputFormat,
        truncate: bool,
    ) -> String {
        render_records(incidents, format, |i| {
            IncidentRow::from_incident(i, truncate)
        })
    }

    pub fn format_report(
        &self,
        report: IncidentReport,
        counts: &[GroupCount],
        format: OutputFormat,
    ) -> String {
        render_group_counts(report.label(), counts, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NewIncident;

    fn seeded_db() -> SecopsDatabase {
        let db = SecopsDatabase::open_in_memory().unwrap();
        let repo = db.incidents();
        for (kind, severity, status) in [
            ("Phishing", "High", "Open"),
            ("Phishing", "High", "Resolved"),
            ("Malware", "High", "Open"),
            ("DDoS", "Low", "Open"),
        ] {
            repo.insert(&NewIncident::new(
                "2024-11-05",
                kind,
                severity,
                status,
                "A fairly long description of what the analyst observed",
                None,
            ))
            .unwrap();
        }
        db
    }

    #[test]
    fn test_reports() {
        let db = seeded_db();
        let lens = IncidentLens::new(&db);

        let by_type = lens.report(IncidentReport::ByType).unwrap();
        assert_eq!(by_type[0], GroupCount::new("Phishing", 2));

        let high = lens.report(IncidentReport::HighSeverityByStatus).unwrap();
        assert_eq!(high[0], GroupCount::new("Open", 2));

        let over = lens.report(IncidentReport::TypesOver(1)).unwrap();
        assert_eq!(over, vec![GroupCount::new("Phishing", 2)]);
    }

    #[test]
    fn test_format_incidents() {
        let db = seeded_db();
        let lens = IncidentLens::new(&db);
        let incidents = db.incidents().get_all().unwrap();

        let table = lens.format_incidents(&incidents, OutputFormat::Markdown, true);
        assert!(table.contains("incident_type"));
        assert!(table.contains("A fairly long description of what the..."));
        assert!(table.contains("| -"));

        let json = lens.format_incidents(&incidents, OutputFormat::Json, true);
        let parsed: Vec<Incident> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, incidents);
    }

    #[test]
    fn test_report_titles() {
        assert_eq!(
            IncidentReport::TypesOver(5).title(),
            "Incident Types with Many Cases (>5)"
        );
        assert_eq!(IncidentReport::HighSeverityByStatus.label(), "status");
    }
}
