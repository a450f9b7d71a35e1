//! Incident repository
//!
//! Data access for the `cyber_incidents` table: single-row CRUD, the fixed
//! grouped-count queries, and CSV import.

use super::{ensure_import_target, query_group_counts, GroupCount};
use crate::database::core::INCIDENTS_TABLE;
use crate::datasets::{read_incident_csv, DEFAULT_REPORTER};
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

const INCIDENT_COLUMNS: &str =
    "id, date, incident_type, severity, status, description, reported_by";

/// A stored security incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub date: String,
    pub incident_type: String,
    /// Informally one of Low, Medium, High, Critical
    pub severity: String,
    pub status: String,
    pub description: String,
    pub reported_by: Option<String>,
}

/// An incident that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    pub date: String,
    pub incident_type: String,
    pub severity: String,
    pub status: String,
    pub description: String,
    pub reported_by: Option<String>,
}

impl NewIncident {
    pub fn new(
        date: &str,
        incident_type: &str,
        severity: &str,
        status: &str,
        description: &str,
        reported_by: Option<&str>,
    ) -> Self {
        Self {
            date: date.to_string(),
            incident_type: incident_type.to_string(),
            severity: severity.to_string(),
            status: status.to_string(),
            description: description.to_string(),
            reported_by: reported_by.map(|s| s.to_string()),
        }
    }
}

fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        id: row.get(0)?,
        date: row.get(1)?,
        incident_type: row.get(2)?,
        severity: row.get(3)?,
        status: row.get(4)?,
        description: row.get(5)?,
        reported_by: row.get(6)?,
    })
}

/// Repository for incident operations
///
/// Borrows the connection; the owner (usually [`super::SecopsDatabase`])
/// decides when it is closed.
pub struct IncidentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> IncidentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert one incident and return its newly assigned id
    pub fn insert(&self, incident: &NewIncident) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO cyber_incidents
                 (date, incident_type, severity, status, description, reported_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    incident.date,
                    incident.incident_type,
                    incident.severity,
                    incident.status,
                    incident.description,
                    incident.reported_by,
                ],
            )
            .map_err(|e| anyhow!("Failed to insert incident: {}", e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All incidents, most recent id first
    pub fn get_all(&self) -> Result<Vec<Incident>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM cyber_incidents ORDER BY id DESC",
            INCIDENT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], incident_from_row)
            .map_err(|e| anyhow!("Failed to list incidents: {}", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| anyhow!("Failed to read incident row: {}", e))
    }

    /// Look up a single incident
    pub fn get(&self, id: i64) -> Result<Option<Incident>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM cyber_incidents WHERE id = ?1",
                    INCIDENT_COLUMNS
                ),
                [id],
                incident_from_row,
            )
            .optional()
            .map_err(|e| anyhow!("Failed to get incident {}: {}", id, e))
    }

    /// Set the status of one incident; returns the number of rows changed
    pub fn update_status(&self, id: i64, new_status: &str) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE cyber_incidents SET status = ?1 WHERE id = ?2",
                params![new_status, id],
            )
            .map_err(|e| anyhow!("Failed to update incident {}: {}", id, e))
    }

    /// Delete one incident; returns the number of rows removed
    pub fn delete(&self, id: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM cyber_incidents WHERE id = ?1", [id])
            .map_err(|e| anyhow!("Failed to delete incident {}: {}", id, e))
    }

    pub fn count(&self) -> Result<u64> {
        crate::database::core::table_count(self.conn, INCIDENTS_TABLE)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    /// Number of incidents per type, largest first
    pub fn count_by_type(&self) -> Result<Vec<GroupCount>> {
        query_group_counts(
            self.conn,
            "SELECT incident_type, COUNT(*) AS count
             FROM cyber_incidents
             GROUP BY incident_type
             ORDER BY count DESC",
            [],
        )
    }

    /// Number of High severity incidents per status, largest first
    pub fn count_high_severity_by_status(&self) -> Result<Vec<GroupCount>> {
        query_group_counts(
            self.conn,
            "SELECT status, COUNT(*) AS count
             FROM cyber_incidents
             WHERE severity = 'High'
             GROUP BY status
             ORDER BY count DESC",
            [],
        )
    }

    /// Incident types with strictly more than `threshold` incidents
    pub fn types_with_min_count(&self, threshold: u64) -> Result<Vec<GroupCount>> {
        query_group_counts(
            self.conn,
            "SELECT incident_type, COUNT(*) AS count
             FROM cyber_incidents
             GROUP BY incident_type
             HAVING COUNT(*) > ?1
             ORDER BY count DESC",
            [threshold],
        )
    }

    /// Append the rows of an incident export to `table_name`
    ///
    /// A missing file is not an error: a warning is logged and 0 is returned.
    pub fn import_csv<P: AsRef<Path>>(&self, path: P, table_name: &str) -> Result<usize> {
        self.import_csv_with_reporter(path, table_name, DEFAULT_REPORTER)
    }

    /// Same as [`Self::import_csv`], with a custom reporter for exports that
    /// lack a `reported_by` column
    pub fn import_csv_with_reporter<P: AsRef<Path>>(
        &self,
        path: P,
        table_name: &str,
        default_reporter: &str,
    ) -> Result<usize> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "File not found: {}. No incidents to migrate.",
                path.display()
            );
            return Ok(0);
        }
        ensure_import_target(self.conn, table_name)?;

        info!("Loading incidents from {}...", path.display());
        let incidents = read_incident_csv(path, default_reporter)?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {}
                 (date, incident_type, severity, status, description, reported_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                table_name
            ))?;
            for incident in &incidents {
                stmt.execute(params![
                    incident.date,
                    incident.incident_type,
                    incident.severity,
                    incident.status,
                    incident.description,
                    incident.reported_by,
                ])
                .map_err(|e| anyhow!("Failed to insert imported incident: {}", e))?;
            }
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit transaction: {}", e))?;

        info!("Loaded {} rows into '{}'", incidents.len(), table_name);
        Ok(incidents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{DatabaseConn, SchemaManager};
    use std::io::Write;

    fn setup_test_db() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        SchemaManager::new(&db.conn).initialize().unwrap();
        db
    }

    fn seed(repo: &IncidentRepository<'_>, incident_type: &str, severity: &str, status: &str) {
        repo.insert(&NewIncident::new(
            "2024-11-05",
            incident_type,
            severity,
            status,
            "seeded",
            None,
        ))
        .unwrap();
    }

    #[test]
    fn test_insert_and_get_all() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        assert!(repo.is_empty().unwrap());

        let id = repo
            .insert(&NewIncident::new(
                "2024-11-05",
                "Phishing",
                "High",
                "Open",
                "Suspicious email detected",
                Some("kareena"),
            ))
            .unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].incident_type, "Phishing");
        assert_eq!(all[0].reported_by.as_deref(), Some("kareena"));
    }

    #[test]
    fn test_is_empty_propagates_store_errors() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        assert!(repo.is_empty().unwrap());

        db.execute("DROP TABLE cyber_incidents").unwrap();
        assert!(repo.is_empty().is_err());
    }

    #[test]
    fn test_ids_are_fresh_and_descending() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);

        seed(&repo, "Malware", "Low", "Open");
        let second = repo
            .insert(&NewIncident::new("2024-11-06", "DDoS", "High", "Open", "x", None))
            .unwrap();
        repo.delete(second).unwrap();

        // a deleted id is never reused
        let third = repo
            .insert(&NewIncident::new("2024-11-07", "DDoS", "High", "Open", "y", None))
            .unwrap();
        assert!(third > second);

        let ids: Vec<i64> = repo.get_all().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] > ids[1]);
    }

    #[test]
    fn test_update_status() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        seed(&repo, "Phishing", "High", "Open");
        let id = repo.get_all().unwrap()[0].id;

        assert_eq!(repo.update_status(id, "Resolved").unwrap(), 1);
        assert_eq!(repo.get(id).unwrap().unwrap().status, "Resolved");
    }

    #[test]
    fn test_update_and_delete_missing_id() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        seed(&repo, "Phishing", "High", "Open");
        let before = repo.get_all().unwrap();

        assert_eq!(repo.update_status(9999, "Resolved").unwrap(), 0);
        assert_eq!(repo.delete(9999).unwrap(), 0);
        assert_eq!(repo.get_all().unwrap(), before);
    }

    #[test]
    fn test_delete() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        seed(&repo, "Phishing", "High", "Open");
        seed(&repo, "Malware", "Low", "Open");
        let id = repo.get_all().unwrap()[0].id;

        assert_eq!(repo.delete(id).unwrap(), 1);
        let remaining = repo.get_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|i| i.id != id));
        assert_eq!(repo.get(id).unwrap(), None);
    }

    #[test]
    fn test_grouped_counts() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        for _ in 0..3 {
            seed(&repo, "Phishing", "High", "Open");
        }
        seed(&repo, "Phishing", "High", "Resolved");
        seed(&repo, "Malware", "High", "Resolved");
        seed(&repo, "Malware", "Low", "Open");
        seed(&repo, "DDoS", "Critical", "Open");

        let by_type = repo.count_by_type().unwrap();
        assert_eq!(by_type[0], GroupCount::new("Phishing", 4));
        assert_eq!(by_type[1], GroupCount::new("Malware", 2));
        let total: u64 = by_type.iter().map(|g| g.count).sum();
        assert_eq!(total, repo.count().unwrap());

        let high = repo.count_high_severity_by_status().unwrap();
        assert_eq!(
            high,
            vec![GroupCount::new("Open", 3), GroupCount::new("Resolved", 2)]
        );
    }

    #[test]
    fn test_types_with_min_count_is_strict() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        for _ in 0..6 {
            seed(&repo, "Phishing", "Low", "Open");
        }
        for _ in 0..5 {
            seed(&repo, "Malware", "Low", "Open");
        }
        seed(&repo, "DDoS", "Low", "Open");

        let many = repo.types_with_min_count(5).unwrap();
        assert_eq!(many, vec![GroupCount::new("Phishing", 6)]);
        assert!(many.iter().all(|g| g.count > 5));

        let any = repo.types_with_min_count(0).unwrap();
        assert_eq!(any.len(), 3);
    }

    #[test]
    fn test_import_missing_file() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);

        let count = repo
            .import_csv("/nonexistent/cyber_incidents.csv", INCIDENTS_TABLE)
            .unwrap();
        assert_eq!(count, 0);
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn test_import_csv() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "incident_id,timestamp,severity,category,status,description").unwrap();
        writeln!(file, "1,2024-01-03 09:12:00,High,Phishing,Open,Spoofed invoice").unwrap();
        writeln!(file, "2,2024-01-04 10:00:00,Medium,Malware,Resolved,Trojan").unwrap();
        file.flush().unwrap();

        let count = repo.import_csv(file.path(), INCIDENTS_TABLE).unwrap();
        assert_eq!(count, 2);

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .all(|i| i.reported_by.as_deref() == Some(DEFAULT_REPORTER)));
        assert!(all.iter().any(|i| i.incident_type == "Phishing"));
        assert!(all.iter().any(|i| i.date == "2024-01-04 10:00:00"));
    }

    #[test]
    fn test_import_rejects_bad_table() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,category,severity,status,description").unwrap();
        writeln!(file, "2024-01-03,Phishing,High,Open,x").unwrap();
        file.flush().unwrap();

        assert!(repo.import_csv(file.path(), "no_such_table").is_err());
        assert!(repo
            .import_csv(file.path(), "cyber_incidents; DROP TABLE it_tickets")
            .is_err());
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn test_import_rejects_short_row() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);

        // the second row misses the severity column value entirely
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,category,severity,status,description").unwrap();
        writeln!(file, "2024-01-03,Phishing,High,Open,x").unwrap();
        writeln!(file, "2024-01-04,Malware").unwrap();
        file.flush().unwrap();

        assert!(repo.import_csv(file.path(), INCIDENTS_TABLE).is_err());
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn test_import_rolls_back_failed_insert() {
        let db = setup_test_db();
        let repo = IncidentRepository::new(&db.conn);
        db.execute(
            "CREATE TABLE strict_incidents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                incident_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                status TEXT NOT NULL,
                description TEXT NOT NULL,
                reported_by TEXT NOT NULL
            )",
        )
        .unwrap();

        // parses fine; the NULL reporter of the third row fails inside the transaction
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "timestamp,category,severity,status,description,reported_by").unwrap();
        writeln!(file, "2024-01-03,Phishing,High,Open,x,alice").unwrap();
        writeln!(file, "2024-01-04,Malware,Low,Open,y,bob").unwrap();
        writeln!(file, "2024-01-05,DDoS,High,Open,z,").unwrap();
        file.flush().unwrap();

        assert!(repo.import_csv(file.path(), "strict_incidents").is_err());
        assert_eq!(db.table_count("strict_incidents").unwrap(), 0);
        assert!(repo.is_empty().unwrap());
    }
}
