//! IT ticket repository
//!
//! Data access for the `it_tickets` table. Field updates go through the
//! closed [`TicketField`] set, so every statement sent to SQLite is a fixed,
//! parameterized string.

use super::{ensure_import_target, query_group_counts, GroupCount};
use crate::database::core::TICKETS_TABLE;
use crate::datasets::read_ticket_csv;
use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Text layout of `created_date` and `resolved_date`
pub const TICKET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TICKET_COLUMNS: &str = "id, ticket_id, priority, status, category, subject, \
     description, created_date, resolved_date, assigned_to";

/// A stored IT ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    /// External reference; not unique
    pub ticket_id: String,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub subject: String,
    pub description: Option<String>,
    pub created_date: Option<String>,
    /// Null until the ticket is resolved
    pub resolved_date: Option<String>,
    pub assigned_to: Option<String>,
}

/// A ticket that has not been stored yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub ticket_id: String,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub subject: String,
    pub description: Option<String>,
    pub created_date: Option<String>,
    pub resolved_date: Option<String>,
    pub assigned_to: Option<String>,
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        priority: row.get(2)?,
        status: row.get(3)?,
        category: row.get(4)?,
        subject: row.get(5)?,
        description: row.get(6)?,
        created_date: row.get(7)?,
        resolved_date: row.get(8)?,
        assigned_to: row.get(9)?,
    })
}

/// Ticket columns that can be changed after insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketField {
    TicketId,
    Priority,
    Status,
    Category,
    Subject,
    Description,
    CreatedDate,
    ResolvedDate,
    AssignedTo,
}

impl TicketField {
    pub fn all() -> &'static [TicketField] {
        &[
            TicketField::TicketId,
            TicketField::Priority,
            TicketField::Status,
            TicketField::Category,
            TicketField::Subject,
            TicketField::Description,
            TicketField::CreatedDate,
            TicketField::ResolvedDate,
            TicketField::AssignedTo,
        ]
    }

    /// Column name in `it_tickets`
    pub fn column(&self) -> &'static str {
        match self {
            TicketField::TicketId => "ticket_id",
            TicketField::Priority => "priority",
            TicketField::Status => "status",
            TicketField::Category => "category",
            TicketField::Subject => "subject",
            TicketField::Description => "description",
            TicketField::CreatedDate => "created_date",
            TicketField::ResolvedDate => "resolved_date",
            TicketField::AssignedTo => "assigned_to",
        }
    }

    fn update_sql(&self) -> &'static str {
        match self {
            TicketField::TicketId => "UPDATE it_tickets SET ticket_id = ?1 WHERE id = ?2",
            TicketField::Priority => "UPDATE it_tickets SET priority = ?1 WHERE id = ?2",
            TicketField::Status => "UPDATE it_tickets SET status = ?1 WHERE id = ?2",
            TicketField::Category => "UPDATE it_tickets SET category = ?1 WHERE id = ?2",
            TicketField::Subject => "UPDATE it_tickets SET subject = ?1 WHERE id = ?2",
            TicketField::Description => "UPDATE it_tickets SET description = ?1 WHERE id = ?2",
            TicketField::CreatedDate => "UPDATE it_tickets SET created_date = ?1 WHERE id = ?2",
            TicketField::ResolvedDate => "UPDATE it_tickets SET resolved_date = ?1 WHERE id = ?2",
            TicketField::AssignedTo => "UPDATE it_tickets SET assigned_to = ?1 WHERE id = ?2",
        }
    }
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for TicketField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TicketField::all()
            .iter()
            .copied()
            .find(|field| field.column() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = TicketField::all().iter().map(|f| f.column()).collect();
                format!(
                    "Unknown ticket field '{}'. Valid fields: {}",
                    s,
                    names.join(", ")
                )
            })
    }
}

/// Repository for IT ticket operations
pub struct TicketRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TicketRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert one ticket and return its newly assigned id
    pub fn insert(&self, ticket: &NewTicket) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO it_tickets
                 (ticket_id, priority, status, category, subject,
                  description, created_date, resolved_date, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    ticket.ticket_id,
                    ticket.priority,
                    ticket.status,
                    ticket.category,
                    ticket.subject,
                    ticket.description,
                    ticket.created_date,
                    ticket.resolved_date,
                    ticket.assigned_to,
                ],
            )
            .map_err(|e| anyhow!("Failed to insert ticket: {}", e))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All tickets, most recent id first
    pub fn get_all(&self) -> Result<Vec<Ticket>> {
        self.query_tickets(
            &format!("SELECT {} FROM it_tickets ORDER BY id DESC", TICKET_COLUMNS),
            "list tickets",
        )
    }

    pub fn get(&self, id: i64) -> Result<Option<Ticket>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM it_tickets WHERE id = ?1", TICKET_COLUMNS),
                [id],
                ticket_from_row,
            )
            .optional()
            .map_err(|e| anyhow!("Failed to get ticket {}: {}", id, e))
    }

    /// Set one field of one ticket; returns the number of rows changed
    pub fn update_field(&self, id: i64, field: TicketField, new_value: &str) -> Result<usize> {
        self.conn
            .execute(field.update_sql(), params![new_value, id])
            .map_err(|e| anyhow!("Failed to update {} of ticket {}: {}", field, id, e))
    }

    /// Mark a ticket resolved at `at`, keeping status and resolved date in step
    pub fn mark_resolved(&self, id: i64, at: NaiveDateTime) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE it_tickets SET status = 'Resolved', resolved_date = ?1 WHERE id = ?2",
                params![at.format(TICKET_TIME_FORMAT).to_string(), id],
            )
            .map_err(|e| anyhow!("Failed to resolve ticket {}: {}", id, e))
    }

    /// Delete one ticket; returns the number of rows removed
    pub fn delete(&self, id: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM it_tickets WHERE id = ?1", [id])
            .map_err(|e| anyhow!("Failed to delete ticket {}: {}", id, e))
    }

    pub fn count(&self) -> Result<u64> {
        crate::database::core::table_count(self.conn, TICKETS_TABLE)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    pub fn count_by_priority(&self) -> Result<Vec<GroupCount>> {
        query_group_counts(
            self.conn,
            "SELECT priority, COUNT(*) AS count
             FROM it_tickets
             GROUP BY priority
             ORDER BY count DESC",
            [],
        )
    }

    pub fn count_by_status(&self) -> Result<Vec<GroupCount>> {
        query_group_counts(
            self.conn,
            "SELECT status, COUNT(*) AS count
             FROM it_tickets
             GROUP BY status
             ORDER BY count DESC",
            [],
        )
    }

    /// Tickets whose status is anything but Resolved, newest first
    pub fn unresolved(&self) -> Result<Vec<Ticket>> {
        self.query_tickets(
            &format!(
                "SELECT {} FROM it_tickets
                 WHERE status != 'Resolved'
                 ORDER BY created_date DESC",
                TICKET_COLUMNS
            ),
            "list unresolved tickets",
        )
    }

    /// Mean hours between creation and resolution over resolved tickets
    ///
    /// Returns `None` when no ticket has a resolved date. Rows whose resolved
    /// date precedes the creation date are averaged in as negative durations
    /// and reported with a warning.
    pub fn average_resolution_hours(&self) -> Result<Option<f64>> {
        let negative: u64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM it_tickets
                 WHERE resolved_date IS NOT NULL
                   AND JULIANDAY(resolved_date) < JULIANDAY(created_date)",
                [],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check resolution durations: {}", e))?;
        if negative > 0 {
            warn!(
                "{} resolved tickets have a resolved date before their created date",
                negative
            );
        }

        self.conn
            .query_row(
                "SELECT AVG((JULIANDAY(resolved_date) - JULIANDAY(created_date)) * 24)
                 FROM it_tickets
                 WHERE resolved_date IS NOT NULL",
                [],
                |row| row.get::<_, Option<f64>>(0),
            )
            .map_err(|e| anyhow!("Failed to compute average resolution time: {}", e))
    }

    /// Append the rows of a ticket export to `table_name`
    ///
    /// A missing file is not an error: a warning is logged and 0 is returned.
    pub fn import_csv<P: AsRef<Path>>(&self, path: P, table_name: &str) -> Result<usize> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("File not found: {}. No tickets to migrate.", path.display());
            return Ok(0);
        }
        ensure_import_target(self.conn, table_name)?;

        info!("Loading IT tickets from {}...", path.display());
        let tickets = read_ticket_csv(path)?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {}
                 (ticket_id, priority, status, category, subject,
                  description, created_date, resolved_date, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                table_name
            ))?;
            for ticket in &tickets {
                stmt.execute(params![
                    ticket.ticket_id,
                    ticket.priority,
                    ticket.status,
                    ticket.category,
                    ticket.subject,
                    ticket.description,
                    ticket.created_date,
                    ticket.resolved_date,
                    ticket.assigned_to,
                ])
                .map_err(|e| anyhow!("Failed to insert imported ticket: {}", e))?;
            }
        }
        tx.commit()
            .map_err(|e| anyhow!("Failed to commit transaction: {}", e))?;

        info!("Loaded {} IT tickets into '{}'", tickets.len(), table_name);
        Ok(tickets.len())
    }

    fn query_tickets(&self, sql: &str, what: &str) -> Result<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], ticket_from_row)
            .map_err(|e| anyhow!("Failed to {}: {}", what, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| anyhow!("Failed to read ticket row: {}", e))
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

    fn ticket(ticket_id: &str, priority: &str, status: &str, created: &str) -> NewTicket {
        NewTicket {
            ticket_id: ticket_id.to_string(),
            priority: priority.to_string(),
            status: status.to_string(),
            category: "Network".to_string(),
            subject: "VPN drops".to_string(),
            description: Some("VPN drops every hour".to_string()),
            created_date: Some(created.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_get_all() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);

        let id = repo
            .insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();
        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].ticket_id, "T-1");
        assert_eq!(all[0].resolved_date, None);
    }

    #[test]
    fn test_duplicate_external_ids_allowed() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);

        let a = repo
            .insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();
        let b = repo
            .insert(&ticket("T-1", "Low", "Open", "2024-01-02 00:00:00"))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_update_field() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        let id = repo
            .insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();

        assert_eq!(
            repo.update_field(id, TicketField::AssignedTo, "alice")
                .unwrap(),
            1
        );
        assert_eq!(
            repo.update_field(id, TicketField::Priority, "Low").unwrap(),
            1
        );
        let stored = repo.get(id).unwrap().unwrap();
        assert_eq!(stored.assigned_to.as_deref(), Some("alice"));
        assert_eq!(stored.priority, "Low");
    }

    #[test]
    fn test_update_and_delete_missing_id() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        repo.insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();
        let before = repo.get_all().unwrap();

        assert_eq!(
            repo.update_field(4242, TicketField::Status, "Resolved")
                .unwrap(),
            0
        );
        assert_eq!(repo.delete(4242).unwrap(), 0);
        assert_eq!(repo.get_all().unwrap(), before);
    }

    #[test]
    fn test_delete() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        let id = repo
            .insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();

        assert_eq!(repo.delete(id).unwrap(), 1);
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(
            TicketField::from_str("assigned_to").unwrap(),
            TicketField::AssignedTo
        );
        assert_eq!(
            TicketField::from_str("Resolved-Date").unwrap(),
            TicketField::ResolvedDate
        );
        assert!(TicketField::from_str("id").is_err());
        assert!(TicketField::from_str("status = 'x', priority").is_err());

        for field in TicketField::all() {
            assert_eq!(TicketField::from_str(&field.to_string()).unwrap(), *field);
        }
    }

    #[test]
    fn test_grouped_counts() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        repo.insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();
        repo.insert(&ticket("T-2", "High", "Resolved", "2024-01-02 00:00:00"))
            .unwrap();
        repo.insert(&ticket("T-3", "Low", "Open", "2024-01-03 00:00:00"))
            .unwrap();

        let by_priority = repo.count_by_priority().unwrap();
        assert_eq!(by_priority[0], GroupCount::new("High", 2));
        assert_eq!(by_priority.iter().map(|g| g.count).sum::<u64>(), 3);

        let by_status = repo.count_by_status().unwrap();
        assert_eq!(by_status[0], GroupCount::new("Open", 2));
        assert_eq!(by_status.iter().map(|g| g.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_unresolved() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        repo.insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();
        repo.insert(&ticket("T-2", "High", "Resolved", "2024-01-05 00:00:00"))
            .unwrap();
        repo.insert(&ticket("T-3", "Low", "In Progress", "2024-01-03 00:00:00"))
            .unwrap();

        let open: Vec<String> = repo
            .unresolved()
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        assert_eq!(open, vec!["T-3".to_string(), "T-1".to_string()]);
    }

    #[test]
    fn test_average_resolution_hours() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        assert_eq!(repo.average_resolution_hours().unwrap(), None);

        let mut resolved = ticket("T-1", "High", "Resolved", "2024-01-01 00:00:00");
        resolved.resolved_date = Some("2024-01-01 02:00:00".to_string());
        repo.insert(&resolved).unwrap();
        repo.insert(&ticket("T-2", "Low", "Open", "2024-01-01 00:00:00"))
            .unwrap();

        let avg = repo.average_resolution_hours().unwrap().unwrap();
        assert!((avg - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_mark_resolved() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        let id = repo
            .insert(&ticket("T-1", "High", "Open", "2024-01-01 00:00:00"))
            .unwrap();

        let at = NaiveDateTime::parse_from_str("2024-01-01 06:00:00", TICKET_TIME_FORMAT)
            .unwrap();
        assert_eq!(repo.mark_resolved(id, at).unwrap(), 1);

        let stored = repo.get(id).unwrap().unwrap();
        assert_eq!(stored.status, "Resolved");
        assert_eq!(stored.resolved_date.as_deref(), Some("2024-01-01 06:00:00"));
        assert!(repo.unresolved().unwrap().is_empty());

        let avg = repo.average_resolution_hours().unwrap().unwrap();
        assert!((avg - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_import_missing_file() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        assert_eq!(
            repo.import_csv("/nonexistent/it_tickets.csv", TICKETS_TABLE)
                .unwrap(),
            0
        );
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn test_import_csv() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "ticket_id,priority,status,description,created_at,resolution_time_hours,assigned_to"
        )
        .unwrap();
        writeln!(
            file,
            "T-100,High,Resolved,VPN drops every hour,2024-01-01 00:00:00,5,it-ops"
        )
        .unwrap();
        writeln!(file, "T-101,Low,Open,Printer jam,2024-01-02 08:00:00,,").unwrap();
        file.flush().unwrap();

        assert_eq!(repo.import_csv(file.path(), TICKETS_TABLE).unwrap(), 2);

        let all = repo.get_all().unwrap();
        let resolved = all.iter().find(|t| t.ticket_id == "T-100").unwrap();
        assert_eq!(resolved.category, "General");
        assert_eq!(resolved.subject, "VPN drops");
        assert_eq!(
            resolved.resolved_date.as_deref(),
            Some("2024-01-01 05:00:00")
        );
        let open = all.iter().find(|t| t.ticket_id == "T-101").unwrap();
        assert_eq!(open.resolved_date, None);

        let avg = repo.average_resolution_hours().unwrap().unwrap();
        assert!((avg - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_import_rejects_bad_resolved_row() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "ticket_id,priority,status,description,created_at,resolution_time_hours,assigned_to"
        )
        .unwrap();
        writeln!(file, "T-1,Low,Open,ok,2024-01-02 08:00:00,,").unwrap();
        writeln!(file, "T-2,Low,Resolved,bad,not a date,3,").unwrap();
        file.flush().unwrap();

        assert!(repo.import_csv(file.path(), TICKETS_TABLE).is_err());
        assert!(repo.is_empty().unwrap());
    }

    #[test]
    fn test_import_rolls_back_failed_insert() {
        let db = setup_test_db();
        let repo = TicketRepository::new(&db.conn);
        db.execute(
            "CREATE TABLE strict_tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                category TEXT NOT NULL,
                subject TEXT NOT NULL,
                description TEXT,
                created_date TEXT,
                resolved_date TEXT,
                assigned_to TEXT NOT NULL
            )",
        )
        .unwrap();

        // every row parses; the unassigned second row fails inside the transaction
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "ticket_id,priority,status,description,created_at,resolution_time_hours,assigned_to"
        )
        .unwrap();
        writeln!(file, "T-1,High,Resolved,VPN down,2024-01-01 00:00:00,5,it-ops").unwrap();
        writeln!(file, "T-2,Low,Open,Printer jam,2024-01-02 08:00:00,,").unwrap();
        file.flush().unwrap();

        assert!(repo.import_csv(file.path(), "strict_tickets").is_err());
        assert_eq!(db.table_count("strict_tickets").unwrap(), 0);
        assert!(repo.is_empty().unwrap());
    }
}
