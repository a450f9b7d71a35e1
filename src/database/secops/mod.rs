//! SecOps database storage
//!
//! The secops database stores two independent record sets in one SQLite file:
//! - security incidents (`cyber_incidents`)
//! - IT tickets (`it_tickets`)

mod incidents;
mod tickets;

pub use incidents::{Incident, IncidentRepository, NewIncident};
pub use tickets::{NewTicket, Ticket, TicketField, TicketRepository, TICKET_TIME_FORMAT};

use crate::database::core::{
    is_plain_identifier, table_exists, DatabaseConn, SchemaManager, SchemaStatus,
    INCIDENTS_TABLE, TICKETS_TABLE,
};
use anyhow::{anyhow, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the database inside the data directory
pub const DATABASE_FILE_NAME: &str = "secops-data.sqlite3";

/// One row of a grouped-count query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    /// Distinct value of the grouped column
    pub value: String,
    pub count: u64,
}

impl GroupCount {
    pub fn new(value: &str, count: u64) -> Self {
        Self {
            value: value.to_string(),
            count,
        }
    }
}

pub(crate) fn query_group_counts<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<GroupCount>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(GroupCount {
                value: group_label(row.get(0)?),
                count: row.get(1)?,
            })
        })
        .map_err(|e| anyhow!("Failed to run grouped count: {}", e))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| anyhow!("Failed to read grouped count: {}", e))
}

/// Grouped columns may hold NULL or non-text values
fn group_label(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

/// Import targets are spliced into the INSERT statement, so they must be
/// bare identifiers naming an existing table.
pub(crate) fn ensure_import_target(conn: &Connection, table_name: &str) -> Result<()> {
    if !is_plain_identifier(table_name) {
        return Err(anyhow!("Invalid table name '{}'", table_name));
    }
    if !table_exists(conn, table_name)? {
        return Err(anyhow!("Table '{}' does not exist", table_name));
    }
    Ok(())
}

/// Row counts and schema details of an open database
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseSummary {
    pub path: Option<String>,
    pub schema_version: u32,
    pub incident_count: u64,
    pub ticket_count: u64,
}

/// Main secops database (SQLite backend)
///
/// Owns the connection. Repositories borrow it, and it is closed when the
/// database value is dropped.
pub struct SecopsDatabase {
    db: DatabaseConn,
    path: Option<PathBuf>,
}

impl SecopsDatabase {
    /// Open the secops database at the specified path
    ///
    /// A fresh file is initialized and missing tables are recreated. A file
    /// written with a different schema version is refused, with its records
    /// left untouched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = DatabaseConn::open_path(path)?;
        ensure_schema(&db.conn)?;
        Ok(Self {
            db,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open the database from a data directory
    ///
    /// Uses the standard file path: `{data_dir}/secops-data.sqlite3`
    pub fn open_in_dir<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::open(data_dir.as_ref().join(DATABASE_FILE_NAME))
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let db = DatabaseConn::open_in_memory()?;
        SchemaManager::new(&db.conn).initialize()?;
        Ok(Self { db, path: None })
    }

    pub fn incidents(&self) -> IncidentRepository<'_> {
        IncidentRepository::new(&self.db.conn)
    }

    pub fn tickets(&self) -> TicketRepository<'_> {
        TicketRepository::new(&self.db.conn)
    }

    /// Get the underlying database connection (for ad-hoc queries)
    pub fn connection(&self) -> &Connection {
        &self.db.conn
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn summary(&self) -> Result<DatabaseSummary> {
        let schema = SchemaManager::new(&self.db.conn);
        Ok(DatabaseSummary {
            path: self.path.as_ref().map(|p| p.display().to_string()),
            schema_version: schema.get_schema_version()?,
            incident_count: self.db.table_count(INCIDENTS_TABLE)?,
            ticket_count: self.db.table_count(TICKETS_TABLE)?,
        })
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        SchemaManager::new(&self.db.conn).get_meta(key)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        SchemaManager::new(&self.db.conn).set_meta(key, value)
    }
}

/// Bring the schema up, never dropping stored records
///
/// Missing tables are recreated in place. A database written by another
/// schema version is refused rather than rebuilt.
fn ensure_schema(conn: &Connection) -> Result<()> {
    let schema = SchemaManager::new(conn);
    match schema.check_status()? {
        SchemaStatus::Current => {
            info!("SecOps database schema is current");
        }
        SchemaStatus::NotInitialized => {
            info!("Initializing secops database schema");
            schema.initialize()?;
        }
        SchemaStatus::Corrupted => {
            warn!("SecOps database is missing tables, recreating them");
            schema.initialize()?;
        }
        SchemaStatus::NeedsMigration { from, to } => {
            return Err(anyhow!(
                "SecOps database schema is v{}, this version requires v{}",
                from,
                to
            ));
        }
        SchemaStatus::Incompatible {
            database_version,
            required_version,
        } => {
            return Err(anyhow!(
                "SecOps database schema v{} is newer than supported v{}",
                database_version,
                required_version
            ));
        }
    }
    Ok(())
}

/// Ensure the data directory exists
pub fn ensure_data_dir<P: AsRef<Path>>(data_dir: P) -> Result<()> {
    let data_dir = data_dir.as_ref();
    std::fs::create_dir_all(data_dir).map_err(|e| {
        anyhow!(
            "Failed to create data directory '{}': {}",
            data_dir.display(),
            e
        )
    })
}
