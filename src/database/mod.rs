//! Database module
//!
//! This module provides all database functionality for secops, organized into:
//!
//! - **core**: Core database infrastructure (SQLite connection, schema management)
//! - **secops**: The incident and ticket repositories and the owning database type
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # Table definitions, versioning
//! │
//! └── secops/         # Persistent storage
//!     ├── incidents   # cyber_incidents CRUD, grouped counts, CSV import
//!     └── tickets     # it_tickets CRUD, grouped counts, CSV import
//! ```
//!
//! # Connection lifetime
//!
//! Repositories borrow a `rusqlite::Connection` and never close it.
//! [`SecopsDatabase`] owns the connection and closes it on drop, so the
//! handle is released on every exit path, errors included.
//!
//! ```rust,ignore
//! use secops::database::{NewIncident, SecopsDatabase};
//!
//! let db = SecopsDatabase::open_in_dir("~/.secops")?;
//! let id = db.incidents().insert(&NewIncident::new(
//!     "2024-11-05", "Phishing", "High", "Open", "Suspicious email detected", Some("kareena"),
//! ))?;
//! db.incidents().update_status(id, "Resolved")?;
//! ```

pub mod core;
pub mod secops;

pub use core::{
    is_plain_identifier, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus,
    INCIDENTS_TABLE, SCHEMA_VERSION, TICKETS_TABLE,
};

pub use secops::{
    ensure_data_dir, DatabaseSummary, GroupCount, Incident, IncidentRepository, NewIncident,
    NewTicket, SecopsDatabase, Ticket, TicketField, TicketRepository, DATABASE_FILE_NAME,
    TICKET_TIME_FORMAT,
};
