#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! SecOps - a SQLite store for security incidents and IT tickets
//!
//! SecOps keeps the records behind a security-operations dashboard: incidents
//! (`cyber_incidents`) and IT tickets (`it_tickets`). It provides single-row
//! CRUD, fixed grouped-count reports, and importers for CSV exports. It can be
//! used as a library or through the `secops` command-line driver.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Database, repositories, CSV import, config | `rusqlite`, `csv`, `oneio` |
//! | `display` | Table/JSON formatting lenses | `tabled` |
//! | `cli` | The `secops` binary | `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: SQLite connection, schema, and the incident/ticket repositories
//! - **[`datasets`]**: CSV export layouts and the column derivations applied on import
//! - **[`lens`]**: report helpers and output formatting (requires `display`)
//! - **[`config`]**: configuration file and environment handling
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use secops::database::{NewIncident, SecopsDatabase, TicketField, INCIDENTS_TABLE};
//!
//! let db = SecopsDatabase::open_in_dir("/var/lib/secops")?;
//!
//! let id = db.incidents().insert(&NewIncident::new(
//!     "2024-11-05", "Phishing", "High", "Open", "Suspicious email detected", Some("kareena"),
//! ))?;
//! db.incidents().update_status(id, "Resolved")?;
//!
//! let loaded = db.incidents().import_csv("DATA/cyber_incidents.csv", INCIDENTS_TABLE)?;
//! for group in db.incidents().count_by_type()? {
//!     println!("{}: {}", group.value, group.count);
//! }
//!
//! db.tickets().update_field(7, TicketField::AssignedTo, "it-ops")?;
//! if let Some(hours) = db.tickets().average_resolution_hours()? {
//!     println!("average resolution: {:.1}h", hours);
//! }
//! ```

pub mod config;
pub mod database;
pub mod datasets;

#[cfg(feature = "display")]
pub mod lens;

pub use config::SecopsConfig;

pub use database::{
    DatabaseConn, GroupCount, Incident, IncidentRepository, NewIncident, NewTicket,
    SchemaManager, SchemaStatus, SecopsDatabase, Ticket, TicketField, TicketRepository,
    INCIDENTS_TABLE, SCHEMA_VERSION, TICKETS_TABLE,
};

#[cfg(feature = "display")]
pub use lens::utils::OutputFormat;
