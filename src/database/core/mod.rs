//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with pragma configuration
//! - `SchemaManager`: schema initialization and version checks
//! - `SchemaStatus`: schema state enumeration

mod connection;
mod schema;

pub use connection::{is_plain_identifier, DatabaseConn};
pub(crate) use connection::{table_count, table_exists};
pub use schema::{
    SchemaDefinitions, SchemaManager, SchemaStatus, INCIDENTS_TABLE, SCHEMA_VERSION,
    TICKETS_TABLE,
};
