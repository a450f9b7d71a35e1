//! CSV exports that can be imported into the secops database
//!
//! Each submodule maps one export layout onto the insertable record type of
//! its table. Inputs are read through `oneio`, so compressed exports work the
//! same as plain files.

pub mod incidents;
pub mod tickets;

pub use incidents::{parse_incident_csv, read_incident_csv, IncidentCsvRow, DEFAULT_REPORTER};
pub use tickets::{
    derive_resolved_date, derive_subject, parse_ticket_csv, read_ticket_csv, TicketCsvRow,
    IMPORTED_CATEGORY, NO_SUBJECT, RESOLVED_STATUS,
};
