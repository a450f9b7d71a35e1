//! Lens module
//!
//! Lenses sit between the repositories and an interface (the CLI today):
//! they run the reports and turn results into tables, PSV or JSON.
//!
//! - `incident`: incident listings and grouped-count reports
//! - `ticket`: ticket listings, reports, average resolution time
//! - `utils`: the shared `OutputFormat` and rendering helpers
//!
//! ```rust,ignore
//! use secops::database::SecopsDatabase;
//! use secops::lens::incident::{IncidentLens, IncidentReport};
//! use secops::lens::utils::OutputFormat;
//!
//! let db = SecopsDatabase::open_in_dir("~/.secops")?;
//! let lens = IncidentLens::new(&db);
//! let counts = lens.report(IncidentReport::ByType)?;
//! println!("{}", lens.format_report(IncidentReport::ByType, &counts, OutputFormat::Markdown));
//! ```

pub mod incident;
pub mod ticket;
pub mod utils;
