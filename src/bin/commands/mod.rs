pub mod config;
pub mod demo;
pub mod incident;
pub mod status;
pub mod ticket;

use anyhow::Result;
use secops::database::{ensure_data_dir, SecopsDatabase};
use secops::SecopsConfig;
use tracing::debug;

/// Open the configured database, creating the data directory if needed
pub(crate) fn open_database(config: &SecopsConfig) -> Result<SecopsDatabase> {
    ensure_data_dir(&config.data_dir)?;
    let path = config.sqlite_path();
    debug!("opening database at {}", path.display());
    SecopsDatabase::open(&path)
}
