use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::database::DATABASE_FILE_NAME;
use crate::datasets::DEFAULT_REPORTER;

#[derive(Debug, Clone, Serialize)]
pub struct SecopsConfig {
    /// Path to the directory holding the secops database
    pub data_dir: String,

    /// Incident export loaded by the demo and `incident import` by default
    pub incidents_csv: String,

    /// Ticket export loaded by the demo and `ticket import` by default
    pub tickets_csv: String,

    /// Reporter recorded for incident exports without a `reported_by` column
    pub default_reporter: String,
}

const EMPTY_CONFIG: &str = r#"### secops configuration file

### directory holding secops-data.sqlite3
# data_dir = "~/.secops"

### default CSV exports (relative paths are resolved against the working directory)
# incidents_csv = "DATA/cyber_incidents.csv"
# tickets_csv = "DATA/it_tickets.csv"

### reporter used when an incident export has no reported_by column
# default_reporter = "system"
"#;

const DEFAULT_INCIDENTS_CSV: &str = "DATA/cyber_incidents.csv";
const DEFAULT_TICKETS_CSV: &str = "DATA/it_tickets.csv";

fn home_dir_string() -> String {
    dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl Default for SecopsConfig {
    fn default() -> Self {
        Self {
            data_dir: format!("{}/.secops", home_dir_string()),
            incidents_csv: DEFAULT_INCIDENTS_CSV.to_string(),
            tickets_csv: DEFAULT_TICKETS_CSV.to_string(),
            default_reporter: DEFAULT_REPORTER.to_string(),
        }
    }
}

impl SecopsConfig {
    /// Load the configuration
    ///
    /// Sources, later ones winning: the TOML file (`path`, or
    /// `$HOME/.secops/secops.toml`), then `SECOPS_*` environment variables.
    /// A missing file is created from a commented template.
    pub fn new(path: &Option<String>) -> Result<SecopsConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let secops_dir = format!("{}/.secops", home_dir_string());
                std::fs::create_dir_all(secops_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create secops directory: {}", e))?;
                let p = format!("{}/secops.toml", secops_dir);
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `SECOPS_DATA_DIR=/tmp/secops secops demo`
        builder = builder.add_source(config::Environment::with_prefix("SECOPS"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let values = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Ok(Self::from_values(&values))
    }

    fn from_values(values: &HashMap<String, String>) -> SecopsConfig {
        let defaults = SecopsConfig::default();
        let pick = |key: &str, default: String| {
            values
                .get(key)
                .map(|v| expand_home(v))
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        SecopsConfig {
            data_dir: pick("data_dir", defaults.data_dir),
            incidents_csv: pick("incidents_csv", defaults.incidents_csv),
            tickets_csv: pick("tickets_csv", defaults.tickets_csv),
            default_reporter: values
                .get("default_reporter")
                .cloned()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_reporter),
        }
    }

    /// Get the path to the SQLite database file
    pub fn sqlite_path(&self) -> PathBuf {
        Path::new(self.data_dir.trim_end_matches('/')).join(DATABASE_FILE_NAME)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.sqlite_path().display()),
            format!("Incidents CSV:      {}", self.incidents_csv),
            format!("Tickets CSV:        {}", self.tickets_csv),
            format!("Default Reporter:   {}", self.default_reporter),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        format!("{}/.secops/secops.toml", home_dir_string())
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(value: &str) -> String {
    match value.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home_dir_string(), rest),
        None if value == "~" => home_dir_string(),
        None => value.to_string(),
    }
}
