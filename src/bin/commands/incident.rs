use super::open_database;
use anyhow::Result;
use clap::{Args, Subcommand};
use secops::database::{NewIncident, INCIDENTS_TABLE};
use secops::lens::incident::{IncidentLens, IncidentReport};
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;
use std::path::PathBuf;

/// Arguments for the Incident command
#[derive(Args)]
pub struct IncidentArgs {
    #[clap(subcommand)]
    pub command: IncidentCommands,
}

#[derive(Subcommand)]
pub enum IncidentCommands {
    /// Record a new incident
    Add {
        /// Incident date, e.g. 2024-11-05
        #[clap(long)]
        date: String,

        /// Incident type, e.g. Phishing
        #[clap(long = "type")]
        incident_type: String,

        /// Severity: Low, Medium, High or Critical
        #[clap(long)]
        severity: String,

        #[clap(long, default_value = "Open")]
        status: String,

        #[clap(long)]
        description: String,

        #[clap(long)]
        reported_by: Option<String>,
    },

    /// List all incidents, most recent first
    List {
        /// Do not truncate descriptions
        #[clap(long)]
        full: bool,
    },

    /// Change the status of an incident
    SetStatus { id: i64, status: String },

    /// Delete an incident
    Delete { id: i64 },

    /// Count incidents per type
    ByType,

    /// Count High severity incidents per status
    HighSeverity,

    /// Incident types with more than THRESHOLD incidents
    TypesOver {
        #[clap(default_value_t = 5)]
        threshold: u64,
    },

    /// Import an incident CSV export
    Import {
        /// CSV file, plain or compressed; defaults to the configured incidents_csv
        path: Option<PathBuf>,

        /// Target table
        #[clap(long, default_value = INCIDENTS_TABLE)]
        table: String,

        /// Reporter for exports without a reported_by column
        #[clap(long)]
        reporter: Option<String>,
    },
}

pub fn run(
    config: &SecopsConfig,
    args: IncidentArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let db = open_database(config)?;
    let repo = db.incidents();
    let lens = IncidentLens::new(&db);

    match args.command {
        IncidentCommands::Add {
            date,
            incident_type,
            severity,
            status,
            description,
            reported_by,
        } => {
            let incident = NewIncident {
                date,
                incident_type,
                severity,
                status,
                description,
                reported_by,
            };
            let id = repo.insert(&incident)?;
            println!("Created incident #{}", id);
        }
        IncidentCommands::List { full } => {
            let incidents = repo.get_all()?;
            if incidents.is_empty() && !output_format.is_json() {
                println!("No incidents recorded");
            } else {
                println!("{}", lens.format_incidents(&incidents, output_format, !full));
            }
        }
        IncidentCommands::SetStatus { id, status } => match repo.update_status(id, &status)? {
            0 => println!("No incident with id {}", id),
            _ => println!("Incident #{} status set to {}", id, status),
        },
        IncidentCommands::Delete { id } => match repo.delete(id)? {
            0 => println!("No incident with id {}", id),
            _ => println!("Incident #{} deleted", id),
        },
        IncidentCommands::ByType => print_report(&lens, IncidentReport::ByType, output_format)?,
        IncidentCommands::HighSeverity => {
            print_report(&lens, IncidentReport::HighSeverityByStatus, output_format)?
        }
        IncidentCommands::TypesOver { threshold } => {
            print_report(&lens, IncidentReport::TypesOver(threshold), output_format)?
        }
        IncidentCommands::Import {
            path,
            table,
            reporter,
        } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.incidents_csv));
            if !path.exists() {
                println!("File not found: {}", path.display());
                println!("   No incidents to migrate.");
                return Ok(());
            }
            let reporter = reporter.unwrap_or_else(|| config.default_reporter.clone());
            let count = repo.import_csv_with_reporter(&path, &table, &reporter)?;
            println!("Loaded {} rows into '{}'.", count, table);
        }
    }
    Ok(())
}

pub(crate) fn print_report(
    lens: &IncidentLens<'_>,
    report: IncidentReport,
    output_format: OutputFormat,
) -> Result<()> {
    let counts = lens.report(report)?;
    println!("{}", lens.format_report(report, &counts, output_format));
    Ok(())
}
