use super::open_database;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Args, Subcommand};
use secops::database::{NewTicket, TICKETS_TABLE, TICKET_TIME_FORMAT};
use secops::lens::ticket::{TicketLens, TicketReport};
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;
use std::path::PathBuf;

/// Arguments for the Ticket command
#[derive(Args)]
pub struct TicketArgs {
    #[clap(subcommand)]
    pub command: TicketCommands,
}

#[derive(Subcommand)]
pub enum TicketCommands {
    /// Open a new ticket
    Add {
        /// External ticket reference, e.g. INC-2041
        #[clap(long)]
        ticket_id: String,

        #[clap(long)]
        priority: String,

        #[clap(long, default_value = "Open")]
        status: String,

        #[clap(long, default_value = "General")]
        category: String,

        #[clap(long)]
        subject: String,

        #[clap(long)]
        description: Option<String>,

        /// Creation time (YYYY-MM-DD HH:MM:SS), defaults to now
        #[clap(long)]
        created: Option<String>,

        #[clap(long)]
        assigned_to: Option<String>,
    },

    /// List all tickets, most recent first
    List {
        /// Do not truncate subjects
        #[clap(long)]
        full: bool,
    },

    /// Set one field of a ticket
    Set {
        id: i64,

        /// One of: ticket_id, priority, status, category, subject, description,
        /// created_date, resolved_date, assigned_to
        field: String,

        value: String,
    },

    /// Mark a ticket resolved
    Resolve {
        id: i64,

        /// Resolution time (YYYY-MM-DD HH:MM:SS), defaults to now
        #[clap(long)]
        at: Option<String>,
    },

    /// Delete a ticket
    Delete { id: i64 },

    /// Count tickets per priority
    ByPriority,

    /// Count tickets per status
    ByStatus,

    /// List tickets that are not resolved, newest first
    Unresolved {
        #[clap(long)]
        full: bool,
    },

    /// Average hours from creation to resolution
    AvgResolution,

    /// Import a ticket CSV export
    Import {
        /// CSV file, plain or compressed; defaults to the configured tickets_csv
        path: Option<PathBuf>,

        /// Target table
        #[clap(long, default_value = TICKETS_TABLE)]
        table: String,
    },
}

fn now_string() -> String {
    Local::now().naive_local().format(TICKET_TIME_FORMAT).to_string()
}

fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TICKET_TIME_FORMAT).map_err(|e| {
        anyhow!(
            "Invalid time '{}', expected YYYY-MM-DD HH:MM:SS: {}",
            value,
            e
        )
    })
}

pub fn run(
    config: &SecopsConfig,
    args: TicketArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let db = open_database(config)?;
    let repo = db.tickets();
    let lens = TicketLens::new(&db);

    match args.command {
        TicketCommands::Add {
            ticket_id,
            priority,
            status,
            category,
            subject,
            description,
            created,
            assigned_to,
        } => {
            let created_date = match created {
                Some(c) => parse_time(&c)?.format(TICKET_TIME_FORMAT).to_string(),
                None => now_string(),
            };
            let ticket = NewTicket {
                ticket_id,
                priority,
                status,
                category,
                subject,
                description,
                created_date: Some(created_date),
                resolved_date: None,
                assigned_to,
            };
            let id = repo.insert(&ticket)?;
            println!("Created ticket #{}", id);
        }
        TicketCommands::List { full } => {
            let tickets = repo.get_all()?;
            println!("{}", lens.format_tickets(&tickets, output_format, !full));
        }
        TicketCommands::Set { id, field, value } => {
            match lens.update_field_by_name(id, &field, &value)? {
                0 => println!("No ticket with id {}", id),
                _ => println!("Ticket #{} {} set to {}", id, field, value),
            }
        }
        TicketCommands::Resolve { id, at } => {
            let at = match at {
                Some(a) => parse_time(&a)?,
                None => Local::now().naive_local(),
            };
            match repo.mark_resolved(id, at)? {
                0 => println!("No ticket with id {}", id),
                _ => println!(
                    "Ticket #{} resolved at {}",
                    id,
                    at.format(TICKET_TIME_FORMAT)
                ),
            }
        }
        TicketCommands::Delete { id } => match repo.delete(id)? {
            0 => println!("No ticket with id {}", id),
            _ => println!("Ticket #{} deleted", id),
        },
        TicketCommands::ByPriority => {
            print_report(&lens, TicketReport::ByPriority, output_format)?
        }
        TicketCommands::ByStatus => print_report(&lens, TicketReport::ByStatus, output_format)?,
        TicketCommands::Unresolved { full } => {
            let tickets = repo.unresolved()?;
            println!("{}", lens.format_tickets(&tickets, output_format, !full));
        }
        TicketCommands::AvgResolution => {
            let hours = repo.average_resolution_hours()?;
            println!("{}", lens.format_average(hours, output_format));
        }
        TicketCommands::Import { path, table } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.tickets_csv));
            if !path.exists() {
                println!("File not found: {}", path.display());
                return Ok(());
            }
            let count = repo.import_csv(&path, &table)?;
            println!("Loaded {} IT tickets into '{}'.", count, table);
        }
    }
    Ok(())
}

pub(crate) fn print_report(
    lens: &TicketLens<'_>,
    report: TicketReport,
    output_format: OutputFormat,
) -> Result<()> {
    let counts = lens.report(report)?;
    println!("{}", lens.format_report(report, &counts, output_format));
    Ok(())
}
