use super::open_database;
use super::{incident, ticket};
use anyhow::Result;
use chrono::{Duration, Local};
use clap::Args;
use secops::database::{
    NewIncident, NewTicket, TicketField, INCIDENTS_TABLE, TICKETS_TABLE, TICKET_TIME_FORMAT,
};
use secops::lens::incident::{IncidentLens, IncidentReport};
use secops::lens::ticket::{TicketLens, TicketReport};
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;
use std::path::Path;

/// Arguments for the Demo command
#[derive(Args)]
pub struct DemoArgs {
    /// Threshold for the "types with many cases" report
    #[clap(long, default_value_t = 5)]
    pub min_count: u64,

    /// Skip the CSV migration steps
    #[clap(long)]
    pub skip_import: bool,
}

pub fn run(config: &SecopsConfig, args: DemoArgs, output_format: OutputFormat) -> Result<()> {
    let DemoArgs {
        min_count,
        skip_import,
    } = args;

    println!("{}", "=".repeat(60));
    println!("SecOps Database Demo");
    println!("{}", "=".repeat(60));

    // 1. setup
    let db = open_database(config)?;
    println!("Database ready: {}", config.sqlite_path().display());

    let incidents = db.incidents();
    let incident_lens = IncidentLens::new(&db);

    // 2. create and query
    let incident_id = incidents.insert(&NewIncident::new(
        "2024-11-05",
        "Phishing",
        "High",
        "Open",
        "Suspicious email detected",
        Some("kareena"),
    ))?;
    println!("Created incident #{}", incident_id);
    println!("Total incidents: {}", incidents.get_all()?.len());

    // 3. migrate the incident export
    if !skip_import {
        let path = Path::new(&config.incidents_csv);
        if path.exists() {
            let count = incidents.import_csv_with_reporter(
                path,
                INCIDENTS_TABLE,
                &config.default_reporter,
            )?;
            println!("Loaded {} rows into '{}'.", count, INCIDENTS_TABLE);
        } else {
            println!("File not found: {}", path.display());
            println!("   No incidents to migrate.");
        }
        println!("Total incidents: {}", incidents.get_all()?.len());
    }

    for report in [
        IncidentReport::ByType,
        IncidentReport::HighSeverityByStatus,
        IncidentReport::TypesOver(min_count),
    ] {
        println!("\n {}:", report.title());
        incident::print_report(&incident_lens, report, output_format)?;
    }

    // 4. incident CRUD round trip
    println!("\n[TEST 2] CRUD Operations");
    let test_id = incidents.insert(&NewIncident::new(
        "2024-11-05",
        "Test Incident",
        "Low",
        "Open",
        "This is a test incident",
        Some("test_user"),
    ))?;
    println!("  Create: Incident #{} created", test_id);
    let updated = incidents.update_status(test_id, "Resolved")?;
    println!("  Update: Status updated ({} row)", updated);
    let deleted = incidents.delete(test_id)?;
    println!("  Delete: Incident deleted ({} row)", deleted);

    // 5. tickets
    println!("\n[TEST 3] IT Tickets");
    let tickets = db.tickets();
    let ticket_lens = TicketLens::new(&db);

    if !skip_import {
        let path = Path::new(&config.tickets_csv);
        if path.exists() {
            let count = tickets.import_csv(path, TICKETS_TABLE)?;
            println!("Loaded {} IT tickets into '{}'.", count, TICKETS_TABLE);
        } else {
            println!("File not found: {}", path.display());
        }
    }

    let created = Local::now().naive_local() - Duration::hours(3);
    let ticket_id = tickets.insert(&NewTicket {
        ticket_id: "DEMO-1".to_string(),
        priority: "High".to_string(),
        status: "Open".to_string(),
        category: "Network".to_string(),
        subject: "VPN drops".to_string(),
        description: Some("VPN drops every few minutes".to_string()),
        created_date: Some(created.format(TICKET_TIME_FORMAT).to_string()),
        resolved_date: None,
        assigned_to: None,
    })?;
    println!("  Create: Ticket #{} created", ticket_id);
    tickets.update_field(ticket_id, TicketField::AssignedTo, "it-ops")?;
    println!("  Update: Ticket assigned to it-ops");
    tickets.mark_resolved(ticket_id, Local::now().naive_local())?;
    println!("  Update: Ticket resolved");

    for report in [TicketReport::ByPriority, TicketReport::ByStatus] {
        println!("\n {}:", report.title());
        ticket::print_report(&ticket_lens, report, output_format)?;
    }
    println!("\n Unresolved tickets: {}", tickets.unresolved()?.len());
    println!(
        " {}",
        ticket_lens.format_average(tickets.average_resolution_hours()?, output_format)
    );

    tickets.delete(ticket_id)?;
    println!("\n  Delete: Ticket #{} deleted", ticket_id);

    Ok(())
}
