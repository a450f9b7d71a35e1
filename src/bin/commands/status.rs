use super::open_database;
use anyhow::Result;
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;

pub fn run(config: &SecopsConfig, output_format: OutputFormat) -> Result<()> {
    let db = open_database(config)?;
    let summary = db.summary()?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            println!("SecOps Database Status");
            println!("======================\n");
            println!(
                "  Path:           {}",
                summary.path.as_deref().unwrap_or("(in-memory)")
            );
            println!("  Schema:         v{}", summary.schema_version);
            println!("  Incidents:      {}", summary.incident_count);
            println!("  IT tickets:     {}", summary.ticket_count);
        }
    }
    Ok(())
}
