use clap::{Parser, Subcommand};
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;
use tracing::Level;

mod commands;

use commands::demo::DemoArgs;
use commands::incident::IncidentArgs;
use commands::ticket::TicketArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.secops/secops.toml is used
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, psv
    #[clap(short, long, global = true, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted walkthrough: setup, CRUD, CSV migration and reports
    Demo(DemoArgs),

    /// Security incident records
    Incident(IncidentArgs),

    /// IT support tickets
    Ticket(TicketArgs),

    /// Show database location, schema version and row counts
    Status,

    /// Show the effective configuration
    Config,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // import diagnostics (missing files) are warnings, so they show by default
    let level = if cli.debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match SecopsConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let format = cli.format;
    let result = match cli.command {
        Commands::Demo(args) => commands::demo::run(&config, args, format),
        Commands::Incident(args) => commands::incident::run(&config, args, format),
        Commands::Ticket(args) => commands::ticket::run(&config, args, format),
        Commands::Status => commands::status::run(&config, format),
        Commands::Config => commands::config::run(&config, cli.config.as_deref(), format),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
