use anyhow::Result;
use secops::lens::utils::OutputFormat;
use secops::SecopsConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config_file: String,
    sqlite_path: String,
    sqlite_exists: bool,
    #[serde(flatten)]
    settings: &'a SecopsConfig,
}

pub fn run(
    config: &SecopsConfig,
    config_file: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    let sqlite_path = config.sqlite_path();
    let info = ConfigInfo {
        config_file: config_file
            .map(|s| s.to_string())
            .unwrap_or_else(SecopsConfig::config_file_path),
        sqlite_path: sqlite_path.display().to_string(),
        sqlite_exists: sqlite_path.exists(),
        settings: config,
    };

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&info)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&info)?),
        _ => {
            println!("Config File:        {}", info.config_file);
            println!("{}", config.summary());
            println!(
                "Database Status:    {}",
                if info.sqlite_exists {
                    "exists"
                } else {
                    "not created"
                }
            );
        }
    }
    Ok(())
}
