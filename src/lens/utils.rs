//! Output formatting shared by the incident and ticket lenses

use crate::database::GroupCount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Default maximum length of free-text columns in tables
pub const DEFAULT_TEXT_MAX_LEN: usize = 40;

/// Output format for every command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Table with rounded borders (default)
    #[default]
    Table,
    /// Markdown table
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty", "psv"]
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let res = match self {
            Self::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        };
        res.unwrap_or_default()
    }

    fn style_table(&self, mut table: Table) -> String {
        match self {
            Self::Markdown => table.with(Style::markdown()).to_string(),
            _ => table.with(Style::rounded()).to_string(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Render records: JSON straight from the records, tables and PSV from
/// their display rows
pub fn render_records<T, R, F>(records: &[T], format: OutputFormat, to_row: F) -> String
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if format.is_json() {
        return format.to_json(records);
    }

    let rows: Vec<R> = records.iter().map(to_row).collect();
    match format {
        OutputFormat::Psv => {
            let mut lines = vec![R::headers().join("|")];
            lines.extend(rows.iter().map(|r| r.fields().join("|")));
            lines.join("\n")
        }
        _ => format.style_table(Table::new(rows)),
    }
}

/// Render a grouped count with `label` as the name of the grouped column
pub fn render_group_counts(label: &str, counts: &[GroupCount], format: OutputFormat) -> String {
    if format.is_json() {
        let rows: Vec<_> = counts
            .iter()
            .map(|g| serde_json::json!({ label: g.value, "count": g.count }))
            .collect();
        return format.to_json(&rows);
    }

    if format == OutputFormat::Psv {
        let mut lines = vec![format!("{}|count", label)];
        lines.extend(counts.iter().map(|g| format!("{}|{}", g.value, g.count)));
        return lines.join("\n");
    }

    let mut builder = Builder::default();
    builder.push_record([label.to_string(), "count".to_string()]);
    for g in counts {
        builder.push_record([g.value.clone(), g.count.to_string()]);
    }
    format.style_table(builder.build())
}

/// Truncate a string to the specified length, adding "..." if truncated
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Table cell for a nullable column
pub fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}
