//! Participant dumps for the admin bot and the `export` CLI command.

use chrono::Utc;
use std::fmt;
use std::str::FromStr;

use crate::error::AppResult;
use crate::storage::Participant;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Txt,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Txt];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
        }
    }

    /// File name with a UTC timestamp, e.g. `participants_20261219_181500.csv`.
    pub fn file_name(&self) -> String {
        format!("participants_{}.{}", Utc::now().format("%Y%m%d_%H%M%S"), self.as_str())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "txt" => Ok(ExportFormat::Txt),
            _ => Err(format!("Unknown export format: {} (expected csv, json or txt)", s)),
        }
    }
}

/// Renders participants in the requested format.
pub fn render(participants: &[Participant], format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Csv => Ok(export_to_csv(participants)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(participants)?),
        ExportFormat::Txt => Ok(export_to_txt(participants)),
    }
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\"").replace(['\r', '\n'], " "))
}

fn export_to_csv(participants: &[Participant]) -> String {
    let mut content =
        "id,telegram_user_id,username,ifo,address_option,address,phone_number,comment,created_at,updated_at\n"
            .to_string();

    for p in participants {
        let row = [
            p.id.to_string(),
            p.telegram_user_id.to_string(),
            csv_field(&p.username),
            csv_field(&p.ifo),
            p.address_option.as_str().to_string(),
            csv_field(&p.address),
            csv_field(&p.phone_number),
            p.comment.as_deref().map(csv_field).unwrap_or_default(),
            p.created_at.clone(),
            p.updated_at.clone(),
        ];
        content.push_str(&row.join(","));
        content.push('\n');
    }

    content
}

fn export_to_txt(participants: &[Participant]) -> String {
    let mut content = format!("Secret Santa participants: {}\n", participants.len());
    content.push_str("=".repeat(50).as_str());
    content.push_str("\n\n");

    for p in participants {
        content.push_str(&format!("#{} {}\n", p.id, p.ifo));
        if p.username.is_empty() {
            content.push_str(&format!("   Telegram: {}\n", p.telegram_user_id));
        } else {
            content.push_str(&format!("   Telegram: {} (@{})\n", p.telegram_user_id, p.username));
        }
        content.push_str(&format!("   Delivery: {}\n", p.address_option));
        content.push_str(&format!("   Address: {}\n", p.address));
        content.push_str(&format!("   Phone: {}\n", p.phone_number));
        if let Some(comment) = &p.comment {
            content.push_str(&format!("   Comment: {}\n", comment));
        }
        content.push('\n');
    }

    content
}
