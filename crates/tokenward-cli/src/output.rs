//! Output formatting helpers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a notice to stderr.
pub fn notice(msg: &str) {
    eprintln!("{} {}", "→".yellow(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Render an optional timestamp for humans.
pub fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
