//! Console rendering of status events

use chrono::Local;
use colored::Colorize;
use helix_ingest::events::{Severity, StatusEvent};

/// Print one event as a time-stamped colored line, or a JSON line
pub fn render(event: &StatusEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(_) => println!("{}", event.message),
        }
        return;
    }

    let timestamp = Local::now().format("%H:%M:%S");
    let message = match event.severity {
        Severity::Info => event.message.normal(),
        Severity::Success => event.message.green(),
        Severity::Warning => event.message.yellow(),
        Severity::Error => event.message.red(),
        Severity::Complete => event.message.bright_blue().bold(),
        Severity::Summary => event.message.magenta().bold(),
    };
    println!("[{}] {}", timestamp, message);
}
