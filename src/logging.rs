//! Structured logging module for Kawan
//!
//! Writes category-tagged log lines to a per-day file:
//! - LEARNING: knowledge base changes
//! - RESPONSE: response selection decisions
//! - CONTEXT: conversation memory updates
//! - PERSISTENCE: snapshot load/save events
//! - ERROR: recovered failures
//!
//! The log directory comes from `KAWAN_LOG_DIR`, falling back to
//! `$HOME/.kawan/logs`, then `/tmp`. Logging is best-effort throughout:
//! a failed write never disturbs the operation being logged.

use chrono::{Local, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Learning,    // Knowledge base changes (keywords, patterns, frequencies)
    Response,    // Response selection (overrides, repeats, personas)
    Context,     // Conversation memory updates
    Persistence, // Snapshot load/save
    Error,       // Recovered failures
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Learning => "LEARNING",
            LogCategory::Response => "RESPONSE",
            LogCategory::Context => "CONTEXT",
            LogCategory::Persistence => "PERSISTENCE",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Get the log directory path
fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KAWAN_LOG_DIR") {
        return PathBuf::from(dir);
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".kawan/logs"),
        Err(_) => PathBuf::from("/tmp"),
    }
}

/// Get today's log file path
fn get_log_file_path() -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    get_log_dir().join(format!("kawan-{}.log", today))
}

/// Initialize the logging system - creates log directory if needed
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = get_log_dir();

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    log(LogCategory::Persistence, None, "Kawan logging initialized");

    Ok(())
}

/// Log a message with category and optional conversation context
pub fn log(category: LogCategory, conversation_id: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let conv_context = conversation_id
        .map(|id| format!("conversation={} | ", id.chars().take(8).collect::<String>()))
        .unwrap_or_default();

    let log_line = format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        conv_context,
        message
    );

    // Write to file, best-effort
    let log_path = get_log_file_path();
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(log_line.as_bytes());
    }
}

/// Log a learning event (keyword recorded, pattern counted, custom response set)
pub fn log_learning(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Learning, conversation_id, message);
}

/// Log a response selection decision
pub fn log_response(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Response, conversation_id, message);
}

/// Log a context memory update
pub fn log_context(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Context, conversation_id, message);
}

/// Log a persistence event
pub fn log_persistence(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Persistence, conversation_id, message);
}

/// Log an error
pub fn log_error(conversation_id: Option<&str>, message: &str) {
    log(LogCategory::Error, conversation_id, message);
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs() -> Result<usize, Box<dyn std::error::Error>> {
    let log_dir = get_log_dir();
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff {
                    if fs::remove_file(&path).is_ok() {
                        deleted += 1;
                    }
                }
            }
        }
    }

    Ok(deleted)
}
