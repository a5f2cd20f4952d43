//! Colored CLI display utilities for bridge stream output.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal while a session streams.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode {
        return s.to_string();
    }
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        // Back up to a char boundary so multi-byte text cannot split.
        let mut cut = max_len - 3;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &s[..cut])
    }
}

/// Format tool input for display, truncating long values.
#[must_use]
pub fn format_tool_input(input: &serde_json::Value, raw_mode: bool) -> String {
    match input {
        serde_json::Value::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let value_str = match v {
                        serde_json::Value::String(s) => truncate(s, 50, raw_mode),
                        other => truncate(&other.to_string(), 50, raw_mode),
                    };
                    format!("{k}={value_str}")
                })
                .collect();
            pairs.join(", ")
        }
        other => truncate(&other.to_string(), DEFAULT_MAX_LEN, raw_mode),
    }
}

/// Print session start information.
pub fn print_session_start(model: Option<&str>, session_id: &str, raw_mode: bool) {
    println!(
        "{} {} model={}, session={}",
        timestamp().dimmed(),
        "[SESSION]".blue().bold(),
        model.unwrap_or("unknown").cyan(),
        truncate(session_id, 20, raw_mode).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print session end information.
pub fn print_session_end(
    cost_usd: Option<f64>,
    is_error: bool,
    session_id: Option<&str>,
    result_msg: Option<&str>,
    raw_mode: bool,
) {
    let ts = timestamp();
    if is_error {
        println!(
            "{} {} Session ended with error {}",
            ts.dimmed(),
            "[SESSION]".red().bold(),
            session_id
                .map_or(String::new(), |id| format!(
                    "session_id={}",
                    truncate(id, 20, raw_mode)
                ))
                .dimmed()
        );
        if let Some(msg) = result_msg {
            if !msg.is_empty() {
                println!(
                    "{} {} {}",
                    ts.dimmed(),
                    "[ERROR]".red().bold(),
                    truncate(msg, 200, raw_mode).red()
                );
            }
        }
    } else if let Some(cost) = cost_usd {
        println!(
            "{} {} Session completed (cost: ${:.4}) {}",
            ts.dimmed(),
            "[SESSION]".blue().bold(),
            cost,
            session_id
                .map_or(String::new(), |id| format!(
                    "session_id={}",
                    truncate(id, 20, raw_mode)
                ))
                .dimmed()
        );
    } else {
        println!(
            "{} {} Session completed {}",
            ts.dimmed(),
            "[SESSION]".blue().bold(),
            session_id
                .map_or(String::new(), |id| format!(
                    "session_id={}",
                    truncate(id, 20, raw_mode)
                ))
                .dimmed()
        );
    }
    let _ = io::stdout().flush();
}

/// Print a tool request.
pub fn print_tool_request(name: &str, input: &serde_json::Value, raw_mode: bool) {
    println!(
        "{} {} ({})",
        "[TOOL]".cyan().bold(),
        name.bold(),
        format_tool_input(input, raw_mode).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print thinking content (dimmed).
pub fn print_thinking(text: &str) {
    print!("{}", text.dimmed());
    let _ = io::stdout().flush();
}

/// Print text content.
pub fn print_text(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

/// End the streamed text with a newline.
pub fn print_message_end() {
    println!();
    let _ = io::stdout().flush();
}

/// Print tool result output.
pub fn print_tool_result(tool_use_id: &str, content: &str, is_error: bool, raw_mode: bool) {
    let id_short = truncate(tool_use_id, 12, raw_mode);
    let content_short = truncate(content, 150, raw_mode);
    if is_error {
        println!(
            "{} {} {}",
            "[RESULT]".red().bold(),
            id_short.dimmed(),
            content_short
        );
    } else {
        println!(
            "{} {} {}",
            "[RESULT]".green().bold(),
            id_short.dimmed(),
            content_short
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Print a classified error with its guidance, if any.
pub fn print_classified_error(
    message: &str,
    suggestion: Option<&str>,
    help_url: Option<&str>,
    warning: bool,
) {
    if warning {
        println!("{} {}", "[WARN]".yellow().bold(), message);
    } else {
        println!("{} {}", "[ERROR]".red().bold(), message);
    }
    if let Some(suggestion) = suggestion {
        println!("        {}", suggestion.dimmed());
    }
    if let Some(url) = help_url {
        println!("        {}", url.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print the CLI process exit reported by the bridge.
pub fn print_stream_complete(exit_code: i32) {
    if exit_code == 0 {
        println!(
            "{} {} CLI exited (code 0)",
            timestamp().dimmed(),
            "[BRIDGE]".blue().bold()
        );
    } else {
        println!(
            "{} {} CLI exited (code {exit_code})",
            timestamp().dimmed(),
            "[BRIDGE]".red().bold()
        );
    }
    let _ = io::stdout().flush();
}

/// Print raw event output (for verbose/raw mode).
pub fn print_raw_event(event_type: &str, event_json: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        format!("[{event_type}]").yellow().bold(),
        event_json
    );
    let _ = io::stdout().flush();
}
