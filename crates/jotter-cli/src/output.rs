//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use jotter_core::{Note, Notice};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Paging position shown under a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Notes loaded so far
    pub loaded: usize,
    /// Notes in the database
    pub total: u64,
    /// Page to ask for next, if any remain
    pub next_page: Option<u32>,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single note in full
    pub fn print_note(&self, note: &Note) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", note.id);
                println!("Title:   {}", note.title);
                println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", note.body);
            }
            OutputFormat::Json => {
                println!("{}", to_json(note));
            }
            OutputFormat::Quiet => {
                println!("{}", note.id);
            }
        }
    }

    /// Print a list of notes with the paging position
    pub fn print_notes(&self, notes: &[Note], footer: Footer) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found. Add one with: jot add");
                    return;
                }
                for note in notes {
                    println!(
                        "#{} | {} | {} | {}",
                        note.short_id(),
                        note.created_at.format("%Y-%m-%d"),
                        truncate(&note.title, 30),
                        truncate_line(&note.body, 40)
                    );
                }
                println!();
                println!("{} of {} note(s)", footer.loaded, footer.total);
                if let Some(page) = footer.next_page {
                    println!("More: jot list --page {}", page);
                }
            }
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "notes": notes,
                    "loaded": footer.loaded,
                    "total": footer.total,
                    "next_page": footer.next_page,
                });
                println!("{}", to_json(&value));
            }
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
    }

    /// Print a failure notice on stderr
    pub fn notice(&self, notice: &Notice) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", notice),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "error", "message": notice.message, "code": notice.code})
                );
            }
            OutputFormat::Quiet => eprintln!("{}", notice.message),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
