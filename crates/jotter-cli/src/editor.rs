//! Interactive editing support
//!
//! Opens $EDITOR to write a note: the first line is the title, everything
//! after it is the description.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::Command;

use jotter_core::NoteDraft;

/// Header placed above the note in the editor
const TEMPLATE_HEADER: &str = "\
# The first line is the title, the rest is the description.
# These two lines are removed. Leave the rest empty to cancel.
";

/// Open content in the user's preferred editor
///
/// Uses $EDITOR, $VISUAL, or falls back to common editors.
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("jot_edit_{}.md", std::process::id()));

    fs::write(&temp_path, initial_content)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        let _ = fs::remove_file(&temp_path);
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    let content = fs::read_to_string(&temp_path)
        .with_context(|| format!("Failed to read edited file: {:?}", temp_path))?;

    let _ = fs::remove_file(&temp_path);

    Ok(content)
}

/// Let the user write or revise a note in the editor
pub fn edit_draft(title: &str, body: &str) -> Result<NoteDraft> {
    let initial = render_draft(title, body);
    let edited = edit_text(&initial).context("Failed to edit note")?;
    Ok(parse_draft(&edited))
}

/// Lay a note out the way `parse_draft` reads it
fn render_draft(title: &str, body: &str) -> String {
    format!("{}\n{}\n\n{}\n", TEMPLATE_HEADER, title, body)
}

/// Split edited text into title and description
///
/// Only the template header is dropped; `#` lines the user wrote are kept.
fn parse_draft(text: &str) -> NoteDraft {
    let mut lines = text
        .lines()
        .skip_while(|line| line.trim().is_empty() || is_header_line(line));

    let title = lines.next().unwrap_or("").trim().to_string();
    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    NoteDraft { title, body }
}

fn is_header_line(line: &str) -> bool {
    TEMPLATE_HEADER.lines().any(|header| header == line.trim_end())
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    if let Ok(editor) = env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }

    if let Ok(visual) = env::var("VISUAL") {
        if !visual.is_empty() {
            return Ok(visual);
        }
    }

    let common_editors = ["nano", "vim", "vi", "emacs", "notepad"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable, or pass --title and --body.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
