//! Note command handlers

use anyhow::{bail, Context, Result};

use jotter_core::{Note, NoteDraft, NotesStore, PageRequest};

use crate::editor::{confirm, edit_draft};
use crate::output::{Footer, Output};

/// List one page of notes, or every note with `all`
pub async fn list(
    store: &mut NotesStore,
    page: Option<u32>,
    limit: u32,
    all: bool,
    output: &Output,
) -> Result<()> {
    let shown = if all {
        store.load_page(PageRequest::first(limit)).await?;
        while store.state().has_more() {
            let batch = store.load_page(PageRequest::next(limit)).await?;
            if batch.is_empty() {
                // Rows vanished underneath us; stop rather than spin
                break;
            }
        }
        store.state().notes().to_vec()
    } else {
        store
            .load_page(PageRequest::at(limit, page.unwrap_or(0)))
            .await?
    };

    let first_page = if all { 0 } else { page.unwrap_or(0) };
    let total = store.state().total();
    output.print_notes(&shown, footer(total, first_page, shown.len(), limit));
    Ok(())
}

/// Show one note in full
pub async fn show(store: &mut NotesStore, id: String, output: &Output) -> Result<()> {
    let id = resolve_id(store, &id).await?;
    let note = find(store, &id).await?;
    output.print_note(&note);
    Ok(())
}

/// Create a new note
///
/// Missing fields are written in the editor.
pub async fn add(
    store: &mut NotesStore,
    title: Option<String>,
    body: Option<String>,
    output: &Output,
) -> Result<()> {
    let draft = match (title, body) {
        (Some(title), Some(body)) => NoteDraft::new(title, body),
        (title, body) => edit_draft(
            title.as_deref().unwrap_or(""),
            body.as_deref().unwrap_or(""),
        )?,
    };

    let note = store.create(draft).await.context("Failed to add note")?;
    output.success(&format!("Added note #{}", note.short_id()));
    Ok(())
}

/// Edit a note's title and description
///
/// Fields not given on the command line keep their stored value; with
/// neither given the note opens in the editor.
pub async fn edit(
    store: &mut NotesStore,
    id: String,
    title: Option<String>,
    body: Option<String>,
    output: &Output,
) -> Result<()> {
    let id = resolve_id(store, &id).await?;
    let existing = find(store, &id).await?;

    let draft = if title.is_none() && body.is_none() {
        edit_draft(&existing.title, &existing.body)?
    } else {
        NoteDraft::new(
            title.unwrap_or(existing.title),
            body.unwrap_or(existing.body),
        )
    };

    let note = store
        .update(&id, draft)
        .await
        .context("Failed to save note")?;
    output.success(&format!("Saved note #{}", note.short_id()));
    Ok(())
}

/// Delete a note
pub async fn delete(store: &mut NotesStore, id: String, output: &Output) -> Result<()> {
    let id = resolve_id(store, &id).await?;
    let note = find(store, &id).await?;

    if output.should_prompt() {
        println!("Delete note: #{} - {}", note.short_id(), note.title);
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete(&id)
        .await
        .context("Failed to delete note")?;
    output.success(&format!("Deleted note #{}", note.short_id()));
    Ok(())
}

/// Turn a full id or the short id shown in listings into a full id
async fn resolve_id(store: &mut NotesStore, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        bail!("Please provide a note ID");
    }

    if store.fetch(id).await?.is_some() {
        return Ok(id.to_string());
    }

    let page_size = store.state().len().max(20) as u32;
    store.refresh(page_size).await?;
    while store.state().has_more() {
        if store.load_page(PageRequest::next(page_size)).await?.is_empty() {
            break;
        }
    }

    let matches: Vec<&Note> = store
        .state()
        .notes()
        .iter()
        .filter(|note| note.id.ends_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No note found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple notes match '{}':", id);
            for note in &matches {
                eprintln!("  {} - {}", note.id, note.title);
            }
            bail!("Ambiguous ID. Please provide more digits.");
        }
    }
}

async fn find(store: &NotesStore, id: &str) -> Result<Note> {
    store
        .fetch(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))
}

/// Paging footer for `shown` notes taken from `page`
fn footer(total: u64, page: u32, shown: usize, limit: u32) -> Footer {
    let seen = u64::from(page) * u64::from(limit) + shown as u64;
    Footer {
        loaded: seen.min(total) as usize,
        total,
        next_page: (seen < total).then_some(page + 1),
    }
}
