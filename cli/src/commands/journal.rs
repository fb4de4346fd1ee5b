use anyhow::{Result, bail};
use chrono::Utc;
use tabled::{Table, Tabled, settings::Style};

use verve_core::models::NewJournalEntry;
use verve_core::stores::{JournalStore, SyncContext};

use super::helpers::{print_json, truncate};

pub(crate) fn cmd_journal_add(
    context: &SyncContext,
    content: &str,
    tags: Option<String>,
    mood: Option<String>,
    json: bool,
) -> Result<()> {
    let tags = tags
        .map(|t| {
            t.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let mut store = JournalStore::new(context.clone());
    let id = store.add_entry(
        NewJournalEntry {
            content: content.to_string(),
            tags,
            mood,
        },
        Utc::now(),
    );

    if json {
        if let Some(entry) = store.entry(&id) {
            return print_json(entry);
        }
    }
    let short: String = id.chars().take(8).collect();
    println!("Journal entry saved [{short}]");
    Ok(())
}

pub(crate) fn cmd_journal_list(context: &SyncContext, json: bool) -> Result<()> {
    let store = JournalStore::new(context.clone());

    if json {
        return print_json(&store.entries());
    }
    if store.entries().is_empty() {
        eprintln!("No journal entries yet.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Id")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Mood")]
        mood: String,
        #[tabled(rename = "Entry")]
        content: String,
    }

    let rows: Vec<EntryRow> = store
        .entries()
        .iter()
        .map(|entry| EntryRow {
            id: entry.id.chars().take(8).collect(),
            date: entry.date.format("%Y-%m-%d").to_string(),
            mood: entry.mood.clone().unwrap_or_default(),
            content: truncate(&entry.content, 50),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_journal_delete(context: &SyncContext, reference: &str, json: bool) -> Result<()> {
    let mut store = JournalStore::new(context.clone());
    let matches: Vec<String> = store
        .entries()
        .iter()
        .filter(|entry| entry.id.starts_with(reference))
        .map(|entry| entry.id.clone())
        .collect();
    let id = match matches.as_slice() {
        [] => bail!("No journal entry matching '{reference}'"),
        [id] => id.clone(),
        _ => bail!("'{reference}' is ambiguous; use a longer id prefix"),
    };
    store.delete_entry(&id);

    if json {
        return print_json(&serde_json::json!({ "deleted": id }));
    }
    println!("Journal entry deleted");
    Ok(())
}
