use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};
use uuid::Uuid;

use verve_core::models::ShoppingItem;
use verve_core::stores::{ShoppingStore, SyncContext};

use super::helpers::{print_json, truncate};

/// Resolve an id prefix or exact name to a full item id.
fn resolve_item(store: &ShoppingStore, reference: &str) -> Result<String> {
    let matches: Vec<&ShoppingItem> = store
        .items()
        .iter()
        .filter(|item| {
            item.id.starts_with(reference) || item.name.eq_ignore_ascii_case(reference)
        })
        .collect();
    match matches.as_slice() {
        [] => bail!("No shopping item matching '{reference}'"),
        [item] => Ok(item.id.clone()),
        _ => bail!("'{reference}' is ambiguous; use a longer id prefix"),
    }
}

pub(crate) fn cmd_shopping_add(
    context: &SyncContext,
    name: &str,
    category: Option<String>,
    amount: Option<String>,
    json: bool,
) -> Result<()> {
    let item = ShoppingItem {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        category: category.unwrap_or_default(),
        amount: amount.unwrap_or_default(),
        checked: false,
    };
    let mut store = ShoppingStore::new(context.clone());
    store.add_items(vec![item.clone()]);

    if json {
        return print_json(&item);
    }
    println!("Added '{name}' to the shopping list");
    Ok(())
}

pub(crate) fn cmd_shopping_toggle(context: &SyncContext, reference: &str, json: bool) -> Result<()> {
    let mut store = ShoppingStore::new(context.clone());
    let id = resolve_item(&store, reference)?;
    store.toggle_item(&id);
    let Some(item) = store.items().iter().find(|item| item.id == id) else {
        bail!("No shopping item matching '{reference}'");
    };

    if json {
        return print_json(item);
    }
    let state = if item.checked { "checked" } else { "unchecked" };
    let name = &item.name;
    println!("{name}: {state}");
    Ok(())
}

pub(crate) fn cmd_shopping_remove(context: &SyncContext, reference: &str, json: bool) -> Result<()> {
    let mut store = ShoppingStore::new(context.clone());
    let id = resolve_item(&store, reference)?;
    store.remove_items(&[id.clone()]);

    if json {
        return print_json(&serde_json::json!({ "removed": id }));
    }
    println!("Removed item from the shopping list");
    Ok(())
}

pub(crate) fn cmd_shopping_show(context: &SyncContext, json: bool) -> Result<()> {
    let store = ShoppingStore::new(context.clone());

    if json {
        return print_json(&store.items());
    }
    if store.items().is_empty() {
        eprintln!("Shopping list is empty.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = " ")]
        checked: String,
        #[tabled(rename = "Id")]
        id: String,
        #[tabled(rename = "Item")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Category")]
        category: String,
    }

    let rows: Vec<ItemRow> = store
        .items()
        .iter()
        .map(|item| ItemRow {
            checked: if item.checked { "x".to_string() } else { String::new() },
            id: item.id.chars().take(8).collect(),
            name: truncate(&item.name, 30),
            amount: item.amount.clone(),
            category: item.category.clone(),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}
