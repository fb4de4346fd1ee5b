//! Shared shopping list. The list is one aggregate: every mutation
//! persists the whole list locally and mirrors it as a single document
//! under the user id. Remote refreshes merge by item id with the checked
//! flag preserved from the local copy.

use chrono::Utc;
use serde_json::json;

use crate::merge::{self, MergePolicy};
use crate::models::ShoppingItem;
use crate::stores::{SyncContext, SyncStatus, status_of};

const STORAGE_KEY: &str = "shopping-storage";
const COLLECTION: &str = "shoppingList";

const MERGE_POLICY: MergePolicy = MergePolicy {
    local_wins: &["checked"],
};

pub struct ShoppingStore {
    context: SyncContext,
    items: Vec<ShoppingItem>,
    status: SyncStatus,
}

impl ShoppingStore {
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let items = context.restore(STORAGE_KEY);
        ShoppingStore {
            context,
            items,
            status: SyncStatus::default(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Replace the whole list.
    pub fn set_items(&mut self, items: Vec<ShoppingItem>) {
        self.items = items;
        self.sync();
    }

    /// Append items whose ids are not already present.
    pub fn add_items(&mut self, new_items: Vec<ShoppingItem>) {
        let mut added = false;
        for item in new_items {
            if self.items.iter().any(|existing| existing.id == item.id) {
                continue;
            }
            self.items.push(item);
            added = true;
        }
        if added {
            self.sync();
        }
    }

    /// Flip an item's checked flag. Returns false for an unknown id.
    pub fn toggle_item(&mut self, id: &str) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        item.checked = !item.checked;
        self.sync();
        true
    }

    /// Merge a remote refresh into the local list. Skips persistence and
    /// the remote write entirely when the merge changes nothing.
    pub fn update_items(&mut self, incoming: &[ShoppingItem]) -> bool {
        let outcome = match merge::merge_keyed(&self.items, incoming, MERGE_POLICY) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.context.errors.report("merge shopping list", &error);
                return false;
            }
        };
        if !outcome.changed {
            return false;
        }
        self.items = outcome.list;
        self.sync();
        true
    }

    /// Drop items by id.
    pub fn remove_items(&mut self, ids: &[String]) {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        if self.items.len() != before {
            self.sync();
        }
    }

    fn sync(&mut self) {
        let persisted = self.context.persist(STORAGE_KEY, &self.items);
        let items = &self.items;
        let pushed = self.context.push("save shopping list", |remote, user| {
            let body = json!({
                "items": items,
                "updatedAt": Utc::now().to_rfc3339(),
            });
            remote.set(COLLECTION, user, body)
        });
        self.status = status_of(persisted, pushed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::DocumentStore;
    use crate::stores::testutil::{
        CollectingSink, FailingDocumentStore, FailingStorage, offline_context, online_context,
    };
    use std::sync::Arc;

    fn item(id: &str, name: &str, checked: bool) -> ShoppingItem {
        ShoppingItem {
            id: id.to_string(),
            name: name.to_string(),
            category: String::new(),
            amount: String::new(),
            checked,
        }
    }

    #[test]
    fn test_add_items_dedupes_by_id() {
        let mut store = ShoppingStore::new(offline_context());
        store.add_items(vec![item("a", "milk", false)]);
        store.add_items(vec![item("a", "milk again", false), item("b", "eggs", false)]);
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.items()[0].name, "milk");
    }

    #[test]
    fn test_toggle_item() {
        let mut store = ShoppingStore::new(offline_context());
        store.add_items(vec![item("a", "milk", false)]);
        assert!(store.toggle_item("a"));
        assert!(store.items()[0].checked);
        assert!(!store.toggle_item("missing"));
    }

    #[test]
    fn test_remove_items() {
        let mut store = ShoppingStore::new(offline_context());
        store.add_items(vec![item("a", "milk", false), item("b", "eggs", false)]);
        store.remove_items(&["a".to_string()]);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, "b");
    }

    #[test]
    fn test_update_items_preserves_local_checked_flag() {
        let mut store = ShoppingStore::new(offline_context());
        store.set_items(vec![item("a", "Milk", true)]);
        let changed = store.update_items(&[item("a", "Milk", false), item("b", "Eggs", false)]);
        assert!(changed);
        assert_eq!(store.items().len(), 2);
        assert!(store.items()[0].checked);
        assert!(!store.items()[1].checked);
    }

    #[test]
    fn test_update_items_skips_redundant_writes() {
        let (context, remote, _) = online_context("u1");
        let mut store = ShoppingStore::new(context);
        store.set_items(vec![item("a", "milk", true)]);
        // An incoming copy that merges to the identical list.
        let changed = store.update_items(&[item("a", "milk", false)]);
        assert!(!changed);

        let doc = remote.get(COLLECTION, "u1").unwrap().unwrap();
        // The mirror still holds the list from set_items.
        assert_eq!(doc.data["items"][0]["id"], "a");
    }

    #[test]
    fn test_signed_in_mutation_reaches_remote() {
        let (context, remote, _) = online_context("u1");
        let mut store = ShoppingStore::new(context);
        store.add_items(vec![item("a", "milk", false)]);
        assert_eq!(store.status(), SyncStatus::Synced);
        let doc = remote.get(COLLECTION, "u1").unwrap().unwrap();
        assert_eq!(doc.data["items"][0]["name"], "milk");
    }

    #[test]
    fn test_signed_out_mutation_is_local_only() {
        let mut store = ShoppingStore::new(offline_context());
        store.add_items(vec![item("a", "milk", false)]);
        assert_eq!(store.status(), SyncStatus::LocalOnly);
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn test_remote_failure_keeps_local_state() {
        let sink = Arc::new(CollectingSink::default());
        let context = SyncContext::new(
            Arc::new(crate::storage::MemoryStorage::new()),
            Arc::new(FailingDocumentStore),
            sink.clone(),
        )
        .with_user("u1");
        let mut store = ShoppingStore::new(context);
        store.add_items(vec![item("a", "milk", false)]);
        assert_eq!(store.status(), SyncStatus::SyncFailed);
        assert_eq!(store.items().len(), 1);
        assert_eq!(sink.operations(), vec!["save shopping list".to_string()]);
    }

    #[test]
    fn test_storage_failure_degrades_without_losing_state() {
        let sink = Arc::new(CollectingSink::default());
        let context = SyncContext::new(
            Arc::new(FailingStorage),
            Arc::new(crate::remote::MemoryDocumentStore::new()),
            sink.clone(),
        );
        let mut store = ShoppingStore::new(context);
        store.add_items(vec![item("a", "milk", false)]);
        assert_eq!(store.status(), SyncStatus::LocalOnly);
        assert_eq!(store.items().len(), 1);
        assert!(!sink.operations().is_empty());
    }
}
