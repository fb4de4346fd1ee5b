//! Collaborator seams for the remote mirror: a document store with
//! filtered queries, an error sink for absorbed sync failures, and the
//! completion service used for journal analysis. All are synchronous
//! traits so tests can substitute plain in-memory doubles.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::anyhow;
use serde_json::Value;
use uuid::Uuid;

/// A remote document: generated or natural-key id plus a JSON object body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

/// A filtered collection read. Supports equality filters, descending
/// order on one field, and a result cap: the shapes the stores issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_desc: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Query {
            collection: name.to_string(),
            filters: Vec::new(),
            order_desc: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: &str, equals: Value) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            equals,
        });
        self
    }

    #[must_use]
    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_desc = Some(field.to_string());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Remote multi-writer document store. Every call is best-effort; the
/// stores absorb failures rather than surfacing them to mutation callers.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>>;
    /// Create or fully replace the document under `id`.
    fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()>;
    /// Merge `patch`'s top-level fields into an existing document.
    fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()>;
    /// Insert with a generated id, returned to the caller.
    fn add(&self, collection: &str, data: Value) -> anyhow::Result<String>;
    fn query(&self, query: &Query) -> anyhow::Result<Vec<Document>>;
}

/// In-memory document store backing tests and the offline CLI session.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        MemoryDocumentStore::default()
    }

    fn lock(
        &self,
    ) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, BTreeMap<String, Value>>>> {
        self.collections
            .lock()
            .map_err(|_| anyhow!("document store mutex poisoned"))
    }
}

fn order_key(value: Option<&Value>) -> (u8, f64, String) {
    match value {
        Some(Value::Number(n)) => (1, n.as_f64().unwrap_or(0.0), String::new()),
        Some(Value::String(s)) => (0, 0.0, s.clone()),
        _ => (2, 0.0, String::new()),
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let collections = self.lock()?;
        Ok(collections.get(collection).and_then(|docs| {
            docs.get(id).map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            })
        }))
    }

    fn set(&self, collection: &str, id: &str, data: Value) -> anyhow::Result<()> {
        let mut collections = self.lock()?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()> {
        let mut collections = self.lock()?;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow!("unknown collection {collection}"))?;
        let existing = docs
            .get_mut(id)
            .ok_or_else(|| anyhow!("no document {id} in {collection}"))?;
        let Value::Object(patch) = patch else {
            anyhow::bail!("update patch must be a JSON object");
        };
        if let Value::Object(fields) = existing {
            for (key, value) in patch {
                fields.insert(key, value);
            }
            Ok(())
        } else {
            anyhow::bail!("document {id} in {collection} is not an object")
        }
    }

    fn add(&self, collection: &str, data: Value) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, data)?;
        Ok(id)
    }

    fn query(&self, query: &Query) -> anyhow::Result<Vec<Document>> {
        let collections = self.lock()?;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| {
                query
                    .filters
                    .iter()
                    .all(|filter| data.get(&filter.field) == Some(&filter.equals))
            })
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();

        if let Some(field) = &query.order_desc {
            matched.sort_by(|a, b| {
                let ka = order_key(a.data.get(field));
                let kb = order_key(b.data.get(field));
                kb.partial_cmp(&ka).unwrap_or(Ordering::Equal)
            });
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

/// Observability sink for failures absorbed on the sync path. Never used
/// for control flow.
pub trait ErrorSink: Send + Sync {
    fn report(&self, operation: &str, error: &anyhow::Error);
}

/// Writes absorbed failures to stderr.
#[derive(Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, operation: &str, error: &anyhow::Error) {
        eprintln!("sync error during {operation}: {error:#}");
    }
}

/// Discards reports. For callers that handle status through `SyncStatus`
/// alone.
#[derive(Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&self, _operation: &str, _error: &anyhow::Error) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: &str) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.to_string(),
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.to_string(),
        }
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.to_string(),
        }
    }
}

/// Outbound AI completion seam. `complete_object` returns a JSON value the
/// caller validates against its expected shape.
pub trait CompletionService: Send + Sync {
    fn complete_text(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
    fn complete_object(
        &self,
        messages: &[ChatMessage],
        schema_hint: &str,
    ) -> anyhow::Result<Value>;
}
