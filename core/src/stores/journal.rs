//! Journal entries. Local-persisted only; the AI analysis pass is
//! quota-guarded (it spends a coach message) and attaches a structured
//! result to the entry.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{JournalAnalysis, JournalEntry, JournalUpdate, NewJournalEntry, Sentiment};
use crate::quota::{Feature, QuotaGuard};
use crate::remote::{ChatMessage, CompletionService};
use crate::stores::{SyncContext, SyncStatus, status_of};

const STORAGE_KEY: &str = "journal-storage";

const ANALYSIS_PROMPT: &str = "You are a reflective journaling coach. Analyze the \
entry and respond with a JSON object: summary (string), key_insights (array of \
strings), actionable_advice (string), strategic_score (number 1-10), and \
optionally sentiment (positive, neutral, negative, or mixed).";

pub struct JournalStore {
    context: SyncContext,
    entries: Vec<JournalEntry>,
    status: SyncStatus,
}

impl JournalStore {
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let entries = context.restore(STORAGE_KEY);
        JournalStore {
            context,
            entries,
            status: SyncStatus::default(),
        }
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Create an entry with a generated id, prepended so the newest entry
    /// lists first. Returns the id.
    pub fn add_entry(&mut self, new_entry: NewJournalEntry, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.insert(
            0,
            JournalEntry {
                id: id.clone(),
                date: now,
                content: new_entry.content,
                tags: new_entry.tags,
                mood: new_entry.mood,
                sentiment: None,
                analysis: None,
            },
        );
        self.persist();
        id
    }

    /// Apply a partial update. Returns false for an unknown id.
    pub fn update_entry(&mut self, id: &str, update: JournalUpdate) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) else {
            return false;
        };
        if let Some(content) = update.content {
            entry.content = content;
        }
        if let Some(tags) = update.tags {
            entry.tags = tags;
        }
        if let Some(mood) = update.mood {
            entry.mood = mood;
        }
        self.persist();
        true
    }

    /// Delete by id. Returns false for an unknown id.
    pub fn delete_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Run the AI analysis for one entry. Consumes a coach-message quota
    /// unit first; a completion failure after that point is surfaced as
    /// `Completion` and can be retried, with the spent message the cost of
    /// the attempt.
    pub fn analyze_entry(
        &mut self,
        id: &str,
        completions: &dyn CompletionService,
        quota: &mut QuotaGuard,
        now: NaiveDateTime,
    ) -> Result<()> {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return Err(CoreError::InvalidInput(format!("no journal entry {id}")));
        };
        quota.try_consume(Feature::CoachMessage, now)?;

        let messages = [
            ChatMessage::system(ANALYSIS_PROMPT),
            ChatMessage::user(&self.entries[position].content),
        ];
        let value = completions
            .complete_object(&messages, "journal analysis")
            .map_err(CoreError::Completion)?;

        let sentiment: Option<Sentiment> = value
            .get("sentiment")
            .and_then(|s| serde_json::from_value(s.clone()).ok());
        let analysis: JournalAnalysis = serde_json::from_value(value)
            .map_err(|e| CoreError::Completion(e.into()))?;

        let entry = &mut self.entries[position];
        entry.analysis = Some(analysis);
        if sentiment.is_some() {
            entry.sentiment = sentiment;
        }
        self.persist();
        Ok(())
    }

    fn persist(&mut self) {
        let persisted = self.context.persist(STORAGE_KEY, &self.entries);
        self.status = status_of(persisted, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaLimits;
    use crate::stores::testutil::offline_context;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    struct CannedCompletions {
        response: anyhow::Result<Value>,
    }

    impl CompletionService for CannedCompletions {
        fn complete_text(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
            Ok(String::new())
        }

        fn complete_object(
            &self,
            _messages: &[ChatMessage],
            _schema_hint: &str,
        ) -> anyhow::Result<Value> {
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(_) => Err(anyhow!("model unavailable")),
            }
        }
    }

    fn new_entry(content: &str) -> NewJournalEntry {
        NewJournalEntry {
            content: content.to_string(),
            tags: vec!["test".to_string()],
            mood: None,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_add_entry_prepends_newest_first() {
        let mut store = JournalStore::new(offline_context());
        store.add_entry(new_entry("first"), Utc::now());
        let second = store.add_entry(new_entry("second"), Utc::now());
        assert_eq!(store.entries()[0].id, second);
        assert_eq!(store.entries()[0].content, "second");
    }

    #[test]
    fn test_update_entry_partial_fields() {
        let mut store = JournalStore::new(offline_context());
        let id = store.add_entry(new_entry("draft"), Utc::now());
        let updated = store.update_entry(
            &id,
            JournalUpdate {
                content: Some("final".to_string()),
                mood: Some(Some("calm".to_string())),
                ..JournalUpdate::default()
            },
        );
        assert!(updated);
        let entry = store.entry(&id).unwrap();
        assert_eq!(entry.content, "final");
        assert_eq!(entry.mood.as_deref(), Some("calm"));
        assert_eq!(entry.tags, vec!["test".to_string()]);
    }

    #[test]
    fn test_delete_entry() {
        let mut store = JournalStore::new(offline_context());
        let id = store.add_entry(new_entry("gone"), Utc::now());
        assert!(store.delete_entry(&id));
        assert!(!store.delete_entry(&id));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_analyze_entry_attaches_result() {
        let mut store = JournalStore::new(offline_context());
        let id = store.add_entry(new_entry("a productive day"), Utc::now());
        let completions = CannedCompletions {
            response: Ok(json!({
                "summary": "A focused day",
                "key_insights": ["momentum building"],
                "actionable_advice": "Keep the morning routine",
                "strategic_score": 8.0,
                "sentiment": "positive",
            })),
        };
        let mut quota = QuotaGuard::new(QuotaLimits::unlimited());
        store
            .analyze_entry(&id, &completions, &mut quota, noon())
            .unwrap();

        let entry = store.entry(&id).unwrap();
        let analysis = entry.analysis.as_ref().unwrap();
        assert_eq!(analysis.summary, "A focused day");
        assert!(matches!(entry.sentiment, Some(Sentiment::Positive)));
        assert_eq!(quota.used(Feature::CoachMessage, noon()), 1);
    }

    #[test]
    fn test_analyze_entry_respects_quota() {
        let mut store = JournalStore::new(offline_context());
        let id = store.add_entry(new_entry("over budget"), Utc::now());
        let completions = CannedCompletions {
            response: Ok(json!({
                "summary": "s", "actionable_advice": "a", "strategic_score": 5.0,
            })),
        };
        let mut quota = QuotaGuard::new(QuotaLimits {
            coach_messages_per_day: Some(0),
            ..QuotaLimits::unlimited()
        });
        let err = store
            .analyze_entry(&id, &completions, &mut quota, noon())
            .unwrap_err();
        assert!(matches!(err, CoreError::QuotaExceeded { .. }));
        assert!(store.entry(&id).unwrap().analysis.is_none());
    }

    #[test]
    fn test_analyze_entry_completion_failure() {
        let mut store = JournalStore::new(offline_context());
        let id = store.add_entry(new_entry("flaky model"), Utc::now());
        let completions = CannedCompletions {
            response: Err(anyhow!("boom")),
        };
        let mut quota = QuotaGuard::new(QuotaLimits::unlimited());
        let err = store
            .analyze_entry(&id, &completions, &mut quota, noon())
            .unwrap_err();
        assert!(matches!(err, CoreError::Completion(_)));
    }

    #[test]
    fn test_analyze_unknown_entry_is_invalid_input() {
        let mut store = JournalStore::new(offline_context());
        let completions = CannedCompletions {
            response: Ok(json!({})),
        };
        let mut quota = QuotaGuard::new(QuotaLimits::unlimited());
        let err = store
            .analyze_entry("ghost", &completions, &mut quota, noon())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
