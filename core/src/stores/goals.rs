//! Personal goals with key results. Local-persisted only.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Goal, GoalStatus, GoalUpdate, NewGoal};
use crate::stores::{SyncContext, SyncStatus, status_of};

const STORAGE_KEY: &str = "goal-storage";

pub struct GoalStore {
    context: SyncContext,
    goals: Vec<Goal>,
    status: SyncStatus,
}

impl GoalStore {
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let goals = context.restore(STORAGE_KEY);
        GoalStore {
            context,
            goals,
            status: SyncStatus::default(),
        }
    }

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    #[must_use]
    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    /// Create an active goal at zero progress. Returns the id.
    pub fn add_goal(&mut self, new_goal: NewGoal, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        self.goals.push(Goal {
            id: id.clone(),
            title: new_goal.title,
            description: new_goal.description,
            category: new_goal.category,
            deadline: new_goal.deadline,
            status: GoalStatus::Active,
            progress: 0.0,
            key_results: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        self.persist();
        id
    }

    /// Apply a partial update and bump `updated_at`. Returns false for an
    /// unknown id.
    pub fn update_goal(&mut self, id: &str, update: GoalUpdate, now: DateTime<Utc>) -> bool {
        let Some(goal) = self.goals.iter_mut().find(|goal| goal.id == id) else {
            return false;
        };
        if let Some(title) = update.title {
            goal.title = title;
        }
        if let Some(description) = update.description {
            goal.description = description;
        }
        if let Some(deadline) = update.deadline {
            goal.deadline = deadline;
        }
        if let Some(progress) = update.progress {
            goal.progress = progress.clamp(0.0, 100.0);
        }
        if let Some(key_results) = update.key_results {
            goal.key_results = key_results;
        }
        goal.updated_at = now;
        self.persist();
        true
    }

    pub fn set_status(&mut self, id: &str, status: GoalStatus, now: DateTime<Utc>) -> bool {
        let Some(goal) = self.goals.iter_mut().find(|goal| goal.id == id) else {
            return false;
        };
        goal.status = status;
        goal.updated_at = now;
        self.persist();
        true
    }

    pub fn delete_goal(&mut self, id: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|goal| goal.id != id);
        if self.goals.len() == before {
            return false;
        }
        self.persist();
        true
    }

    fn persist(&mut self) {
        let persisted = self.context.persist(STORAGE_KEY, &self.goals);
        self.status = status_of(persisted, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalCategory;
    use crate::stores::testutil::offline_context;

    fn new_goal(title: &str) -> NewGoal {
        NewGoal {
            title: title.to_string(),
            description: None,
            category: GoalCategory::Health,
            deadline: None,
        }
    }

    #[test]
    fn test_add_goal_starts_active_at_zero() {
        let mut store = GoalStore::new(offline_context());
        let id = store.add_goal(new_goal("run a 10k"), Utc::now());
        let goal = store.goal(&id).unwrap();
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.progress, 0.0);
        assert_eq!(goal.created_at, goal.updated_at);
    }

    #[test]
    fn test_update_goal_bumps_updated_at_and_clamps_progress() {
        let mut store = GoalStore::new(offline_context());
        let created = Utc::now();
        let id = store.add_goal(new_goal("read more"), created);
        let later = created + chrono::Duration::hours(2);
        let updated = store.update_goal(
            &id,
            GoalUpdate {
                progress: Some(150.0),
                ..GoalUpdate::default()
            },
            later,
        );
        assert!(updated);
        let goal = store.goal(&id).unwrap();
        assert_eq!(goal.progress, 100.0);
        assert_eq!(goal.updated_at, later);
    }

    #[test]
    fn test_clearing_optional_fields() {
        let mut store = GoalStore::new(offline_context());
        let id = store.add_goal(
            NewGoal {
                description: Some("details".to_string()),
                ..new_goal("declutter")
            },
            Utc::now(),
        );
        store.update_goal(
            &id,
            GoalUpdate {
                description: Some(None),
                ..GoalUpdate::default()
            },
            Utc::now(),
        );
        assert!(store.goal(&id).unwrap().description.is_none());
    }

    #[test]
    fn test_set_status_and_delete() {
        let mut store = GoalStore::new(offline_context());
        let id = store.add_goal(new_goal("meditate daily"), Utc::now());
        assert!(store.set_status(&id, GoalStatus::Completed, Utc::now()));
        assert_eq!(store.goal(&id).unwrap().status, GoalStatus::Completed);
        assert!(store.delete_goal(&id));
        assert!(!store.delete_goal(&id));
        assert!(store.goals().is_empty());
    }

    #[test]
    fn test_unknown_id_returns_false() {
        let mut store = GoalStore::new(offline_context());
        assert!(!store.update_goal("ghost", GoalUpdate::default(), Utc::now()));
        assert!(!store.set_status("ghost", GoalStatus::Archived, Utc::now()));
    }
}
