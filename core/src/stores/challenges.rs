//! Group challenges and the points leaderboard. Challenges are shared
//! documents; participant lists re-rank on every progress change. The
//! leaderboard is a read-side view over the gamification collection.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{self, Challenge, ChallengeParticipant, LeaderboardEntry, NewChallenge};
use crate::rank;
use crate::remote::Query;
use crate::stores::{SyncContext, SyncStatus, status_of};

const STORAGE_KEY: &str = "challenge-storage";
const COLLECTION: &str = "challenges";
const LEADERBOARD_COLLECTION: &str = "gamification";

pub struct ChallengeStore {
    context: SyncContext,
    challenges: Vec<Challenge>,
    status: SyncStatus,
}

impl ChallengeStore {
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let challenges = context.restore(STORAGE_KEY);
        ChallengeStore {
            context,
            challenges,
            status: SyncStatus::default(),
        }
    }

    #[must_use]
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    #[must_use]
    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Pull the shared challenge list. Local state survives a failed fetch.
    pub fn fetch_remote(&mut self) -> bool {
        match self.context.remote.query(&Query::collection(COLLECTION)) {
            Ok(documents) => {
                self.challenges = documents
                    .into_iter()
                    .filter_map(|doc| serde_json::from_value(doc.data).ok())
                    .collect();
                self.challenges
                    .sort_by(|a, b| b.start_date.cmp(&a.start_date));
                let persisted = self.context.persist(STORAGE_KEY, &self.challenges);
                self.status = status_of(persisted, Some(true));
                true
            }
            Err(source) => {
                let error: anyhow::Error = CoreError::RemoteSync {
                    operation: "fetch challenges".to_string(),
                    source,
                }
                .into();
                self.context.errors.report("fetch challenges", &error);
                self.status = SyncStatus::SyncFailed;
                false
            }
        }
    }

    /// Create a challenge. The creator joins automatically when signed in.
    pub fn create_challenge(
        &mut self,
        new_challenge: NewChallenge,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        models::validate_challenge_dates(new_challenge.start_date, new_challenge.end_date)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let mut challenge = Challenge {
            id: id.clone(),
            title: new_challenge.title,
            description: new_challenge.description,
            start_date: new_challenge.start_date,
            end_date: new_challenge.end_date,
            created_at: now,
            participants: Vec::new(),
        };
        if let Some(user) = self.context.user_id() {
            challenge.participants.push(ChallengeParticipant {
                user_id: user.to_string(),
                user_name: user_name.to_string(),
                progress: 0.0,
                joined_at: now,
                rank: 1,
            });
        }
        self.challenges.insert(0, challenge.clone());

        let persisted = self.context.persist(STORAGE_KEY, &self.challenges);
        let pushed = self.context.push("create challenge", |remote, _user| {
            remote.set(COLLECTION, &id, serde_json::to_value(&challenge)?)
        });
        self.status = status_of(persisted, pushed);
        Ok(id)
    }

    /// Join a challenge at zero progress. Joining twice is a no-op.
    pub fn join_challenge(&mut self, id: &str, user_name: &str, now: DateTime<Utc>) -> bool {
        let Some(user) = self.context.user_id().map(str::to_string) else {
            return false;
        };
        let Some(challenge) = self.challenges.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if challenge.participants.iter().any(|p| p.user_id == user) {
            return false;
        }
        challenge.participants.push(ChallengeParticipant {
            user_id: user,
            user_name: user_name.to_string(),
            progress: 0.0,
            joined_at: now,
            rank: 0,
        });
        challenge.participants = rank::rank(&challenge.participants);
        self.sync_participants(id);
        true
    }

    /// Record the signed-in user's progress and re-rank the field.
    pub fn update_progress(&mut self, id: &str, progress: f64) -> bool {
        let Some(user) = self.context.user_id().map(str::to_string) else {
            return false;
        };
        let Some(challenge) = self.challenges.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        let Some(participant) = challenge
            .participants
            .iter_mut()
            .find(|p| p.user_id == user)
        else {
            return false;
        };
        participant.progress = progress.clamp(0.0, 100.0);
        challenge.participants = rank::rank(&challenge.participants);
        self.sync_participants(id);
        true
    }

    /// Top scorers by total points, densely re-ranked after the fetch. A
    /// remote failure reads as an empty board.
    #[must_use]
    pub fn fetch_leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let query = Query::collection(LEADERBOARD_COLLECTION)
            .order_desc("totalPoints")
            .limit(limit);
        let documents = match self.context.remote.query(&query) {
            Ok(documents) => documents,
            Err(error) => {
                self.context.errors.report("fetch leaderboard", &error);
                return Vec::new();
            }
        };
        let entries: Vec<LeaderboardEntry> = documents
            .into_iter()
            .map(|doc| LeaderboardEntry {
                user_id: doc.id,
                user_name: doc
                    .data
                    .get("displayName")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Anonymous")
                    .to_string(),
                score: doc
                    .data
                    .get("totalPoints")
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(0.0),
                rank: 0,
            })
            .collect();
        rank::rank(&entries)
    }

    fn sync_participants(&mut self, id: &str) {
        let persisted = self.context.persist(STORAGE_KEY, &self.challenges);
        let participants = self
            .challenges
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.participants.clone())
            .unwrap_or_default();
        let pushed = self.context.push("save participants", |remote, _user| {
            remote.update(COLLECTION, id, json!({ "participants": participants }))
        });
        self.status = status_of(persisted, pushed);
    }
}
