//! Health metrics, history, check-ins, activity logs, and reflections.
//! One aggregate persisted under a single key; the remote mirror is
//! per-section documents so a check-in does not rewrite the whole
//! aggregate remotely.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{
    self, ExerciseLog, HealthMetrics, HistoryPoint, MealLog, ReflectionEntry, WellnessCheckIn,
};
use crate::quota::{Feature, QuotaGuard};
use crate::stores::{SyncContext, SyncStatus, status_of};

const STORAGE_KEY: &str = "health-storage";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<HealthMetrics>,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
    #[serde(default)]
    pub check_ins: Vec<WellnessCheckIn>,
    #[serde(default)]
    pub exercise_logs: Vec<ExerciseLog>,
    #[serde(default)]
    pub meal_logs: Vec<MealLog>,
    #[serde(default)]
    pub reflections: Vec<ReflectionEntry>,
}

pub struct HealthStore {
    context: SyncContext,
    state: HealthState,
    status: SyncStatus,
}

impl HealthStore {
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let state = context.restore(STORAGE_KEY);
        HealthStore {
            context,
            state,
            status: SyncStatus::default(),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> Option<&HealthMetrics> {
        self.state.metrics.as_ref()
    }

    /// History in ascending date order, at most one point per day.
    #[must_use]
    pub fn history(&self) -> &[HistoryPoint] {
        &self.state.history
    }

    /// Check-ins, newest first.
    #[must_use]
    pub fn check_ins(&self) -> &[WellnessCheckIn] {
        &self.state.check_ins
    }

    #[must_use]
    pub fn exercise_logs(&self) -> &[ExerciseLog] {
        &self.state.exercise_logs
    }

    #[must_use]
    pub fn meal_logs(&self) -> &[MealLog] {
        &self.state.meal_logs
    }

    /// Reflections in ascending date order.
    #[must_use]
    pub fn reflections(&self) -> &[ReflectionEntry] {
        &self.state.reflections
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Replace today's metrics. The history point for `today` is
    /// overwritten, never duplicated.
    pub fn update_metrics(&mut self, metrics: HealthMetrics, today: NaiveDate) {
        self.state.metrics = Some(metrics);
        self.upsert_history(today);
        let persisted = self.context.persist(STORAGE_KEY, &self.state);
        let pushed = self.sync_metrics_and_history();
        self.status = status_of(persisted, pushed);
    }

    /// Add to today's water total, kept to 2 decimal places.
    pub fn log_water(&mut self, liters: f64, today: NaiveDate) {
        let mut metrics = self.state.metrics.clone().unwrap_or_default();
        let total = metrics.water.unwrap_or(0.0) + liters;
        metrics.water = Some((total * 100.0).round() / 100.0);
        self.update_metrics(metrics, today);
    }

    /// Record a wellness check-in. Quota-guarded; the check-in's mood,
    /// stress, and energy fold into the current metrics and today's
    /// history point.
    pub fn add_check_in(
        &mut self,
        check_in: WellnessCheckIn,
        quota: &mut QuotaGuard,
        now: NaiveDateTime,
    ) -> Result<()> {
        models::validate_check_in(&check_in)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
        quota.try_consume(Feature::CheckIn, now)?;

        let mut metrics = self.state.metrics.clone().unwrap_or_default();
        metrics.mood = Some(check_in.mood);
        metrics.stress = Some(check_in.stress_level);
        metrics.energy = Some(check_in.energy_level);
        self.state.metrics = Some(metrics);
        self.upsert_history(check_in.date);
        self.state.check_ins.insert(0, check_in);

        let persisted = self.context.persist(STORAGE_KEY, &self.state);
        let check_ins = &self.state.check_ins;
        let pushed = self.context.push("save check-ins", |remote, user| {
            remote.set("wellnessCheckIns", user, json!({ "checkIns": check_ins }))
        });
        let metrics_pushed = self.sync_metrics_and_history();
        self.status = status_of(persisted, merge_pushes(pushed, metrics_pushed));
        Ok(())
    }

    /// Append an exercise log. Quota-guarded.
    pub fn add_exercise_log(
        &mut self,
        name: &str,
        duration_min: f64,
        calories: Option<f64>,
        quota: &mut QuotaGuard,
        now: NaiveDateTime,
    ) -> Result<String> {
        quota.try_consume(Feature::ExerciseLog, now)?;
        let id = Uuid::new_v4().to_string();
        self.state.exercise_logs.push(ExerciseLog {
            id: id.clone(),
            date: now.date(),
            name: name.to_string(),
            duration_min,
            calories,
        });
        let persisted = self.context.persist(STORAGE_KEY, &self.state);
        let logs = &self.state.exercise_logs;
        let pushed = self.context.push("save exercise logs", |remote, user| {
            remote.set("exerciseLogs", user, json!({ "logs": logs }))
        });
        self.status = status_of(persisted, pushed);
        Ok(id)
    }

    /// Append a meal log. Quota-guarded.
    pub fn add_meal_log(
        &mut self,
        name: &str,
        calories: Option<f64>,
        meal_type: Option<String>,
        quota: &mut QuotaGuard,
        now: NaiveDateTime,
    ) -> Result<String> {
        quota.try_consume(Feature::MealLog, now)?;
        let id = Uuid::new_v4().to_string();
        self.state.meal_logs.push(MealLog {
            id: id.clone(),
            date: now.date(),
            name: name.to_string(),
            calories,
            meal_type,
        });
        let persisted = self.context.persist(STORAGE_KEY, &self.state);
        let logs = &self.state.meal_logs;
        let pushed = self.context.push("save meal logs", |remote, user| {
            remote.set("mealLogs", user, json!({ "logs": logs }))
        });
        self.status = status_of(persisted, pushed);
        Ok(id)
    }

    /// Record an evening reflection, kept in date order.
    pub fn add_reflection(&mut self, entry: ReflectionEntry) {
        let position = self
            .state
            .reflections
            .partition_point(|existing| existing.date <= entry.date);
        self.state.reflections.insert(position, entry);
        let persisted = self.context.persist(STORAGE_KEY, &self.state);
        let entries = &self.state.reflections;
        let pushed = self.context.push("save reflections", |remote, user| {
            remote.set("reflections", user, json!({ "entries": entries }))
        });
        self.status = status_of(persisted, pushed);
    }

    fn upsert_history(&mut self, today: NaiveDate) {
        let Some(metrics) = self.state.metrics.clone() else {
            return;
        };
        match self
            .state
            .history
            .iter_mut()
            .find(|point| point.date == today)
        {
            Some(point) => point.metrics = metrics,
            None => {
                self.state.history.push(HistoryPoint {
                    date: today,
                    metrics,
                });
                self.state.history.sort_by_key(|point| point.date);
            }
        }
    }

    fn sync_metrics_and_history(&self) -> Option<bool> {
        let metrics = &self.state.metrics;
        let history = &self.state.history;
        let first = self.context.push("save metrics", |remote, user| {
            remote.set("healthMetrics", user, json!(metrics))
        });
        let second = self.context.push("save history", |remote, user| {
            remote.set("healthHistory", user, json!({ "history": history }))
        });
        merge_pushes(first, second)
    }
}

/// Combine two push results: any failure wins, any success beats none.
fn merge_pushes(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), _) | (_, Some(true)) => Some(true),
        (None, None) => None,
    }
}
