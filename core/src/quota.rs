//! Per-feature usage ceilings keyed by subscription tier. Counters roll
//! over on calendar-period boundaries; a rejected attempt never consumes
//! quota.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Pro,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Monthly,
}

/// Quota-guarded features. Plan generation resets monthly, day-to-day
/// logging resets daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    WorkoutPlan,
    MealPlan,
    CoachMessage,
    ExerciseLog,
    MealLog,
    CheckIn,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::WorkoutPlan,
        Feature::MealPlan,
        Feature::CoachMessage,
        Feature::ExerciseLog,
        Feature::MealLog,
        Feature::CheckIn,
    ];

    #[must_use]
    pub fn period(self) -> Period {
        match self {
            Feature::WorkoutPlan | Feature::MealPlan => Period::Monthly,
            _ => Period::Daily,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Feature::WorkoutPlan => "workout plans",
            Feature::MealPlan => "meal plans",
            Feature::CoachMessage => "coach messages",
            Feature::ExerciseLog => "exercise logs",
            Feature::MealLog => "meal logs",
            Feature::CheckIn => "wellness check-ins",
        };
        f.write_str(label)
    }
}

/// Per-feature ceilings for one tier. `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub workout_plans_per_month: Option<u32>,
    pub meal_plans_per_month: Option<u32>,
    pub coach_messages_per_day: Option<u32>,
    pub exercise_logs_per_day: Option<u32>,
    pub meal_logs_per_day: Option<u32>,
    pub check_ins_per_day: Option<u32>,
}

impl QuotaLimits {
    #[must_use]
    pub fn limit(&self, feature: Feature) -> Option<u32> {
        match feature {
            Feature::WorkoutPlan => self.workout_plans_per_month,
            Feature::MealPlan => self.meal_plans_per_month,
            Feature::CoachMessage => self.coach_messages_per_day,
            Feature::ExerciseLog => self.exercise_logs_per_day,
            Feature::MealLog => self.meal_logs_per_day,
            Feature::CheckIn => self.check_ins_per_day,
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        QuotaLimits {
            workout_plans_per_month: None,
            meal_plans_per_month: None,
            coach_messages_per_day: None,
            exercise_logs_per_day: None,
            meal_logs_per_day: None,
            check_ins_per_day: None,
        }
    }
}

/// Tier-to-limits table. Deserializable so an operator can override the
/// shipped defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub free: QuotaLimits,
    pub basic: QuotaLimits,
    pub pro: QuotaLimits,
    pub premium: QuotaLimits,
}

impl QuotaConfig {
    #[must_use]
    pub fn limits(&self, plan: SubscriptionPlan) -> &QuotaLimits {
        match plan {
            SubscriptionPlan::Free => &self.free,
            SubscriptionPlan::Basic => &self.basic,
            SubscriptionPlan::Pro => &self.pro,
            SubscriptionPlan::Premium => &self.premium,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        QuotaConfig {
            free: QuotaLimits {
                workout_plans_per_month: Some(3),
                meal_plans_per_month: Some(3),
                coach_messages_per_day: Some(5),
                exercise_logs_per_day: Some(5),
                meal_logs_per_day: Some(5),
                check_ins_per_day: Some(1),
            },
            basic: QuotaLimits {
                workout_plans_per_month: Some(10),
                meal_plans_per_month: Some(10),
                coach_messages_per_day: Some(20),
                exercise_logs_per_day: Some(20),
                meal_logs_per_day: Some(20),
                check_ins_per_day: Some(3),
            },
            pro: QuotaLimits {
                workout_plans_per_month: Some(50),
                meal_plans_per_month: Some(50),
                coach_messages_per_day: Some(100),
                exercise_logs_per_day: Some(100),
                meal_logs_per_day: Some(100),
                check_ins_per_day: Some(10),
            },
            premium: QuotaLimits::unlimited(),
        }
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn period_bounds(period: Period, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let today = now.date();
    match period {
        Period::Daily => {
            let end = today.succ_opt().map_or(now, start_of_day);
            (start_of_day(today), end)
        }
        Period::Monthly => {
            let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                .map_or(now, start_of_day);
            let next = if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            };
            (first, next.map_or(now, start_of_day))
        }
    }
}

/// One feature's usage within its current period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaCounter {
    pub used: u32,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
}

/// Tracks usage against one tier's limits. Serialize the whole guard to
/// persist counters across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaGuard {
    limits: QuotaLimits,
    counters: HashMap<Feature, QuotaCounter>,
}

impl QuotaGuard {
    #[must_use]
    pub fn new(limits: QuotaLimits) -> Self {
        QuotaGuard {
            limits,
            counters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    /// Consume one unit of quota for `feature`, rolling the counter into a
    /// fresh period first when `now` has passed the period end. Rollover
    /// precedes the limit check so a stale counter never blocks a new
    /// period's first operation. Returns the post-increment count; a
    /// rejected attempt leaves the counter untouched.
    pub fn try_consume(&mut self, feature: Feature, now: NaiveDateTime) -> Result<u32> {
        let (start, end) = period_bounds(feature.period(), now);
        let counter = self
            .counters
            .entry(feature)
            .or_insert_with(|| QuotaCounter {
                used: 0,
                period_start: start,
                period_end: end,
            });

        if now >= counter.period_end {
            counter.used = 0;
            counter.period_start = start;
            counter.period_end = end;
        }

        if let Some(limit) = self.limits.limit(feature) {
            if counter.used + 1 > limit {
                return Err(CoreError::QuotaExceeded { feature, limit });
            }
        }

        counter.used += 1;
        Ok(counter.used)
    }

    /// Usage within the period containing `now`. A counter from an expired
    /// period reads as zero.
    #[must_use]
    pub fn used(&self, feature: Feature, now: NaiveDateTime) -> u32 {
        match self.counters.get(&feature) {
            Some(counter) if now < counter.period_end => counter.used,
            _ => 0,
        }
    }

    #[must_use]
    pub fn remaining(&self, feature: Feature, now: NaiveDateTime) -> Option<u32> {
        self.limits
            .limit(feature)
            .map(|limit| limit.saturating_sub(self.used(feature, now)))
    }

    /// Fraction of the limit consumed, clamped to 1.0. Unlimited features
    /// always read as 0.
    #[must_use]
    pub fn usage_fraction(&self, feature: Feature, now: NaiveDateTime) -> f64 {
        match self.limits.limit(feature) {
            Some(limit) if limit > 0 => {
                (f64::from(self.used(feature, now)) / f64::from(limit)).min(1.0)
            }
            _ => 0.0,
        }
    }

    /// True once 80% of the limit is consumed.
    #[must_use]
    pub fn near_limit(&self, feature: Feature, now: NaiveDateTime) -> bool {
        match self.limits.limit(feature) {
            Some(limit) => f64::from(self.used(feature, now)) >= f64::from(limit) * 0.8,
            None => false,
        }
    }
}
