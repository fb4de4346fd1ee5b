use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use verve_core::models::MoodLevel;
use verve_core::quota::{QuotaConfig, QuotaGuard, SubscriptionPlan};
use verve_core::storage::{self, KeyValueStorage};

pub(crate) const QUOTA_KEY: &str = "quota-storage";
pub(crate) const PLAN_KEY: &str = "subscription-plan";

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
        },
    }
}

pub(crate) fn parse_mood(s: &str) -> Result<MoodLevel> {
    match s.to_lowercase().as_str() {
        "excellent" => Ok(MoodLevel::Excellent),
        "good" => Ok(MoodLevel::Good),
        "okay" => Ok(MoodLevel::Okay),
        "low" => Ok(MoodLevel::Low),
        "struggling" => Ok(MoodLevel::Struggling),
        _ => bail!("Invalid mood '{s}'. Use excellent, good, okay, low, or struggling"),
    }
}

pub(crate) fn parse_plan(s: &str) -> Result<SubscriptionPlan> {
    match s.to_lowercase().as_str() {
        "free" => Ok(SubscriptionPlan::Free),
        "basic" => Ok(SubscriptionPlan::Basic),
        "pro" => Ok(SubscriptionPlan::Pro),
        "premium" => Ok(SubscriptionPlan::Premium),
        _ => bail!("Invalid plan '{s}'. Use free, basic, pro, or premium"),
    }
}

pub(crate) fn current_plan(storage: &dyn KeyValueStorage) -> Result<SubscriptionPlan> {
    Ok(storage::load(storage, PLAN_KEY, SubscriptionPlan::Free)?)
}

pub(crate) fn set_plan(storage: &dyn KeyValueStorage, plan: SubscriptionPlan) -> Result<()> {
    storage::save(storage, PLAN_KEY, &plan)?;
    // Drop the old counters: limits changed with the plan.
    storage::remove(storage, QUOTA_KEY)?;
    Ok(())
}

/// Load the persisted quota guard, rebuilding it when the plan's limits
/// changed since it was saved.
pub(crate) fn load_quota(storage: &dyn KeyValueStorage) -> Result<QuotaGuard> {
    let plan = current_plan(storage)?;
    let limits = QuotaConfig::default().limits(plan).clone();
    let saved: Option<QuotaGuard> = storage::load(storage, QUOTA_KEY, None)?;
    Ok(match saved {
        Some(guard) if guard.limits() == &limits => guard,
        _ => QuotaGuard::new(limits),
    })
}

pub(crate) fn save_quota(storage: &dyn KeyValueStorage, guard: &QuotaGuard) -> Result<()> {
    Ok(storage::save(storage, QUOTA_KEY, guard)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
