use anyhow::Result;
use chrono::Local;
use serde_json::json;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use verve_core::quota::Feature;
use verve_core::stores::SyncContext;

use super::helpers::{current_plan, load_quota, parse_plan, print_json, set_plan};

pub(crate) fn cmd_quota_show(context: &SyncContext, json: bool) -> Result<()> {
    let plan = current_plan(context.storage.as_ref())?;
    let guard = load_quota(context.storage.as_ref())?;
    let now = Local::now().naive_local();

    if json {
        let features: Vec<_> = Feature::ALL
            .into_iter()
            .map(|feature| {
                json!({
                    "feature": feature.to_string(),
                    "used": guard.used(feature, now),
                    "limit": guard.limits().limit(feature),
                    "remaining": guard.remaining(feature, now),
                })
            })
            .collect();
        return print_json(&json!({ "plan": plan, "features": features }));
    }

    #[derive(Tabled)]
    struct QuotaRow {
        #[tabled(rename = "Feature")]
        feature: String,
        #[tabled(rename = "Used")]
        used: u32,
        #[tabled(rename = "Limit")]
        limit: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
    }

    let rows: Vec<QuotaRow> = Feature::ALL
        .into_iter()
        .map(|feature| {
            let warn = if guard.near_limit(feature, now) { " !" } else { "" };
            QuotaRow {
                feature: feature.to_string(),
                used: guard.used(feature, now),
                limit: guard
                    .limits()
                    .limit(feature)
                    .map_or("unlimited".to_string(), |l| l.to_string()),
                remaining: guard
                    .remaining(feature, now)
                    .map_or("-".to_string(), |r| format!("{r}{warn}")),
            }
        })
        .collect();

    println!("Plan: {plan:?}");
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_quota_plan(context: &SyncContext, plan: &str, json: bool) -> Result<()> {
    let plan = parse_plan(plan)?;
    set_plan(context.storage.as_ref(), plan)?;

    if json {
        return print_json(&json!({ "plan": plan }));
    }
    println!("Subscription plan set to {plan:?} (counters reset)");
    Ok(())
}
