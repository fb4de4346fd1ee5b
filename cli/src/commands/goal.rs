use anyhow::{Result, bail};
use chrono::Utc;
use tabled::{Table, Tabled, settings::Style};

use verve_core::models::{self, GoalCategory, GoalStatus, GoalUpdate, NewGoal};
use verve_core::stores::{GoalStore, SyncContext};

use super::helpers::{parse_date, print_json, truncate};

fn parse_category(s: &str) -> Result<GoalCategory> {
    match s.to_lowercase().as_str() {
        "business" => Ok(GoalCategory::Business),
        "personal" => Ok(GoalCategory::Personal),
        "health" => Ok(GoalCategory::Health),
        "learning" => Ok(GoalCategory::Learning),
        _ => bail!("Invalid category '{s}'. Use business, personal, health, or learning"),
    }
}

fn resolve_goal(store: &GoalStore, reference: &str) -> Result<String> {
    let matches: Vec<String> = store
        .goals()
        .iter()
        .filter(|goal| goal.id.starts_with(reference) || goal.title.eq_ignore_ascii_case(reference))
        .map(|goal| goal.id.clone())
        .collect();
    match matches.as_slice() {
        [] => bail!("No goal matching '{reference}'"),
        [id] => Ok(id.clone()),
        _ => bail!("'{reference}' is ambiguous; use a longer id prefix"),
    }
}

pub(crate) fn cmd_goal_add(
    context: &SyncContext,
    title: &str,
    description: Option<String>,
    category: &str,
    deadline: Option<String>,
    json: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let deadline = deadline.map(|d| parse_date(Some(d))).transpose()?;
    let mut store = GoalStore::new(context.clone());
    let id = store.add_goal(
        NewGoal {
            title: title.to_string(),
            description,
            category,
            deadline,
        },
        Utc::now(),
    );

    if json {
        if let Some(goal) = store.goal(&id) {
            return print_json(goal);
        }
    }
    let short: String = id.chars().take(8).collect();
    println!("Goal added [{short}]: {title}");
    Ok(())
}

pub(crate) fn cmd_goal_list(context: &SyncContext, json: bool) -> Result<()> {
    let store = GoalStore::new(context.clone());

    if json {
        return print_json(&store.goals());
    }
    if store.goals().is_empty() {
        eprintln!("No goals yet. Use `verve goal add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Id")]
        id: String,
        #[tabled(rename = "Goal")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Deadline")]
        deadline: String,
    }

    let rows: Vec<GoalRow> = store
        .goals()
        .iter()
        .map(|goal| GoalRow {
            id: goal.id.chars().take(8).collect(),
            title: truncate(&goal.title, 35),
            category: format!("{:?}", goal.category).to_lowercase(),
            progress: format!("{:.0}%", goal.progress),
            status: format!("{:?}", goal.status).to_lowercase(),
            deadline: goal.deadline.map(|d| d.to_string()).unwrap_or_default(),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_goal_progress(
    context: &SyncContext,
    reference: &str,
    percent: f64,
    json: bool,
) -> Result<()> {
    models::validate_progress(percent)?;
    let mut store = GoalStore::new(context.clone());
    let id = resolve_goal(&store, reference)?;
    store.update_goal(
        &id,
        GoalUpdate {
            progress: Some(percent),
            ..GoalUpdate::default()
        },
        Utc::now(),
    );

    if json {
        if let Some(goal) = store.goal(&id) {
            return print_json(goal);
        }
    }
    println!("Progress set to {percent:.0}%");
    Ok(())
}

pub(crate) fn cmd_goal_done(context: &SyncContext, reference: &str, json: bool) -> Result<()> {
    let mut store = GoalStore::new(context.clone());
    let id = resolve_goal(&store, reference)?;
    store.set_status(&id, GoalStatus::Completed, Utc::now());

    if json {
        if let Some(goal) = store.goal(&id) {
            return print_json(goal);
        }
    }
    println!("Goal completed");
    Ok(())
}
