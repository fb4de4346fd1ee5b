use anyhow::{Result, bail};
use chrono::Local;
use serde_json::json;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};
use uuid::Uuid;

use verve_core::analytics::{self, Trend};
use verve_core::models::{HealthMetrics, Metric, WellnessCheckIn};
use verve_core::stores::{HealthStore, SyncContext};

use super::helpers::{load_quota, parse_date, parse_mood, print_json, save_quota};

pub(crate) fn cmd_checkin(
    context: &SyncContext,
    mood: &str,
    stress: f64,
    energy: f64,
    sleep_quality: f64,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let mood = parse_mood(mood)?;
    let check_in = WellnessCheckIn {
        id: Uuid::new_v4().to_string(),
        date: Local::now().date_naive(),
        mood,
        stress_level: stress,
        energy_level: energy,
        sleep_quality,
        notes,
    };

    let mut quota = load_quota(context.storage.as_ref())?;
    let mut store = HealthStore::new(context.clone());
    store.add_check_in(check_in, &mut quota, Local::now().naive_local())?;
    save_quota(context.storage.as_ref(), &quota)?;

    if json {
        if let Some(check_in) = store.check_ins().first() {
            return print_json(check_in);
        }
        return print_json(&json!(null));
    }
    println!("Check-in recorded (mood: {mood:?}, stress: {stress}, energy: {energy})");
    Ok(())
}

pub(crate) fn cmd_metrics_log(
    context: &SyncContext,
    steps: Option<f64>,
    sleep: Option<f64>,
    heart_rate: Option<f64>,
    calories: Option<f64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let mut store = HealthStore::new(context.clone());
    let mut metrics = store.metrics().cloned().unwrap_or_default();
    if let Some(steps) = steps {
        metrics.steps = steps;
    }
    if let Some(sleep) = sleep {
        metrics.sleep = Some(sleep);
    }
    if let Some(heart_rate) = heart_rate {
        metrics.heart_rate = Some(heart_rate);
    }
    if let Some(calories) = calories {
        metrics.calories = Some(calories);
    }
    store.update_metrics(metrics.clone(), date);

    if json {
        return print_json(&metrics);
    }
    println!("Logged metrics for {date}");
    Ok(())
}

pub(crate) fn cmd_metrics_show(context: &SyncContext, json: bool) -> Result<()> {
    let store = HealthStore::new(context.clone());
    let Some(metrics) = store.metrics() else {
        if json {
            return print_json(&json!(null));
        }
        eprintln!("No metrics logged yet. Use `verve metrics log` to start.");
        return Ok(());
    };

    if json {
        return print_json(metrics);
    }

    #[derive(Tabled)]
    struct MetricRow {
        #[tabled(rename = "Metric")]
        metric: String,
        #[tabled(rename = "Today")]
        value: String,
        #[tabled(rename = "7-day avg")]
        average: String,
        #[tabled(rename = "Trend")]
        trend: String,
    }

    let history = store.history();
    let rows: Vec<MetricRow> = [
        Metric::Steps,
        Metric::Sleep,
        Metric::Water,
        Metric::HeartRate,
        Metric::Calories,
        Metric::Stress,
        Metric::Energy,
    ]
    .into_iter()
    .filter_map(|metric| {
        let value = metrics.value(metric)?;
        let average = analytics::metric_average(history, metric);
        let trend = match analytics::metric_trend(history, metric) {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        };
        Some(MetricRow {
            metric: metric.to_string(),
            value: format!("{value:.1}"),
            average: format!("{average:.1}"),
            trend: trend.to_string(),
        })
    })
    .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_water(
    context: &SyncContext,
    liters: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if liters <= 0.0 {
        bail!("Water amount must be greater than 0");
    }
    let date = parse_date(date)?;
    let mut store = HealthStore::new(context.clone());
    store.log_water(liters, date);
    let total = store
        .metrics()
        .and_then(|m| m.water)
        .unwrap_or(0.0);

    if json {
        return print_json(&json!({ "date": date, "water": total }));
    }
    println!("Water logged: {total:.2}L total for {date}");
    Ok(())
}
