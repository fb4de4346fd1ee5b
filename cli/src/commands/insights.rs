use anyhow::Result;
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};

use verve_core::analytics::{self, Impact, Severity, Trend};
use verve_core::stores::{HealthStore, SyncContext};

use super::helpers::print_json;

pub(crate) fn cmd_forecast(context: &SyncContext, json: bool) -> Result<()> {
    let store = HealthStore::new(context.clone());
    let forecast = analytics::forecast(store.history());

    if json {
        return print_json(&forecast);
    }

    if forecast.confidence == 0.0 {
        eprintln!("Not enough history for a forecast yet (3 logged days needed).");
        return Ok(());
    }

    let trend = match forecast.trend {
        Trend::Improving => "improving",
        Trend::Declining => "declining",
        Trend::Stable => "stable",
    };
    let score = forecast.predicted_score;
    let confidence = forecast.confidence * 100.0;
    println!("Wellness forecast: {score:.0}/100 ({trend}, {confidence:.0}% confidence)");
    Ok(())
}

pub(crate) fn cmd_insights(context: &SyncContext, json: bool) -> Result<()> {
    let store = HealthStore::new(context.clone());
    let history = store.history();
    let insights = analytics::correlation_insights(history);
    let anomalies = store
        .metrics()
        .map(|metrics| analytics::detect_anomalies(metrics, history))
        .unwrap_or_default();

    if json {
        return print_json(&json!({
            "correlations": insights,
            "anomalies": anomalies,
        }));
    }

    if insights.is_empty() && anomalies.is_empty() {
        eprintln!("Nothing to report yet. Correlations need 7 logged days.");
        return Ok(());
    }

    if !insights.is_empty() {
        #[derive(Tabled)]
        struct InsightRow {
            #[tabled(rename = "Factor")]
            factor: String,
            #[tabled(rename = "Impact")]
            impact: String,
            #[tabled(rename = "r")]
            score: String,
            #[tabled(rename = "What it means")]
            description: String,
        }

        let rows: Vec<InsightRow> = insights
            .iter()
            .map(|insight| InsightRow {
                factor: insight.factor.to_string(),
                impact: match insight.impact {
                    Impact::High => "high".to_string(),
                    Impact::Medium => "medium".to_string(),
                },
                score: format!("{:+.2}", insight.score),
                description: insight.description.clone(),
            })
            .collect();
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    for anomaly in &anomalies {
        let severity = match anomaly.severity {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        let metric = anomaly.metric;
        let current = anomaly.current;
        let expected = anomaly.expected;
        let percent = anomaly.deviation * 100.0;
        println!(
            "[{severity}] {metric}: {current:.1} vs {expected:.1} average ({percent:.0}% off)"
        );
    }
    Ok(())
}
