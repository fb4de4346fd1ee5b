use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Health metrics ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLevel {
    Excellent,
    Good,
    Okay,
    Low,
    Struggling,
}

impl MoodLevel {
    /// Numeric score used when mood joins a numeric series (correlation,
    /// forecast baselines).
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            MoodLevel::Excellent => 92.0,
            MoodLevel::Good => 78.0,
            MoodLevel::Okay => 62.0,
            MoodLevel::Low => 45.0,
            MoodLevel::Struggling => 30.0,
        }
    }
}

/// A day's raw health metrics. `steps` is always present; everything else
/// depends on what the user (or a connected device) logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(default)]
    pub steps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
}

/// Named accessor for the numeric series of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Steps,
    HeartRate,
    Sleep,
    Calories,
    Water,
    Stress,
    Energy,
    Mood,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Metric::Steps => "steps",
            Metric::HeartRate => "heart rate",
            Metric::Sleep => "sleep",
            Metric::Calories => "calories",
            Metric::Water => "water",
            Metric::Stress => "stress",
            Metric::Energy => "energy",
            Metric::Mood => "mood",
        };
        write!(f, "{label}")
    }
}

impl HealthMetrics {
    /// The numeric value of a metric, if logged. Mood maps through its
    /// fixed score table so it can join numeric series.
    #[must_use]
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Steps => Some(self.steps),
            Metric::HeartRate => self.heart_rate,
            Metric::Sleep => self.sleep,
            Metric::Calories => self.calories,
            Metric::Water => self.water,
            Metric::Stress => self.stress,
            Metric::Energy => self.energy,
            Metric::Mood => self.mood.map(MoodLevel::score),
        }
    }
}

/// One calendar day of history. At most one point exists per day; a
/// same-day update overwrites the metrics rather than appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub metrics: HealthMetrics,
}

// --- Check-ins, logs, reflections ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessCheckIn {
    pub id: String,
    pub date: NaiveDate,
    pub mood: MoodLevel,
    pub stress_level: f64,
    pub energy_level: f64,
    pub sleep_quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    pub duration_min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLog {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectionMood {
    Grounded,
    Energized,
    Stretched,
    Fatigued,
    Centered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub id: String,
    pub date: NaiveDate,
    pub gratitude: String,
    pub challenge: String,
    pub intention: String,
    pub mood_tag: ReflectionMood,
    pub energy_score: f64,
    pub clarity_score: f64,
}

// --- Shopping list ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub checked: bool,
}

// --- Journal ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalAnalysis {
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    pub actionable_advice: String,
    /// 1-10 alignment with the user's stated goals.
    pub strategic_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<JournalAnalysis>,
}

#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub content: String,
    pub tags: Vec<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JournalUpdate {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub mood: Option<Option<String>>,
}

// --- Goals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Business,
    Personal,
    Health,
    Learning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: String,
    pub description: String,
    pub target: f64,
    pub current: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: GoalCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub status: GoalStatus,
    /// 0-100.
    pub progress: f64,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<NaiveDate>>,
    pub progress: Option<f64>,
    pub key_results: Option<Vec<KeyResult>>,
}

// --- Weekly reviews ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Draft,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyReview {
    pub id: String,
    pub user_id: String,
    /// Monday of the reviewed week; the natural key together with `user_id`.
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub wins: String,
    pub improvements: String,
    pub lessons: String,
    pub productivity_score: f64,
    pub energy_score: f64,
    pub clarity_score: f64,
    pub priorities_next_week: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone)]
pub struct NewWeeklyReview {
    pub week_start_date: NaiveDate,
    pub wins: String,
    pub improvements: String,
    pub lessons: String,
    pub productivity_score: f64,
    pub energy_score: f64,
    pub clarity_score: f64,
    pub priorities_next_week: String,
    pub status: ReviewStatus,
}

// --- Challenges & leaderboard ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeParticipant {
    pub user_id: String,
    pub user_name: String,
    pub progress: f64,
    pub joined_at: DateTime<Utc>,
    /// Dense 1-based rank within the challenge; 0 until the first ranking pass.
    #[serde(default)]
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<ChallengeParticipant>,
}

#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub user_name: String,
    pub score: f64,
    #[serde(default)]
    pub rank: u32,
}

// --- Validation ---

/// Validate a check-in: stress and energy on a 0-10 scale, sleep quality 1-10.
pub fn validate_check_in(check_in: &WellnessCheckIn) -> Result<()> {
    if !(0.0..=10.0).contains(&check_in.stress_level) {
        bail!("Stress level must be between 0 and 10");
    }
    if !(0.0..=10.0).contains(&check_in.energy_level) {
        bail!("Energy level must be between 0 and 10");
    }
    if !(1.0..=10.0).contains(&check_in.sleep_quality) {
        bail!("Sleep quality must be between 1 and 10");
    }
    Ok(())
}

/// Validate review scores: all three on a 1-10 scale.
pub fn validate_review_scores(productivity: f64, energy: f64, clarity: f64) -> Result<()> {
    for (label, score) in [
        ("productivity", productivity),
        ("energy", energy),
        ("clarity", clarity),
    ] {
        if !(1.0..=10.0).contains(&score) {
            bail!("Review {label} score must be between 1 and 10 (got {score})");
        }
    }
    Ok(())
}

/// Validate a goal progress value (0-100).
pub fn validate_progress(progress: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&progress) {
        bail!("Progress must be between 0 and 100 (got {progress})");
    }
    Ok(())
}

/// Validate challenge dates: the end must not precede the start.
pub fn validate_challenge_dates(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        bail!("Challenge end date {end} precedes start date {start}");
    }
    Ok(())
}
