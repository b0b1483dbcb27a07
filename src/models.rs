use std::ops::RangeInclusive;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DashboardError;

/// One completed self-assessment. Numeric answers stay optional because the
/// survey data is self-reported and frequently incomplete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub timestamp: Option<NaiveDateTime>,
    pub email: String,
    pub name: String,
    pub age: Option<f64>,
    pub gender: String,
    pub occupation: String,
    pub sleep_hours: Option<f64>,
    pub exercise_freq: String,
    pub diet_quality: String,
    pub stress_level: Option<f64>,
    pub anxiety_level: Option<f64>,
    pub depression_level: Option<f64>,
    pub social_interaction: String,
    pub work_life_balance: String,
    pub coping_methods: String,
    pub past_mental_illness: String,
    pub current_medication: String,
    pub medication_details: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::Moderate => "Moderate",
            RiskLabel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub label: RiskLabel,
    pub explanations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counsellor {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub phone: String,
    pub booking_url: String,
}

pub const RATING_RANGE: RangeInclusive<i32> = 1..=5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: NaiveDateTime,
    pub email: String,
    pub name: String,
    pub rating: i32,
    pub feedback: String,
}

impl FeedbackEntry {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if !RATING_RANGE.contains(&self.rating) {
            return Err(DashboardError::RatingOutOfRange(self.rating));
        }
        if self.feedback.trim().is_empty() {
            return Err(DashboardError::EmptyFeedback);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCount {
    pub rating: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub count: usize,
}

/// Windowed feedback, newest first, with the rating histogram and per-day volume.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackDigest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub entries: Vec<FeedbackEntry>,
    pub rating_counts: Vec<RatingCount>,
    pub daily_volume: Vec<DailyVolume>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub email_contains: Option<String>,
    pub min_sleep: Option<f64>,
    pub max_sleep: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRisk {
    pub date: NaiveDate,
    pub submission_count: usize,
    pub mean_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub date: NaiveDate,
    pub label: RiskLabel,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WindowSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub submission_count: usize,
    pub mean_risk: Option<f64>,
    pub daily: Vec<DailyRisk>,
    pub bucket_mix: Vec<BucketShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRisk {
    pub email: String,
    pub mean_risk: f64,
    pub submission_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAlert {
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub email: String,
    pub name: String,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub stress_level: Option<f64>,
    pub anxiety_level: Option<f64>,
    pub depression_level: Option<f64>,
    pub risk: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    pub values: Vec<Vec<Option<f64>>>,
    pub row_count: usize,
}

/// Submission counts indexed by weekday (Monday first) then hour of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingGrid {
    pub counts: [[usize; 24]; 7],
}

/// Field-wise admin edit; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct SubmissionPatch {
    pub timestamp: Option<NaiveDateTime>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub sleep_hours: Option<f64>,
    pub exercise_freq: Option<String>,
    pub diet_quality: Option<String>,
    pub stress_level: Option<f64>,
    pub anxiety_level: Option<f64>,
    pub depression_level: Option<f64>,
    pub social_interaction: Option<String>,
    pub work_life_balance: Option<String>,
    pub past_mental_illness: Option<String>,
    pub current_medication: Option<String>,
}

impl SubmissionPatch {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.email.is_none()
            && self.name.is_none()
            && self.sleep_hours.is_none()
            && self.exercise_freq.is_none()
            && self.diet_quality.is_none()
            && self.stress_level.is_none()
            && self.anxiety_level.is_none()
            && self.depression_level.is_none()
            && self.social_interaction.is_none()
            && self.work_life_balance.is_none()
            && self.past_mental_illness.is_none()
            && self.current_medication.is_none()
    }

    pub fn apply(&self, submission: &mut Submission) {
        if let Some(timestamp) = self.timestamp {
            submission.timestamp = Some(timestamp);
        }
        if let Some(value) = self.sleep_hours {
            submission.sleep_hours = Some(value);
        }
        if let Some(value) = self.stress_level {
            submission.stress_level = Some(value);
        }
        if let Some(value) = self.anxiety_level {
            submission.anxiety_level = Some(value);
        }
        if let Some(value) = self.depression_level {
            submission.depression_level = Some(value);
        }

        let text_fields = [
            (&self.email, &mut submission.email),
            (&self.name, &mut submission.name),
            (&self.exercise_freq, &mut submission.exercise_freq),
            (&self.diet_quality, &mut submission.diet_quality),
            (&self.social_interaction, &mut submission.social_interaction),
            (&self.work_life_balance, &mut submission.work_life_balance),
            (&self.past_mental_illness, &mut submission.past_mental_illness),
            (&self.current_medication, &mut submission.current_medication),
        ];
        for (patch, field) in text_fields {
            if let Some(value) = patch {
                *field = value.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_given_fields() {
        let mut submission = Submission {
            email: "old@example.com".to_string(),
            stress_level: Some(3.0),
            anxiety_level: Some(4.0),
            diet_quality: "Average".to_string(),
            ..Default::default()
        };
        let patch = SubmissionPatch {
            stress_level: Some(9.0),
            diet_quality: Some("Poor".to_string()),
            ..Default::default()
        };

        assert!(!patch.is_empty());
        patch.apply(&mut submission);

        assert_eq!(submission.stress_level, Some(9.0));
        assert_eq!(submission.anxiety_level, Some(4.0));
        assert_eq!(submission.diet_quality, "Poor");
        assert_eq!(submission.email, "old@example.com");
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(SubmissionPatch::default().is_empty());
    }

    #[test]
    fn label_display_matches_name() {
        assert_eq!(RiskLabel::Moderate.to_string(), "Moderate");
    }

    fn feedback(rating: i32, text: &str) -> FeedbackEntry {
        FeedbackEntry {
            timestamp: NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            rating,
            feedback: text.to_string(),
        }
    }

    #[test]
    fn feedback_rating_is_one_to_five() {
        assert!(feedback(1, "ok").validate().is_ok());
        assert!(feedback(5, "great").validate().is_ok());
        assert!(matches!(
            feedback(6, "great").validate(),
            Err(DashboardError::RatingOutOfRange(6))
        ));
        assert!(matches!(
            feedback(0, "meh").validate(),
            Err(DashboardError::RatingOutOfRange(0))
        ));
    }

    #[test]
    fn blank_feedback_is_rejected() {
        assert!(matches!(
            feedback(4, "   ").validate(),
            Err(DashboardError::EmptyFeedback)
        ));
    }
}
