use crate::models::{RiskAssessment, RiskLabel, Submission};

const STRESS_WEIGHT: f64 = 0.45;
const ANXIETY_WEIGHT: f64 = 0.35;
const DEPRESSION_WEIGHT: f64 = 0.20;

const NUDGE_LIMIT: f64 = 1.0;
const MAX_EXPLANATIONS: usize = 4;

pub fn score_submission(submission: &Submission) -> f64 {
    let base = numeric(submission.stress_level) * STRESS_WEIGHT
        + numeric(submission.anxiety_level) * ANXIETY_WEIGHT
        + numeric(submission.depression_level) * DEPRESSION_WEIGHT;

    let nudges = lifestyle_nudges(submission).clamp(-NUDGE_LIMIT, NUDGE_LIMIT);
    round_to(clamp_score(base + nudges), 1)
}

pub fn assess(submission: &Submission) -> RiskAssessment {
    let score = score_submission(submission);
    RiskAssessment {
        score,
        label: RiskLabel::from_score(score),
        explanations: explain(submission),
    }
}

impl RiskLabel {
    /// `>= 7` High, `>= 4` Moderate, otherwise Low.
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            RiskLabel::High
        } else if score >= 4.0 {
            RiskLabel::Moderate
        } else {
            RiskLabel::Low
        }
    }
}

/// Unclamped sum of lifestyle adjustments.
pub fn lifestyle_nudges(submission: &Submission) -> f64 {
    let mut nudges = 0.0;

    let sleep = numeric(submission.sleep_hours);
    if sleep < 6.0 {
        nudges += 0.4;
    } else if (7.0..=9.0).contains(&sleep) {
        nudges -= 0.2;
    }

    match submission.exercise_freq.trim() {
        "None" => nudges += 0.2,
        "3-5 days/week" | "Daily" => nudges -= 0.2,
        _ => {}
    }

    match submission.diet_quality.trim() {
        "Poor" => nudges += 0.2,
        "Good" | "Excellent" => nudges -= 0.1,
        _ => {}
    }

    match submission.work_life_balance.trim() {
        "Poor" => nudges += 0.3,
        "Good" | "Excellent" => nudges -= 0.1,
        _ => {}
    }

    match submission.social_interaction.trim() {
        "Rarely" => nudges += 0.2,
        "Often" | "Daily" => nudges -= 0.1,
        _ => {}
    }

    if is_yes(&submission.past_mental_illness) {
        nudges += 0.2;
    }
    if is_yes(&submission.current_medication) {
        nudges += 0.1;
    }

    nudges
}

/// Short lifestyle notes shown next to a score.
pub fn explain(submission: &Submission) -> Vec<String> {
    let mut notes = Vec::new();

    let sleep = numeric(submission.sleep_hours);
    if sleep < 6.0 {
        notes.push("Short sleep (<6h): consider a consistent bedtime routine.".to_string());
    } else if (7.0..=9.0).contains(&sleep) {
        notes.push("Good sleep range, positive for mood regulation.".to_string());
    }
    if submission.exercise_freq.trim() == "None" {
        notes.push("Try light activity 2-3 times a week to help reduce stress.".to_string());
    }
    if submission.diet_quality.trim() == "Poor" {
        notes.push("Improving diet quality can support energy and mood.".to_string());
    }
    if submission.social_interaction.trim() == "Rarely" {
        notes.push("Small social check-ins can be beneficial.".to_string());
    }

    notes.truncate(MAX_EXPLANATIONS);
    notes
}

fn numeric(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn is_yes(value: &str) -> bool {
    value.trim() == "Yes"
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 10.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral(stress: f64, anxiety: f64, depression: f64) -> Submission {
        Submission {
            stress_level: Some(stress),
            anxiety_level: Some(anxiety),
            depression_level: Some(depression),
            sleep_hours: Some(6.5),
            exercise_freq: "Sometimes".to_string(),
            diet_quality: "Average".to_string(),
            social_interaction: "Sometimes".to_string(),
            work_life_balance: "Fair".to_string(),
            past_mental_illness: "No".to_string(),
            current_medication: "No".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn neutral_zero_inputs_score_zero() {
        assert_eq!(score_submission(&neutral(0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn worst_case_clamps_nudges_and_score() {
        let submission = Submission {
            sleep_hours: Some(4.0),
            exercise_freq: "None".to_string(),
            diet_quality: "Poor".to_string(),
            work_life_balance: "Poor".to_string(),
            social_interaction: "Rarely".to_string(),
            past_mental_illness: "Yes".to_string(),
            current_medication: "Yes".to_string(),
            ..neutral(10.0, 10.0, 10.0)
        };

        assert!((lifestyle_nudges(&submission) - 1.6).abs() < 1e-9);
        assert_eq!(score_submission(&submission), 10.0);
        assert_eq!(RiskLabel::from_score(10.0), RiskLabel::High);
    }

    #[test]
    fn worked_example_scores_high() {
        let submission = Submission {
            sleep_hours: Some(5.0),
            exercise_freq: "None".to_string(),
            ..neutral(8.0, 6.0, 5.0)
        };

        let assessment = assess(&submission);
        assert_eq!(assessment.score, 7.3);
        assert_eq!(assessment.label, RiskLabel::High);
    }

    #[test]
    fn missing_and_junk_numbers_count_as_zero() {
        let submission = Submission {
            stress_level: None,
            anxiety_level: Some(f64::NAN),
            depression_level: Some(f64::INFINITY),
            ..neutral(0.0, 0.0, 0.0)
        };
        assert_eq!(score_submission(&submission), 0.0);

        // Nothing filled in at all still scores, with the short-sleep nudge.
        assert_eq!(score_submission(&Submission::default()), 0.4);
    }

    #[test]
    fn score_stays_in_bounds_for_out_of_range_inputs() {
        for value in [-1e9, -50.0, -0.1, 0.0, 3.3, 10.0, 11.0, 250.0, 1e12] {
            let score = score_submission(&neutral(value, value, value));
            assert!((0.0..=10.0).contains(&score), "score {score} for {value}");
        }
    }

    #[test]
    fn positive_lifestyle_floors_at_zero() {
        let submission = Submission {
            sleep_hours: Some(8.0),
            exercise_freq: "Daily".to_string(),
            diet_quality: "Excellent".to_string(),
            work_life_balance: "Good".to_string(),
            social_interaction: "Often".to_string(),
            ..neutral(0.5, 0.0, 0.0)
        };
        assert!((lifestyle_nudges(&submission) + 0.7).abs() < 1e-9);
        assert_eq!(score_submission(&submission), 0.0);
    }

    #[test]
    fn categorical_values_are_trimmed() {
        let padded = Submission {
            exercise_freq: "  None ".to_string(),
            past_mental_illness: " Yes".to_string(),
            ..neutral(0.0, 0.0, 0.0)
        };
        assert!((lifestyle_nudges(&padded) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(RiskLabel::from_score(0.0), RiskLabel::Low);
        assert_eq!(RiskLabel::from_score(3.9), RiskLabel::Low);
        assert_eq!(RiskLabel::from_score(4.0), RiskLabel::Moderate);
        assert_eq!(RiskLabel::from_score(6.9), RiskLabel::Moderate);
        assert_eq!(RiskLabel::from_score(7.0), RiskLabel::High);
    }

    #[test]
    fn labels_never_decrease_as_score_rises() {
        let mut previous = RiskLabel::Low;
        for step in 0..=100 {
            let label = RiskLabel::from_score(step as f64 / 10.0);
            assert!(label >= previous);
            previous = label;
        }
    }

    #[test]
    fn explanations_are_capped() {
        let submission = Submission {
            sleep_hours: Some(3.0),
            exercise_freq: "None".to_string(),
            diet_quality: "Poor".to_string(),
            social_interaction: "Rarely".to_string(),
            ..Default::default()
        };
        let notes = explain(&submission);
        assert_eq!(notes.len(), 4);
        assert!(notes[0].starts_with("Short sleep"));

        assert!(explain(&neutral(5.0, 5.0, 5.0)).is_empty());
    }
}
