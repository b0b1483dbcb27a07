use std::fmt::Write;

use serde::Serialize;

use crate::models::{
    CorrelationMatrix, Counsellor, FeedbackDigest, RiskAlert, RiskAssessment, RiskLabel,
    TimingGrid, TrendPoint, UserRisk, WindowSummary,
};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Serialize)]
pub struct Analytics<'a> {
    pub summary: &'a WindowSummary,
    pub feedback_count: usize,
    pub alerts: &'a [RiskAlert],
    pub alert_threshold: f64,
    pub top_users: &'a [UserRisk],
    pub correlation: Option<&'a CorrelationMatrix>,
    pub timing: &'a TimingGrid,
}

pub fn render_assessment(assessment: &RiskAssessment, suggestions: &[Counsellor]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Risk score: {:.1} / 10 ({})", assessment.score, assessment.label);

    if assessment.explanations.is_empty() {
        let _ = writeln!(
            output,
            "No extra lifestyle factors detected. Keep tracking over time for better insights."
        );
    } else {
        for note in assessment.explanations.iter() {
            let _ = writeln!(output, "- {note}");
        }
    }

    if assessment.label == RiskLabel::High {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "If you're feeling overwhelmed or thinking about self-harm, please contact local \
             emergency services or a crisis hotline immediately."
        );
    }

    if !suggestions.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Suggested counsellors:");
        for counsellor in suggestions {
            let _ = writeln!(
                output,
                "- {} ({}) {} {} {}",
                counsellor.name,
                counsellor.specialty,
                counsellor.email,
                counsellor.phone,
                counsellor.booking_url
            );
        }
    }

    output
}

pub fn render_trend(email: &str, trend: &[TrendPoint]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Trend for {email}:");
    for point in trend {
        let _ = writeln!(
            output,
            "- {} stress {} anxiety {} depression {} risk {:.1}",
            point.timestamp.format("%Y-%m-%d %H:%M"),
            fmt_level(point.stress_level),
            fmt_level(point.anxiety_level),
            fmt_level(point.depression_level),
            point.risk
        );
    }
    output
}

pub fn render_analytics(analytics: &Analytics<'_>) -> String {
    let summary = analytics.summary;
    let mut output = String::new();

    let _ = writeln!(output, "# Analytics");
    if let (Some(from), Some(to)) = (summary.from, summary.to) {
        let _ = writeln!(output, "Window {from} to {to}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Submissions: {}", summary.submission_count);
    let _ = writeln!(
        output,
        "Average risk: {}",
        summary
            .mean_risk
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(output, "Feedback: {}", analytics.feedback_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily");
    if summary.daily.is_empty() {
        let _ = writeln!(output, "No submissions in this window.");
    } else {
        for day in summary.daily.iter() {
            let mix: Vec<String> = summary
                .bucket_mix
                .iter()
                .filter(|share| share.date == day.date)
                .map(|share| format!("{} {:.1}%", share.label, share.percent))
                .collect();
            let _ = writeln!(
                output,
                "- {}: {} submissions, avg risk {:.2} ({})",
                day.date,
                day.submission_count,
                day.mean_risk,
                mix.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## High-risk alerts (risk >= {:.1})", analytics.alert_threshold);
    if analytics.alerts.is_empty() {
        let _ = writeln!(output, "No recent submissions above the threshold.");
    } else {
        for alert in analytics.alerts {
            let _ = writeln!(
                output,
                "- {} {} ({}) risk {:.1} [{}]",
                alert.timestamp.format("%Y-%m-%d %H:%M"),
                alert.email,
                alert.name,
                alert.risk,
                alert.id
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top at-risk users");
    if analytics.top_users.is_empty() {
        let _ = writeln!(output, "Not enough recent data for ranking.");
    } else {
        for user in analytics.top_users {
            let _ = writeln!(
                output,
                "- {} avg risk {:.2} across {} submissions",
                user.email, user.mean_risk, user.submission_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Correlation");
    match analytics.correlation {
        None => {
            let _ = writeln!(output, "Not enough complete submissions.");
        }
        Some(matrix) => {
            let _ = writeln!(output, "{:>18} {}", "", matrix.columns.join(" "));
            for (name, row) in matrix.columns.iter().zip(matrix.values.iter()) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|value| match value {
                        Some(r) => format!("{r:>6.2}"),
                        None => format!("{:>6}", "-"),
                    })
                    .collect();
                let _ = writeln!(output, "{name:>18} {}", cells.join(" "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Busiest submission hours");
    let busiest = busiest_slots(analytics.timing, 3);
    if busiest.is_empty() {
        let _ = writeln!(output, "No submissions in this window.");
    } else {
        for (weekday, hour, count) in busiest {
            let _ = writeln!(output, "- {} {:02}:00 ({} submissions)", WEEKDAYS[weekday], hour, count);
        }
    }

    output
}

pub fn render_feedback(digest: &FeedbackDigest) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Feedback");
    let _ = writeln!(output, "Window {} to {}", digest.from, digest.to);
    let _ = writeln!(output, "Entries: {}", digest.entries.len());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ratings");
    for bucket in digest.rating_counts.iter() {
        let _ = writeln!(output, "- {}: {}", bucket.rating, bucket.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily volume");
    if digest.daily_volume.is_empty() {
        let _ = writeln!(output, "No feedback in this window.");
    } else {
        for day in digest.daily_volume.iter() {
            let _ = writeln!(output, "- {}: {}", day.date, day.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Entries");
    if digest.entries.is_empty() {
        let _ = writeln!(output, "None.");
    }
    for entry in digest.entries.iter() {
        let who = if entry.name.trim().is_empty() {
            "anonymous"
        } else {
            entry.name.trim()
        };
        let _ = writeln!(
            output,
            "- {} {} ({}/5): {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            who,
            entry.rating,
            entry.feedback
        );
    }

    output
}

fn busiest_slots(grid: &TimingGrid, limit: usize) -> Vec<(usize, usize, usize)> {
    let mut slots: Vec<(usize, usize, usize)> = grid
        .counts
        .iter()
        .enumerate()
        .flat_map(|(weekday, hours)| {
            hours
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(move |(hour, count)| (weekday, hour, *count))
        })
        .collect();

    slots.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (a.0, a.1).cmp(&(b.0, b.1))));
    slots.truncate(limit);
    slots
}

fn fmt_level(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::seed_counsellors;

    #[test]
    fn high_assessment_includes_safety_note_and_suggestions() {
        let assessment = RiskAssessment {
            score: 7.3,
            label: RiskLabel::High,
            explanations: vec!["Short sleep (<6h): consider a consistent bedtime routine.".to_string()],
        };
        let text = render_assessment(&assessment, &seed_counsellors()[..2]);

        assert!(text.starts_with("Risk score: 7.3 / 10 (High)"));
        assert!(text.contains("crisis hotline"));
        assert!(text.contains("Dr. Ayesha Khan"));
    }

    #[test]
    fn low_assessment_has_no_safety_note() {
        let assessment = RiskAssessment {
            score: 1.0,
            label: RiskLabel::Low,
            explanations: Vec::new(),
        };
        let text = render_assessment(&assessment, &[]);
        assert!(!text.contains("crisis hotline"));
        assert!(text.contains("No extra lifestyle factors"));
    }

    #[test]
    fn empty_analytics_renders_placeholders() {
        let summary = WindowSummary::default();
        let timing = TimingGrid {
            counts: [[0; 24]; 7],
        };
        let text = render_analytics(&Analytics {
            summary: &summary,
            feedback_count: 0,
            alerts: &[],
            alert_threshold: 7.0,
            top_users: &[],
            correlation: None,
            timing: &timing,
        });

        assert!(text.contains("Average risk: -"));
        assert!(text.contains("No submissions in this window."));
        assert!(text.contains("Not enough complete submissions."));
    }

    #[test]
    fn feedback_report_lists_ratings_volume_and_entries() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let digest = FeedbackDigest {
            from: date,
            to: date,
            entries: vec![crate::models::FeedbackEntry {
                timestamp: date.and_hms_opt(10, 15, 0).unwrap(),
                email: String::new(),
                name: String::new(),
                rating: 4,
                feedback: "Helpful".to_string(),
            }],
            rating_counts: (1..=5)
                .map(|rating| crate::models::RatingCount {
                    rating,
                    count: usize::from(rating == 4),
                })
                .collect(),
            daily_volume: vec![crate::models::DailyVolume { date, count: 1 }],
        };
        let text = render_feedback(&digest);

        assert!(text.contains("Entries: 1"));
        assert!(text.contains("- 4: 1"));
        assert!(text.contains("- 5: 0"));
        assert!(text.contains("- 2026-05-03: 1"));
        assert!(text.contains("- 2026-05-03 10:15 anonymous (4/5): Helpful"));
    }

    #[test]
    fn empty_feedback_report_renders_placeholders() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let text = render_feedback(&FeedbackDigest {
            from: date,
            to: date,
            entries: Vec::new(),
            rating_counts: Vec::new(),
            daily_volume: Vec::new(),
        });

        assert!(text.contains("No feedback in this window."));
        assert!(text.contains("None."));
    }

    #[test]
    fn busiest_slots_orders_by_count() {
        let mut counts = [[0; 24]; 7];
        counts[2][10] = 1;
        counts[4][18] = 5;
        counts[0][9] = 3;
        let slots = busiest_slots(&TimingGrid { counts }, 2);
        assert_eq!(slots, vec![(4, 18, 5), (0, 9, 3)]);
    }
}
