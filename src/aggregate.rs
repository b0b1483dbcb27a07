use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::DashboardError;
use crate::models::{
    BucketShare, CorrelationMatrix, DailyRisk, DailyVolume, FeedbackDigest, FeedbackEntry,
    RatingCount, RiskAlert, RiskLabel, Submission, SubmissionFilter, TimingGrid, TrendPoint,
    UserRisk, WindowSummary, RATING_RANGE,
};
use crate::risk::{round_to, score_submission};

/// Calendar-date window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DashboardError> {
        if from > to {
            return Err(DashboardError::InvertedWindow { from, to });
        }
        Ok(Self { from, to })
    }

    /// From `today - days` through `today`. Spans that run past the calendar
    /// start at the earliest representable date.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        let from = Duration::try_days(days.max(1))
            .and_then(|span| today.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.from && date <= self.to
    }
}

/// Timestamped rows that fall inside the window, paired with their timestamp.
fn in_window<'a>(
    rows: &'a [Submission],
    window: &'a DateWindow,
) -> impl Iterator<Item = (NaiveDateTime, &'a Submission)> + 'a {
    rows.iter()
        .filter_map(|row| row.timestamp.map(|ts| (ts, row)))
        .filter(move |(ts, _)| window.contains(*ts))
}

fn cutoff(as_of: NaiveDateTime, days: i64) -> NaiveDateTime {
    Duration::try_days(days.max(1))
        .and_then(|span| as_of.checked_sub_signed(span))
        .unwrap_or(NaiveDateTime::MIN)
}

fn since<'a>(
    rows: &'a [Submission],
    cutoff: NaiveDateTime,
) -> impl Iterator<Item = (NaiveDateTime, &'a Submission)> + 'a {
    rows.iter()
        .filter_map(|row| row.timestamp.map(|ts| (ts, row)))
        .filter(move |(ts, _)| *ts >= cutoff)
}

pub fn summarize_window(rows: &[Submission], window: &DateWindow) -> WindowSummary {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for (timestamp, row) in in_window(rows, window) {
        by_day
            .entry(timestamp.date())
            .or_default()
            .push(score_submission(row));
    }

    let submission_count: usize = by_day.values().map(Vec::len).sum();
    let total: f64 = by_day.values().flatten().sum();
    let mean_risk = if submission_count == 0 {
        None
    } else {
        Some(round_to(total / submission_count as f64, 2))
    };

    let mut daily = Vec::with_capacity(by_day.len());
    let mut bucket_mix = Vec::new();

    for (date, scores) in by_day.iter() {
        let count = scores.len();
        daily.push(DailyRisk {
            date: *date,
            submission_count: count,
            mean_risk: round_to(scores.iter().sum::<f64>() / count as f64, 2),
        });

        let mut buckets: BTreeMap<RiskLabel, usize> = BTreeMap::new();
        for score in scores {
            *buckets.entry(RiskLabel::from_score(*score)).or_insert(0) += 1;
        }
        for (label, bucket_count) in buckets {
            bucket_mix.push(BucketShare {
                date: *date,
                label,
                count: bucket_count,
                percent: round_to(bucket_count as f64 / count as f64 * 100.0, 1),
            });
        }
    }

    WindowSummary {
        from: Some(window.from()),
        to: Some(window.to()),
        submission_count,
        mean_risk,
        daily,
        bucket_mix,
    }
}

/// Mean risk per email over the trailing window, highest first.
pub fn top_at_risk(
    rows: &[Submission],
    as_of: NaiveDateTime,
    trailing_days: i64,
    limit: usize,
) -> Vec<UserRisk> {
    let cutoff = cutoff(as_of, trailing_days);
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();

    for (_, row) in since(rows, cutoff) {
        let entry = totals.entry(email_key(&row.email)).or_insert((0.0, 0));
        entry.0 += score_submission(row);
        entry.1 += 1;
    }

    let mut ranked: Vec<UserRisk> = totals
        .into_iter()
        .map(|(email, (total, count))| UserRisk {
            email,
            mean_risk: round_to(total / count as f64, 2),
            submission_count: count,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.mean_risk
            .partial_cmp(&a.mean_risk)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.email.cmp(&b.email))
    });
    ranked.truncate(limit);
    ranked
}

pub fn high_risk_alerts(
    rows: &[Submission],
    as_of: NaiveDateTime,
    days: i64,
    min_risk: f64,
    limit: usize,
) -> Vec<RiskAlert> {
    let cutoff = cutoff(as_of, days);

    let mut alerts: Vec<RiskAlert> = since(rows, cutoff)
        .filter_map(|(timestamp, row)| {
            let risk = score_submission(row);
            (risk >= min_risk).then(|| RiskAlert {
                id: row.id,
                timestamp,
                email: row.email.clone(),
                name: row.name.clone(),
                risk,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.risk
            .partial_cmp(&a.risk)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    alerts.truncate(limit);
    alerts
}

/// History for one email, oldest first. A single point is not a trend.
pub fn user_trend(rows: &[Submission], email: &str) -> Option<Vec<TrendPoint>> {
    let key = email_key(email);
    let mut points: Vec<TrendPoint> = rows
        .iter()
        .filter(|row| email_key(&row.email) == key)
        .filter_map(|row| {
            row.timestamp.map(|timestamp| TrendPoint {
                timestamp,
                stress_level: row.stress_level,
                anxiety_level: row.anxiety_level,
                depression_level: row.depression_level,
                risk: score_submission(row),
            })
        })
        .collect();

    if points.len() < 2 {
        return None;
    }
    points.sort_by_key(|point| point.timestamp);
    Some(points)
}

const CORRELATION_COLUMNS: [&str; 4] = [
    "stress_level",
    "anxiety_level",
    "depression_level",
    "sleep_hours",
];

/// Pearson correlations over in-window rows with all four numeric answers present.
pub fn correlation_matrix(
    rows: &[Submission],
    window: &DateWindow,
    min_rows: usize,
) -> Option<CorrelationMatrix> {
    let samples: Vec<[f64; 4]> = in_window(rows, window)
        .filter_map(|(_, row)| {
            let values = [
                row.stress_level?,
                row.anxiety_level?,
                row.depression_level?,
                row.sleep_hours?,
            ];
            values.iter().all(|v| v.is_finite()).then_some(values)
        })
        .collect();

    if samples.is_empty() || samples.len() < min_rows {
        return None;
    }

    let columns: Vec<Vec<f64>> = (0..CORRELATION_COLUMNS.len())
        .map(|i| samples.iter().map(|sample| sample[i]).collect())
        .collect();

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Some(CorrelationMatrix {
        columns: CORRELATION_COLUMNS.to_vec(),
        values,
        row_count: samples.len(),
    })
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((covariance / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

pub fn timing_grid(rows: &[Submission], window: &DateWindow) -> TimingGrid {
    let mut counts = [[0usize; 24]; 7];
    for (timestamp, _) in in_window(rows, window) {
        let weekday = timestamp.weekday().num_days_from_monday() as usize;
        counts[weekday][timestamp.hour() as usize] += 1;
    }
    TimingGrid { counts }
}

pub fn count_feedback(entries: &[FeedbackEntry], window: &DateWindow) -> usize {
    entries
        .iter()
        .filter(|entry| window.contains(entry.timestamp))
        .count()
}

pub fn summarize_feedback(entries: &[FeedbackEntry], window: &DateWindow) -> FeedbackDigest {
    let mut windowed: Vec<FeedbackEntry> = entries
        .iter()
        .filter(|entry| window.contains(entry.timestamp))
        .cloned()
        .collect();
    windowed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut rating_counts: Vec<RatingCount> = RATING_RANGE
        .map(|rating| RatingCount { rating, count: 0 })
        .collect();
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for entry in windowed.iter() {
        if let Some(bucket) = rating_counts.iter_mut().find(|b| b.rating == entry.rating) {
            bucket.count += 1;
        }
        *by_day.entry(entry.timestamp.date()).or_insert(0) += 1;
    }

    FeedbackDigest {
        from: window.from(),
        to: window.to(),
        entries: windowed,
        rating_counts,
        daily_volume: by_day
            .into_iter()
            .map(|(date, count)| DailyVolume { date, count })
            .collect(),
    }
}

/// Admin review filter: case-insensitive email substring and an inclusive
/// sleep range. Rows without a sleep answer drop out once a bound is set.
pub fn filter_submissions<'a>(
    rows: &'a [Submission],
    filter: &SubmissionFilter,
) -> Vec<&'a Submission> {
    let needle = filter
        .email_contains
        .as_deref()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());
    let sleep_bounded = filter.min_sleep.is_some() || filter.max_sleep.is_some();

    rows.iter()
        .filter(|row| match &needle {
            Some(needle) => row.email.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .filter(|row| {
            if !sleep_bounded {
                return true;
            }
            match row.sleep_hours.filter(|v| v.is_finite()) {
                Some(sleep) => {
                    filter.min_sleep.map_or(true, |min| sleep >= min)
                        && filter.max_sleep.map_or(true, |max| sleep <= max)
                }
                None => false,
            }
        })
        .collect()
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
