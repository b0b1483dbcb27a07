use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Submission;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Column layout of the flat submission file. Every field is read as text so
/// a bad cell never rejects the whole row.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    timestamp: String,
    email: String,
    name: String,
    age: String,
    gender: String,
    occupation: String,
    sleep_hours: String,
    exercise_freq: String,
    diet_quality: String,
    stress_level: String,
    anxiety_level: String,
    depression_level: String,
    social_interaction: String,
    work_life_balance: String,
    coping_methods: String,
    past_mental_illness: String,
    current_medication: String,
    medication_details: String,
    feedback: String,
}

impl From<CsvRow> for Submission {
    fn from(row: CsvRow) -> Self {
        Submission {
            id: Uuid::new_v4(),
            timestamp: parse_timestamp(&row.timestamp),
            age: parse_number("age", &row.age),
            sleep_hours: parse_number("sleep_hours", &row.sleep_hours),
            stress_level: parse_number("stress_level", &row.stress_level),
            anxiety_level: parse_number("anxiety_level", &row.anxiety_level),
            depression_level: parse_number("depression_level", &row.depression_level),
            email: row.email.trim().to_string(),
            name: row.name,
            gender: row.gender,
            occupation: row.occupation,
            exercise_freq: row.exercise_freq,
            diet_quality: row.diet_quality,
            social_interaction: row.social_interaction,
            work_life_balance: row.work_life_balance,
            coping_methods: row.coping_methods,
            past_mental_illness: row.past_mental_illness,
            current_medication: row.current_medication,
            medication_details: row.medication_details,
            feedback: row.feedback,
        }
    }
}

pub fn read_submissions<R: Read>(reader: R) -> anyhow::Result<Vec<Submission>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed submission record {}", index + 1))?;
        let submission = Submission::from(row);
        if submission.timestamp.is_none() {
            log::debug!(
                "record {} has no usable timestamp; it will be left out of windowed analytics",
                index + 1
            );
        }
        submissions.push(submission);
    }

    Ok(submissions)
}

pub fn read_submissions_file(path: &Path) -> anyhow::Result<Vec<Submission>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_submissions(file)
}

/// Lenient float parsing: blanks and junk become `None`.
pub fn parse_number(field: &str, raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            log::debug!("ignoring non-numeric {field} value {trimmed:?}");
            None
        }
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(timestamp);
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.naive_local());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "timestamp,email,name,age,gender,occupation,sleep_hours,exercise_freq,diet_quality,stress_level,anxiety_level,depression_level,social_interaction,work_life_balance,coping_methods,past_mental_illness,current_medication,medication_details,feedback";

    #[test]
    fn reads_flat_file_column_layout() {
        let data = format!(
            "{HEADER}\n2026-01-05 09:30:00,ana@example.com,Ana,29,Female,Student,5,None,Average,8,6,5,Sometimes,Fair,Not Applicable,No,No,None,\n"
        );
        let rows = read_submissions(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.email, "ana@example.com");
        assert_eq!(row.stress_level, Some(8.0));
        assert_eq!(row.sleep_hours, Some(5.0));
        assert_eq!(
            row.timestamp,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(9, 30, 0)
        );
        assert_eq!(crate::risk::score_submission(row), 7.3);
    }

    #[test]
    fn junk_cells_become_missing_values() {
        let data = "timestamp,email,stress_level,anxiety_level\nyesterday,bo@example.com,very high,NaN\n";
        let rows = read_submissions(data.as_bytes()).unwrap();

        assert_eq!(rows[0].timestamp, None);
        assert_eq!(rows[0].stress_level, None);
        assert_eq!(rows[0].anxiety_level, None);
        assert_eq!(rows[0].depression_level, None);
    }

    #[test]
    fn accepts_common_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2026, 4, 2)
            .unwrap()
            .and_hms_opt(14, 5, 0);
        assert_eq!(parse_timestamp("2026-04-02 14:05:00"), expected);
        assert_eq!(parse_timestamp("2026-04-02T14:05:00"), expected);
        assert_eq!(parse_timestamp("2026-04-02 14:05"), expected);
        assert_eq!(parse_timestamp("2026-04-02T14:05:00+02:00"), expected);
        assert_eq!(
            parse_timestamp("2026-04-02"),
            NaiveDate::from_ymd_opt(2026, 4, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("  "), None);
        assert_eq!(parse_timestamp("02/04/2026"), None);
    }

    #[test]
    fn ragged_record_is_an_error() {
        let data = "timestamp,email\n2026-01-01 00:00:00,a@example.com,extra\n";
        assert!(read_submissions(data.as_bytes()).is_err());
    }

    #[test]
    fn reads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(
            file,
            "2026-02-01 08:00:00,cy@example.com,Cy,40,Male,Engineer,8,Daily,Good,2,2,2,Daily,Good,,No,No,,"
        )
        .unwrap();

        let rows = read_submissions_file(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_freq, "Daily");
    }
}
