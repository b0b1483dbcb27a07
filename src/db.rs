use std::path::Path;

use anyhow::Context;
use chrono::{Duration, Local};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::directory;
use crate::error::DashboardError;
use crate::ingest;
use crate::models::{Counsellor, FeedbackEntry, Submission, SubmissionPatch};

const SUBMISSION_COLUMNS: &str = "id, submitted_at, email, full_name, age, gender, occupation, \
     sleep_hours, exercise_freq, diet_quality, stress_level, anxiety_level, depression_level, \
     social_interaction, work_life_balance, coping_methods, past_mental_illness, \
     current_medication, medication_details, feedback";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    for counsellor in directory::seed_counsellors() {
        insert_counsellor(pool, &counsellor).await?;
    }

    let now = Local::now().naive_local();
    let samples = vec![
        ("seed-001", "avery.lee@example.com", "Avery Lee", 1, 8.0, 6.0, 5.0, 5.0, "None", "Average", "Sometimes", "Fair"),
        ("seed-002", "avery.lee@example.com", "Avery Lee", 9, 6.0, 5.0, 4.0, 6.5, "Rarely", "Average", "Sometimes", "Average"),
        ("seed-003", "jules.moreno@example.com", "Jules Moreno", 2, 3.0, 2.0, 1.0, 8.0, "Daily", "Good", "Daily", "Good"),
        ("seed-004", "kiara.patel@example.com", "Kiara Patel", 4, 9.0, 8.0, 7.0, 4.5, "None", "Poor", "Rarely", "Poor"),
        ("seed-005", "kiara.patel@example.com", "Kiara Patel", 12, 7.0, 7.0, 6.0, 6.0, "Sometimes", "Average", "Weekly", "Average"),
    ];

    for (source_key, email, name, days_ago, stress, anxiety, depression, sleep, exercise, diet, social, balance) in samples {
        let submission = Submission {
            id: Uuid::new_v4(),
            timestamp: Some(now - Duration::days(days_ago)),
            email: email.to_string(),
            name: name.to_string(),
            stress_level: Some(stress),
            anxiety_level: Some(anxiety),
            depression_level: Some(depression),
            sleep_hours: Some(sleep),
            exercise_freq: exercise.to_string(),
            diet_quality: diet.to_string(),
            social_interaction: social.to_string(),
            work_life_balance: balance.to_string(),
            past_mental_illness: "No".to_string(),
            current_medication: "No".to_string(),
            ..Default::default()
        };
        insert_submission(pool, &submission, Some(source_key)).await?;
    }

    Ok(())
}

/// Returns false when a row with the same source key already exists.
pub async fn insert_submission(
    pool: &PgPool,
    submission: &Submission,
    source_key: Option<&str>,
) -> anyhow::Result<bool> {
    let query = format!(
        "INSERT INTO mindpulse.submissions ({SUBMISSION_COLUMNS}, source_key) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
         ON CONFLICT (source_key) DO NOTHING"
    );

    let result = bind_submission(sqlx::query(&query), submission)
        .bind(source_key)
        .execute(pool)
        .await
        .context("failed to insert submission")?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let submissions = ingest::read_submissions_file(csv_path)?;
    let mut inserted = 0usize;

    for submission in submissions.iter() {
        if insert_submission(pool, submission, None).await? {
            inserted += 1;
        }
    }

    log::info!("imported {inserted} of {} rows from {}", submissions.len(), csv_path.display());
    Ok(inserted)
}

pub async fn fetch_submissions(
    pool: &PgPool,
    email: Option<&str>,
) -> anyhow::Result<Vec<Submission>> {
    let mut query = format!("SELECT {SUBMISSION_COLUMNS} FROM mindpulse.submissions");
    if email.is_some() {
        query.push_str(" WHERE lower(email) = lower($1)");
    }
    query.push_str(" ORDER BY submitted_at NULLS LAST");

    let mut rows = sqlx::query(&query);
    if let Some(value) = email {
        rows = rows.bind(value.trim());
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(submission_from_row).collect())
}

pub async fn fetch_submission(pool: &PgPool, id: Uuid) -> anyhow::Result<Submission> {
    let query = format!("SELECT {SUBMISSION_COLUMNS} FROM mindpulse.submissions WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DashboardError::UnknownSubmission(id))?;
    Ok(submission_from_row(&row))
}

pub async fn update_submission(
    pool: &PgPool,
    id: Uuid,
    patch: &SubmissionPatch,
) -> anyhow::Result<Submission> {
    let mut submission = fetch_submission(pool, id).await?;
    patch.apply(&mut submission);

    let query = "UPDATE mindpulse.submissions SET \
         submitted_at = $2, email = $3, full_name = $4, age = $5, gender = $6, occupation = $7, \
         sleep_hours = $8, exercise_freq = $9, diet_quality = $10, stress_level = $11, \
         anxiety_level = $12, depression_level = $13, social_interaction = $14, \
         work_life_balance = $15, coping_methods = $16, past_mental_illness = $17, \
         current_medication = $18, medication_details = $19, feedback = $20 \
         WHERE id = $1";

    bind_submission(sqlx::query(query), &submission)
        .execute(pool)
        .await
        .context("failed to update submission")?;

    log::info!("updated submission {id}");
    Ok(submission)
}

pub async fn delete_submission(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM mindpulse.submissions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DashboardError::UnknownSubmission(id).into());
    }
    log::info!("deleted submission {id}");
    Ok(())
}

pub async fn fetch_counsellors(pool: &PgPool) -> anyhow::Result<Vec<Counsellor>> {
    let records = sqlx::query(
        "SELECT full_name, specialty, email, phone, booking_url \
         FROM mindpulse.counsellors ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(records
        .iter()
        .map(|row| Counsellor {
            name: row.get("full_name"),
            specialty: row.get("specialty"),
            email: row.get("email"),
            phone: row.get("phone"),
            booking_url: row.get("booking_url"),
        })
        .collect())
}

pub async fn insert_counsellor(pool: &PgPool, counsellor: &Counsellor) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO mindpulse.counsellors (id, full_name, specialty, email, phone, booking_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, specialty = EXCLUDED.specialty,
            phone = EXCLUDED.phone, booking_url = EXCLUDED.booking_url
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&counsellor.name)
    .bind(&counsellor.specialty)
    .bind(&counsellor.email)
    .bind(&counsellor.phone)
    .bind(&counsellor.booking_url)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_feedback(pool: &PgPool, entry: &FeedbackEntry) -> anyhow::Result<()> {
    entry.validate()?;

    sqlx::query(
        r#"
        INSERT INTO mindpulse.feedback (id, submitted_at, email, full_name, rating, feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.timestamp)
    .bind(&entry.email)
    .bind(&entry.name)
    .bind(entry.rating)
    .bind(&entry.feedback)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_feedback(pool: &PgPool) -> anyhow::Result<Vec<FeedbackEntry>> {
    let records = sqlx::query(
        "SELECT submitted_at, email, full_name, rating, feedback \
         FROM mindpulse.feedback ORDER BY submitted_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(records
        .iter()
        .map(|row| FeedbackEntry {
            timestamp: row.get("submitted_at"),
            email: row.get("email"),
            name: row.get("full_name"),
            rating: row.get("rating"),
            feedback: row.get("feedback"),
        })
        .collect())
}

pub async fn clear_feedback(pool: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM mindpulse.feedback")
        .execute(pool)
        .await
        .context("failed to clear feedback")?;

    log::info!("cleared {} feedback entries", result.rows_affected());
    Ok(result.rows_affected())
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Binds `$1..$20` in `SUBMISSION_COLUMNS` order.
fn bind_submission<'q>(query: PgQuery<'q>, submission: &'q Submission) -> PgQuery<'q> {
    query
        .bind(submission.id)
        .bind(submission.timestamp)
        .bind(&submission.email)
        .bind(&submission.name)
        .bind(submission.age)
        .bind(&submission.gender)
        .bind(&submission.occupation)
        .bind(submission.sleep_hours)
        .bind(&submission.exercise_freq)
        .bind(&submission.diet_quality)
        .bind(submission.stress_level)
        .bind(submission.anxiety_level)
        .bind(submission.depression_level)
        .bind(&submission.social_interaction)
        .bind(&submission.work_life_balance)
        .bind(&submission.coping_methods)
        .bind(&submission.past_mental_illness)
        .bind(&submission.current_medication)
        .bind(&submission.medication_details)
        .bind(&submission.feedback)
}

fn submission_from_row(row: &PgRow) -> Submission {
    Submission {
        id: row.get("id"),
        timestamp: row.get("submitted_at"),
        email: row.get("email"),
        name: row.get("full_name"),
        age: row.get("age"),
        gender: row.get("gender"),
        occupation: row.get("occupation"),
        sleep_hours: row.get("sleep_hours"),
        exercise_freq: row.get("exercise_freq"),
        diet_quality: row.get("diet_quality"),
        stress_level: row.get("stress_level"),
        anxiety_level: row.get("anxiety_level"),
        depression_level: row.get("depression_level"),
        social_interaction: row.get("social_interaction"),
        work_life_balance: row.get("work_life_balance"),
        coping_methods: row.get("coping_methods"),
        past_mental_illness: row.get("past_mental_illness"),
        current_medication: row.get("current_medication"),
        medication_details: row.get("medication_details"),
        feedback: row.get("feedback"),
    }
}
