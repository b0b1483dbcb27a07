use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod aggregate;
mod config;
mod db;
mod directory;
mod error;
mod ingest;
mod models;
mod risk;
mod summary;

use aggregate::DateWindow;
use config::AnalyticsConfig;
use models::{Counsellor, FeedbackEntry, Submission, SubmissionFilter, SubmissionPatch};

#[derive(Parser)]
#[command(name = "mindpulse")]
#[command(about = "Mental-health self-assessment scoring and analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load counsellors and sample submissions
    Seed,
    /// Import submissions from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score a questionnaire and store it
    Submit(Questionnaire),
    /// Show one user's history
    Trend {
        #[arg(long)]
        email: String,
    },
    /// List stored submissions with their scores
    List {
        #[arg(long)]
        email: Option<String>,
        /// Case-insensitive substring of the email address
        #[arg(long, conflicts_with = "email")]
        email_contains: Option<String>,
        #[arg(long)]
        min_sleep: Option<f64>,
        #[arg(long)]
        max_sleep: Option<f64>,
    },
    /// Edit fields of a stored submission
    Edit(EditArgs),
    /// Delete a stored submission
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Windowed analytics across all submissions
    #[command(group(
        ArgGroup::new("range")
            .args(["from", "since_days"])
            .multiple(false)
    ))]
    Analytics {
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        alert_threshold: Option<f64>,
        #[arg(long)]
        min_corr_rows: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Record feedback about the tool
    Feedback {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        rating: i32,
        #[arg(long)]
        text: String,
    },
    /// Windowed feedback with rating counts and daily volume
    #[command(group(
        ArgGroup::new("range")
            .args(["from", "since_days"])
            .multiple(false)
    ))]
    FeedbackList {
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored feedback entry
    ClearFeedback {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List the professional directory
    Counsellors,
    /// Add or update a counsellor
    AddCounsellor {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        specialty: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        booking_url: String,
    },
}

#[derive(Args, Clone)]
struct Questionnaire {
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    age: Option<f64>,
    #[arg(long, default_value = "")]
    gender: String,
    #[arg(long, default_value = "")]
    occupation: String,
    #[arg(long)]
    sleep_hours: Option<f64>,
    #[arg(long, default_value = "")]
    exercise: String,
    #[arg(long, default_value = "")]
    diet: String,
    #[arg(long)]
    stress: Option<f64>,
    #[arg(long)]
    anxiety: Option<f64>,
    #[arg(long)]
    depression: Option<f64>,
    #[arg(long, default_value = "")]
    social: String,
    #[arg(long, default_value = "")]
    work_life: String,
    #[arg(long, default_value = "")]
    coping: String,
    #[arg(long, default_value = "No")]
    past_illness: String,
    #[arg(long, default_value = "No")]
    medication: String,
    #[arg(long, default_value = "")]
    medication_details: String,
    /// Score without storing the submission
    #[arg(long)]
    dry_run: bool,
}

impl Questionnaire {
    fn into_submission(self, timestamp: NaiveDateTime) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            timestamp: Some(timestamp),
            email: self.email.trim().to_string(),
            name: self.name,
            age: self.age,
            gender: self.gender,
            occupation: self.occupation,
            sleep_hours: self.sleep_hours,
            exercise_freq: self.exercise,
            diet_quality: self.diet,
            stress_level: self.stress,
            anxiety_level: self.anxiety,
            depression_level: self.depression,
            social_interaction: self.social,
            work_life_balance: self.work_life,
            coping_methods: self.coping,
            past_mental_illness: self.past_illness,
            current_medication: self.medication,
            medication_details: self.medication_details,
            feedback: String::new(),
        }
    }
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long, value_parser = parse_timestamp_arg)]
    timestamp: Option<NaiveDateTime>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    sleep_hours: Option<f64>,
    #[arg(long)]
    exercise: Option<String>,
    #[arg(long)]
    diet: Option<String>,
    #[arg(long)]
    stress: Option<f64>,
    #[arg(long)]
    anxiety: Option<f64>,
    #[arg(long)]
    depression: Option<f64>,
    #[arg(long)]
    social: Option<String>,
    #[arg(long)]
    work_life: Option<String>,
    #[arg(long)]
    past_illness: Option<String>,
    #[arg(long)]
    medication: Option<String>,
}

impl EditArgs {
    fn patch(self) -> SubmissionPatch {
        SubmissionPatch {
            timestamp: self.timestamp,
            email: self.email,
            name: self.name,
            sleep_hours: self.sleep_hours,
            exercise_freq: self.exercise,
            diet_quality: self.diet,
            stress_level: self.stress,
            anxiety_level: self.anxiety,
            depression_level: self.depression,
            social_interaction: self.social,
            work_life_balance: self.work_life,
            past_mental_illness: self.past_illness,
            current_medication: self.medication,
        }
    }
}

/// An explicit `--from`/`--to` pair wins; otherwise the trailing `days` ending today.
fn resolve_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
    days: i64,
) -> anyhow::Result<DateWindow> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(DateWindow::new(from, to)?),
        _ => Ok(DateWindow::trailing(today, days)),
    }
}

fn parse_timestamp_arg(raw: &str) -> Result<NaiveDateTime, String> {
    ingest::parse_timestamp(raw).ok_or_else(|| format!("unrecognised timestamp {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Commands::Submit(questionnaire) = &cli.command {
        if questionnaire.dry_run {
            let submission = questionnaire.clone().into_submission(Local::now().naive_local());
            let suggestions = directory::suggest(
                &directory::seed_counsellors(),
                directory::SUGGESTION_COUNT,
                &mut rand::thread_rng(),
            );
            print!("{}", summary::render_assessment(&risk::assess(&submission), &suggestions));
            return Ok(());
        }
    }

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} submissions from {}.", csv.display());
        }
        Commands::Submit(questionnaire) => {
            let submission = questionnaire.into_submission(Local::now().naive_local());
            db::insert_submission(&pool, &submission, None).await?;
            log::info!("stored submission {} for {}", submission.id, submission.email);

            let mut counsellors = db::fetch_counsellors(&pool).await?;
            if counsellors.is_empty() {
                counsellors = directory::seed_counsellors();
            }
            let suggestions = directory::suggest(
                &counsellors,
                directory::SUGGESTION_COUNT,
                &mut rand::thread_rng(),
            );
            print!("{}", summary::render_assessment(&risk::assess(&submission), &suggestions));
        }
        Commands::Trend { email } => {
            let rows = db::fetch_submissions(&pool, Some(&email)).await?;
            match aggregate::user_trend(&rows, &email) {
                Some(trend) => print!("{}", summary::render_trend(&email, &trend)),
                None => println!("Not enough submissions for {email} to show a trend."),
            }
        }
        Commands::List {
            email,
            email_contains,
            min_sleep,
            max_sleep,
        } => {
            let fetched = db::fetch_submissions(&pool, email.as_deref()).await?;
            let filter = SubmissionFilter {
                email_contains,
                min_sleep,
                max_sleep,
            };
            let rows = aggregate::filter_submissions(&fetched, &filter);
            if rows.is_empty() {
                println!("No submissions found.");
                return Ok(());
            }
            for row in rows {
                let score = risk::score_submission(row);
                println!(
                    "{} {} {} score {:.1} ({})",
                    row.id,
                    row.timestamp
                        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    row.email,
                    score,
                    models::RiskLabel::from_score(score)
                );
            }
        }
        Commands::Edit(args) => {
            let id = args.id;
            let patch = args.patch();
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let updated = db::update_submission(&pool, id, &patch).await?;
            println!(
                "Updated {}; score now {:.1}.",
                updated.id,
                risk::score_submission(&updated)
            );
        }
        Commands::Delete { id } => {
            db::delete_submission(&pool, id).await?;
            println!("Deleted {id}.");
        }
        Commands::Analytics {
            from,
            to,
            since_days,
            alert_threshold,
            min_corr_rows,
            json,
        } => {
            let defaults = AnalyticsConfig::default();
            let config = AnalyticsConfig {
                window_days: since_days.unwrap_or(defaults.window_days),
                alert_threshold: alert_threshold.unwrap_or(defaults.alert_threshold),
                min_correlation_rows: min_corr_rows.unwrap_or(defaults.min_correlation_rows),
                ..defaults
            };

            let now = Local::now().naive_local();
            let window = resolve_window(from, to, now.date(), config.window_days)?;

            let rows = db::fetch_submissions(&pool, None).await?;
            let feedback = db::fetch_feedback(&pool).await?;
            log::debug!("loaded {} submissions and {} feedback entries", rows.len(), feedback.len());

            let window_summary = aggregate::summarize_window(&rows, &window);
            let alerts = aggregate::high_risk_alerts(
                &rows,
                now,
                config.alert_days,
                config.alert_threshold,
                config.alert_limit,
            );
            let top_users =
                aggregate::top_at_risk(&rows, now, config.trailing_days, config.top_limit);
            let correlation =
                aggregate::correlation_matrix(&rows, &window, config.min_correlation_rows);
            let timing = aggregate::timing_grid(&rows, &window);

            let analytics = summary::Analytics {
                summary: &window_summary,
                feedback_count: aggregate::count_feedback(&feedback, &window),
                alerts: &alerts,
                alert_threshold: config.alert_threshold,
                top_users: &top_users,
                correlation: correlation.as_ref(),
                timing: &timing,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&analytics)?);
            } else {
                print!("{}", summary::render_analytics(&analytics));
            }
        }
        Commands::Feedback {
            email,
            name,
            rating,
            text,
        } => {
            db::insert_feedback(
                &pool,
                &FeedbackEntry {
                    timestamp: Local::now().naive_local(),
                    email,
                    name,
                    rating,
                    feedback: text.trim().to_string(),
                },
            )
            .await?;
            println!("Thanks for your feedback.");
        }
        Commands::FeedbackList {
            from,
            to,
            since_days,
            json,
        } => {
            let days = since_days.unwrap_or(AnalyticsConfig::default().window_days);
            let window = resolve_window(from, to, Local::now().date_naive(), days)?;
            let entries = db::fetch_feedback(&pool).await?;
            let digest = aggregate::summarize_feedback(&entries, &window);

            if json {
                println!("{}", serde_json::to_string_pretty(&digest)?);
            } else {
                print!("{}", summary::render_feedback(&digest));
            }
        }
        Commands::ClearFeedback { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete feedback without --yes");
            }
            let removed = db::clear_feedback(&pool).await?;
            println!("Removed {removed} feedback entries.");
        }
        Commands::Counsellors => {
            let counsellors = db::fetch_counsellors(&pool).await?;
            if counsellors.is_empty() {
                println!("No counsellors listed. Run `seed` or `add-counsellor`.");
            }
            for counsellor in counsellors.iter() {
                println!(
                    "- {} ({}) {} {} {}",
                    counsellor.name,
                    counsellor.specialty,
                    counsellor.email,
                    counsellor.phone,
                    counsellor.booking_url
                );
            }
        }
        Commands::AddCounsellor {
            name,
            specialty,
            email,
            phone,
            booking_url,
        } => {
            db::insert_counsellor(
                &pool,
                &Counsellor {
                    name,
                    specialty,
                    email,
                    phone,
                    booking_url,
                },
            )
            .await?;
            println!("Counsellor saved.");
        }
    }

    Ok(())
}
