use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("window start {from} is after window end {to}")]
    InvertedWindow { from: NaiveDate, to: NaiveDate },

    #[error("no submission with id {0}")]
    UnknownSubmission(Uuid),

    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),

    #[error("feedback text must not be empty")]
    EmptyFeedback,
}
