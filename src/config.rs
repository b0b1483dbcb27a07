/// Tunable constants for the admin analytics.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Default reporting window when no explicit dates are given
    pub window_days: i64,

    /// Trailing window for the top at-risk ranking
    pub trailing_days: i64,
    pub top_limit: usize,

    /// High-risk alerts look back this far and keep rows at or above the threshold
    pub alert_days: i64,
    pub alert_threshold: f64,
    pub alert_limit: usize,

    /// Below this many complete rows a correlation matrix is not reported
    pub min_correlation_rows: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            trailing_days: 30,
            top_limit: 25,
            alert_days: 7,
            alert_threshold: 7.0,
            alert_limit: 50,
            min_correlation_rows: 5,
        }
    }
}
