use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Which end of an interval a value belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IntervalField {
    StartTime,
    EndTime,
}

impl fmt::Display for IntervalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalField::StartTime => write!(f, "start_time"),
            IntervalField::EndTime => write!(f, "end_time"),
        }
    }
}

/// Why a submitted value was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Not a complete 24-hour `HH:MM` value
    Malformed { field: IntervalField, value: String },
    /// End time is not after the start time
    EndNotAfterStart,
    /// Date is not `YYYY-MM-DD`
    InvalidDate,
}

/// Where an offending value sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueLocation {
    /// Interval `index` of a weekly draft day
    WeeklyInterval { day_of_week: u8, index: usize },
    /// Entry `index` of an exception list
    Exception { index: usize, date: String },
}

impl fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLocation::WeeklyInterval { day_of_week, index } => {
                write!(f, "day {} interval {}", day_of_week, index)
            }
            IssueLocation::Exception { index, date } => {
                write!(f, "exception {} ({})", index, date)
            }
        }
    }
}

/// One offending value in a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: IssueLocation,
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn weekly(day_of_week: u8, index: usize, kind: IssueKind) -> Self {
        Self {
            location: IssueLocation::WeeklyInterval { day_of_week, index },
            kind,
        }
    }

    pub fn exception(index: usize, date: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            location: IssueLocation::Exception {
                index,
                date: date.into(),
            },
            kind,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Malformed { field, value } => {
                write!(f, "{}: {} '{}' is not HH:MM", self.location, field, value)
            }
            IssueKind::EndNotAfterStart => {
                write!(f, "{}: end_time must be after start_time", self.location)
            }
            IssueKind::InvalidDate => write!(f, "{}: date is not YYYY-MM-DD", self.location),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for the crate
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Validation failed: {}", join_issues(.0))]
    #[diagnostic(code(noura::validation), help("fix the listed times before saving"))]
    Validation(Vec<ValidationIssue>),

    #[error("Authentication required")]
    #[diagnostic(code(noura::auth), help("set NOURA_AUTH_TOKEN"))]
    AuthenticationRequired,

    #[error("Remote call '{operation}' failed: {message}")]
    #[diagnostic(code(noura::api))]
    Api { operation: String, message: String },

    #[error("More than one exception for date {0}")]
    #[diagnostic(code(noura::duplicate_exception))]
    DuplicateExceptionDate(String),

    #[error("Operation cancelled")]
    #[diagnostic(code(noura::cancelled))]
    Cancelled,

    #[error("Environment error: {0}")]
    #[diagnostic(code(noura::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(noura::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(noura::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(noura::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(noura::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create remote call errors
pub fn api_error(operation: &str, message: &str) -> Error {
    Error::Api {
        operation: operation.to_string(),
        message: message.to_string(),
    }
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_issue() {
        let err = Error::Validation(vec![
            ValidationIssue::weekly(
                1,
                0,
                IssueKind::Malformed {
                    field: IntervalField::StartTime,
                    value: "9:3".to_string(),
                },
            ),
            ValidationIssue::weekly(3, 2, IssueKind::EndNotAfterStart),
            ValidationIssue::exception(1, "2025-13-01", IssueKind::InvalidDate),
        ]);

        let message = err.to_string();
        assert!(message.contains("day 1 interval 0: start_time '9:3' is not HH:MM"));
        assert!(message.contains("day 3 interval 2: end_time must be after start_time"));
        assert!(message.contains("exception 1 (2025-13-01): date is not YYYY-MM-DD"));
    }

    #[test]
    fn test_api_error_helper() {
        let err = api_error("delete_exception_date", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Remote call 'delete_exception_date' failed: HTTP 500"
        );
    }
}
