//! Sequential replay of availability changes against the remote service.
//!
//! Operations run one at a time, each awaited before the next starts. The run
//! stops at the first failure or when the cancellation token fires, and the
//! report says what went through, what failed and what never started.

use crate::components::api::AvailabilityApi;
use crate::components::availability::diff::{diff_exceptions, ExceptionDiff};
use crate::components::availability::draft::WeeklyDraft;
use crate::components::availability::grouping::{ensure_unique_dates, validate_exceptions};
use crate::components::availability::models::{
    ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry,
};
use crate::components::availability::time::TimeCodec;
use crate::error::{AppResult, Error};
use crate::utils::time::{day_of_week, parse_date};
use chrono::TimeZone;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// One remote step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOperation {
    /// Delete a synced exception
    DeleteException { id: String, date: String },
    /// Forget an exception that never reached the server
    DropLocalException { date: String },
    /// Delete the old row (when synced) and add the new content
    ReplaceException {
        original: ExceptionEntry,
        updated: ExceptionEntry,
    },
    AddException { exception: ExceptionEntry },
    UpsertWeekly {
        day_of_week: u8,
        intervals: Vec<TimeInterval>,
    },
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::DeleteException { id, date } => {
                write!(f, "delete exception {} ({})", date, id)
            }
            SyncOperation::DropLocalException { date } => {
                write!(f, "drop local exception {}", date)
            }
            SyncOperation::ReplaceException { updated, .. } => {
                write!(f, "replace exception {}", updated.date)
            }
            SyncOperation::AddException { exception } => {
                write!(f, "add exception {}", exception.date)
            }
            SyncOperation::UpsertWeekly {
                day_of_week,
                intervals,
            } => write!(
                f,
                "upsert weekly day {} ({} intervals)",
                day_of_week,
                intervals.len()
            ),
        }
    }
}

/// How a completed step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Deleted,
    DroppedLocally,
    /// The delete failed and a whole-day exception matching the weekly
    /// pattern was stored instead. The old row is still on the server.
    Neutralized {
        exception: ExceptionEntry,
        delete_error: String,
    },
    Added { exception: ExceptionEntry },
    Replaced { exception: ExceptionEntry },
    Upserted,
}

/// A step that went through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedOperation {
    pub operation: SyncOperation,
    pub outcome: SyncOutcome,
}

/// The step that stopped the run
///
/// `operation` is what is still left to do, so retrying it is safe.
#[derive(Debug)]
pub struct FailedOperation {
    pub operation: SyncOperation,
    pub error: Error,
}

/// Result of one sync run
#[derive(Debug)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub completed: Vec<CompletedOperation>,
    pub failed: Option<FailedOperation>,
    /// Steps never attempted
    pub pending: Vec<SyncOperation>,
    pub cancelled: bool,
}

impl SyncReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            completed: Vec::new(),
            failed: None,
            pending: Vec::new(),
            cancelled: false,
        }
    }

    /// Every step went through
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.pending.is_empty() && !self.cancelled
    }

    /// Steps to resubmit: the failed one first, then the pending ones
    pub fn remaining(&self) -> Vec<SyncOperation> {
        self.failed
            .iter()
            .map(|f| f.operation.clone())
            .chain(self.pending.iter().cloned())
            .collect()
    }

    /// Steps that ended in a compensating write rather than a delete
    pub fn neutralized(&self) -> impl Iterator<Item = &CompletedOperation> {
        self.completed
            .iter()
            .filter(|c| matches!(c.outcome, SyncOutcome::Neutralized { .. }))
    }
}

/// Turn an exception diff into ordered steps: removals, replacements, additions
pub fn plan_exception_operations(diff: &ExceptionDiff) -> Vec<SyncOperation> {
    let removals = diff.to_remove.iter().map(|entry| match &entry.id {
        Some(id) => SyncOperation::DeleteException {
            id: id.clone(),
            date: entry.date.clone(),
        },
        None => SyncOperation::DropLocalException {
            date: entry.date.clone(),
        },
    });
    let replacements = diff.changed.iter().map(|c| SyncOperation::ReplaceException {
        original: c.original.clone(),
        updated: c.updated.clone(),
    });
    let additions = diff.to_add.iter().map(|entry| SyncOperation::AddException {
        exception: entry.clone(),
    });

    removals.chain(replacements).chain(additions).collect()
}

/// Turn a weekly draft into one upsert per changed day, in UTC
pub fn plan_weekly_operations<Tz: TimeZone>(
    snapshot: &WeeklyDraft,
    draft: &WeeklyDraft,
    codec: &TimeCodec<Tz>,
) -> Vec<SyncOperation> {
    let utc = draft.to_utc(codec);
    draft
        .changed_days(snapshot)
        .into_iter()
        .map(|day| SyncOperation::UpsertWeekly {
            day_of_week: day,
            intervals: utc.intervals(day).to_vec(),
        })
        .collect()
}

/// Diff `current` against the `original` snapshot and replay it remotely
///
/// `weekly` is the wire weekly pattern, used when a delete has to be
/// neutralized. Fails before any call when the token is missing, when
/// `current` holds two exceptions for one date, or when any of its dates or
/// times is malformed.
pub async fn apply_exception_diff(
    api: &dyn AvailabilityApi,
    auth_token: Option<&str>,
    weekly: &[WeeklyAvailabilityEntry],
    original: &[ExceptionEntry],
    current: &[ExceptionEntry],
    cancel: &CancellationToken,
) -> AppResult<SyncReport> {
    let auth_token = auth_token.ok_or(Error::AuthenticationRequired)?;
    ensure_unique_dates(current)?;
    validate_exceptions(current)?;

    let operations = plan_exception_operations(&diff_exceptions(original, current));
    Ok(run_operations(api, auth_token, weekly, operations, cancel, "exception_sync").await)
}

/// Validate a weekly draft and upsert the days that changed since `snapshot`
///
/// Draft times are in the codec's display zone.
pub async fn apply_weekly_draft<Tz: TimeZone>(
    api: &dyn AvailabilityApi,
    auth_token: Option<&str>,
    snapshot: &WeeklyDraft,
    draft: &WeeklyDraft,
    codec: &TimeCodec<Tz>,
    cancel: &CancellationToken,
) -> AppResult<SyncReport> {
    let auth_token = auth_token.ok_or(Error::AuthenticationRequired)?;
    draft.validate()?;

    let operations = plan_weekly_operations(snapshot, draft, codec);
    Ok(run_operations(api, auth_token, &[], operations, cancel, "weekly_sync").await)
}

/// Run steps in order until done, failed or cancelled
pub async fn run_operations(
    api: &dyn AvailabilityApi,
    auth_token: &str,
    weekly: &[WeeklyAvailabilityEntry],
    operations: Vec<SyncOperation>,
    cancel: &CancellationToken,
    kind: &'static str,
) -> SyncReport {
    let run_id = Uuid::new_v4();
    let span = info_span!("sync", kind, run_id = %run_id);

    async move {
        let mut report = SyncReport::new(run_id);
        info!("Starting sync with {} operations", operations.len());

        let mut queue = operations.into_iter();
        while let Some(operation) = queue.next() {
            if cancel.is_cancelled() {
                warn!("Sync cancelled before '{}'", operation);
                report.cancelled = true;
                report.pending.push(operation);
                report.pending.extend(queue);
                break;
            }

            match execute(api, auth_token, weekly, &operation).await {
                Ok(outcome) => {
                    info!("Completed '{}'", operation);
                    report.completed.push(CompletedOperation { operation, outcome });
                }
                Err(failed) => {
                    error!("Failed '{}': {}", failed.operation, failed.error);
                    report.failed = Some(failed);
                    report.pending.extend(queue);
                    break;
                }
            }
        }

        info!(
            completed = report.completed.len(),
            pending = report.pending.len(),
            failed = report.failed.is_some(),
            cancelled = report.cancelled,
            "Sync finished"
        );
        report
    }
    .instrument(span)
    .await
}

/// Run one step
async fn execute(
    api: &dyn AvailabilityApi,
    auth_token: &str,
    weekly: &[WeeklyAvailabilityEntry],
    operation: &SyncOperation,
) -> Result<SyncOutcome, FailedOperation> {
    let fail = |error: Error| FailedOperation {
        operation: operation.clone(),
        error,
    };

    match operation {
        SyncOperation::DropLocalException { .. } => Ok(SyncOutcome::DroppedLocally),

        SyncOperation::DeleteException { id, date } => {
            match api.delete_exception_date(id, auth_token).await {
                Ok(()) => Ok(SyncOutcome::Deleted),
                // Auth problems are not worth compensating for
                Err(Error::AuthenticationRequired) => Err(fail(Error::AuthenticationRequired)),
                Err(delete_error) => {
                    neutralize(api, auth_token, weekly, date, delete_error)
                        .await
                        .map_err(fail)
                }
            }
        }

        SyncOperation::ReplaceException { original, updated } => {
            if let Some(id) = &original.id {
                api.delete_exception_date(id, auth_token)
                    .await
                    .map_err(fail)?;
            }
            match api.add_exception_date(updated, auth_token).await {
                Ok(exception) => Ok(SyncOutcome::Replaced { exception }),
                // The old row is gone, only the add is left
                Err(error) => Err(FailedOperation {
                    operation: SyncOperation::AddException {
                        exception: updated.clone(),
                    },
                    error,
                }),
            }
        }

        SyncOperation::AddException { exception } => api
            .add_exception_date(exception, auth_token)
            .await
            .map(|exception| SyncOutcome::Added { exception })
            .map_err(fail),

        SyncOperation::UpsertWeekly {
            day_of_week,
            intervals,
        } => api
            .upsert_weekly_availability(*day_of_week, intervals, auth_token)
            .await
            .map(|()| SyncOutcome::Upserted)
            .map_err(fail),
    }
}

/// Store a whole-day exception that matches the weekly pattern for `date`
async fn neutralize(
    api: &dyn AvailabilityApi,
    auth_token: &str,
    weekly: &[WeeklyAvailabilityEntry],
    date: &str,
    delete_error: Error,
) -> AppResult<SyncOutcome> {
    let Some(parsed) = parse_date(date) else {
        return Err(delete_error);
    };
    let day = day_of_week(parsed);
    let is_available = weekly.iter().any(|entry| entry.day_of_week == day);

    let exception = api
        .add_exception_date(&ExceptionEntry::full_day(date, is_available), auth_token)
        .await
        .map_err(|e| {
            error!(outcome = "neutralize_failed", "Could not neutralize {}: {}", date, e);
            match e {
                Error::AuthenticationRequired => Error::AuthenticationRequired,
                other => delete_error_with_context(&delete_error, &other),
            }
        })?;

    warn!(
        outcome = "neutralized",
        date,
        is_available,
        "Delete failed ({}), stored a whole-day exception instead",
        delete_error
    );

    Ok(SyncOutcome::Neutralized {
        exception,
        delete_error: delete_error.to_string(),
    })
}

fn delete_error_with_context(delete_error: &Error, neutralize_error: &Error) -> Error {
    Error::Api {
        operation: "delete_exception_date".to_string(),
        message: format!(
            "{}; neutralizing also failed: {}",
            delete_error, neutralize_error
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::availability::diff::ChangedException;
    use crate::components::availability::draft::DraftAction;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn test_plan_orders_removals_replacements_additions() {
        let diff = ExceptionDiff {
            to_add: vec![ExceptionEntry::full_day("2025-01-03", true)],
            to_remove: vec![
                ExceptionEntry::full_day("2025-01-01", false).with_id("a"),
                ExceptionEntry::full_day("2025-01-02", false),
            ],
            changed: vec![ChangedException {
                original: ExceptionEntry::full_day("2025-01-04", false).with_id("b"),
                updated: ExceptionEntry::full_day("2025-01-04", true).with_id("b"),
            }],
        };

        let plan = plan_exception_operations(&diff);
        assert_eq!(plan.len(), 4);
        assert_eq!(
            plan[0],
            SyncOperation::DeleteException {
                id: "a".to_string(),
                date: "2025-01-01".to_string()
            }
        );
        assert_eq!(
            plan[1],
            SyncOperation::DropLocalException {
                date: "2025-01-02".to_string()
            }
        );
        assert!(matches!(plan[2], SyncOperation::ReplaceException { .. }));
        assert!(matches!(plan[3], SyncOperation::AddException { .. }));
    }

    #[test]
    fn test_plan_weekly_converts_changed_days_to_utc() {
        let codec = TimeCodec::new(
            FixedOffset::east_opt(2 * 3600).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        );
        let snapshot = WeeklyDraft::empty();
        let draft = snapshot.apply(DraftAction::ToggleDay { day: 4 });

        let plan = plan_weekly_operations(&snapshot, &draft, &codec);
        assert_eq!(
            plan,
            vec![SyncOperation::UpsertWeekly {
                day_of_week: 4,
                intervals: vec![TimeInterval::new("07:00", "15:00")],
            }]
        );
    }

    #[test]
    fn test_report_remaining_lists_failed_then_pending() {
        let mut report = SyncReport::new(Uuid::new_v4());
        report.failed = Some(FailedOperation {
            operation: SyncOperation::DropLocalException {
                date: "2025-01-01".to_string(),
            },
            error: Error::Cancelled,
        });
        report.pending.push(SyncOperation::DropLocalException {
            date: "2025-01-02".to_string(),
        });

        assert!(!report.is_complete());
        let dates: Vec<String> = report
            .remaining()
            .into_iter()
            .map(|op| op.to_string())
            .collect();
        assert_eq!(
            dates,
            vec![
                "drop local exception 2025-01-01".to_string(),
                "drop local exception 2025-01-02".to_string()
            ]
        );
    }
}
