use super::models::{
    EffectiveAvailability, ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry, DAYS_IN_WEEK,
};
use super::time::{format_minutes, is_valid_time, minutes_of_day, TimeCodec};
use crate::error::{AppResult, Error, IntervalField, IssueKind, ValidationIssue};
use crate::utils::time::{day_of_week, format_date, parse_date, week_dates};
use chrono::{NaiveDate, TimeZone};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Start of a whole-day available window
pub const FULL_DAY_START: &str = "00:00";
/// End of a whole-day available window
pub const FULL_DAY_END: &str = "23:59";

/// Intervals keyed by day of week, always holding keys 0..=6
pub type DayGroups = BTreeMap<u8, Vec<TimeInterval>>;

/// A week with every day present and empty
pub fn empty_week() -> DayGroups {
    (0..DAYS_IN_WEEK).map(|day| (day, Vec::new())).collect()
}

/// Group weekly entries per day of week, keeping input order within a day
pub fn group_by_day_of_week(entries: &[WeeklyAvailabilityEntry]) -> DayGroups {
    let mut groups = empty_week();
    for entry in entries {
        match groups.get_mut(&entry.day_of_week) {
            Some(intervals) => intervals.push(entry.interval()),
            None => warn!(
                "Ignoring weekly entry with day_of_week {}",
                entry.day_of_week
            ),
        }
    }
    groups
}

/// Sort intervals by start time
///
/// Plain string order, which is chronological for zero-padded `HH:MM`.
pub fn sort_intervals(intervals: &mut [TimeInterval]) {
    intervals.sort_by(|a, b| a.start_time.cmp(&b.start_time));
}

/// Weekly entries with their times shifted into the display zone
pub fn localize_weekly_entries<Tz: TimeZone>(
    entries: &[WeeklyAvailabilityEntry],
    codec: &TimeCodec<Tz>,
) -> Vec<WeeklyAvailabilityEntry> {
    entries
        .iter()
        .map(|entry| WeeklyAvailabilityEntry {
            day_of_week: entry.day_of_week,
            start_time: codec.convert_utc_to_local_hhmm(&entry.start_time),
            end_time: codec.convert_utc_to_local_hhmm(&entry.end_time),
        })
        .collect()
}

/// An exception with its times shifted into the display zone
pub fn localize_exception<Tz: TimeZone>(
    entry: &ExceptionEntry,
    codec: &TimeCodec<Tz>,
) -> ExceptionEntry {
    ExceptionEntry {
        id: entry.id.clone(),
        date: entry.date.clone(),
        start_time: entry
            .start_time
            .as_deref()
            .map(|t| codec.convert_utc_to_local_hhmm(t)),
        end_time: entry
            .end_time
            .as_deref()
            .map(|t| codec.convert_utc_to_local_hhmm(t)),
        is_available: entry.is_available,
    }
}

/// An exception edited in the display zone, shifted back to UTC
pub fn wire_exception<Tz: TimeZone>(entry: &ExceptionEntry, codec: &TimeCodec<Tz>) -> ExceptionEntry {
    ExceptionEntry {
        id: entry.id.clone(),
        date: entry.date.clone(),
        start_time: entry.start_time.as_deref().map(|t| codec.local_to_utc_hhmm(t)),
        end_time: entry.end_time.as_deref().map(|t| codec.local_to_utc_hhmm(t)),
        is_available: entry.is_available,
    }
}

/// Local display view of the weekly pattern, sorted within each day
pub fn weekly_local_view<Tz: TimeZone>(
    entries: &[WeeklyAvailabilityEntry],
    codec: &TimeCodec<Tz>,
) -> DayGroups {
    let mut groups = group_by_day_of_week(&localize_weekly_entries(entries, codec));
    for intervals in groups.values_mut() {
        sort_intervals(intervals);
    }
    groups
}

/// Local display view of exceptions, grouped per date in date order
pub fn exceptions_by_date<Tz: TimeZone>(
    exceptions: &[ExceptionEntry],
    codec: &TimeCodec<Tz>,
) -> BTreeMap<String, Vec<ExceptionEntry>> {
    let mut groups: BTreeMap<String, Vec<ExceptionEntry>> = BTreeMap::new();
    for exception in exceptions {
        groups
            .entry(exception.date.clone())
            .or_default()
            .push(localize_exception(exception, codec));
    }
    for entries in groups.values_mut() {
        // Whole-day rows (no start) first
        entries.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    }
    groups
}

/// Fail if two exceptions share a date
pub fn ensure_unique_dates(exceptions: &[ExceptionEntry]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for exception in exceptions {
        if !seen.insert(exception.date.as_str()) {
            return Err(Error::DuplicateExceptionDate(exception.date.clone()));
        }
    }
    Ok(())
}

/// Check dates and times of an edited exception list before it is sent
///
/// Dates must be canonical `YYYY-MM-DD`. Each present time must be `HH:MM`,
/// and a window must end after it starts. Every problem is reported.
pub fn validate_exceptions(exceptions: &[ExceptionEntry]) -> AppResult<()> {
    let mut issues = Vec::new();

    for (index, exception) in exceptions.iter().enumerate() {
        let date_ok = parse_date(&exception.date)
            .map(|parsed| format_date(parsed) == exception.date)
            .unwrap_or(false);
        if !date_ok {
            issues.push(ValidationIssue::exception(
                index,
                exception.date.clone(),
                IssueKind::InvalidDate,
            ));
        }

        let mut malformed = false;
        for (field, value) in [
            (IntervalField::StartTime, &exception.start_time),
            (IntervalField::EndTime, &exception.end_time),
        ] {
            let Some(value) = value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            if !is_valid_time(value) {
                malformed = true;
                issues.push(ValidationIssue::exception(
                    index,
                    exception.date.clone(),
                    IssueKind::Malformed {
                        field,
                        value: value.to_string(),
                    },
                ));
            }
        }
        if malformed {
            continue;
        }

        if let Some(window) = exception.window() {
            if minutes_of_day(&window.end_time) <= minutes_of_day(&window.start_time) {
                issues.push(ValidationIssue::exception(
                    index,
                    exception.date.clone(),
                    IssueKind::EndNotAfterStart,
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(issues))
    }
}

/// Weekly intervals for one day, sorted
fn weekly_for_day(weekly: &[WeeklyAvailabilityEntry], day: u8) -> Vec<TimeInterval> {
    let mut intervals: Vec<TimeInterval> = weekly
        .iter()
        .filter(|entry| entry.day_of_week == day)
        .map(WeeklyAvailabilityEntry::interval)
        .collect();
    sort_intervals(&mut intervals);
    intervals
}

/// Remove `window` from each interval, splitting where needed
///
/// Intervals or windows that are not valid `HH:MM` are left untouched.
fn subtract_window(intervals: Vec<TimeInterval>, window: &TimeInterval) -> Vec<TimeInterval> {
    let (Some(block_start), Some(block_end)) = (
        minutes_of_day(&window.start_time),
        minutes_of_day(&window.end_time),
    ) else {
        return intervals;
    };

    let mut remaining = Vec::new();
    for interval in intervals {
        let (Some(start), Some(end)) = (
            minutes_of_day(&interval.start_time),
            minutes_of_day(&interval.end_time),
        ) else {
            remaining.push(interval);
            continue;
        };

        if block_end <= start || block_start >= end {
            remaining.push(interval);
            continue;
        }
        if start < block_start {
            remaining.push(TimeInterval::new(
                interval.start_time.clone(),
                format_minutes(block_start),
            ));
        }
        if block_end < end {
            remaining.push(TimeInterval::new(
                format_minutes(block_end),
                interval.end_time.clone(),
            ));
        }
    }
    remaining
}

fn apply_exception(exception: &ExceptionEntry, weekly: Vec<TimeInterval>) -> EffectiveAvailability {
    match (exception.window(), exception.is_available) {
        (None, false) => EffectiveAvailability::unavailable(),
        (None, true) => EffectiveAvailability {
            intervals: vec![TimeInterval::new(FULL_DAY_START, FULL_DAY_END)],
            is_available: true,
        },
        (Some(window), true) => EffectiveAvailability {
            intervals: vec![window],
            is_available: true,
        },
        (Some(window), false) => {
            let intervals = subtract_window(weekly, &window);
            EffectiveAvailability {
                is_available: !intervals.is_empty(),
                intervals,
            }
        }
    }
}

/// Availability on one date: a matching exception wins over the weekly pattern
///
/// When several exceptions share the date, the first one in the list is used.
pub fn resolve_effective_availability(
    weekly: &[WeeklyAvailabilityEntry],
    exceptions: &[ExceptionEntry],
    date: NaiveDate,
) -> EffectiveAvailability {
    let key = format_date(date);
    let weekly_intervals = weekly_for_day(weekly, day_of_week(date));

    match exceptions.iter().find(|exception| exception.date == key) {
        Some(exception) => apply_exception(exception, weekly_intervals),
        None => EffectiveAvailability {
            is_available: !weekly_intervals.is_empty(),
            intervals: weekly_intervals,
        },
    }
}

/// Availability for each day of the Sunday-to-Saturday week containing `date`
pub fn resolve_week(
    weekly: &[WeeklyAvailabilityEntry],
    exceptions: &[ExceptionEntry],
    date: NaiveDate,
) -> Vec<(NaiveDate, EffectiveAvailability)> {
    week_dates(date)
        .into_iter()
        .map(|day| (day, resolve_effective_availability(weekly, exceptions, day)))
        .collect()
}
