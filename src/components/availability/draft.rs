//! Editable seven-day availability draft.
//!
//! Transitions are pure: every action takes the current draft and returns a
//! new one. Days are looked up by `day_of_week`, never by position.

use super::grouping::group_by_day_of_week;
use super::models::{TimeInterval, WeeklyAvailabilityEntry, WeeklySchedule, DAYS_IN_WEEK};
use super::time::{is_valid_time, minutes_of_day, TimeCodec};
use crate::error::{AppResult, Error, IntervalField, IssueKind, ValidationIssue};
use chrono::TimeZone;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Actions a user can take on the draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftAction {
    /// Off days get one default interval, on days are cleared
    ToggleDay { day: u8 },
    /// Append a default interval
    AddInterval { day: u8 },
    RemoveInterval { day: u8, index: usize },
    /// Replace one end of one interval, unvalidated
    UpdateInterval {
        day: u8,
        index: usize,
        field: IntervalField,
        value: String,
    },
    /// Replace the whole draft
    SetSchedule { schedule: Vec<WeeklySchedule> },
}

/// Seven days of intervals being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyDraft {
    days: Vec<WeeklySchedule>,
}

impl Default for WeeklyDraft {
    fn default() -> Self {
        Self::empty()
    }
}

impl WeeklyDraft {
    /// A draft with every day off
    pub fn empty() -> Self {
        Self {
            days: (0..DAYS_IN_WEEK).map(WeeklySchedule::off).collect(),
        }
    }

    /// Build a draft from a schedule list, filling in any missing day as off
    ///
    /// Days outside 0..=6 are dropped. A repeated day keeps its first entry.
    pub fn from_schedule(schedule: Vec<WeeklySchedule>) -> Self {
        let mut draft = Self::empty();
        let mut seen = [false; DAYS_IN_WEEK as usize];
        for day in schedule {
            let Some(slot) = seen.get_mut(day.day_of_week as usize) else {
                debug!("Dropping schedule for day {}", day.day_of_week);
                continue;
            };
            if *slot {
                continue;
            }
            *slot = true;
            if let Some(existing) = draft.day_mut(day.day_of_week) {
                existing.intervals = day.intervals;
            }
        }
        draft
    }

    /// Seed a draft from flat weekly entries
    pub fn from_entries(entries: &[WeeklyAvailabilityEntry]) -> Self {
        Self::from_schedule(
            group_by_day_of_week(entries)
                .into_iter()
                .map(|(day_of_week, intervals)| WeeklySchedule {
                    day_of_week,
                    intervals,
                })
                .collect(),
        )
    }

    /// Flatten back into weekly entries
    pub fn to_entries(&self) -> Vec<WeeklyAvailabilityEntry> {
        let mut days: Vec<&WeeklySchedule> = self.days.iter().collect();
        days.sort_by_key(|d| d.day_of_week);
        days.into_iter()
            .flat_map(|day| {
                day.intervals.iter().map(move |interval| WeeklyAvailabilityEntry {
                    day_of_week: day.day_of_week,
                    start_time: interval.start_time.clone(),
                    end_time: interval.end_time.clone(),
                })
            })
            .collect()
    }

    /// All days of the draft
    pub fn days(&self) -> &[WeeklySchedule] {
        &self.days
    }

    /// One day of the draft
    pub fn day(&self, day_of_week: u8) -> Option<&WeeklySchedule> {
        self.days.iter().find(|d| d.day_of_week == day_of_week)
    }

    fn day_mut(&mut self, day_of_week: u8) -> Option<&mut WeeklySchedule> {
        self.days.iter_mut().find(|d| d.day_of_week == day_of_week)
    }

    /// Intervals for one day, empty if the day is unknown
    pub fn intervals(&self, day_of_week: u8) -> &[TimeInterval] {
        self.day(day_of_week)
            .map(|d| d.intervals.as_slice())
            .unwrap_or(&[])
    }

    /// Apply one action, returning the new draft
    pub fn apply(&self, action: DraftAction) -> Self {
        let mut next = self.clone();
        match action {
            DraftAction::ToggleDay { day } => {
                if let Some(schedule) = next.day_mut(day) {
                    if schedule.intervals.is_empty() {
                        schedule.intervals = vec![TimeInterval::default_workday()];
                    } else {
                        schedule.intervals.clear();
                    }
                }
            }
            DraftAction::AddInterval { day } => {
                if let Some(schedule) = next.day_mut(day) {
                    schedule.intervals.push(TimeInterval::default_workday());
                }
            }
            DraftAction::RemoveInterval { day, index } => {
                if let Some(schedule) = next.day_mut(day) {
                    if index < schedule.intervals.len() {
                        schedule.intervals.remove(index);
                    }
                }
            }
            DraftAction::UpdateInterval {
                day,
                index,
                field,
                value,
            } => {
                if let Some(interval) = next
                    .day_mut(day)
                    .and_then(|schedule| schedule.intervals.get_mut(index))
                {
                    match field {
                        IntervalField::StartTime => interval.start_time = value,
                        IntervalField::EndTime => interval.end_time = value,
                    }
                }
            }
            DraftAction::SetSchedule { schedule } => {
                next = Self::from_schedule(schedule);
            }
        }
        next
    }

    /// Check every interval before anything is sent
    pub fn validate(&self) -> AppResult<()> {
        let mut issues = Vec::new();
        let mut days: Vec<&WeeklySchedule> = self.days.iter().collect();
        days.sort_by_key(|d| d.day_of_week);

        for day in days {
            for (index, interval) in day.intervals.iter().enumerate() {
                let mut malformed = false;
                for (field, value) in [
                    (IntervalField::StartTime, &interval.start_time),
                    (IntervalField::EndTime, &interval.end_time),
                ] {
                    if !is_valid_time(value) {
                        malformed = true;
                        issues.push(ValidationIssue::weekly(
                            day.day_of_week,
                            index,
                            IssueKind::Malformed {
                                field,
                                value: value.clone(),
                            },
                        ));
                    }
                }
                if malformed {
                    continue;
                }
                if minutes_of_day(&interval.end_time) <= minutes_of_day(&interval.start_time) {
                    issues.push(ValidationIssue::weekly(
                        day.day_of_week,
                        index,
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

    /// Days whose intervals differ from `snapshot`, in day order
    pub fn changed_days(&self, snapshot: &WeeklyDraft) -> Vec<u8> {
        (0..DAYS_IN_WEEK)
            .filter(|day| self.intervals(*day) != snapshot.intervals(*day))
            .collect()
    }

    /// Copy of the draft with every time shifted from the display zone to UTC
    pub fn to_utc<Tz: TimeZone>(&self, codec: &TimeCodec<Tz>) -> Self {
        Self {
            days: self
                .days
                .iter()
                .map(|day| WeeklySchedule {
                    day_of_week: day.day_of_week,
                    intervals: day
                        .intervals
                        .iter()
                        .map(|i| {
                            let utc = TimeInterval::new(
                                codec.local_to_utc_hhmm(&i.start_time),
                                codec.local_to_utc_hhmm(&i.end_time),
                            );
                            if wraps_midnight(&utc) {
                                warn!(
                                    day_of_week = day.day_of_week,
                                    "Local interval {}-{} crosses UTC midnight as {}-{}",
                                    i.start_time,
                                    i.end_time,
                                    utc.start_time,
                                    utc.end_time
                                );
                            }
                            utc
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Whether a valid interval ends at or before its start
pub fn wraps_midnight(interval: &TimeInterval) -> bool {
    match (
        minutes_of_day(&interval.start_time),
        minutes_of_day(&interval.end_time),
    ) {
        (Some(start), Some(end)) => end <= start,
        _ => false,
    }
}

/// Free-function form of [`WeeklyDraft::apply`]
pub fn reduce(state: &WeeklyDraft, action: DraftAction) -> WeeklyDraft {
    state.apply(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueLocation;

    fn update(day: u8, index: usize, field: IntervalField, value: &str) -> DraftAction {
        DraftAction::UpdateInterval {
            day,
            index,
            field,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_empty_draft_has_seven_off_days() {
        let draft = WeeklyDraft::empty();
        assert_eq!(draft.days().len(), 7);
        assert!(draft.days().iter().all(|d| !d.is_available()));
    }

    #[test]
    fn test_toggle_day_on_and_off() {
        let draft = WeeklyDraft::empty().apply(DraftAction::ToggleDay { day: 1 });
        assert_eq!(draft.intervals(1), &[TimeInterval::new("09:00", "17:00")]);

        let draft = draft.apply(DraftAction::ToggleDay { day: 1 });
        assert!(draft.intervals(1).is_empty());
    }

    #[test]
    fn test_toggle_discards_customization() {
        let draft = WeeklyDraft::empty()
            .apply(DraftAction::ToggleDay { day: 2 })
            .apply(update(2, 0, IntervalField::StartTime, "07:30"))
            .apply(DraftAction::AddInterval { day: 2 })
            .apply(DraftAction::ToggleDay { day: 2 })
            .apply(DraftAction::ToggleDay { day: 2 });
        assert_eq!(draft.intervals(2), &[TimeInterval::default_workday()]);
    }

    #[test]
    fn test_add_and_remove_intervals() {
        let draft = WeeklyDraft::empty()
            .apply(DraftAction::AddInterval { day: 3 })
            .apply(DraftAction::AddInterval { day: 3 })
            .apply(update(3, 1, IntervalField::EndTime, "18:00"));
        assert_eq!(draft.intervals(3).len(), 2);
        assert_eq!(draft.intervals(3)[1].end_time, "18:00");

        let draft = draft.apply(DraftAction::RemoveInterval { day: 3, index: 0 });
        assert_eq!(draft.intervals(3), &[TimeInterval::new("09:00", "18:00")]);

        // Removing the last interval turns the day off
        let draft = draft.apply(DraftAction::RemoveInterval { day: 3, index: 0 });
        assert!(!draft.day(3).unwrap().is_available());
    }

    #[test]
    fn test_out_of_range_actions_leave_state_unchanged() {
        let draft = WeeklyDraft::empty().apply(DraftAction::ToggleDay { day: 0 });
        assert_eq!(draft.apply(DraftAction::ToggleDay { day: 7 }), draft);
        assert_eq!(draft.apply(DraftAction::RemoveInterval { day: 0, index: 5 }), draft);
        assert_eq!(draft.apply(update(4, 0, IntervalField::StartTime, "10:00")), draft);
    }

    #[test]
    fn test_update_keeps_partial_values() {
        let draft = WeeklyDraft::empty()
            .apply(DraftAction::ToggleDay { day: 5 })
            .apply(update(5, 0, IntervalField::StartTime, "1"));
        assert_eq!(draft.intervals(5)[0].start_time, "1");
    }

    #[test]
    fn test_set_schedule_fills_missing_days() {
        let draft = reduce(
            &WeeklyDraft::empty(),
            DraftAction::SetSchedule {
                schedule: vec![
                    WeeklySchedule {
                        day_of_week: 6,
                        intervals: vec![TimeInterval::new("10:00", "12:00")],
                    },
                    WeeklySchedule {
                        day_of_week: 1,
                        intervals: vec![TimeInterval::new("08:00", "09:00")],
                    },
                ],
            },
        );
        assert_eq!(draft.days().len(), 7);
        assert_eq!(draft.intervals(6), &[TimeInterval::new("10:00", "12:00")]);
        assert_eq!(draft.intervals(1), &[TimeInterval::new("08:00", "09:00")]);
        assert!(draft.intervals(0).is_empty());
    }

    #[test]
    fn test_entries_round_trip() {
        let entries = vec![
            WeeklyAvailabilityEntry::new(1, "09:00", "12:00"),
            WeeklyAvailabilityEntry::new(1, "13:00", "17:00"),
            WeeklyAvailabilityEntry::new(4, "10:00", "14:00"),
        ];
        let draft = WeeklyDraft::from_entries(&entries);
        assert_eq!(draft.to_entries(), entries);
    }

    #[test]
    fn test_validate_reports_each_issue() {
        let draft = WeeklyDraft::empty()
            .apply(DraftAction::ToggleDay { day: 1 })
            .apply(update(1, 0, IntervalField::StartTime, "9:3"))
            .apply(DraftAction::ToggleDay { day: 2 })
            .apply(update(2, 0, IntervalField::EndTime, "08:00"));

        match draft.validate() {
            Err(Error::Validation(issues)) => {
                assert_eq!(issues.len(), 2);
                assert_eq!(
                    issues[0].location,
                    IssueLocation::WeeklyInterval {
                        day_of_week: 1,
                        index: 0
                    }
                );
                assert_eq!(
                    issues[0].kind,
                    IssueKind::Malformed {
                        field: IntervalField::StartTime,
                        value: "9:3".to_string()
                    }
                );
                assert_eq!(
                    issues[1].location,
                    IssueLocation::WeeklyInterval {
                        day_of_week: 2,
                        index: 0
                    }
                );
                assert_eq!(issues[1].kind, IssueKind::EndNotAfterStart);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(WeeklyDraft::empty()
            .apply(DraftAction::ToggleDay { day: 1 })
            .validate()
            .is_ok());
    }

    #[test]
    fn test_to_utc_interval_crossing_midnight() {
        let codec = TimeCodec::new(
            chrono::FixedOffset::east_opt(3 * 3600).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        );
        let draft = WeeklyDraft::empty()
            .apply(DraftAction::ToggleDay { day: 1 })
            .apply(update(1, 0, IntervalField::StartTime, "01:00"))
            .apply(update(1, 0, IntervalField::EndTime, "05:00"));

        let utc = draft.to_utc(&codec);
        assert_eq!(utc.intervals(1), &[TimeInterval::new("22:00", "02:00")]);
        assert!(wraps_midnight(&utc.intervals(1)[0]));
        assert!(!wraps_midnight(&TimeInterval::new("09:00", "17:00")));
        assert!(!wraps_midnight(&TimeInterval::new("9:0", "08:00")));
    }

    #[test]
    fn test_changed_days() {
        let snapshot = WeeklyDraft::from_entries(&[WeeklyAvailabilityEntry::new(1, "09:00", "17:00")]);
        let draft = snapshot
            .apply(DraftAction::ToggleDay { day: 1 })
            .apply(DraftAction::ToggleDay { day: 3 });
        assert_eq!(draft.changed_days(&snapshot), vec![1, 3]);
        assert!(snapshot.changed_days(&snapshot).is_empty());
    }

    #[test]
    fn test_action_deserializes_from_tagged_json() {
        let action: DraftAction =
            serde_json::from_str(r#"{"type":"TOGGLE_DAY","day":2}"#).unwrap();
        assert_eq!(action, DraftAction::ToggleDay { day: 2 });

        let action: DraftAction = serde_json::from_str(
            r#"{"type":"UPDATE_INTERVAL","day":2,"index":0,"field":"end_time","value":"18:00"}"#,
        )
        .unwrap();
        assert_eq!(action, update(2, 0, IntervalField::EndTime, "18:00"));
    }
}
