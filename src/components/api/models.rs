//! Wire shapes of the scheduling API.
//!
//! Responses come back in several shapes: a bare array, `{"data": [...]}` or
//! `{"items": [...]}` for lists, a bare or `{"data": {...}}` object for single
//! records, and ids as either strings or numbers. All of that is absorbed here
//! so the rest of the crate only sees the normalized models.

use crate::components::availability::models::{
    ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry,
};
use crate::error::{AppResult, Error};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Items { items: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Data { data } => data,
            ListEnvelope::Items { items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectEnvelope<T> {
    Data { data: T },
    Bare(T),
}

impl<T> ObjectEnvelope<T> {
    fn into_inner(self) -> T {
        match self {
            ObjectEnvelope::Data { data } => data,
            ObjectEnvelope::Bare(inner) => inner,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawException {
    #[serde(default)]
    id: Option<RawId>,
    date: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    is_available: bool,
}

impl From<RawException> for ExceptionEntry {
    fn from(raw: RawException) -> Self {
        ExceptionEntry {
            id: raw.id.map(String::from),
            // Some backends send a full timestamp for the date
            date: raw.date.chars().take(10).collect(),
            start_time: raw.start_time.filter(|t| !t.is_empty()),
            end_time: raw.end_time.filter(|t| !t.is_empty()),
            is_available: raw.is_available,
        }
    }
}

/// Body of a weekly upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct UpsertWeeklyRequest {
    pub day_of_week: u8,
    pub intervals: Vec<TimeInterval>,
}

/// Body of an exception insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NewExceptionRequest {
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_full_day: bool,
    pub is_available: bool,
}

impl NewExceptionRequest {
    /// Build the insert body for an exception
    pub fn from_entry(entry: &ExceptionEntry) -> Self {
        let window = entry.window();
        Self {
            date: entry.date.clone(),
            is_full_day: window.is_none(),
            start_time: window.as_ref().map(|w| w.start_time.clone()),
            end_time: window.map(|w| w.end_time),
            is_available: entry.is_available,
        }
    }
}

fn shape_error(what: &str, err: serde_json::Error) -> Error {
    Error::Serialization(format!("Unexpected {} response shape: {}", what, err))
}

/// Read a list response in any of the accepted shapes
pub fn parse_list<T: DeserializeOwned>(what: &str, value: Value) -> AppResult<Vec<T>> {
    serde_json::from_value::<ListEnvelope<T>>(value)
        .map(ListEnvelope::into_vec)
        .map_err(|e| shape_error(what, e))
}

/// Read a single-record response in any of the accepted shapes
pub fn parse_object<T: DeserializeOwned>(what: &str, value: Value) -> AppResult<T> {
    serde_json::from_value::<ObjectEnvelope<T>>(value)
        .map(ObjectEnvelope::into_inner)
        .map_err(|e| shape_error(what, e))
}

/// Weekly entries from a list response
pub fn weekly_entries_from_value(value: Value) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
    parse_list("weekly availability", value)
}

/// Exceptions from a list response
pub fn exceptions_from_value(value: Value) -> AppResult<Vec<ExceptionEntry>> {
    Ok(parse_list::<RawException>("exception dates", value)?
        .into_iter()
        .map(ExceptionEntry::from)
        .collect())
}

/// One exception from an insert response
pub fn exception_from_value(value: Value) -> AppResult<ExceptionEntry> {
    parse_object::<RawException>("exception", value).map(ExceptionEntry::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_weekly_list_shapes() {
        let entry = json!({"day_of_week": 1, "start_time": "09:00", "end_time": "17:00"});
        let expected = vec![WeeklyAvailabilityEntry::new(1, "09:00", "17:00")];

        assert_eq!(weekly_entries_from_value(json!([entry.clone()])).unwrap(), expected);
        assert_eq!(
            weekly_entries_from_value(json!({"data": [entry.clone()]})).unwrap(),
            expected
        );
        assert_eq!(
            weekly_entries_from_value(json!({"items": [entry], "count": 1})).unwrap(),
            expected
        );
    }

    #[test]
    fn test_exception_ids_and_dates_normalized() {
        let value = json!({"data": [
            {"id": 42, "date": "2025-06-02T00:00:00Z", "is_available": false},
            {"id": "abc", "date": "2025-06-03", "start_time": "10:00", "end_time": "12:00", "is_available": true},
            {"date": "2025-06-04", "start_time": "", "end_time": null, "is_available": true}
        ]});
        let entries = exceptions_from_value(value).unwrap();
        assert_eq!(entries[0], ExceptionEntry::full_day("2025-06-02", false).with_id("42"));
        assert_eq!(
            entries[1],
            ExceptionEntry::partial("2025-06-03", "10:00", "12:00", true).with_id("abc")
        );
        assert_eq!(entries[2], ExceptionEntry::full_day("2025-06-04", true));
    }

    #[test]
    fn test_single_exception_shapes() {
        let bare = json!({"id": 7, "date": "2025-06-02", "is_available": true});
        let wrapped = json!({"data": {"id": 7, "date": "2025-06-02", "is_available": true}});
        let expected = ExceptionEntry::full_day("2025-06-02", true).with_id("7");
        assert_eq!(exception_from_value(bare).unwrap(), expected);
        assert_eq!(exception_from_value(wrapped).unwrap(), expected);
    }

    #[test]
    fn test_unexpected_shape_is_serialization_error() {
        let err = weekly_entries_from_value(json!({"rows": []})).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_new_exception_request_flags() {
        let full = NewExceptionRequest::from_entry(&ExceptionEntry::full_day("2025-06-02", false));
        assert!(full.is_full_day);
        assert_eq!(full.start_time, None);

        let partial = NewExceptionRequest::from_entry(&ExceptionEntry::partial(
            "2025-06-02",
            "10:00",
            "11:00",
            true,
        ));
        assert!(!partial.is_full_day);
        assert_eq!(partial.start_time.as_deref(), Some("10:00"));
        assert_eq!(partial.end_time.as_deref(), Some("11:00"));
    }
}
