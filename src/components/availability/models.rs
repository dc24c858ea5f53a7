use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Start of the interval a day gets when it is switched on
pub const DEFAULT_START_TIME: &str = "09:00";
/// End of the interval a day gets when it is switched on
pub const DEFAULT_END_TIME: &str = "17:00";
/// Number of days in the weekly pattern
pub const DAYS_IN_WEEK: u8 = 7;

/// A clock-time interval in `HH:MM`
///
/// The strings are not validated on construction. Drafts hold partially typed
/// values until they are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeInterval {
    pub start_time: String,
    pub end_time: String,
}

impl TimeInterval {
    /// Create a new interval
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// The 09:00-17:00 interval used when a day is switched on
    pub fn default_workday() -> Self {
        Self::new(DEFAULT_START_TIME, DEFAULT_END_TIME)
    }
}

/// A recurring availability interval on one day of the week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklyAvailabilityEntry {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

impl WeeklyAvailabilityEntry {
    /// Create a new weekly entry
    pub fn new(day_of_week: u8, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            day_of_week,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// The entry's interval without the day
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time.clone(), self.end_time.clone())
    }
}

/// A date-specific override of the weekly pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExceptionEntry {
    /// Server-assigned id, absent until the exception has been synced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub is_available: bool,
}

impl ExceptionEntry {
    /// Create a whole-day exception
    pub fn full_day(date: impl Into<String>, is_available: bool) -> Self {
        Self {
            id: None,
            date: date.into(),
            start_time: None,
            end_time: None,
            is_available,
        }
    }

    /// Create an exception covering one window of the day
    pub fn partial(
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        is_available: bool,
    ) -> Self {
        Self {
            id: None,
            date: date.into(),
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
            is_available,
        }
    }

    /// Attach a server id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The explicit window, if both ends are present
    pub fn window(&self) -> Option<TimeInterval> {
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Some(TimeInterval::new(start, end))
            }
            _ => None,
        }
    }

    /// Whether the exception applies to the whole day
    pub fn is_full_day(&self) -> bool {
        self.window().is_none()
    }

    /// Whether the server knows about this exception
    pub fn is_synced(&self) -> bool {
        self.id.is_some()
    }

    /// Compare everything except the server id
    pub fn same_content(&self, other: &ExceptionEntry) -> bool {
        self.date == other.date
            && self.window() == other.window()
            && self.is_available == other.is_available
    }
}

/// One day of an editable weekly draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WeeklySchedule {
    pub day_of_week: u8,
    #[serde(default)]
    pub intervals: Vec<TimeInterval>,
}

impl WeeklySchedule {
    /// An unavailable day
    pub fn off(day_of_week: u8) -> Self {
        Self {
            day_of_week,
            intervals: Vec::new(),
        }
    }

    /// A day is on when it has at least one interval
    pub fn is_available(&self) -> bool {
        !self.intervals.is_empty()
    }
}

/// What a person's availability actually is on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveAvailability {
    pub intervals: Vec<TimeInterval>,
    pub is_available: bool,
}

impl EffectiveAvailability {
    /// Nothing available
    pub fn unavailable() -> Self {
        Self {
            intervals: Vec::new(),
            is_available: false,
        }
    }
}
