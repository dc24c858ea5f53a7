pub mod diff;
pub mod draft;
pub mod grouping;
pub mod models;
pub mod time;

pub use diff::{diff_exceptions, ChangedException, ExceptionDiff};
pub use draft::{reduce, DraftAction, WeeklyDraft};
pub use grouping::{
    ensure_unique_dates, group_by_day_of_week, resolve_effective_availability, resolve_week,
    validate_exceptions, DayGroups,
};
pub use models::{
    EffectiveAvailability, ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry, WeeklySchedule,
};
pub use time::{format_partial_time, is_valid_time, TimeCodec};
