use super::print_json;
use noura_availability::components::api::models::{NewExceptionRequest, UpsertWeeklyRequest};
use noura_availability::components::availability::{
    DraftAction, ExceptionEntry, WeeklyAvailabilityEntry, WeeklySchedule,
};
use noura_availability::error::AppResult;
use schemars::schema_for;
use serde_json::json;

/// Print the schemas of the files the CLI reads and the bodies it sends
pub fn print() -> AppResult<()> {
    let schemas = json!({
        "weekly_entry": schema_for!(WeeklyAvailabilityEntry),
        "weekly_schedule": schema_for!(Vec<WeeklySchedule>),
        "exceptions": schema_for!(Vec<ExceptionEntry>),
        "draft_actions": schema_for!(Vec<DraftAction>),
        "upsert_weekly_request": schema_for!(UpsertWeeklyRequest),
        "new_exception_request": schema_for!(NewExceptionRequest),
    });
    print_json(&schemas)
}
