mod client;
pub mod models;

pub use client::HttpAvailabilityApi;

use crate::components::availability::models::{
    ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry,
};
use crate::error::AppResult;
use async_trait::async_trait;

/// Operations the remote scheduling service offers
///
/// Times cross this boundary in the UTC wire format.
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    /// Fetch the recurring weekly pattern
    async fn fetch_weekly_availability(
        &self,
        auth_token: &str,
    ) -> AppResult<Vec<WeeklyAvailabilityEntry>>;

    /// Fetch all date exceptions
    async fn fetch_exception_dates(&self, auth_token: &str) -> AppResult<Vec<ExceptionEntry>>;

    /// Replace the intervals of one weekday
    async fn upsert_weekly_availability(
        &self,
        day_of_week: u8,
        intervals: &[TimeInterval],
        auth_token: &str,
    ) -> AppResult<()>;

    /// Store a new exception; the returned entry carries the server id
    async fn add_exception_date(
        &self,
        exception: &ExceptionEntry,
        auth_token: &str,
    ) -> AppResult<ExceptionEntry>;

    /// Delete an exception by server id
    async fn delete_exception_date(&self, id: &str, auth_token: &str) -> AppResult<()>;
}
