#![allow(dead_code)]

use async_trait::async_trait;
use noura_availability::components::api::AvailabilityApi;
use noura_availability::components::availability::{
    ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry,
};
use noura_availability::config::Config;
use noura_availability::error::{api_error, AppResult, Error};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const TOKEN: &str = "test-token";

/// A remote call as the mock saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchWeekly,
    FetchExceptions,
    Upsert(u8, Vec<TimeInterval>),
    Add(ExceptionEntry),
    Delete(String),
}

/// In-memory scheduling API that records every call
#[derive(Default)]
pub struct MockAvailabilityApi {
    weekly: Mutex<Vec<WeeklyAvailabilityEntry>>,
    exceptions: Mutex<Vec<ExceptionEntry>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<&'static str>>,
    rejected: Mutex<HashSet<&'static str>>,
    unauthorized: Mutex<bool>,
    after_first_write: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    next_id: Mutex<u32>,
}

impl MockAvailabilityApi {
    pub fn new(weekly: Vec<WeeklyAvailabilityEntry>, exceptions: Vec<ExceptionEntry>) -> Self {
        Self {
            weekly: Mutex::new(weekly),
            exceptions: Mutex::new(exceptions),
            next_id: Mutex::new(100),
            ..Default::default()
        }
    }

    /// Make every call to `operation` fail with an HTTP 500
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Answer every call with HTTP 401
    pub fn reject_token(&self) {
        *self.unauthorized.lock().unwrap() = true;
    }

    /// Run `hook` once the first mutating call has gone through
    pub fn after_first_write(&self, hook: impl FnOnce() + Send + 'static) {
        *self.after_first_write.lock().unwrap() = Some(Box::new(hook));
    }

    /// Fire `token` once the first mutating call has gone through
    pub fn cancel_after_first_call(&self, token: CancellationToken) {
        self.after_first_write(move || token.cancel());
    }

    /// Answer every call to `operation` with HTTP 401
    pub fn reject_token_for(&self, operation: &'static str) {
        self.rejected.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored_exceptions(&self) -> Vec<ExceptionEntry> {
        self.exceptions.lock().unwrap().clone()
    }

    pub fn stored_weekly(&self) -> Vec<WeeklyAvailabilityEntry> {
        self.weekly.lock().unwrap().clone()
    }

    fn record(&self, call: Call, operation: &str, auth_token: &str) -> AppResult<()> {
        self.calls.lock().unwrap().push(call);
        if *self.unauthorized.lock().unwrap()
            || auth_token != TOKEN
            || self.rejected.lock().unwrap().contains(operation)
        {
            return Err(Error::AuthenticationRequired);
        }
        if self.failing.lock().unwrap().contains(operation) {
            return Err(api_error(operation, "HTTP 500 Internal Server Error - boom"));
        }
        Ok(())
    }

    fn after_write(&self) {
        let hook = self.after_first_write.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

#[async_trait]
impl AvailabilityApi for MockAvailabilityApi {
    async fn fetch_weekly_availability(
        &self,
        auth_token: &str,
    ) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
        self.record(Call::FetchWeekly, "fetch_weekly_availability", auth_token)?;
        Ok(self.stored_weekly())
    }

    async fn fetch_exception_dates(&self, auth_token: &str) -> AppResult<Vec<ExceptionEntry>> {
        self.record(Call::FetchExceptions, "fetch_exception_dates", auth_token)?;
        Ok(self.stored_exceptions())
    }

    async fn upsert_weekly_availability(
        &self,
        day_of_week: u8,
        intervals: &[TimeInterval],
        auth_token: &str,
    ) -> AppResult<()> {
        self.record(
            Call::Upsert(day_of_week, intervals.to_vec()),
            "upsert_weekly_availability",
            auth_token,
        )?;
        let mut weekly = self.weekly.lock().unwrap();
        weekly.retain(|entry| entry.day_of_week != day_of_week);
        weekly.extend(intervals.iter().map(|interval| {
            WeeklyAvailabilityEntry::new(
                day_of_week,
                interval.start_time.clone(),
                interval.end_time.clone(),
            )
        }));
        drop(weekly);
        self.after_write();
        Ok(())
    }

    async fn add_exception_date(
        &self,
        exception: &ExceptionEntry,
        auth_token: &str,
    ) -> AppResult<ExceptionEntry> {
        self.record(Call::Add(exception.clone()), "add_exception_date", auth_token)?;
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            next_id.to_string()
        };
        let stored = exception.clone().with_id(id);
        self.exceptions.lock().unwrap().push(stored.clone());
        self.after_write();
        Ok(stored)
    }

    async fn delete_exception_date(&self, id: &str, auth_token: &str) -> AppResult<()> {
        self.record(Call::Delete(id.to_string()), "delete_exception_date", auth_token)?;
        self.exceptions
            .lock()
            .unwrap()
            .retain(|entry| entry.id.as_deref() != Some(id));
        self.after_write();
        Ok(())
    }
}

/// Config pointing nowhere, with the mock's token
pub fn test_config(timezone: &str) -> Config {
    Config {
        api_base_url: "http://localhost:9".to_string(),
        auth_token: Some(TOKEN.to_string()),
        timezone: timezone.to_string(),
        locale: "en".to_string(),
        request_timeout_secs: 5,
    }
}
