use super::models::{
    exception_from_value, exceptions_from_value, weekly_entries_from_value, NewExceptionRequest,
    UpsertWeeklyRequest,
};
use super::AvailabilityApi;
use crate::components::availability::models::{
    ExceptionEntry, TimeInterval, WeeklyAvailabilityEntry,
};
use crate::config::Config;
use crate::error::{api_error, config_error, AppResult, Error};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const WEEKLY_PATH: [&str; 2] = ["availability", "weekly"];
const EXCEPTIONS_PATH: [&str; 2] = ["availability", "exceptions"];

/// reqwest-backed client for the scheduling API
#[derive(Debug, Clone)]
pub struct HttpAvailabilityApi {
    client: Client,
    base_url: Url,
}

impl HttpAvailabilityApi {
    /// Create a client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("API URL '{}' cannot be a base", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Build an endpoint URL below the base URL
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        auth_token: &str,
    ) -> AppResult<Response> {
        let response = request
            .bearer_auth(auth_token)
            .send()
            .await
            .map_err(|e| api_error(operation, &e.to_string()))?;

        let status = response.status();
        debug!("{} -> HTTP {}", operation, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthenticationRequired);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(api_error(
                operation,
                &format!("HTTP {} - {}", status, error_body),
            ));
        }

        Ok(response)
    }

    async fn send_json(
        &self,
        operation: &str,
        request: RequestBuilder,
        auth_token: &str,
    ) -> AppResult<Value> {
        self.send(operation, request, auth_token)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| api_error(operation, &format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl AvailabilityApi for HttpAvailabilityApi {
    async fn fetch_weekly_availability(
        &self,
        auth_token: &str,
    ) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
        let url = self.endpoint(&WEEKLY_PATH);
        let value = self
            .send_json("fetch_weekly_availability", self.client.get(url), auth_token)
            .await?;
        weekly_entries_from_value(value)
    }

    async fn fetch_exception_dates(&self, auth_token: &str) -> AppResult<Vec<ExceptionEntry>> {
        let url = self.endpoint(&EXCEPTIONS_PATH);
        let value = self
            .send_json("fetch_exception_dates", self.client.get(url), auth_token)
            .await?;
        exceptions_from_value(value)
    }

    async fn upsert_weekly_availability(
        &self,
        day_of_week: u8,
        intervals: &[TimeInterval],
        auth_token: &str,
    ) -> AppResult<()> {
        let day = day_of_week.to_string();
        let url = self.endpoint(&[WEEKLY_PATH[0], WEEKLY_PATH[1], day.as_str()]);
        let body = UpsertWeeklyRequest {
            day_of_week,
            intervals: intervals.to_vec(),
        };
        self.send(
            "upsert_weekly_availability",
            self.client.put(url).json(&body),
            auth_token,
        )
        .await?;
        Ok(())
    }

    async fn add_exception_date(
        &self,
        exception: &ExceptionEntry,
        auth_token: &str,
    ) -> AppResult<ExceptionEntry> {
        let url = self.endpoint(&EXCEPTIONS_PATH);
        let body = NewExceptionRequest::from_entry(exception);
        let value = self
            .send_json(
                "add_exception_date",
                self.client.post(url).json(&body),
                auth_token,
            )
            .await?;
        exception_from_value(value)
    }

    async fn delete_exception_date(&self, id: &str, auth_token: &str) -> AppResult<()> {
        let url = self.endpoint(&[EXCEPTIONS_PATH[0], EXCEPTIONS_PATH[1], id]);
        self.send(
            "delete_exception_date",
            self.client.delete(url),
            auth_token,
        )
        .await?;
        Ok(())
    }
}
