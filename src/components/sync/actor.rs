use super::executor::{apply_exception_diff, apply_weekly_draft, SyncReport};
use crate::components::api::AvailabilityApi;
use crate::components::availability::draft::WeeklyDraft;
use crate::components::availability::models::{ExceptionEntry, WeeklyAvailabilityEntry};
use crate::components::availability::time::TimeCodec;
use crate::config::Config;
use crate::error::{other_error, AppResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancellation for sync runs
///
/// Every run gets its own token. `cancel` stops only the run in flight;
/// `stop` also cancels every later run.
#[derive(Clone, Default)]
pub struct RunCancellation {
    root: CancellationToken,
    current: Arc<Mutex<CancellationToken>>,
}

impl RunCancellation {
    /// Token for a run starting now
    fn begin(&self) -> CancellationToken {
        let token = self.root.child_token();
        *self.current() = token.clone();
        token
    }

    /// Cancel the run in flight, if any
    pub fn cancel(&self) {
        self.current().cancel();
    }

    /// Cancel the run in flight and every later one
    pub fn stop(&self) {
        self.root.cancel();
    }

    fn current(&self) -> MutexGuard<'_, CancellationToken> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The sync actor that processes messages one at a time
pub struct AvailabilitySyncActor {
    config: Arc<RwLock<Config>>,
    api: Arc<dyn AvailabilityApi>,
    cancel: RunCancellation,
    command_rx: mpsc::Receiver<AvailabilitySyncCommand>,
}

/// Commands that can be sent to the sync actor
pub enum AvailabilitySyncCommand {
    FetchWeekly(mpsc::Sender<AppResult<Vec<WeeklyAvailabilityEntry>>>),
    FetchExceptions(mpsc::Sender<AppResult<Vec<ExceptionEntry>>>),
    ApplyExceptions {
        weekly: Vec<WeeklyAvailabilityEntry>,
        original: Vec<ExceptionEntry>,
        current: Vec<ExceptionEntry>,
        respond: mpsc::Sender<AppResult<SyncReport>>,
    },
    SaveWeekly {
        snapshot: WeeklyDraft,
        draft: WeeklyDraft,
        respond: mpsc::Sender<AppResult<SyncReport>>,
    },
    Shutdown,
}

/// Handle for communicating with the sync actor
#[derive(Clone)]
pub struct AvailabilitySyncActorHandle {
    command_tx: mpsc::Sender<AvailabilitySyncCommand>,
}

impl AvailabilitySyncActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<AppResult<T>>) -> AvailabilitySyncCommand,
    ) -> AppResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Fetch the weekly pattern in wire format
    pub async fn fetch_weekly(&self) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
        self.request(AvailabilitySyncCommand::FetchWeekly).await
    }

    /// Fetch all exceptions in wire format
    pub async fn fetch_exceptions(&self) -> AppResult<Vec<ExceptionEntry>> {
        self.request(AvailabilitySyncCommand::FetchExceptions).await
    }

    /// Replay the difference between two exception lists
    pub async fn apply_exceptions(
        &self,
        weekly: Vec<WeeklyAvailabilityEntry>,
        original: Vec<ExceptionEntry>,
        current: Vec<ExceptionEntry>,
    ) -> AppResult<SyncReport> {
        self.request(|respond| AvailabilitySyncCommand::ApplyExceptions {
            weekly,
            original,
            current,
            respond,
        })
        .await
    }

    /// Save the days of `draft` that differ from `snapshot`
    pub async fn save_weekly(
        &self,
        snapshot: WeeklyDraft,
        draft: WeeklyDraft,
    ) -> AppResult<SyncReport> {
        self.request(|respond| AvailabilitySyncCommand::SaveWeekly {
            snapshot,
            draft,
            respond,
        })
        .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(AvailabilitySyncCommand::Shutdown).await;
        Ok(())
    }
}

impl AvailabilitySyncActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        api: Arc<dyn AvailabilityApi>,
        cancel: RunCancellation,
    ) -> (Self, AvailabilitySyncActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            api,
            cancel,
            command_rx,
        };

        let handle = AvailabilitySyncActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Availability sync actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                AvailabilitySyncCommand::FetchWeekly(response_tx) => {
                    let result = self.fetch_weekly().await;
                    let _ = response_tx.send(result).await;
                }
                AvailabilitySyncCommand::FetchExceptions(response_tx) => {
                    let result = self.fetch_exceptions().await;
                    let _ = response_tx.send(result).await;
                }
                AvailabilitySyncCommand::ApplyExceptions {
                    weekly,
                    original,
                    current,
                    respond,
                } => {
                    let token = self.auth_token().await;
                    let run_cancel = self.cancel.begin();
                    let result = apply_exception_diff(
                        self.api.as_ref(),
                        token.as_deref(),
                        &weekly,
                        &original,
                        &current,
                        &run_cancel,
                    )
                    .await;
                    let _ = respond.send(result).await;
                }
                AvailabilitySyncCommand::SaveWeekly {
                    snapshot,
                    draft,
                    respond,
                } => {
                    let result = self.save_weekly(&snapshot, &draft).await;
                    let _ = respond.send(result).await;
                }
                AvailabilitySyncCommand::Shutdown => {
                    info!("Availability sync actor shutting down");
                    break;
                }
            }
        }

        info!("Availability sync actor shut down");
    }

    async fn auth_token(&self) -> Option<String> {
        self.config.read().await.auth_token.clone()
    }

    async fn fetch_weekly(&self) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
        let config = self.config.read().await;
        let token = config.require_token()?;
        self.api.fetch_weekly_availability(token).await
    }

    async fn fetch_exceptions(&self) -> AppResult<Vec<ExceptionEntry>> {
        let config = self.config.read().await;
        let token = config.require_token()?;
        self.api.fetch_exception_dates(token).await
    }

    async fn save_weekly(&self, snapshot: &WeeklyDraft, draft: &WeeklyDraft) -> AppResult<SyncReport> {
        let (token, zone) = {
            let config = self.config.read().await;
            (config.auth_token.clone(), config.time_zone()?)
        };
        let codec = TimeCodec::for_today(zone);
        let run_cancel = self.cancel.begin();
        apply_weekly_draft(
            self.api.as_ref(),
            token.as_deref(),
            snapshot,
            draft,
            &codec,
            &run_cancel,
        )
        .await
    }
}
