use super::actor::{AvailabilitySyncActor, AvailabilitySyncActorHandle, RunCancellation};
use super::executor::SyncReport;
use crate::components::api::AvailabilityApi;
use crate::components::availability::draft::WeeklyDraft;
use crate::components::availability::models::{ExceptionEntry, WeeklyAvailabilityEntry};
use crate::config::Config;
use crate::error::AppResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Server state captured when an edit session starts
///
/// Never mutated afterwards; it is the baseline the edits are diffed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedSnapshot {
    pub weekly: Vec<WeeklyAvailabilityEntry>,
    pub exceptions: Vec<ExceptionEntry>,
}

/// Handle for interacting with the availability sync actor
#[derive(Clone)]
pub struct AvailabilitySyncHandle {
    actor_handle: AvailabilitySyncActorHandle,
    cancel: RunCancellation,
    _actor_task: Arc<JoinHandle<()>>,
}

impl AvailabilitySyncHandle {
    /// Create a new AvailabilitySyncHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>, api: Arc<dyn AvailabilityApi>) -> Self {
        let cancel = RunCancellation::default();

        // Create the actor and get its handle
        let (mut actor, handle) = AvailabilitySyncActor::new(config, api, cancel.clone());

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            cancel,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Fetch the weekly pattern in wire format
    pub async fn fetch_weekly(&self) -> AppResult<Vec<WeeklyAvailabilityEntry>> {
        self.actor_handle.fetch_weekly().await
    }

    /// Fetch all exceptions in wire format
    pub async fn fetch_exceptions(&self) -> AppResult<Vec<ExceptionEntry>> {
        self.actor_handle.fetch_exceptions().await
    }

    /// Capture the current server state as an edit baseline
    pub async fn snapshot(&self) -> AppResult<SyncedSnapshot> {
        let weekly = self.fetch_weekly().await?;
        let exceptions = self.fetch_exceptions().await?;
        Ok(SyncedSnapshot { weekly, exceptions })
    }

    /// Replay exception edits made since `snapshot`
    pub async fn apply_exceptions(
        &self,
        snapshot: &SyncedSnapshot,
        current: Vec<ExceptionEntry>,
    ) -> AppResult<SyncReport> {
        self.actor_handle
            .apply_exceptions(snapshot.weekly.clone(), snapshot.exceptions.clone(), current)
            .await
    }

    /// Save weekly edits made since `snapshot`; draft times are local
    pub async fn save_weekly(&self, snapshot: WeeklyDraft, draft: WeeklyDraft) -> AppResult<SyncReport> {
        self.actor_handle.save_weekly(snapshot, draft).await
    }

    /// Stop the sync in flight between steps; later syncs run normally
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the sync in flight and refuse to start any later one
    pub fn stop(&self) {
        self.cancel.stop();
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
