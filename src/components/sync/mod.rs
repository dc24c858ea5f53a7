mod actor;
pub mod executor;
mod handle;

pub use executor::{
    apply_exception_diff, apply_weekly_draft, CompletedOperation, FailedOperation, SyncOperation,
    SyncOutcome, SyncReport,
};
pub use handle::{AvailabilitySyncHandle, SyncedSnapshot};
