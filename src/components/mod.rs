// Export components
pub mod api;
pub mod availability;
pub mod sync;

// Re-export the sync handle
pub use sync::AvailabilitySyncHandle;
