//! # Queue Status
//!
//! Read model over the active download queue and the pending release
//! queue, with debounced change broadcasting.

pub mod models;
pub mod status;

pub use models::{PendingRelease, QueueItem, QueueStatus, TrackedDownloadStatus};
pub use status::{PendingReleaseProvider, QueueProvider, QueueStatusAggregator, StatusBroadcaster};
