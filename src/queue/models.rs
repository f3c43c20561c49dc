use serde::{Deserialize, Serialize};

/// Import state of a tracked download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedDownloadStatus {
    Ok,
    Warning,
    Error,
}

/// An item in the active download queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    /// Library entity the download was matched to, if any
    pub owner_id: Option<i64>,
    pub status: TrackedDownloadStatus,
}

impl QueueItem {
    pub fn has_owner(&self) -> bool {
        self.owner_id.is_some()
    }
}

/// A release held back before being sent to a download client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRelease {
    pub id: i64,
}

/// Coalesced view of both queues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub total_count: usize,
    /// Queue items with an owner plus every pending release
    pub known_count: usize,
    pub unknown_count: usize,
    pub has_known_errors: bool,
    pub has_known_warnings: bool,
    pub has_unknown_errors: bool,
    pub has_unknown_warnings: bool,
}

impl QueueStatus {
    pub fn from_queues(queue: &[QueueItem], pending: &[PendingRelease]) -> Self {
        let any = |owned: bool, status: TrackedDownloadStatus| {
            queue
                .iter()
                .any(|item| item.has_owner() == owned && item.status == status)
        };
        let owned = queue.iter().filter(|item| item.has_owner()).count();

        Self {
            total_count: queue.len() + pending.len(),
            known_count: owned + pending.len(),
            unknown_count: queue.len() - owned,
            has_known_errors: any(true, TrackedDownloadStatus::Error),
            has_known_warnings: any(true, TrackedDownloadStatus::Warning),
            has_unknown_errors: any(false, TrackedDownloadStatus::Error),
            has_unknown_warnings: any(false, TrackedDownloadStatus::Warning),
        }
    }
}
