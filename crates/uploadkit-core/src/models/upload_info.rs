use serde::{Deserialize, Serialize};

/// Share of the combined progress attributed to the transfer itself; the rest
/// covers server-side file identification.
const UPLOAD_PROGRESS_WEIGHT: f64 = 0.9;

/// Lifecycle of one file submission, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Uploading,
    Uploaded,
    Ready,
}

impl UploadState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Ready => "ready",
        }
    }
}

/// Progress snapshot of a single file submission
///
/// Each snapshot replaces the previous one; it is not a delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub progress: f64,
    pub state: UploadState,
    pub upload_progress: f64,
}

impl UploadInfo {
    pub fn uploading(upload_progress: f64) -> Self {
        let upload_progress = clamp_fraction(upload_progress);
        Self {
            progress: upload_progress * UPLOAD_PROGRESS_WEIGHT,
            state: UploadState::Uploading,
            upload_progress,
        }
    }

    pub fn uploaded() -> Self {
        Self {
            progress: UPLOAD_PROGRESS_WEIGHT,
            state: UploadState::Uploaded,
            upload_progress: 1.0,
        }
    }

    pub fn ready() -> Self {
        Self {
            progress: 1.0,
            state: UploadState::Ready,
            upload_progress: 1.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == UploadState::Ready
    }

    /// Combine a new snapshot with the previous one so that neither fraction
    /// nor the state ever moves backwards within one lifecycle.
    pub fn merge_monotonic(previous: Option<&UploadInfo>, next: UploadInfo) -> UploadInfo {
        let next = UploadInfo {
            progress: clamp_fraction(next.progress),
            state: next.state,
            upload_progress: clamp_fraction(next.upload_progress),
        };
        match previous {
            None => next,
            Some(prev) => UploadInfo {
                progress: next.progress.max(prev.progress),
                state: next.state.max(prev.state),
                upload_progress: next.upload_progress.max(prev.upload_progress),
            },
        }
    }
}

impl Default for UploadInfo {
    fn default() -> Self {
        Self::uploading(0.0)
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
