//! File handles
//!
//! A file handle resolves to a [`FileInfo`] once the file is uploaded and
//! validated, and reports [`UploadInfo`] progress on the way there.

use uploadkit_core::{FileInfo, UploadError, UploadInfo};

use crate::deferred::{Deferred, Promise};

/// Consumer view of a file being resolved
pub type FilePromise = Promise<FileInfo, UploadInfo>;

/// Producer side of a file handle.
///
/// Progress snapshots are merged with the previous one so neither the
/// fractions nor the state move backwards.
#[derive(Clone, Default)]
pub struct FileDeferred {
    inner: Deferred<FileInfo, UploadInfo>,
}

impl FileDeferred {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn promise(&self) -> FilePromise {
        self.inner.promise()
    }

    pub fn notify(&self, info: UploadInfo) -> bool {
        let merged = UploadInfo::merge_monotonic(self.inner.last_progress().as_ref(), info);
        self.inner.notify(merged)
    }

    pub fn resolve(&self, info: FileInfo) -> bool {
        self.inner.resolve(info)
    }

    pub fn reject(&self, reason: UploadError) -> bool {
        self.inner.reject(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uploadkit_core::UploadState;

    #[test]
    fn test_progress_is_monotonic() {
        let deferred = FileDeferred::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        deferred
            .promise()
            .progress(move |info: &UploadInfo| sink.lock().unwrap().push(*info));

        deferred.notify(UploadInfo::uploading(0.5));
        deferred.notify(UploadInfo::uploading(0.2));
        deferred.notify(UploadInfo::uploaded());
        deferred.notify(UploadInfo::uploading(0.1));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert!(seen.windows(2).all(|w| w[0].state <= w[1].state));
        assert_eq!(seen[3].state, UploadState::Uploaded);
    }
}
