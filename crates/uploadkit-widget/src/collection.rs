//! Ordered collection of file handles
//!
//! Membership is by handle identity: adding a handle that is already present
//! is a no-op. Aggregate observers (`on_any_*`) follow the handle's own events
//! but only while the handle is a member; events from a removed handle are
//! dropped.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use uploadkit_core::{FileInfo, UploadError, UploadInfo};

use crate::callbacks::{CallbackId, Callbacks};
use crate::file::FilePromise;

struct Entry {
    file: FilePromise,
    /// Changes every time the handle (re)joins the collection
    token: u64,
    /// Listeners `watch` attached to the handle
    subscriptions: Vec<CallbackId>,
}

impl Entry {
    fn new(file: FilePromise, token: u64) -> Self {
        Self {
            file,
            token,
            subscriptions: Vec::new(),
        }
    }

    fn detach(self) -> FilePromise {
        for id in self.subscriptions {
            self.file.unsubscribe(id);
        }
        self.file
    }
}

struct Shared {
    entries: Mutex<Vec<Entry>>,
    next_token: AtomicU64,
    on_add: Callbacks<FilePromise>,
    on_remove: Callbacks<FilePromise>,
    on_replace: Callbacks<(FilePromise, FilePromise)>,
    on_sort: Callbacks<[FilePromise]>,
    on_any_progress: Callbacks<(FilePromise, UploadInfo)>,
    on_any_done: Callbacks<(FilePromise, FileInfo)>,
    on_any_fail: Callbacks<(FilePromise, UploadError)>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn member(&self, token: u64) -> Option<FilePromise> {
        self.lock()
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| entry.file.clone())
    }
}

#[derive(Clone)]
pub struct FileCollection {
    shared: Arc<Shared>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                next_token: AtomicU64::new(1),
                on_add: Callbacks::new(),
                on_remove: Callbacks::new(),
                on_replace: Callbacks::new(),
                on_sort: Callbacks::new(),
                on_any_progress: Callbacks::new(),
                on_any_done: Callbacks::new(),
                on_any_fail: Callbacks::new(),
            }),
        }
    }

    /// Fired with each handle added
    pub fn on_add(&self) -> &Callbacks<FilePromise> {
        &self.shared.on_add
    }

    /// Fired with each handle removed
    pub fn on_remove(&self) -> &Callbacks<FilePromise> {
        &self.shared.on_remove
    }

    /// Fired with `(original, replacement)`
    pub fn on_replace(&self) -> &Callbacks<(FilePromise, FilePromise)> {
        &self.shared.on_replace
    }

    /// Fired with the new order after a sort
    pub fn on_sort(&self) -> &Callbacks<[FilePromise]> {
        &self.shared.on_sort
    }

    pub fn on_any_progress(&self) -> &Callbacks<(FilePromise, UploadInfo)> {
        &self.shared.on_any_progress
    }

    pub fn on_any_done(&self) -> &Callbacks<(FilePromise, FileInfo)> {
        &self.shared.on_any_done
    }

    pub fn on_any_fail(&self) -> &Callbacks<(FilePromise, UploadError)> {
        &self.shared.on_any_fail
    }

    /// Append a handle. Returns `false` if it is already a member.
    pub fn add(&self, file: FilePromise) -> bool {
        let token = {
            let mut entries = self.shared.lock();
            if entries.iter().any(|entry| entry.file.ptr_eq(&file)) {
                return false;
            }
            let token = self.shared.next_token.fetch_add(1, Ordering::Relaxed);
            entries.push(Entry::new(file.clone(), token));
            token
        };

        tracing::debug!(file_handle = file.id(), "File added to collection");
        self.shared.on_add.fire(&file);
        self.watch(&file, token);
        true
    }

    /// Remove a handle by identity. Returns `false` if it was not a member.
    pub fn remove(&self, file: &FilePromise) -> bool {
        let removed = {
            let mut entries = self.shared.lock();
            match entries.iter().position(|entry| entry.file.ptr_eq(file)) {
                Some(index) => entries.remove(index),
                None => return false,
            }
        };
        let removed = removed.detach();

        tracing::debug!(file_handle = removed.id(), "File removed from collection");
        self.shared.on_remove.fire(&removed);
        true
    }

    /// Put `replacement` at the position of `original`.
    ///
    /// Returns `false` if `original` is not a member or `replacement`
    /// already is.
    pub fn replace(&self, original: &FilePromise, replacement: FilePromise) -> bool {
        let (previous, token) = {
            let mut entries = self.shared.lock();
            if entries.iter().any(|entry| entry.file.ptr_eq(&replacement)) {
                return false;
            }
            let index = match entries.iter().position(|entry| entry.file.ptr_eq(original)) {
                Some(index) => index,
                None => return false,
            };
            let token = self.shared.next_token.fetch_add(1, Ordering::Relaxed);
            let previous =
                std::mem::replace(&mut entries[index], Entry::new(replacement.clone(), token));
            (previous, token)
        };
        let previous = previous.detach();

        tracing::debug!(
            original = previous.id(),
            replacement = replacement.id(),
            "File replaced in collection"
        );
        self.shared
            .on_replace
            .fire(&(previous, replacement.clone()));
        self.watch(&replacement, token);
        true
    }

    /// Remove every handle, firing `on_remove` for each
    pub fn clear(&self) {
        let removed: Vec<Entry> = self.shared.lock().drain(..).collect();
        let removed: Vec<FilePromise> = removed.into_iter().map(Entry::detach).collect();
        for file in &removed {
            self.shared.on_remove.fire(file);
        }
    }

    /// Reorder the handles. The comparator must not call back into the
    /// collection.
    pub fn sort<F>(&self, mut compare: F) -> &Self
    where
        F: FnMut(&FilePromise, &FilePromise) -> CmpOrdering,
    {
        let order = {
            let mut entries = self.shared.lock();
            entries.sort_by(|a, b| compare(&a.file, &b.file));
            entries
                .iter()
                .map(|entry| entry.file.clone())
                .collect::<Vec<_>>()
        };
        self.shared.on_sort.fire(order.as_slice());
        self
    }

    pub fn get_all(&self) -> Vec<FilePromise> {
        self.shared
            .lock()
            .iter()
            .map(|entry| entry.file.clone())
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<FilePromise> {
        self.shared
            .lock()
            .get(index)
            .map(|entry| entry.file.clone())
    }

    pub fn contains(&self, file: &FilePromise) -> bool {
        self.shared
            .lock()
            .iter()
            .any(|entry| entry.file.ptr_eq(file))
    }

    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().is_empty()
    }

    /// Forward the handle's events to the aggregate observers while it
    /// stays a member under `token`.
    fn watch(&self, file: &FilePromise, token: u64) {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);

        let progress = weak.clone();
        let progress_id = file.on_progress(move |info: &UploadInfo| {
            if let Some(shared) = progress.upgrade() {
                if let Some(file) = shared.member(token) {
                    shared.on_any_progress.fire(&(file, *info));
                }
            }
        });

        let settled_id = file.on_settled(move |outcome| {
            let shared = match weak.upgrade() {
                Some(shared) => shared,
                None => return,
            };
            let member = match shared.member(token) {
                Some(member) => member,
                None => return,
            };
            match outcome {
                Ok(info) => shared.on_any_done.fire(&(member, info.clone())),
                Err(reason) => shared.on_any_fail.fire(&(member, reason.clone())),
            }
        });

        let subscriptions = vec![progress_id, settled_id];
        let mut entries = self.shared.lock();
        match entries.iter_mut().find(|entry| entry.token == token) {
            Some(entry) => entry.subscriptions = subscriptions,
            None => {
                // Left the collection while the listeners were being attached
                drop(entries);
                for id in subscriptions {
                    file.unsubscribe(id);
                }
            }
        }
    }
}

impl Default for FileCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCollection")
            .field("files", &self.get_all())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileDeferred;

    fn pending() -> (FileDeferred, FilePromise) {
        let deferred = FileDeferred::new();
        let promise = deferred.promise();
        (deferred, promise)
    }

    fn ids(files: &[FilePromise]) -> Vec<u64> {
        files.iter().map(FilePromise::id).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let collection = FileCollection::new();
        let (_d, file) = pending();
        let added = Arc::new(Mutex::new(0));
        let counter = added.clone();
        collection.on_add().add(move |_| *counter.lock().unwrap() += 1);

        assert!(collection.add(file.clone()));
        assert!(!collection.add(file.clone()));
        assert_eq!(collection.len(), 1);
        assert_eq!(*added.lock().unwrap(), 1);
    }

    #[test]
    fn test_remove_and_replace_keep_order() {
        let collection = FileCollection::new();
        let (_a, a) = pending();
        let (_b, b) = pending();
        let (_c, c) = pending();
        let (_d, d) = pending();
        collection.add(a.clone());
        collection.add(b.clone());
        collection.add(c.clone());

        let replaced = Arc::new(Mutex::new(Vec::new()));
        let sink = replaced.clone();
        collection
            .on_replace()
            .add(move |(old, new)| sink.lock().unwrap().push((old.id(), new.id())));

        assert!(collection.replace(&b, d.clone()));
        assert!(!collection.replace(&b, a.clone()));
        assert_eq!(ids(&collection.get_all()), vec![a.id(), d.id(), c.id()]);
        assert_eq!(*replaced.lock().unwrap(), vec![(b.id(), d.id())]);

        assert!(collection.remove(&a));
        assert!(!collection.remove(&a));
        assert_eq!(ids(&collection.get_all()), vec![d.id(), c.id()]);
        assert!(collection.get(0).unwrap().ptr_eq(&d));
    }

    #[test]
    fn test_sort_fires_with_new_order() {
        let collection = FileCollection::new();
        let (_a, a) = pending();
        let (_b, b) = pending();
        collection.add(a.clone());
        collection.add(b.clone());

        let sorted = Arc::new(Mutex::new(Vec::new()));
        let sink = sorted.clone();
        collection
            .on_sort()
            .add(move |files: &[FilePromise]| *sink.lock().unwrap() = ids(files));

        collection.sort(|x, y| y.id().cmp(&x.id()));
        assert_eq!(*sorted.lock().unwrap(), vec![b.id(), a.id()]);
        assert_eq!(ids(&collection.get_all()), vec![b.id(), a.id()]);
    }

    #[test]
    fn test_aggregate_progress_stops_after_removal() {
        let collection = FileCollection::new();
        let (deferred, file) = pending();
        collection.add(file.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        collection
            .on_any_progress()
            .add(move |(_, info)| sink.lock().unwrap().push(info.upload_progress));

        deferred.notify(UploadInfo::uploading(0.3));
        collection.remove(&file);
        deferred.notify(UploadInfo::uploading(0.6));

        assert_eq!(*seen.lock().unwrap(), vec![0.3]);
    }

    #[test]
    fn test_readding_does_not_duplicate_events() {
        let collection = FileCollection::new();
        let (deferred, file) = pending();
        collection.add(file.clone());
        collection.remove(&file);
        collection.add(file.clone());

        let failures = Arc::new(Mutex::new(0));
        let counter = failures.clone();
        collection
            .on_any_fail()
            .add(move |_| *counter.lock().unwrap() += 1);

        deferred.reject(UploadError::Cancelled);
        assert_eq!(*failures.lock().unwrap(), 1);
    }

    #[test]
    fn test_membership_churn_does_not_accumulate_listeners() {
        let collection = FileCollection::new();
        let (_d, file) = pending();
        let (_r, replacement) = pending();

        for _ in 0..50 {
            collection.add(file.clone());
            collection.remove(&file);
        }
        assert_eq!(file.listener_count(), 0);

        collection.add(file.clone());
        assert_eq!(file.listener_count(), 2);

        collection.replace(&file, replacement.clone());
        assert_eq!(file.listener_count(), 0);
        assert_eq!(replacement.listener_count(), 2);

        collection.clear();
        assert_eq!(replacement.listener_count(), 0);
    }

    #[test]
    fn test_clear_fires_remove_for_each() {
        let collection = FileCollection::new();
        let (_a, a) = pending();
        let (_b, b) = pending();
        collection.add(a);
        collection.add(b);

        let removed = Arc::new(Mutex::new(0));
        let counter = removed.clone();
        collection
            .on_remove()
            .add(move |_| *counter.lock().unwrap() += 1);

        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(*removed.lock().unwrap(), 2);
    }
}
