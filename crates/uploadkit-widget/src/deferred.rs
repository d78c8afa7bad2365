//! Single-resolution deferred values
//!
//! A `Deferred` is the producer side: it settles once, either resolved with a
//! value or rejected with an `UploadError`, and may emit progress before that.
//! A `Promise` is the consumer view; it can observe but never settle.
//!
//! Observers run in registration order, exactly once. Observers attached after
//! settlement run with the stored outcome. Callbacks always run outside the
//! internal lock, so they may freely call back into the handle.
//!
//! Every delivery goes through a per-handle queue that one thread drains at a
//! time. A thread that finds the queue already being drained (or a callback
//! re-entering its own handle) only enqueues; the draining thread runs the
//! callback after the ones queued before it. Progress queued for a listener
//! is dropped if the handle settles first.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uploadkit_core::UploadError;

use crate::callbacks::CallbackId;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Observable state of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
    Pending,
    Resolved,
    Rejected,
}

impl PromiseState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }
}

enum Cell<T> {
    Pending,
    Fulfilled(T),
    Rejected(UploadError),
}

type SettleFn<T> = Box<dyn FnOnce(Result<&T, &UploadError>) + Send>;
type ProgressFn<P> = Arc<dyn Fn(&P) + Send + Sync>;

enum Delivery<T, P> {
    Progress(CallbackId, ProgressFn<P>, P),
    Settled(SettleFn<T>, Result<T, UploadError>),
}

struct Inner<T, P> {
    cell: Cell<T>,
    observers: Vec<(CallbackId, SettleFn<T>)>,
    progress: Vec<(CallbackId, ProgressFn<P>)>,
    last_progress: Option<P>,
    next_subscription: u64,
    queue: VecDeque<Delivery<T, P>>,
    draining: bool,
}

impl<T, P> Inner<T, P> {
    fn is_pending(&self) -> bool {
        matches!(self.cell, Cell::Pending)
    }

    fn state(&self) -> PromiseState {
        match self.cell {
            Cell::Pending => PromiseState::Pending,
            Cell::Fulfilled(_) => PromiseState::Resolved,
            Cell::Rejected(_) => PromiseState::Rejected,
        }
    }

    fn next_id(&mut self) -> CallbackId {
        self.next_subscription += 1;
        CallbackId::from_raw(self.next_subscription)
    }

    fn is_subscribed(&self, id: CallbackId) -> bool {
        self.progress.iter().any(|(existing, _)| *existing == id)
    }
}

impl<T: Clone, P> Inner<T, P> {
    fn outcome(&self) -> Option<Result<T, UploadError>> {
        match &self.cell {
            Cell::Pending => None,
            Cell::Fulfilled(value) => Some(Ok(value.clone())),
            Cell::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

struct Shared<T, P> {
    id: u64,
    inner: Mutex<Inner<T, P>>,
    settled: watch::Sender<bool>,
}

impl<T, P> Shared<T, P> {
    fn lock(&self) -> MutexGuard<'_, Inner<T, P>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run queued deliveries until the queue is empty, unless another call
    /// is already doing so.
    fn drain<'a>(&'a self, mut inner: MutexGuard<'a, Inner<T, P>>) {
        if inner.draining {
            return;
        }
        inner.draining = true;
        let _reset = DrainReset(self);

        loop {
            let delivery = match inner.queue.pop_front() {
                Some(delivery) => delivery,
                None => {
                    inner.draining = false;
                    return;
                }
            };
            if let Delivery::Progress(id, ..) = &delivery {
                // Unsubscribed, or cleared by settlement
                if !inner.is_subscribed(*id) {
                    continue;
                }
            }

            drop(inner);
            match delivery {
                Delivery::Progress(_, callback, progress) => callback(&progress),
                Delivery::Settled(observer, outcome) => observer(outcome.as_ref()),
            }
            inner = self.lock();
        }
    }
}

/// Releases the drain flag if a callback panics mid-drain
struct DrainReset<'a, T, P>(&'a Shared<T, P>);

impl<T, P> Drop for DrainReset<'_, T, P> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

/// Producer side of a handle
pub struct Deferred<T, P = ()> {
    shared: Arc<Shared<T, P>>,
}

impl<T, P> Clone for Deferred<T, P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, P> Deferred<T, P>
where
    T: Clone + Send + 'static,
    P: Clone + Send + 'static,
{
    pub fn new() -> Self {
        let (settled, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                inner: Mutex::new(Inner {
                    cell: Cell::Pending,
                    observers: Vec::new(),
                    progress: Vec::new(),
                    last_progress: None,
                    next_subscription: 0,
                    queue: VecDeque::new(),
                    draining: false,
                }),
                settled,
            }),
        }
    }

    /// Consumer view of this handle
    pub fn promise(&self) -> Promise<T, P> {
        Promise {
            shared: self.shared.clone(),
        }
    }

    /// Fulfil the handle. Returns `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the handle. Returns `false` if it was already settled.
    pub fn reject(&self, reason: UploadError) -> bool {
        self.settle(Err(reason))
    }

    /// Emit a progress notification. Ignored once the handle has settled.
    pub fn notify(&self, progress: P) -> bool {
        let mut inner = self.shared.lock();
        if !inner.is_pending() {
            return false;
        }
        inner.last_progress = Some(progress.clone());
        let deliveries: Vec<Delivery<T, P>> = inner
            .progress
            .iter()
            .map(|(id, callback)| Delivery::Progress(*id, callback.clone(), progress.clone()))
            .collect();
        inner.queue.extend(deliveries);
        self.shared.drain(inner);
        true
    }

    pub fn last_progress(&self) -> Option<P> {
        self.shared.lock().last_progress.clone()
    }

    pub fn state(&self) -> PromiseState {
        self.shared.lock().state()
    }

    fn settle(&self, outcome: Result<T, UploadError>) -> bool {
        let mut inner = self.shared.lock();
        if !inner.is_pending() {
            tracing::debug!(handle_id = self.shared.id, "Ignoring second settlement");
            return false;
        }
        inner.cell = match &outcome {
            Ok(value) => Cell::Fulfilled(value.clone()),
            Err(reason) => Cell::Rejected(reason.clone()),
        };
        inner.progress.clear();

        let observers = std::mem::take(&mut inner.observers);
        tracing::debug!(
            handle_id = self.shared.id,
            resolved = outcome.is_ok(),
            observers = observers.len(),
            "Handle settled"
        );
        for (_, observer) in observers {
            inner
                .queue
                .push_back(Delivery::Settled(observer, outcome.clone()));
        }

        self.shared.settled.send_replace(true);
        self.shared.drain(inner);
        true
    }
}

impl<T, P> Default for Deferred<T, P>
where
    T: Clone + Send + 'static,
    P: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of a handle
pub struct Promise<T, P = ()> {
    shared: Arc<Shared<T, P>>,
}

impl<T, P> Clone for Promise<T, P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, P> Promise<T, P>
where
    T: Clone + Send + 'static,
    P: Clone + Send + 'static,
{
    /// An already fulfilled handle
    pub fn resolved(value: T) -> Self {
        let deferred = Deferred::new();
        deferred.resolve(value);
        deferred.promise()
    }

    /// An already rejected handle
    pub fn rejected(reason: UploadError) -> Self {
        let deferred = Deferred::new();
        deferred.reject(reason);
        deferred.promise()
    }

    /// Process-unique identity of the underlying handle
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Whether both values refer to the same handle
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn state(&self) -> PromiseState {
        self.shared.lock().state()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// The stored outcome, or `None` while pending
    pub fn outcome(&self) -> Option<Result<T, UploadError>> {
        self.shared.lock().outcome()
    }

    /// Most recent progress notification, if any
    pub fn last_progress(&self) -> Option<P> {
        self.shared.lock().last_progress.clone()
    }

    /// Run `f` with the value once the handle is fulfilled
    pub fn done<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.observe(Box::new(move |outcome| {
            if let Ok(value) = outcome {
                f(value);
            }
        }));
        self
    }

    /// Run `f` with the reason once the handle is rejected
    pub fn fail<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&UploadError) + Send + 'static,
    {
        self.observe(Box::new(move |outcome| {
            if let Err(reason) = outcome {
                f(reason);
            }
        }));
        self
    }

    /// Run `f` once the handle settles either way
    pub fn always<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Result<&T, &UploadError>) + Send + 'static,
    {
        self.observe(Box::new(f));
        self
    }

    /// Observe progress notifications.
    ///
    /// A listener attached while pending immediately receives the latest
    /// notification, if one was emitted. Listeners attached after settlement
    /// are never called.
    pub fn progress<F>(&self, f: F) -> &Self
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.on_progress(f);
        self
    }

    /// Like [`Promise::always`], returning an id for [`Promise::unsubscribe`]
    pub fn on_settled<F>(&self, f: F) -> CallbackId
    where
        F: FnOnce(Result<&T, &UploadError>) + Send + 'static,
    {
        self.observe(Box::new(f))
    }

    /// Like [`Promise::progress`], returning an id for [`Promise::unsubscribe`]
    pub fn on_progress<F>(&self, f: F) -> CallbackId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let callback: ProgressFn<P> = Arc::new(f);
        let mut inner = self.shared.lock();
        let id = inner.next_id();
        if !inner.is_pending() {
            return id;
        }
        inner.progress.push((id, callback.clone()));
        if let Some(last) = inner.last_progress.clone() {
            inner
                .queue
                .push_back(Delivery::Progress(id, callback, last));
        }
        self.shared.drain(inner);
        id
    }

    /// Detach a listener that has not run yet. Returns `false` if it already
    /// ran or was never attached.
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        let mut inner = self.shared.lock();
        let before = inner.observers.len() + inner.progress.len();
        inner.observers.retain(|(existing, _)| *existing != id);
        inner.progress.retain(|(existing, _)| *existing != id);
        inner.observers.len() + inner.progress.len() != before
    }

    /// Number of attached listeners still waiting for events
    pub fn listener_count(&self) -> usize {
        let inner = self.shared.lock();
        inner.observers.len() + inner.progress.len()
    }

    /// Derive a new handle by mapping the fulfilled value.
    ///
    /// Progress is forwarded; rejections pass through unchanged.
    pub fn then<U, F>(&self, f: F) -> Promise<U, P>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, UploadError> + Send + 'static,
    {
        let derived = Deferred::<U, P>::new();

        let forward = derived.clone();
        self.progress(move |progress: &P| {
            forward.notify(progress.clone());
        });

        let settle = derived.clone();
        self.always(move |outcome| match outcome {
            Ok(value) => match f(value.clone()) {
                Ok(mapped) => {
                    settle.resolve(mapped);
                }
                Err(reason) => {
                    settle.reject(reason);
                }
            },
            Err(reason) => {
                settle.reject(reason.clone());
            }
        });

        derived.promise()
    }

    /// Wait for settlement
    pub async fn wait(&self) -> Result<T, UploadError> {
        let mut settled = self.shared.settled.subscribe();
        // The sender lives in `shared`, so this only returns once settled
        let _ = settled.wait_for(|settled| *settled).await;
        self.outcome().unwrap_or_else(|| {
            Err(UploadError::Transport(
                "handle settled without an outcome".to_string(),
            ))
        })
    }

    fn observe(&self, observer: SettleFn<T>) -> CallbackId {
        let mut inner = self.shared.lock();
        let id = inner.next_id();
        match inner.outcome() {
            None => inner.observers.push((id, observer)),
            Some(outcome) => {
                inner.queue.push_back(Delivery::Settled(observer, outcome));
                self.shared.drain(inner);
            }
        }
        id
    }
}

impl<T, P> fmt::Debug for Promise<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock().state();
        f.debug_struct("Promise")
            .field("id", &self.shared.id)
            .field("state", &state)
            .finish()
    }
}
