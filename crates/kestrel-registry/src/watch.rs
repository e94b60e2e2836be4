//! Watch subscriptions.
//!
//! A [`Watcher`] owns a background task that pulls raw changes from the
//! key-value store, decodes them, re-evaluates the watch predicate against
//! both the old and the new state, and forwards typed events:
//!
//! | old matches | new matches | event      |
//! |-------------|-------------|------------|
//! | no          | yes         | `Added`    |
//! | yes         | yes         | `Modified` |
//! | yes         | no / gone   | `Deleted`  |
//! | no          | no / gone   | (dropped)  |
//!
//! The task stops when the request context is cancelled or the watcher
//! goes away, and after a source failure. The store subscription is
//! dropped with it.

use bytes::Bytes;
use kestrel_storage::{KvEvent, KvEventKind, KvWatch};
use kestrel_types::{RequestContext, Resource};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{RegistryError, Result};
use crate::predicate::Predicate;
use crate::store::ObjectHook;

/// One change observed by a watch.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent<T> {
    /// The object started matching, either because it was created or
    /// because a change brought it into the selection.
    Added(T),
    /// A matching object changed and still matches.
    Modified(T),
    /// The object was removed or stopped matching. Carries the last state
    /// that matched, stamped with the version of the removing change.
    Deleted(T),
    /// The watch failed and will produce no further events.
    Error(String),
}

impl<T> WatchEvent<T> {
    pub fn object(&self) -> Option<&T> {
        match self {
            Self::Added(o) | Self::Modified(o) | Self::Deleted(o) => Some(o),
            Self::Error(_) => None,
        }
    }

    pub fn into_object(self) -> Option<T> {
        match self {
            Self::Added(o) | Self::Modified(o) | Self::Deleted(o) => Some(o),
            Self::Error(_) => None,
        }
    }

    /// Upper-case event type, as clients see it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Added(_) => "ADDED",
            Self::Modified(_) => "MODIFIED",
            Self::Deleted(_) => "DELETED",
            Self::Error(_) => "ERROR",
        }
    }
}

/// What a watch selects and how it presents objects.
pub(crate) struct WatchFilter<T> {
    pub predicate: Predicate,
    /// Set when the watch follows a single key under a wider prefix.
    pub exact_key: Option<String>,
    pub decorator: Option<ObjectHook<T>>,
}

impl<T: Resource> WatchFilter<T> {
    fn decorate(&self, mut obj: T) -> Result<T> {
        if let Some(decorator) = &self.decorator {
            decorator(&mut obj)?;
        }
        Ok(obj)
    }

    /// Turn a raw change into the event this watch should emit, if any.
    pub fn translate(&self, event: &KvEvent) -> Result<Option<WatchEvent<T>>> {
        if self.exact_key.as_deref().is_some_and(|k| k != event.key) {
            return Ok(None);
        }

        let decode = |value: &Option<Bytes>| -> Result<Option<T>> {
            value
                .as_deref()
                .map(|v| codec::decode::<T>(v, event.revision))
                .transpose()
        };
        let current = match event.kind {
            KvEventKind::Put => decode(&event.value)?,
            KvEventKind::Delete => None,
        };
        let previous = decode(&event.prev_value)?;

        let now = current.as_ref().is_some_and(|o| self.predicate.matches(o));
        let before = previous.as_ref().is_some_and(|o| self.predicate.matches(o));

        let event = match (before, now, current, previous) {
            (true, true, Some(cur), _) => WatchEvent::Modified(self.decorate(cur)?),
            (false, true, Some(cur), _) => WatchEvent::Added(self.decorate(cur)?),
            (true, false, _, Some(prev)) => WatchEvent::Deleted(self.decorate(prev)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// A live, typed event stream. Not restartable: once it ends, open a new
/// watch from the last version seen.
pub struct Watcher<T> {
    events: mpsc::Receiver<WatchEvent<T>>,
    task: JoinHandle<()>,
}

impl<T: Resource> Watcher<T> {
    pub(crate) fn spawn(
        source: Box<dyn KvWatch>,
        initial: Vec<T>,
        filter: WatchFilter<T>,
        ctx: RequestContext,
        capacity: usize,
    ) -> Self {
        let (tx, events) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(pump(source, initial, filter, ctx, tx));
        Self { events, task }
    }
}

impl<T> Watcher<T> {
    /// The next event, or `None` once the watch has ended.
    pub async fn next(&mut self) -> Option<WatchEvent<T>> {
        self.events.recv().await
    }

    /// End the watch and release its store subscription. Events already
    /// buffered can still be drained with [`next`](Self::next).
    pub fn stop(&mut self) {
        self.task.abort();
        self.events.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for Watcher<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> std::fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

async fn pump<T: Resource>(
    mut source: Box<dyn KvWatch>,
    initial: Vec<T>,
    filter: WatchFilter<T>,
    ctx: RequestContext,
    tx: mpsc::Sender<WatchEvent<T>>,
) {
    for obj in initial {
        if !deliver(&tx, &ctx, WatchEvent::Added(obj)).await {
            return;
        }
    }

    loop {
        let next = tokio::select! {
            _ = ctx.cancelled() => {
                debug!(kind = T::KIND, "watch cancelled");
                return;
            }
            _ = tx.closed() => return,
            next = source.next() => next,
        };

        let outcome = match next {
            None => return,
            Some(Ok(event)) => filter.translate(&event),
            Some(Err(e)) => Err(RegistryError::Storage(e)),
        };

        match outcome {
            Ok(Some(event)) => {
                if !deliver(&tx, &ctx, event).await {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(kind = T::KIND, error = %e, "watch terminated");
                deliver(&tx, &ctx, WatchEvent::Error(e.to_string())).await;
                return;
            }
        }
    }
}

/// Send one event, giving up if the consumer left or the context was
/// cancelled while waiting for buffer space.
async fn deliver<T>(
    tx: &mpsc::Sender<WatchEvent<T>>,
    ctx: &RequestContext,
    event: WatchEvent<T>,
) -> bool {
    tokio::select! {
        _ = ctx.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}
