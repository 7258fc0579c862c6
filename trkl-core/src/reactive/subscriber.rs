//! Subscriber types for the reactive system.
//!
//! A Subscriber is anything a signal calls back when its value changes:
//! a user callback, or the re-evaluation routine of a computed signal that
//! read the signal while it was running.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::runtime::Tracker;
use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Signals key their subscriber sets by this ID, so a subscriber can only
/// appear once per signal no matter how often it subscribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Rc<dyn Fn(&T, Option<&T>) -> Result<()>>;

enum Notify<T> {
    /// A user callback, called with `(new, old)`.
    Callback(Callback<T>),
    /// A computation that depends on the signal. Held weakly.
    Tracker(Tracker),
}

/// A callback registered on a `Signal<T>`.
///
/// Clones share the same identity, so subscribing a clone of an already
/// subscribed handle is a no-op.
///
/// The callback receives the new value and, for change notifications, the
/// value it replaced. Immediate calls made by `Signal::subscribe` pass
/// `None` as the old value.
pub struct Subscriber<T> {
    id: SubscriberId,
    notify: Notify<T>,
}

impl<T> Subscriber<T> {
    /// Create a subscriber from an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T, Option<&T>) + 'static,
    {
        Self::try_new(move |new, old| {
            callback(new, old);
            Ok(())
        })
    }

    /// Create a subscriber whose failures propagate out of the `set` call
    /// that notified it.
    pub fn try_new<F>(callback: F) -> Self
    where
        F: Fn(&T, Option<&T>) -> Result<()> + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Notify::Callback(Rc::new(callback)),
        }
    }

    pub(crate) fn from_tracker(tracker: Tracker) -> Self {
        Self {
            id: tracker.id(),
            notify: Notify::Tracker(tracker),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the subscriber can still be notified.
    ///
    /// Tracking subscriptions die with the computation that installed them.
    pub(crate) fn is_live(&self) -> bool {
        match &self.notify {
            Notify::Callback(_) => true,
            Notify::Tracker(tracker) => tracker.is_live(),
        }
    }

    /// Notify the subscriber of a value.
    pub fn notify(&self, new: &T, old: Option<&T>) -> Result<()> {
        match &self.notify {
            Notify::Callback(callback) => callback(new, old),
            // Dependencies only need to know that something changed.
            Notify::Tracker(tracker) => tracker.recompute(),
        }
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        let notify = match &self.notify {
            Notify::Callback(callback) => Notify::Callback(Rc::clone(callback)),
            Notify::Tracker(tracker) => Notify::Tracker(tracker.clone()),
        };
        Self { id: self.id, notify }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.notify {
            Notify::Callback(_) => "callback",
            Notify::Tracker(_) => "tracker",
        };
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("kind", &kind)
            .finish()
    }
}
