//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! a set of subscribers that are called whenever the value changes.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while a computed signal is evaluating, the
//!    signal subscribes that computation.
//!
//! 2. When a signal is written with a value different from the current one,
//!    every subscriber is called with `(new, old)` before `set` returns.
//!
//! 3. Writing a value equal to the current one does nothing. This is what
//!    stops self-assignment from looping.
//!
//! # Notification Order
//!
//! Subscribers are called in the order they subscribed. The subscriber set
//! is snapshotted before a notification pass starts: subscribers added
//! during the pass wait for the next change, and subscribers removed during
//! the pass are skipped. The first subscriber that fails ends the pass and
//! its error is returned from `set`; the new value stays stored.
//!
//! Each subscriber receives the value this `set` wrote, even if an earlier
//! subscriber in the same pass wrote the signal again.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use super::runtime::{Runtime, Tracker};
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::Result;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct SignalInner<T> {
    id: u64,
    runtime: Runtime,
    value: RefCell<T>,
    /// Insertion-ordered, keyed by identity, so each subscriber is present once.
    subscribers: RefCell<IndexMap<SubscriberId, Subscriber<T>>>,
}

/// A reactive signal holding a value of type T.
///
/// `PartialEq` decides whether a write is a change. Cloning a signal gives
/// another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use trkl_core::{Runtime, Subscriber};
///
/// let rt = Runtime::new();
/// let count = rt.signal(0);
///
/// let log = Subscriber::new(|new: &i32, old: Option<&i32>| println!("{old:?} -> {new}"));
/// count.subscribe(&log, false).unwrap();
///
/// assert_eq!(count.set(5).unwrap(), Some(5));
/// assert_eq!(count.set(5).unwrap(), None);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(runtime: &Runtime, value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: next_signal_id(),
                runtime: runtime.clone(),
                value: RefCell::new(value),
                subscribers: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The runtime this signal tracks dependencies in.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Get the current value.
    ///
    /// If a computed signal of the same runtime is evaluating, it is
    /// subscribed to this signal.
    pub fn get(&self) -> T {
        if let Some(tracker) = self.inner.runtime.current_tracker() {
            self.track(tracker);
        }

        self.get_untracked()
    }

    /// Get the current value without subscribing anything.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    fn track(&self, tracker: Tracker) {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        if subscribers.contains_key(&tracker.id()) {
            return;
        }

        trace!(signal = self.inner.id, subscriber = ?tracker.id(), "tracking dependency");
        subscribers.insert(tracker.id(), Subscriber::from_tracker(tracker));
    }

    /// Set a new value and notify subscribers.
    ///
    /// Returns `Ok(None)` without notifying anyone if `value` equals the
    /// current value, and `Ok(Some(value))` once every subscriber has been
    /// called. A failing subscriber ends the notification pass and its error
    /// is returned.
    pub fn set(&self, value: T) -> Result<Option<T>> {
        let old = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return Ok(None);
            }
            std::mem::replace(&mut *current, value.clone())
        };

        self.notify_subscribers(&value, &old)?;
        Ok(Some(value))
    }

    /// Update the value using a function.
    ///
    /// This is useful for updates that depend on the current value. The
    /// read is untracked.
    pub fn update<F>(&self, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.get_untracked());
        self.set(new_value)
    }

    /// Register a subscriber.
    ///
    /// Subscribing the same subscriber twice keeps a single entry. With
    /// `immediate`, the subscriber is also called right away with the
    /// current value and no old value.
    pub fn subscribe(&self, subscriber: &Subscriber<T>, immediate: bool) -> Result<()> {
        self.inner
            .subscribers
            .borrow_mut()
            .entry(subscriber.id())
            .or_insert_with(|| subscriber.clone());

        if immediate {
            let current = self.get_untracked();
            subscriber.notify(&current, None)?;
        }

        Ok(())
    }

    /// Remove a subscriber. Returns whether it was subscribed.
    pub fn unsubscribe(&self, subscriber: &Subscriber<T>) -> bool {
        self.inner
            .subscribers
            .borrow_mut()
            .shift_remove(&subscriber.id())
            .is_some()
    }

    /// Check whether a subscriber (user callback or computation) is registered.
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.inner.subscribers.borrow().contains_key(&id)
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Notify all subscribers that the value has changed.
    fn notify_subscribers(&self, new: &T, old: &T) -> Result<()> {
        let snapshot: Vec<Subscriber<T>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|_, subscriber| subscriber.is_live());
            subscribers.values().cloned().collect()
        };

        trace!(signal = self.inner.id, subscribers = snapshot.len(), "notifying subscribers");

        for subscriber in snapshot {
            if !self.is_subscribed(subscriber.id()) {
                continue;
            }
            subscriber.notify(new, Some(old))?;
        }

        Ok(())
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
