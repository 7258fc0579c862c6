//! Reactive Runtime
//!
//! The runtime is the coordinating object that signals and computed signals
//! share. It owns the tracking context: the record of which computation is
//! currently being evaluated.
//!
//! # How It Works
//!
//! 1. Every signal is created through a runtime and keeps a handle to it.
//!
//! 2. A computed signal evaluates its function inside a `ReactiveContext`,
//!    which pushes the computation onto the runtime's tracking stack and
//!    pops it again when the evaluation ends.
//!
//! 3. When a signal is read, it asks its runtime for the computation on top
//!    of the stack and, if there is one, subscribes it.
//!
//! 4. When a signal is written, it notifies its subscribers synchronously.
//!    Subscribed computations re-evaluate, which writes their own signal,
//!    which notifies further down the graph.
//!
//! # Isolation
//!
//! There is no global state. Two runtimes never see each other's tracking
//! context, so independent reactive graphs (for example in tests) cannot
//! interfere. A runtime handle is `Rc`-based and therefore confined to the
//! thread that created it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::debug;

use super::computed::Computed;
use super::signal::Signal;
use super::subscriber::SubscriberId;
use crate::config::RuntimeConfig;
use crate::error::Result;

/// A computation that can be re-run when one of its dependencies changes.
pub(crate) trait Recompute {
    /// Re-run the computation and publish its result.
    fn recompute(&self) -> Result<()>;
}

/// A weak reference to a running computation.
///
/// Trackers sit on the runtime's stack while their computation runs and are
/// stored in the subscriber sets of every signal the computation reads.
/// They never keep the computation alive.
#[derive(Clone)]
pub(crate) struct Tracker {
    id: SubscriberId,
    node: Weak<dyn Recompute>,
}

impl Tracker {
    pub(crate) fn new(id: SubscriberId, node: Weak<dyn Recompute>) -> Self {
        Self { id, node }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn is_live(&self) -> bool {
        self.node.strong_count() > 0
    }

    /// Re-run the computation. A computation that has been dropped is skipped.
    pub(crate) fn recompute(&self) -> Result<()> {
        match self.node.upgrade() {
            Some(node) => node.recompute(),
            None => Ok(()),
        }
    }
}

pub(crate) type TrackingStack = SmallVec<[Tracker; 8]>;

struct RuntimeInner {
    config: RuntimeConfig,
    stack: RefCell<TrackingStack>,
    /// Re-runs currently nested inside one another, counting each re-run
    /// until its result has been published downstream.
    propagation: Cell<usize>,
}

/// Handle to a reactive runtime.
///
/// Cloning the handle is cheap; clones share the same tracking context.
///
/// # Example
///
/// ```rust
/// use trkl_core::Runtime;
///
/// let rt = Runtime::new();
/// let count = rt.signal(1);
///
/// let doubled = {
///     let count = count.clone();
///     rt.computed(move || Ok(count.get() * 2)).unwrap()
/// };
///
/// count.set(5).unwrap();
/// assert_eq!(doubled.get(), 10);
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                stack: RefCell::new(SmallVec::new()),
                propagation: Cell::new(0),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Name used on log events.
    pub(crate) fn label(&self) -> &str {
        self.inner.config.label.as_deref().unwrap_or("default")
    }

    /// Create a signal holding `initial`.
    pub fn signal<T>(&self, initial: T) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
    {
        Signal::new(self, initial)
    }

    /// Create a computed signal.
    ///
    /// `compute` runs once immediately. If that first run fails, the error
    /// is returned and no computed signal is created.
    pub fn computed<T, F>(&self, compute: F) -> Result<Computed<T>>
    where
        T: Clone + PartialEq + 'static,
        F: Fn() -> Result<T> + 'static,
    {
        Computed::new(self, compute)
    }

    /// Create a signal holding `T::default()` and hand it to `executor`.
    ///
    /// This is the hook for wiring a signal to an external source: the
    /// executor can keep its clone and write to it whenever the source
    /// produces something.
    pub fn from_executor<T, F>(&self, executor: F) -> Signal<T>
    where
        T: Clone + PartialEq + Default + 'static,
        F: FnOnce(Signal<T>),
    {
        let signal = self.signal(T::default());
        debug!(runtime = self.label(), signal = signal.id(), "running signal executor");
        executor(signal.clone());
        signal
    }

    /// Check if a computation is currently being evaluated.
    pub fn is_tracking(&self) -> bool {
        !self.inner.stack.borrow().is_empty()
    }

    /// Get the computation currently being evaluated, if any.
    pub fn current_subscriber(&self) -> Option<SubscriberId> {
        self.inner.stack.borrow().last().map(Tracker::id)
    }

    /// Number of computations currently nested on the tracking stack.
    pub fn depth(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    /// Number of computed re-runs currently nested inside one another.
    ///
    /// Unlike [`depth`](Self::depth), a re-run stays counted while its
    /// result propagates to dependents, so a chain of N computed signals
    /// reaches N here. This is what `RuntimeConfig::max_depth` limits.
    pub fn propagation_depth(&self) -> usize {
        self.inner.propagation.get()
    }

    /// Whether two handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn current_tracker(&self) -> Option<Tracker> {
        self.inner.stack.borrow().last().cloned()
    }

    pub(crate) fn stack(&self) -> &RefCell<TrackingStack> {
        &self.inner.stack
    }

    pub(crate) fn propagation(&self) -> &Cell<usize> {
        &self.inner.propagation
    }

    #[cfg(test)]
    pub(crate) fn stack_ids(&self) -> Vec<SubscriberId> {
        self.inner.stack.borrow().iter().map(Tracker::id).collect()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("label", &self.label())
            .field("depth", &self.depth())
            .field("propagation_depth", &self.propagation_depth())
            .field("max_depth", &self.inner.config.max_depth)
            .finish()
    }
}
