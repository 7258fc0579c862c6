//! Computed Signal Implementation
//!
//! A computed signal is a signal whose value comes from re-running a
//! function whenever any signal that function read changes.
//!
//! # How Computed Signals Work
//!
//! 1. On creation, the function runs once inside a reactive context. Every
//!    signal it reads subscribes the computation.
//!
//! 2. When one of those signals changes, it calls the computation, which
//!    runs the function again (subscribing whatever it reads this time).
//!
//! 3. A successful run writes the result into the computed signal's own
//!    output signal, which notifies that signal's subscribers in turn. This
//!    is how chains of computed signals update within a single write.
//!
//! 4. A failed run leaves the output untouched and returns the error to
//!    whoever triggered the run.
//!
//! # Dependencies Only Accumulate
//!
//! Re-running never removes subscriptions made by earlier runs. A function
//! that reads `x` only while some flag is set stays subscribed to `x` after
//! the flag is cleared, and writes to `x` keep re-running it.
//!
//! # Ownership
//!
//! The `Computed` handle owns the computation. Dependencies only hold weak
//! references to it, so dropping the last handle stops re-evaluation and
//! the stale entries are pruned on the next notification.

use std::cell::{Cell, OnceCell};
use std::fmt::Debug;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span};

use super::context::{PropagationGuard, ReactiveContext};
use super::runtime::{Recompute, Runtime, Tracker};
use super::signal::Signal;
use super::subscriber::SubscriberId;
use crate::error::Result;

struct ComputedNode<T> {
    id: SubscriberId,
    runtime: Runtime,
    self_ref: Weak<ComputedNode<T>>,
    compute: Box<dyn Fn() -> Result<T>>,
    /// Set once the first evaluation has succeeded.
    output: OnceCell<Signal<T>>,
    run_count: Cell<usize>,
}

impl<T> ComputedNode<T>
where
    T: Clone + PartialEq + 'static,
{
    fn tracker(&self) -> Tracker {
        Tracker::new(self.id, self.self_ref.clone())
    }

    /// Run the function inside a reactive context.
    fn evaluate(&self) -> Result<T> {
        let span = debug_span!("evaluate", subscriber = ?self.id, runtime = self.runtime.label());
        let _enter = span.enter();

        let result = {
            let _ctx = ReactiveContext::enter(&self.runtime, self.tracker())?;
            (self.compute)()
        };

        let value = result?;
        self.run_count.set(self.run_count.get() + 1);
        Ok(value)
    }
}

impl<T> Recompute for ComputedNode<T>
where
    T: Clone + PartialEq + 'static,
{
    fn recompute(&self) -> Result<()> {
        // Held until dependents have re-run too, so chains count toward the limit.
        let _run = PropagationGuard::enter(&self.runtime)?;

        let value = self.evaluate()?;
        if let Some(output) = self.output.get() {
            output.set(value)?;
        }
        Ok(())
    }
}

/// A signal derived from other signals.
///
/// Dereferences to its output [`Signal`], so it can be read, subscribed to,
/// and read from inside other computed signals like any signal.
///
/// # Example
///
/// ```rust
/// use trkl_core::Runtime;
///
/// let rt = Runtime::new();
/// let a = rt.signal(1);
///
/// let c = {
///     let a = a.clone();
///     rt.computed(move || Ok(a.get() * 2)).unwrap()
/// };
/// let b = {
///     let c = c.clone();
///     rt.computed(move || Ok(c.get() + 1)).unwrap()
/// };
///
/// a.set(5).unwrap();
/// assert_eq!(c.get(), 10);
/// assert_eq!(b.get(), 11);
/// ```
#[must_use = "dropping the last handle stops re-evaluation"]
pub struct Computed<T> {
    node: Rc<ComputedNode<T>>,
    signal: Signal<T>,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a computed signal and evaluate it once.
    pub fn new<F>(runtime: &Runtime, compute: F) -> Result<Self>
    where
        F: Fn() -> Result<T> + 'static,
    {
        let node = Rc::new_cyclic(|self_ref| ComputedNode {
            id: SubscriberId::new(),
            runtime: runtime.clone(),
            self_ref: self_ref.clone(),
            compute: Box::new(compute),
            output: OnceCell::new(),
            run_count: Cell::new(0),
        });

        let initial = {
            let _run = PropagationGuard::enter(runtime)?;
            node.evaluate()?
        };
        let signal = Signal::new(runtime, initial);
        // Nothing can have filled the cell: a re-run before this point
        // would have been circular.
        let _ = node.output.set(signal.clone());

        debug!(
            runtime = runtime.label(),
            subscriber = ?node.id,
            signal = signal.id(),
            "created computed signal"
        );

        Ok(Self { node, signal })
    }

    /// The output signal.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// The ID this computation subscribes to its dependencies under.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.node.id
    }

    /// Number of successful evaluations, including the initial one.
    pub fn run_count(&self) -> usize {
        self.node.run_count.get()
    }

    /// Re-run the function now, as if a dependency had changed.
    pub fn recompute(&self) -> Result<()> {
        self.node.recompute()
    }
}

impl<T> Deref for Computed<T> {
    type Target = Signal<T>;

    fn deref(&self) -> &Signal<T> {
        &self.signal
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
            signal: self.signal.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("subscriber_id", &self.node.id)
            .field("run_count", &self.node.run_count.get())
            .field("signal", &self.signal)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
