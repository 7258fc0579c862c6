//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! it subscribes the current computation.
//!
//! # Implementation
//!
//! Each runtime keeps a stack of trackers. Entering a context pushes the
//! computation's tracker; dropping the returned guard pops it. The top of
//! the stack is the computation that signal reads subscribe, and popping on
//! drop restores whatever was running before, whether the computation
//! returned normally, returned an error, or panicked.
//!
//! This design supports nested contexts (e.g., a computed signal whose
//! evaluation triggers the re-evaluation of another one).
//!
//! # Propagation Depth
//!
//! The tracking stack only holds computations that are still evaluating.
//! A computed signal publishes its result after leaving its context, so a
//! write flowing down a chain keeps at most one entry on the stack. The
//! depth limit is therefore counted separately by `PropagationGuard`,
//! which stays held across both the evaluation and the publish.

use tracing::trace;

use super::runtime::{Runtime, Tracker};
use super::SubscriberId;
use crate::error::{ReactiveError, Result};

/// Guard that pops the context when dropped.
pub(crate) struct ReactiveContext {
    runtime: Runtime,
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given computation.
    ///
    /// Fails without touching the stack if the computation is already
    /// running somewhere up the stack.
    pub(crate) fn enter(runtime: &Runtime, tracker: Tracker) -> Result<Self> {
        let subscriber_id = tracker.id();
        let mut stack = runtime.stack().borrow_mut();

        // Identity, not value: the same computation re-entering itself.
        if stack.iter().any(|active| active.id() == subscriber_id) {
            return Err(ReactiveError::CircularComputation {
                subscriber: subscriber_id,
            });
        }

        stack.push(tracker);
        trace!(subscriber = ?subscriber_id, depth = stack.len(), "entered reactive context");

        Ok(Self {
            runtime: runtime.clone(),
            subscriber_id,
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = self.runtime.stack().borrow_mut().pop();

        // Guards are strictly nested, so the top must be ours.
        if let Some(entry) = popped {
            debug_assert_eq!(
                entry.id(),
                self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id,
                entry.id()
            );
        }
    }
}

/// Guard that counts one computed re-run until its result has propagated.
pub(crate) struct PropagationGuard {
    runtime: Runtime,
}

impl PropagationGuard {
    /// Count a new re-run, failing if `RuntimeConfig::max_depth` re-runs
    /// are already in progress.
    pub(crate) fn enter(runtime: &Runtime) -> Result<Self> {
        let depth = runtime.propagation();

        if let Some(limit) = runtime.config().max_depth {
            if depth.get() >= limit {
                return Err(ReactiveError::DepthExceeded { limit });
            }
        }

        depth.set(depth.get() + 1);
        Ok(Self {
            runtime: runtime.clone(),
        })
    }
}

impl Drop for PropagationGuard {
    fn drop(&mut self) {
        let depth = self.runtime.propagation();
        depth.set(depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::reactive::runtime::Recompute;
    use std::rc::Weak;

    struct Inert;

    impl Recompute for Inert {
        fn recompute(&self) -> Result<()> {
            Ok(())
        }
    }

    fn tracker() -> Tracker {
        Tracker::new(SubscriberId::new(), Weak::<Inert>::new())
    }

    #[test]
    fn context_tracks_subscriber() {
        let rt = Runtime::new();
        let tracker = tracker();
        let id = tracker.id();

        assert!(!rt.is_tracking());
        assert!(rt.current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(&rt, tracker).unwrap();
            assert!(rt.is_tracking());
            assert_eq!(rt.current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!rt.is_tracking());
        assert!(rt.current_subscriber().is_none());
    }

    #[test]
    fn nested_contexts() {
        let rt = Runtime::new();
        let outer = tracker();
        let inner = tracker();
        let (id1, id2) = (outer.id(), inner.id());

        {
            let _ctx1 = ReactiveContext::enter(&rt, outer).unwrap();
            assert_eq!(rt.current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(&rt, inner).unwrap();
                assert_eq!(rt.current_subscriber(), Some(id2));
                assert_eq!(rt.stack_ids(), vec![id1, id2]);
            }

            // After inner context drops, outer should be current
            assert_eq!(rt.current_subscriber(), Some(id1));
        }

        assert!(rt.current_subscriber().is_none());
    }

    #[test]
    fn reentering_is_circular() {
        let rt = Runtime::new();
        let outer = tracker();
        let middle = tracker();

        let _ctx1 = ReactiveContext::enter(&rt, outer.clone()).unwrap();
        let _ctx2 = ReactiveContext::enter(&rt, middle).unwrap();

        // Indirect: the outer computation is below the top of the stack.
        let err = ReactiveContext::enter(&rt, outer).err().unwrap();
        assert!(err.is_circular());

        // The failed enter left the stack alone.
        assert_eq!(rt.depth(), 2);
    }

    #[test]
    fn depth_limit() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_max_depth(2));

        let _run1 = PropagationGuard::enter(&rt).unwrap();
        let _run2 = PropagationGuard::enter(&rt).unwrap();
        let err = PropagationGuard::enter(&rt).err().unwrap();

        assert!(matches!(err, ReactiveError::DepthExceeded { limit: 2 }));
        assert_eq!(rt.propagation_depth(), 2);
        // The tracking stack is not involved.
        assert_eq!(rt.depth(), 0);
    }

    #[test]
    fn propagation_depth_released_on_drop() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_max_depth(1));

        {
            let _run = PropagationGuard::enter(&rt).unwrap();
            assert_eq!(rt.propagation_depth(), 1);
        }

        assert_eq!(rt.propagation_depth(), 0);
        assert!(PropagationGuard::enter(&rt).is_ok());
    }

    #[test]
    fn tracking_stack_ignores_depth_limit() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_max_depth(1));

        let _ctx1 = ReactiveContext::enter(&rt, tracker()).unwrap();
        let _ctx2 = ReactiveContext::enter(&rt, tracker()).unwrap();
        assert_eq!(rt.depth(), 2);
    }

    #[test]
    fn context_restored_after_panic() {
        let rt = Runtime::new();
        let rt_clone = rt.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ctx = ReactiveContext::enter(&rt_clone, tracker()).unwrap();
            panic!("computation blew up");
        }));

        assert!(result.is_err());
        assert!(!rt.is_tracking());
    }

    #[test]
    fn runtimes_do_not_share_context() {
        let rt1 = Runtime::new();
        let rt2 = Runtime::new();

        let _ctx = ReactiveContext::enter(&rt1, tracker()).unwrap();
        assert!(rt1.is_tracking());
        assert!(!rt2.is_tracking());
    }
}
