//! Reactive Primitives
//!
//! This module implements the dependency-tracking engine: signals, computed
//! signals, and the runtime that coordinates them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while a computed signal is evaluating, the signal automatically subscribes
//! that computation. When the signal's value changes, all subscribers are
//! called synchronously, before the write returns.
//!
//! ## Computed Signals
//!
//! A computed signal is a signal whose value is produced by a function. It
//! discovers its dependencies simply by reading them, and re-runs the
//! function whenever any of them changes. Propagation is eager: after a
//! write returns, every computed signal downstream of it is up to date.
//!
//! # Implementation Notes
//!
//! The runtime keeps a stack of the computations currently being evaluated.
//! Entering an evaluation pushes onto it and leaving pops, through an RAII
//! guard, so nested evaluations always see the right tracker. Seeing a
//! computation that is already on the stack means it re-entered itself,
//! which is reported as a circular computation.

mod computed;
mod context;
mod runtime;
mod signal;
mod subscriber;

pub use computed::Computed;
pub use runtime::Runtime;
pub use signal::Signal;
pub use subscriber::{Subscriber, SubscriberId};
