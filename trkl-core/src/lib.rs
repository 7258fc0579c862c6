//! trkl Core
//!
//! A small reactive-state library: mutable observable cells ("signals") and
//! derived values ("computed signals") that re-evaluate automatically when
//! any signal they read changes.
//!
//! - Dependencies are discovered implicitly, by reading signals while a
//!   computed signal evaluates. Nothing is subscribed by hand.
//! - Propagation is synchronous. When `set` returns, every dependent
//!   computation has re-run.
//! - Everything is single-threaded and owned by a [`Runtime`]; separate
//!   runtimes are fully independent.
//!
//! # Architecture
//!
//! - `reactive`: signals, computed signals, the runtime and its tracking context
//! - `value`: a dynamic primitive value type for untyped cells
//! - `config`: runtime configuration
//! - `error`: the error type shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use trkl_core::{Runtime, Subscriber};
//!
//! let rt = Runtime::new();
//!
//! // Create a signal
//! let count = rt.signal(0);
//!
//! // Create a derived value
//! let doubled = {
//!     let count = count.clone();
//!     rt.computed(move || Ok(count.get() * 2)).unwrap()
//! };
//!
//! // Observe it
//! doubled
//!     .subscribe(&Subscriber::new(|new: &i32, _| println!("doubled: {new}")), false)
//!     .unwrap();
//!
//! // Update the signal; prints "doubled: 10"
//! count.set(5).unwrap();
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod value;

pub use config::RuntimeConfig;
pub use error::{ReactiveError, Result};
pub use reactive::{Computed, Runtime, Signal, Subscriber, SubscriberId};
pub use value::Value;
