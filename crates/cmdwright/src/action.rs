//! Command actions.
//!
//! An action is the business logic bound to a definition. It receives the
//! invoker and the bound [`Arguments`] and either succeeds or returns an
//! error; the dispatcher turns that error into
//! [`Rejection::ActionFailed`](crate::Rejection::ActionFailed).
//!
//! Actions are shared across threads with the table they live in, hence
//! `Send + Sync`. An action needing mutable state keeps it behind a lock.
//!
//! # Example
//!
//! ```rust
//! use cmdwright::{Action, Arguments, FnAction, InvokerKind};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! // Closures are wrapped in FnAction
//! let greet = FnAction::new(|_who: &InvokerKind, args: &Arguments| {
//!     println!("hello {}", args.str(0).unwrap_or("world"));
//!     Ok(())
//! });
//!
//! // Structs implement Action directly
//! struct Counter { hits: AtomicUsize }
//!
//! impl Action<InvokerKind> for Counter {
//!     fn invoke(&self, _who: &InvokerKind, _args: &Arguments) -> anyhow::Result<()> {
//!         self.hits.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//! ```

use crate::args::Arguments;

/// Trait for command actions.
pub trait Action<S>: Send + Sync {
    /// Runs the action.
    fn invoke(&self, invoker: &S, args: &Arguments) -> anyhow::Result<()>;
}

/// A wrapper that implements [`Action`] for closures.
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F> {
    /// Wraps a closure taking the invoker and the bound arguments.
    pub fn new<S>(f: F) -> Self
    where
        F: Fn(&S, &Arguments) -> anyhow::Result<()> + Send + Sync,
    {
        Self { f }
    }
}

impl<S, F> Action<S> for FnAction<F>
where
    F: Fn(&S, &Arguments) -> anyhow::Result<()> + Send + Sync,
{
    fn invoke(&self, invoker: &S, args: &Arguments) -> anyhow::Result<()> {
        (self.f)(invoker, args)
    }
}
