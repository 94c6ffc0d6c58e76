//! Hook system for pre/post dispatch.
//!
//! Hooks run host code at fixed points of the dispatch pipeline, for
//! cross-cutting concerns (auditing, rate limiting, cooldowns) that do not
//! belong in any one action.
//!
//! # Pipeline Position
//!
//! ```text
//! tokens
//!   → resolve, authorize, bind
//!   → PRE-DISPATCH HOOK ← (veto, audit)
//!   → action
//!   → POST-DISPATCH HOOK ← (observe the result)
//! ```
//!
//! - Pre-dispatch: sees the invoker, the resolved definition and the bound
//!   arguments. Returning a [`HookError`] stops the dispatch with
//!   [`Rejection::Vetoed`](crate::Rejection::Vetoed); later hooks and the
//!   action do not run.
//! - Post-dispatch: sees the invoker and the final result of every dispatch
//!   call, success or rejection. It cannot change the result.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::args::Arguments;
use crate::definition::CommandDefinition;
use crate::dispatch::DispatchResult;

/// Error returned by a pre-dispatch hook to veto a call.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    /// Human-readable reason, carried into the rejection.
    pub message: String,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Type alias for pre-dispatch hook functions.
pub type PreDispatchFn<S> =
    Arc<dyn Fn(&S, &CommandDefinition<S>, &Arguments) -> Result<(), HookError> + Send + Sync>;

/// Type alias for post-dispatch hook functions.
pub type PostDispatchFn<S> = Arc<dyn Fn(&S, &DispatchResult) + Send + Sync>;

/// Hooks of one command table, executed in registration order.
pub struct Hooks<S> {
    pre_dispatch: Vec<PreDispatchFn<S>>,
    post_dispatch: Vec<PostDispatchFn<S>>,
}

impl<S> Hooks<S> {
    pub fn new() -> Self {
        Self {
            pre_dispatch: Vec::new(),
            post_dispatch: Vec::new(),
        }
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.pre_dispatch.is_empty() && self.post_dispatch.is_empty()
    }

    /// Adds a pre-dispatch hook.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cmdwright::{HookError, Hooks, InvokerKind};
    ///
    /// let hooks = Hooks::<InvokerKind>::new().pre_dispatch(|who, def, _args| {
    ///     if def.name() == "shutdown" && *who != InvokerKind::Console {
    ///         return Err(HookError::new("shutdown is console-only"));
    ///     }
    ///     Ok(())
    /// });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn pre_dispatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&S, &CommandDefinition<S>, &Arguments) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.pre_dispatch.push(Arc::new(f));
        self
    }

    /// Adds a post-dispatch hook.
    pub fn post_dispatch<F>(mut self, f: F) -> Self
    where
        F: Fn(&S, &DispatchResult) + Send + Sync + 'static,
    {
        self.post_dispatch.push(Arc::new(f));
        self
    }

    /// Runs all pre-dispatch hooks, stopping at the first veto.
    pub fn run_pre_dispatch(
        &self,
        invoker: &S,
        definition: &CommandDefinition<S>,
        args: &Arguments,
    ) -> Result<(), HookError> {
        for hook in &self.pre_dispatch {
            hook(invoker, definition, args)?;
        }
        Ok(())
    }

    /// Runs all post-dispatch hooks.
    pub fn run_post_dispatch(&self, invoker: &S, result: &DispatchResult) {
        for hook in &self.post_dispatch {
            hook(invoker, result);
        }
    }
}

impl<S> Default for Hooks<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Hooks<S> {
    fn clone(&self) -> Self {
        Self {
            pre_dispatch: self.pre_dispatch.clone(),
            post_dispatch: self.post_dispatch.clone(),
        }
    }
}

impl<S> fmt::Debug for Hooks<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_dispatch_count", &self.pre_dispatch.len())
            .field("post_dispatch_count", &self.post_dispatch.len())
            .finish()
    }
}
