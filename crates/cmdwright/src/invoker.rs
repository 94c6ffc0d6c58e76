//! Invokers and authorization.
//!
//! The engine never inspects who an invoker is. It needs two things from
//! the host: the invoker's kind (a capability tag compared against the
//! definition's [`InvokerConstraint`](crate::InvokerConstraint)), and an
//! [`Authorizer`] answering "may this invoker use this permission".

/// Capability tag carried by every invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokerKind {
    /// A person at an interactive session (a player, a chat user).
    Interactive,
    /// A non-interactive origin (server console, script, scheduler).
    Console,
}

/// The entity issuing a command.
pub trait Invoker {
    fn kind(&self) -> InvokerKind;

    fn is_interactive(&self) -> bool {
        self.kind() == InvokerKind::Interactive
    }
}

impl Invoker for InvokerKind {
    fn kind(&self) -> InvokerKind {
        *self
    }
}

/// Host-supplied permission predicate.
///
/// Implemented for any `Fn(&S, &str) -> bool`:
///
/// ```
/// use cmdwright::{Authorizer, InvokerKind};
///
/// let console_only = |invoker: &InvokerKind, _perm: &str| *invoker == InvokerKind::Console;
/// assert!(console_only.is_permitted(&InvokerKind::Console, "admin"));
/// ```
pub trait Authorizer<S>: Send + Sync {
    fn is_permitted(&self, invoker: &S, permission: &str) -> bool;
}

impl<S, F> Authorizer<S> for F
where
    F: Fn(&S, &str) -> bool + Send + Sync,
{
    fn is_permitted(&self, invoker: &S, permission: &str) -> bool {
        self(invoker, permission)
    }
}

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<S> Authorizer<S> for AllowAll {
    fn is_permitted(&self, _invoker: &S, _permission: &str) -> bool {
        true
    }
}

/// Refuses every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl<S> Authorizer<S> for DenyAll {
    fn is_permitted(&self, _invoker: &S, _permission: &str) -> bool {
        false
    }
}
