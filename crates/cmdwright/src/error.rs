//! Error types for registration and dispatch.
//!
//! Two categories with different lifetimes:
//!
//! - [`RegistrationError`]: a malformed definition or table, detected while
//!   the table is built. Fatal at startup.
//! - [`Rejection`]: why one dispatch call did not succeed. Always returned as
//!   data; the host decides how to present it.
//!
//! [`ArgumentError`] is the coercion failure produced by resolvers, wrapped
//! into [`Rejection::InvalidArgument`] by the dispatcher.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A raw token could not be coerced to the target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The token is not a valid value of the expected type.
    #[error("'{raw}' is not a valid {expected}")]
    Invalid { expected: String, raw: String },

    /// The token matches none of the enum's symbols.
    #[error("'{raw}' is not a valid {enum_name} (expected one of: {})", .symbols.join(", "))]
    InvalidEnumValue {
        enum_name: String,
        raw: String,
        symbols: Vec<String>,
    },

    /// No resolver is registered for the type.
    ///
    /// Tables reject such definitions when they are built, so dispatch never
    /// produces this; it only surfaces from direct resolver calls.
    #[error("no resolver registered for type '{0}'")]
    Unregistered(String),

    /// Failure reported by a custom resolver.
    #[error("{0}")]
    Custom(String),
}

impl ArgumentError {
    /// Create an invalid-value error.
    pub fn invalid(expected: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Invalid {
            expected: expected.into(),
            raw: raw.into(),
        }
    }

    /// Create a custom resolver error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// A definition or table that must not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command name must not be empty")]
    EmptyName,

    #[error("command '{command}' has an empty alias")]
    EmptyAlias { command: String },

    #[error("command '{command}' has no action")]
    MissingAction { command: String },

    #[error("command '{command}': variadic parameter at position {position} is not the last parameter")]
    NonFinalVariadic { command: String, position: usize },

    #[error("command '{command}' uses unregistered parameter type '{type_name}'")]
    UnregisteredType { command: String, type_name: String },

    #[error("command '{command}': enum '{enum_name}' has no symbols")]
    EmptyEnum { command: String, enum_name: String },

    #[error("table '{table}' already has default command '{existing}', cannot add '{command}'")]
    DuplicateDefault {
        table: String,
        existing: String,
        command: String,
    },

    #[error("'{key}' of command '{command}' collides with command '{existing}'")]
    DuplicateName {
        key: String,
        command: String,
        existing: String,
    },

    #[error("command '{command}': invalid flag key '{key}'")]
    InvalidFlag { command: String, key: String },

    #[error("command '{command}': flag token '{key}' is registered twice")]
    DuplicateFlag { command: String, key: String },

    #[error("command '{command}': completion id '{id}' must start with '{prefix}'")]
    InvalidCompletionId {
        command: String,
        id: String,
        prefix: String,
    },

    #[error("command '{command}': completion id '{id}' is not registered")]
    UnregisteredCompletion { command: String, id: String },

    #[error("command '{command}': completion bound at index {index} but the command takes {arity} argument(s)")]
    UnreachableCompletion {
        command: String,
        index: usize,
        arity: usize,
    },

    #[error("root label '{label}' is already used by table '{existing}'")]
    DuplicateRoot { label: String, existing: String },
}

/// Opaque failure raised by a command action.
///
/// Shared through an [`Arc`] so dispatch results stay cheap to clone. Two
/// action errors compare equal when they render the same message.
#[derive(Clone)]
pub struct ActionError(Arc<anyhow::Error>);

impl ActionError {
    pub fn new(cause: anyhow::Error) -> Self {
        Self(Arc::new(cause))
    }

    /// The error the action returned.
    pub fn cause(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl PartialEq for ActionError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

/// Why a dispatch call did not reach (or did not survive) the action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// No name, alias or default matched.
    #[error("unknown command{}", quoted_suffix(.token))]
    UnknownCommand { token: Option<String> },

    /// The invoker kind is incompatible with the definition's constraint.
    #[error("command '{command}' cannot be run by this invoker")]
    SenderNotAllowed { command: String },

    /// The authorization predicate returned false.
    #[error("missing permission '{permission}' for command '{command}'")]
    PermissionDenied { command: String, permission: String },

    /// A valued flag was the last token.
    #[error("flag '{flag}' expects a value")]
    MissingFlagValue { flag: String },

    /// Positional token count does not satisfy the signature.
    #[error(
        "command '{command}' expects {}{expected} argument(s), got {actual}",
        at_least(.variadic)
    )]
    ArgumentCountMismatch {
        command: String,
        expected: usize,
        variadic: bool,
        actual: usize,
    },

    /// A positional or flag value failed coercion.
    ///
    /// `index` is the offset of the offending token in the argument list
    /// handed to the definition (after the selector token was consumed).
    #[error("invalid argument at {index}: {cause}")]
    InvalidArgument {
        index: usize,
        raw: String,
        #[source]
        cause: ArgumentError,
    },

    /// A pre-dispatch hook refused the call.
    #[error("dispatch vetoed: {message}")]
    Vetoed { message: String },

    /// The action itself failed.
    #[error("command '{command}' failed: {cause}")]
    ActionFailed {
        command: String,
        #[source]
        cause: ActionError,
    },
}

impl Rejection {
    /// Returns true if the failure happened inside the action.
    pub fn is_action_failure(&self) -> bool {
        matches!(self, Rejection::ActionFailed { .. })
    }

    /// Returns true if the invoker was refused before any argument was bound.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Rejection::SenderNotAllowed { .. } | Rejection::PermissionDenied { .. }
        )
    }

    /// Returns true if the tokens did not fit the command's signature.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Rejection::MissingFlagValue { .. }
                | Rejection::ArgumentCountMismatch { .. }
                | Rejection::InvalidArgument { .. }
        )
    }
}

fn quoted_suffix(token: &Option<String>) -> String {
    token
        .as_deref()
        .map(|t| format!(" '{}'", t))
        .unwrap_or_default()
}

fn at_least(variadic: &bool) -> &'static str {
    if *variadic {
        "at least "
    } else {
        ""
    }
}
