//! Typed coercion of raw tokens.
//!
//! [`ArgumentResolvers`] maps a type name to a function turning one raw
//! token (plus the invoker, for context-sensitive lookups such as "a player
//! currently online") into a [`Value`]. Enumerations bypass the registry and
//! are matched against their symbol table instead.
//!
//! # Example
//!
//! ```
//! use cmdwright::{ArgType, ArgumentError, ArgumentResolvers, Value};
//!
//! struct Session { world: String }
//!
//! let resolvers = ArgumentResolvers::<Session>::new()
//!     .register("world", |raw, session: &Session| {
//!         if raw == "here" {
//!             Ok(Value::String(session.world.clone()))
//!         } else {
//!             Ok(Value::String(raw.to_string()))
//!         }
//!     });
//!
//! let session = Session { world: "overworld".into() };
//! let value = resolvers.resolve(&ArgType::custom("world"), "here", &session)?;
//! assert_eq!(value.as_str(), Some("overworld"));
//! # Ok::<(), ArgumentError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ArgumentError;
use crate::value::{ArgType, Value};

/// A coercion function from raw token to value.
pub type ResolverFn<S> = Arc<dyn Fn(&str, &S) -> Result<Value, ArgumentError> + Send + Sync>;

/// Registry of resolvers keyed by type name.
///
/// [`new`](Self::new) pre-registers `string`, `int`, `float` and `bool`;
/// [`empty`](Self::empty) registers nothing. Registering a name twice
/// replaces the earlier resolver, which is how the built-ins are overridden.
pub struct ArgumentResolvers<S> {
    resolvers: HashMap<String, ResolverFn<S>>,
}

impl<S> ArgumentResolvers<S> {
    /// Creates a registry holding the built-in resolvers.
    pub fn new() -> Self {
        Self::empty()
            .register("string", |raw, _| Ok(Value::String(raw.to_string())))
            .register("int", |raw, _| parse_int(raw))
            .register("float", |raw, _| parse_float(raw))
            .register("bool", |raw, _| parse_bool(raw))
    }

    /// Creates a registry with no resolvers at all.
    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Registers a resolver for a type name.
    pub fn register<F>(mut self, type_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str, &S) -> Result<Value, ArgumentError> + Send + Sync + 'static,
    {
        self.resolvers.insert(type_name.into(), Arc::new(f));
        self
    }

    /// Returns true if values of `ty` can be resolved.
    pub fn supports(&self, ty: &ArgType) -> bool {
        match ty.resolver_key() {
            Some(key) => self.resolvers.contains_key(key),
            None => true,
        }
    }

    /// Coerces one raw token to `ty`.
    ///
    /// A `Rest` target yields the token as a plain string; capturing whole
    /// token lists is the dispatcher's job.
    pub fn resolve(&self, ty: &ArgType, raw: &str, invoker: &S) -> Result<Value, ArgumentError> {
        match ty {
            ArgType::Enum(spec) => {
                spec.lookup(raw)
                    .map(Value::Enum)
                    .ok_or_else(|| ArgumentError::InvalidEnumValue {
                        enum_name: spec.name().to_string(),
                        raw: raw.to_string(),
                        symbols: spec.symbols().to_vec(),
                    })
            }
            ArgType::Rest => Ok(Value::String(raw.to_string())),
            other => {
                let key = other.type_name();
                let resolver = self
                    .resolvers
                    .get(key)
                    .ok_or_else(|| ArgumentError::Unregistered(key.to_string()))?;
                resolver(raw, invoker)
            }
        }
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S> Default for ArgumentResolvers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ArgumentResolvers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentResolvers")
            .field("types", &self.type_names())
            .finish()
    }
}

fn parse_int(raw: &str) -> Result<Value, ArgumentError> {
    raw.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| ArgumentError::invalid("int", raw))
}

fn parse_float(raw: &str) -> Result<Value, ArgumentError> {
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Value::Float(n)),
        _ => Err(ArgumentError::invalid("float", raw)),
    }
}

fn parse_bool(raw: &str) -> Result<Value, ArgumentError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(Value::Bool(true)),
        "false" | "no" | "off" => Ok(Value::Bool(false)),
        _ => Err(ArgumentError::invalid("bool", raw)),
    }
}
