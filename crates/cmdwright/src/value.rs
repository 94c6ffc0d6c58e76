//! Argument type tags and bound values.
//!
//! [`ArgType`] is the semantic tag a parameter or valued flag declares.
//! [`Value`] is what a raw token becomes once a resolver has coerced it.
//!
//! Enumerations are described by an [`EnumSpec`] (type name plus symbol
//! names). Rust enums can provide one by implementing [`ArgEnum`]:
//!
//! ```
//! use cmdwright::{ArgEnum, ArgType};
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Color { Red, Green }
//!
//! impl ArgEnum for Color {
//!     const NAME: &'static str = "Color";
//!     const SYMBOLS: &'static [&'static str] = &["RED", "GREEN"];
//!
//!     fn from_ordinal(ordinal: usize) -> Option<Self> {
//!         [Color::Red, Color::Green].get(ordinal).copied()
//!     }
//! }
//!
//! let ty = ArgType::enumeration::<Color>();
//! assert_eq!(ty.type_name(), "Color");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Trait for Rust enums usable as parameter types.
///
/// `SYMBOLS[i]` must be the symbolic name of the variant returned by
/// `from_ordinal(i)`. Matching against user input is case-insensitive.
pub trait ArgEnum: Sized {
    /// Type name shown in usage strings and errors.
    const NAME: &'static str;

    /// Symbolic variant names, in ordinal order.
    const SYMBOLS: &'static [&'static str];

    /// Returns the variant with the given ordinal.
    fn from_ordinal(ordinal: usize) -> Option<Self>;
}

/// Symbol table of an enumeration parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    name: String,
    symbols: Vec<String>,
}

impl EnumSpec {
    /// Creates an enum description from a type name and its symbols.
    pub fn new<I, T>(name: impl Into<String>, symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Describes a Rust enum implementing [`ArgEnum`].
    pub fn of<E: ArgEnum>() -> Self {
        Self::new(E::NAME, E::SYMBOLS.iter().copied())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Finds the symbol matching `raw`, ignoring case.
    pub fn lookup(&self, raw: &str) -> Option<EnumValue> {
        let needle = raw.to_lowercase();
        self.symbols
            .iter()
            .position(|symbol| symbol.to_lowercase() == needle)
            .map(|ordinal| EnumValue {
                enum_name: self.name.clone(),
                symbol: self.symbols[ordinal].clone(),
                ordinal,
            })
    }
}

/// A resolved enumeration symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Name of the enumeration type.
    pub enum_name: String,
    /// The symbol as declared (canonical casing, not the user's input).
    pub symbol: String,
    /// Position of the symbol in its [`EnumSpec`].
    pub ordinal: usize,
}

impl EnumValue {
    /// Converts back into the Rust enum it was declared from.
    pub fn to_enum<E: ArgEnum>(&self) -> Option<E> {
        if self.enum_name != E::NAME {
            return None;
        }
        E::from_ordinal(self.ordinal)
    }
}

/// Semantic type tag of a parameter or valued flag.
///
/// `String`, `Int`, `Float`, `Bool` and `Custom` types are coerced by the
/// resolver registered under [`type_name`](Self::type_name). `Enum` is
/// resolved against its symbol table and `Rest` captures raw tokens, so
/// neither needs a registered resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    String,
    Int,
    Float,
    Bool,
    /// A host-defined type, resolved by the resolver registered under this name.
    Custom(String),
    Enum(EnumSpec),
    /// Raw-string capture of every remaining token.
    Rest,
}

impl ArgType {
    pub fn custom(name: impl Into<String>) -> Self {
        ArgType::Custom(name.into())
    }

    pub fn enumeration<E: ArgEnum>() -> Self {
        ArgType::Enum(EnumSpec::of::<E>())
    }

    /// Name used for resolver lookup and usage strings.
    pub fn type_name(&self) -> &str {
        match self {
            ArgType::String => "string",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::Bool => "bool",
            ArgType::Custom(name) => name,
            ArgType::Enum(spec) => spec.name(),
            ArgType::Rest => "rest",
        }
    }

    /// Key of the resolver this type needs, if any.
    pub(crate) fn resolver_key(&self) -> Option<&str> {
        match self {
            ArgType::Enum(_) | ArgType::Rest => None,
            other => Some(other.type_name()),
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, ArgType::Rest)
    }

    pub fn as_enum(&self) -> Option<&EnumSpec> {
        match self {
            ArgType::Enum(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A coerced argument value.
#[derive(Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Enum(EnumValue),
    /// Raw tokens captured by a rest parameter, untouched.
    Rest(Vec<String>),
    /// Coerced tokens of a typed variadic parameter.
    List(Vec<Value>),
    /// Value produced by a host-defined resolver.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps a host-defined value.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_rest(&self) -> Option<&[String]> {
        match self {
            Value::Rest(tokens) => Some(tokens),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Downcasts a host-defined value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(any) => any.downcast_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Enum(e) => f.debug_tuple("Enum").field(&e.symbol).finish(),
            Value::Rest(tokens) => f.debug_tuple("Rest").field(tokens).finish(),
            Value::List(values) => f.debug_tuple("List").field(values).finish(),
            Value::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Rest(a), Value::Rest(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Host values have no equality of their own; identity is the best we have.
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
