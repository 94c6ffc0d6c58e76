//! Flag definitions and token matching.
//!
//! A flag is an out-of-band argument bound by key instead of position.
//! Token syntax is the only protocol here:
//!
//! ```text
//! --long    long form: lookup key "long"
//! -k        short form: lookup key "k"
//! other     positional, never a flag
//! ```
//!
//! The stripped key is looked up in the short (canonical key) map first and
//! in the long map second, so `--k` and `-long` resolve too.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistrationError;
use crate::value::ArgType;

/// What a matched flag records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    /// The flag's presence is its value.
    Presence,
    /// The flag consumes the following token, coerced to this type.
    Valued(ArgType),
}

/// One recognized flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    key: String,
    long: Option<String>,
    kind: FlagKind,
}

impl FlagSpec {
    /// A boolean presence flag.
    pub fn presence(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            long: None,
            kind: FlagKind::Presence,
        }
    }

    /// A flag taking one value of type `ty`.
    pub fn valued(key: impl Into<String>, ty: ArgType) -> Self {
        Self {
            key: key.into(),
            long: None,
            kind: FlagKind::Valued(ty),
        }
    }

    /// Sets the long form.
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Canonical key the matched value is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn long_form(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn kind(&self) -> &FlagKind {
        &self.kind
    }

    pub fn takes_value(&self) -> bool {
        matches!(self.kind, FlagKind::Valued(_))
    }

    pub fn value_type(&self) -> Option<&ArgType> {
        match &self.kind {
            FlagKind::Valued(ty) => Some(ty),
            FlagKind::Presence => None,
        }
    }

    /// Token forms this flag answers to, short first.
    pub fn tokens(&self) -> Vec<String> {
        let mut forms = vec![format!("-{}", self.key)];
        if let Some(long) = &self.long {
            forms.push(format!("--{}", long));
        }
        forms
    }
}

/// The flags recognized by one command.
///
/// Every spec is present in the short map under its key; specs with a long
/// form are also present in the long map. Both entries share one instance.
#[derive(Debug, Clone, Default)]
pub struct FlagGrammar {
    by_short: HashMap<String, Arc<FlagSpec>>,
    by_long: HashMap<String, Arc<FlagSpec>>,
}

impl FlagGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag, rejecting malformed or clashing keys.
    pub(crate) fn insert(&mut self, command: &str, spec: FlagSpec) -> Result<(), RegistrationError> {
        let invalid = |key: &str| RegistrationError::InvalidFlag {
            command: command.to_string(),
            key: key.to_string(),
        };

        if !is_valid_key(&spec.key) {
            return Err(invalid(&spec.key));
        }
        if let Some(long) = &spec.long {
            if !is_valid_key(long) {
                return Err(invalid(long));
            }
        }

        // Short and long lookups share one stripped namespace.
        let mut forms = vec![spec.key.as_str()];
        forms.extend(spec.long.as_deref().filter(|long| *long != spec.key));
        for form in forms {
            if self.by_short.contains_key(form) || self.by_long.contains_key(form) {
                return Err(RegistrationError::DuplicateFlag {
                    command: command.to_string(),
                    key: form.to_string(),
                });
            }
        }

        let spec = Arc::new(spec);
        if let Some(long) = &spec.long {
            self.by_long.insert(long.clone(), Arc::clone(&spec));
        }
        self.by_short.insert(spec.key.clone(), spec);
        Ok(())
    }

    /// Matches a raw token to a flag.
    pub fn matching(&self, token: &str) -> Option<&FlagSpec> {
        let stripped = strip_leading_hyphens(token)?;
        self.by_short
            .get(stripped)
            .or_else(|| self.by_long.get(stripped))
            .map(Arc::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.by_short.is_empty() && self.by_long.is_empty()
    }

    /// Number of distinct flags.
    pub fn len(&self) -> usize {
        self.by_short.len()
    }

    /// Distinct flags, ordered by key.
    pub fn specs(&self) -> Vec<&FlagSpec> {
        let mut specs: Vec<&FlagSpec> = self.by_short.values().map(Arc::as_ref).collect();
        specs.sort_by(|a, b| a.key.cmp(&b.key));
        specs
    }
}

/// Returns the lookup key of a flag-shaped token, or `None` for positionals.
fn strip_leading_hyphens(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .filter(|key| !key.is_empty())
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('-') && !key.chars().any(char::is_whitespace)
}
