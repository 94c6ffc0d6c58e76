//! Named suggestion sources.
//!
//! A definition binds a provider id to a positional index. The id may carry
//! an auxiliary key after a colon (`#players:online`); the part before the
//! colon selects the provider and the rest is handed to it as
//! [`CompletionRequest::sub_key`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::ArgType;

/// Everything a provider may consult when producing candidates.
pub struct CompletionRequest<'a, S> {
    /// The invoker asking for suggestions.
    pub invoker: &'a S,
    /// Text after the colon in the bound id, if any.
    pub sub_key: Option<&'a str>,
    /// Declared type of the parameter being completed, if the index maps to one.
    pub param_type: Option<&'a ArgType>,
    /// The partial token being typed.
    pub partial: &'a str,
}

/// A suggestion source.
pub type ProviderFn<S> = Arc<dyn Fn(&CompletionRequest<'_, S>) -> Vec<String> + Send + Sync>;

/// Registry of suggestion sources keyed by id.
pub struct CompletionProviders<S> {
    providers: HashMap<String, ProviderFn<S>>,
}

impl<S> CompletionProviders<S> {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registers a provider under `id`.
    pub fn register<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&CompletionRequest<'_, S>) -> Vec<String> + Send + Sync + 'static,
    {
        self.providers.insert(id.into(), Arc::new(f));
        self
    }

    /// Registers a provider that always offers the same candidates.
    pub fn register_static<I, T>(self, id: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        self.register(id, move |_| candidates.clone())
    }

    /// Returns true if the provider part of `id` is registered.
    pub fn is_registered(&self, id: &str) -> bool {
        let (provider, _) = split_id(id);
        self.providers.contains_key(provider)
    }

    /// Fetches raw candidates for a bound id.
    ///
    /// Returns `None` if no provider is registered under the id. Filtering
    /// and ordering are left to the caller.
    pub fn provide(
        &self,
        id: &str,
        invoker: &S,
        param_type: Option<&ArgType>,
        partial: &str,
    ) -> Option<Vec<String>> {
        let (provider, sub_key) = split_id(id);
        let f = self.providers.get(provider)?;
        Some(f(&CompletionRequest {
            invoker,
            sub_key,
            param_type,
            partial,
        }))
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl<S> Default for CompletionProviders<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for CompletionProviders<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionProviders")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Splits `provider:sub` into its parts.
pub fn split_id(id: &str) -> (&str, Option<&str>) {
    match id.split_once(':') {
        Some((provider, sub)) => (provider, Some(sub)),
        None => (id, None),
    }
}
