//! Position-aware completion.
//!
//! The last token is always the partial being typed. With nothing before
//! it, candidates are the table's names and aliases. Otherwise the tokens
//! before it select a definition, and the positional index the partial
//! falls on selects a completion provider.
//!
//! Every call returns a fresh, sorted, duplicate-free list.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::definition::CommandDefinition;
use crate::invoker::Authorizer;
use crate::table::CommandTable;

/// Computes suggestions for partial input against a table.
pub struct Suggester<S> {
    authorizer: Option<Arc<dyn Authorizer<S>>>,
}

impl<S> Suggester<S> {
    pub fn new() -> Self {
        Self { authorizer: None }
    }

    /// Sets the predicate used to hide commands when the table's config
    /// enables `hide_unpermitted`.
    pub fn with_authorizer(mut self, authorizer: impl Authorizer<S> + 'static) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    pub(crate) fn with_shared_authorizer(authorizer: Arc<dyn Authorizer<S>>) -> Self {
        Self {
            authorizer: Some(authorizer),
        }
    }

    pub fn suggest<T: AsRef<str>>(
        &self,
        table: &CommandTable<S>,
        invoker: &S,
        tokens: &[T],
    ) -> Vec<String> {
        let Some((partial, head)) = tokens.split_last() else {
            return self.command_names(table, invoker, "");
        };
        let partial = partial.as_ref();
        if head.is_empty() {
            return self.command_names(table, invoker, partial);
        }

        let Some((definition, args)) = table.resolve_root(head) else {
            trace!(table = table.name(), "no definition for completion");
            return Vec::new();
        };

        // A pending flag value takes the next token whatever it looks like.
        let Some(index) = positional_index(definition, args) else {
            trace!(command = definition.name(), "awaiting flag value");
            return Vec::new();
        };

        let wants_flags = partial.starts_with('-') && table.config().suggest_flags;
        if wants_flags && !definition.flags().is_empty() {
            return flag_tokens(definition, partial);
        }
        let Some(id) = definition.completion_at(index) else {
            trace!(command = definition.name(), index, "no provider bound");
            return Vec::new();
        };

        let param_type = definition.parameter_at(index).map(|p| p.ty());
        let Some(candidates) = table.completions().provide(id, invoker, param_type, partial) else {
            return Vec::new();
        };

        let needle = partial.to_lowercase();
        let mut out: Vec<String> = candidates
            .into_iter()
            .filter(|candidate| candidate.to_lowercase().contains(&needle))
            .collect();
        finish(&mut out);
        trace!(command = definition.name(), index, id, count = out.len(), "suggestions computed");
        out
    }

    /// Names and aliases whose lowercase form starts with the lowercase partial.
    ///
    /// `hide_unpermitted` needs an authorizer; without one every name is shown.
    fn command_names(&self, table: &CommandTable<S>, invoker: &S, partial: &str) -> Vec<String> {
        let needle = partial.to_lowercase();
        let hide = table.config().hide_unpermitted;
        if hide && self.authorizer.is_none() {
            debug!(table = table.name(), "hide_unpermitted is set but no authorizer is configured");
        }
        let mut out: Vec<String> = table
            .keys()
            .into_iter()
            .filter(|key| key.to_lowercase().starts_with(&needle))
            .filter(|key| !hide || self.permits(table, invoker, key))
            .map(str::to_string)
            .collect();
        finish(&mut out);
        out
    }

    fn permits(&self, table: &CommandTable<S>, invoker: &S, key: &str) -> bool {
        let (Some(authorizer), Some(permission)) = (
            self.authorizer.as_ref(),
            table.get(key).and_then(|def| def.permission()),
        ) else {
            return true;
        };
        authorizer.is_permitted(invoker, permission)
    }
}

impl<S> Default for Suggester<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Suggester<S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: self.authorizer.clone(),
        }
    }
}

/// Index of the positional slot the next token fills, skipping flags and
/// their values. `None` if the next token is a flag's value.
fn positional_index<S, T: AsRef<str>>(
    definition: &CommandDefinition<S>,
    args: &[T],
) -> Option<usize> {
    let grammar = definition.flags();
    let mut index = 0;
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        match grammar.matching(token.as_ref()) {
            Some(spec) if spec.takes_value() => {
                tokens.next()?;
            }
            Some(_) => {}
            None => index += 1,
        }
    }
    Some(index)
}

fn flag_tokens<S>(definition: &CommandDefinition<S>, partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    let mut out: Vec<String> = definition
        .flags()
        .specs()
        .into_iter()
        .flat_map(|spec| spec.tokens())
        .filter(|token| token.to_lowercase().starts_with(&needle))
        .collect();
    finish(&mut out);
    out
}

fn finish(out: &mut Vec<String>) {
    out.sort();
    out.dedup();
}
