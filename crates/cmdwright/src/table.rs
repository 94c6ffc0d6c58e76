//! Per-root-command definition tables.
//!
//! A [`CommandTable`] holds every definition reachable under one root
//! command, keyed by primary name and by alias. All keys of one definition
//! share a single `Arc`. The table also owns the registries its definitions
//! were checked against, so dispatch never meets an unknown type or
//! completion id.
//!
//! ```rust
//! use cmdwright::{ArgType, CommandDefinition, CommandTable, InvokerKind};
//!
//! let table = CommandTable::<InvokerKind>::builder("build")
//!     .command(
//!         CommandDefinition::builder("house")
//!             .param("size", ArgType::Int)
//!             .action(|_, _| Ok(()))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let (def, rest) = table.resolve_root(&["house", "5"]).unwrap();
//! assert_eq!(def.name(), "house");
//! assert_eq!(rest, &["5"]);
//! # Ok::<(), cmdwright::RegistrationError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::completion::CompletionProviders;
use crate::config::{CollisionPolicy, EngineConfig};
use crate::definition::CommandDefinition;
use crate::error::RegistrationError;
use crate::hooks::Hooks;
use crate::resolver::ArgumentResolvers;

/// Immutable set of definitions under one root command.
pub struct CommandTable<S> {
    name: String,
    aliases: Vec<String>,
    by_name: HashMap<String, Arc<CommandDefinition<S>>>,
    default: Option<Arc<CommandDefinition<S>>>,
    resolvers: Arc<ArgumentResolvers<S>>,
    completions: Arc<CompletionProviders<S>>,
    hooks: Hooks<S>,
    config: EngineConfig,
}

impl<S> CommandTable<S> {
    pub fn builder(name: impl Into<String>) -> TableBuilder<S> {
        TableBuilder::new(name)
    }

    /// Root command label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative root labels.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Selects the definition a token sequence addresses.
    ///
    /// If the first token names a definition, it is consumed. Otherwise the
    /// default definition (if any) receives the whole sequence.
    pub fn resolve_root<'t, T: AsRef<str>>(
        &self,
        tokens: &'t [T],
    ) -> Option<(&Arc<CommandDefinition<S>>, &'t [T])> {
        if let Some((first, rest)) = tokens.split_first() {
            if let Some(def) = self.by_name.get(first.as_ref()) {
                return Some((def, rest));
            }
        }
        self.default.as_ref().map(|def| (def, tokens))
    }

    /// Looks up a definition by exact name or alias.
    pub fn get(&self, key: &str) -> Option<&Arc<CommandDefinition<S>>> {
        self.by_name.get(key)
    }

    pub fn default_command(&self) -> Option<&Arc<CommandDefinition<S>>> {
        self.default.as_ref()
    }

    /// Every name and alias, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Distinct definitions, ordered by name.
    pub fn definitions(&self) -> Vec<&Arc<CommandDefinition<S>>> {
        let mut defs: Vec<&Arc<CommandDefinition<S>>> = Vec::new();
        for def in self.by_name.values() {
            if !defs.iter().any(|seen| Arc::ptr_eq(seen, def)) {
                defs.push(def);
            }
        }
        defs.sort_by(|a, b| a.name().cmp(b.name()));
        defs
    }

    pub fn resolvers(&self) -> &ArgumentResolvers<S> {
        &self.resolvers
    }

    pub fn completions(&self) -> &CompletionProviders<S> {
        &self.completions
    }

    pub fn hooks(&self) -> &Hooks<S> {
        &self.hooks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<S> fmt::Debug for CommandTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("keys", &self.keys())
            .field("default", &self.default.as_ref().map(|d| d.name()))
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`CommandTable`].
///
/// Definitions are collected as given; every cross-definition and
/// registry check runs in [`build`](Self::build).
pub struct TableBuilder<S> {
    name: String,
    aliases: Vec<String>,
    definitions: Vec<CommandDefinition<S>>,
    resolvers: Arc<ArgumentResolvers<S>>,
    completions: Arc<CompletionProviders<S>>,
    hooks: Hooks<S>,
    config: EngineConfig,
}

impl<S> TableBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            definitions: Vec::new(),
            resolvers: Arc::new(ArgumentResolvers::new()),
            completions: Arc::new(CompletionProviders::new()),
            hooks: Hooks::new(),
            config: EngineConfig::default(),
        }
    }

    /// Adds an alternative root label.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the resolver registry. Several tables may share one.
    pub fn resolvers(mut self, resolvers: impl Into<Arc<ArgumentResolvers<S>>>) -> Self {
        self.resolvers = resolvers.into();
        self
    }

    /// Sets the completion registry. Several tables may share one.
    pub fn completions(mut self, completions: impl Into<Arc<CompletionProviders<S>>>) -> Self {
        self.completions = completions.into();
        self
    }

    pub fn hooks(mut self, hooks: Hooks<S>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Adds a definition.
    pub fn command(mut self, definition: CommandDefinition<S>) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Checks every definition against the registries and each other, then
    /// freezes the table.
    pub fn build(mut self) -> Result<CommandTable<S>, RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.aliases.iter().any(|alias| alias.trim().is_empty()) {
            return Err(RegistrationError::EmptyAlias { command: self.name });
        }

        let mut by_name: HashMap<String, Arc<CommandDefinition<S>>> = HashMap::new();
        let mut default: Option<Arc<CommandDefinition<S>>> = None;

        let definitions = std::mem::take(&mut self.definitions);
        for definition in definitions {
            self.check_types(&definition)?;
            self.check_completions(&definition)?;

            let definition = Arc::new(definition);

            if definition.is_default() {
                if let Some(existing) = &default {
                    return Err(RegistrationError::DuplicateDefault {
                        table: self.name,
                        existing: existing.name().to_string(),
                        command: definition.name().to_string(),
                    });
                }
                default = Some(Arc::clone(&definition));
            }

            let keys = std::iter::once(definition.name())
                .chain(definition.aliases().iter().map(String::as_str));
            for key in keys {
                if let Some(existing) = by_name.get(key) {
                    match self.config.collisions {
                        CollisionPolicy::Reject => {
                            return Err(RegistrationError::DuplicateName {
                                key: key.to_string(),
                                command: definition.name().to_string(),
                                existing: existing.name().to_string(),
                            });
                        }
                        CollisionPolicy::LastWins => {
                            warn!(
                                table = %self.name,
                                key,
                                replaced = existing.name(),
                                by = definition.name(),
                                "command key overwritten"
                            );
                        }
                    }
                }
                by_name.insert(key.to_string(), Arc::clone(&definition));
            }
        }

        let mut aliases: Vec<String> = Vec::new();
        for alias in self.aliases {
            if alias != self.name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        debug!(
            table = %self.name,
            keys = by_name.len(),
            has_default = default.is_some(),
            "command table built"
        );

        Ok(CommandTable {
            name: self.name,
            aliases,
            by_name,
            default,
            resolvers: self.resolvers,
            completions: self.completions,
            hooks: self.hooks,
            config: self.config,
        })
    }

    fn check_types(&self, definition: &CommandDefinition<S>) -> Result<(), RegistrationError> {
        for ty in definition.declared_types() {
            if let Some(spec) = ty.as_enum() {
                if spec.symbols().is_empty() {
                    return Err(RegistrationError::EmptyEnum {
                        command: definition.name().to_string(),
                        enum_name: spec.name().to_string(),
                    });
                }
            }
            if !self.resolvers.supports(ty) {
                return Err(RegistrationError::UnregisteredType {
                    command: definition.name().to_string(),
                    type_name: ty.type_name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_completions(&self, definition: &CommandDefinition<S>) -> Result<(), RegistrationError> {
        for id in definition.completions().values() {
            if let Some(prefix) = &self.config.completion_prefix {
                if !id.starts_with(prefix.as_str()) {
                    return Err(RegistrationError::InvalidCompletionId {
                        command: definition.name().to_string(),
                        id: id.clone(),
                        prefix: prefix.clone(),
                    });
                }
            }
            if !self.completions.is_registered(id) {
                return Err(RegistrationError::UnregisteredCompletion {
                    command: definition.name().to_string(),
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }
}
