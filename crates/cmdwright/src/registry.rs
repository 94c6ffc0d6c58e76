//! Root command registry.
//!
//! A host usually owns several root commands (`/build`, `/warp`, ...), each
//! backed by its own [`CommandTable`]. [`CommandRegistry`] maps every root
//! label (a table's name and its aliases) to its table and routes dispatch
//! and completion requests with one shared authorizer.
//!
//! ```rust
//! use cmdwright::{AllowAll, CommandDefinition, CommandRegistry, CommandTable, InvokerKind};
//!
//! let warp = CommandTable::<InvokerKind>::builder("warp")
//!     .alias("w")
//!     .command(
//!         CommandDefinition::builder("home")
//!             .action(|_, _| Ok(()))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let registry = CommandRegistry::new(AllowAll).register(warp)?;
//! let done = registry.dispatch(&InvokerKind::Interactive, "w", &["home"]).unwrap();
//! assert_eq!(done.command, "home");
//! # Ok::<(), cmdwright::RegistrationError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::{DispatchResult, Dispatcher};
use crate::error::{RegistrationError, Rejection};
use crate::invoker::{Authorizer, Invoker};
use crate::suggest::Suggester;
use crate::table::CommandTable;

/// Tables by root label.
pub struct CommandRegistry<S> {
    tables: HashMap<String, Arc<CommandTable<S>>>,
    dispatcher: Dispatcher<S>,
    suggester: Suggester<S>,
}

impl<S> CommandRegistry<S> {
    pub fn new(authorizer: impl Authorizer<S> + 'static) -> Self {
        let authorizer: Arc<dyn Authorizer<S>> = Arc::new(authorizer);
        Self {
            tables: HashMap::new(),
            dispatcher: Dispatcher::with_shared_authorizer(Arc::clone(&authorizer)),
            suggester: Suggester::with_shared_authorizer(authorizer),
        }
    }

    /// Registers a table under its name and aliases.
    ///
    /// Fails without changing the registry if any label is already taken.
    pub fn register(mut self, table: CommandTable<S>) -> Result<Self, RegistrationError> {
        let labels: Vec<String> = std::iter::once(table.name())
            .chain(table.aliases().iter().map(String::as_str))
            .map(str::to_string)
            .collect();

        for label in &labels {
            if let Some(existing) = self.tables.get(label) {
                return Err(RegistrationError::DuplicateRoot {
                    label: label.clone(),
                    existing: existing.name().to_string(),
                });
            }
        }

        debug!(table = table.name(), labels = ?labels, "root command registered");
        let table = Arc::new(table);
        for label in labels {
            self.tables.insert(label, Arc::clone(&table));
        }
        Ok(self)
    }

    pub fn table(&self, label: &str) -> Option<&Arc<CommandTable<S>>> {
        self.tables.get(label)
    }

    /// Every root label, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    /// Suggestions for `tokens` typed after the root `label`.
    ///
    /// An unknown label has no suggestions.
    pub fn suggest<T: AsRef<str>>(
        &self,
        invoker: &S,
        label: &str,
        tokens: &[T],
    ) -> Vec<String> {
        match self.tables.get(label) {
            Some(table) => self.suggester.suggest(table, invoker, tokens),
            None => Vec::new(),
        }
    }
}

impl<S: Invoker> CommandRegistry<S> {
    /// Dispatches `tokens` typed after the root `label`.
    pub fn dispatch<T: AsRef<str>>(
        &self,
        invoker: &S,
        label: &str,
        tokens: &[T],
    ) -> DispatchResult {
        let Some(table) = self.tables.get(label) else {
            debug!(label, "unknown root command");
            return Err(Rejection::UnknownCommand {
                token: Some(label.to_string()),
            });
        };
        self.dispatcher.dispatch(table, invoker, tokens)
    }
}

impl<S> fmt::Debug for CommandRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("labels", &self.labels())
            .finish()
    }
}
