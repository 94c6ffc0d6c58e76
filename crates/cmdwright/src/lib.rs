//! Command resolution, typed argument binding and tab completion.
//!
//! `cmdwright` turns a token sequence such as `build house 5 --color red`
//! into exactly one registered command, checks that the invoker may run it,
//! coerces its arguments and runs it, or reports precisely why it did not.
//! It also answers "what could come next" for partial input.
//!
//! # Features
//!
//! - **Explicit definitions**: name, aliases, invoker constraint, permission,
//!   typed positional signature, flags, completion bindings, action
//! - **Typed coercion**: built-in `string`/`int`/`float`/`bool`, enums matched
//!   case-insensitively, host-defined resolvers that may consult the invoker
//! - **Flags**: `-k` / `--long`, presence or valued
//! - **Completion**: names for the first token, provider-backed candidates per
//!   positional slot, flag tokens
//! - **Hooks**: pre-dispatch veto and post-dispatch observation
//!
//! Failures are data. Registration problems surface as [`RegistrationError`]
//! when a table is built; dispatch problems come back as a [`Rejection`].
//!
//! # Example
//!
//! ```rust
//! use cmdwright::{
//!     AllowAll, ArgType, CommandDefinition, CommandTable, Dispatcher, InvokerKind, Rejection,
//! };
//!
//! let table = CommandTable::<InvokerKind>::builder("build")
//!     .command(
//!         CommandDefinition::builder("move")
//!             .param("x", ArgType::Int)
//!             .param("y", ArgType::Int)
//!             .action(|_who, args| {
//!                 println!("moving to {:?},{:?}", args.int(0), args.int(1));
//!                 Ok(())
//!             })
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let dispatcher = Dispatcher::new(AllowAll);
//! let done = dispatcher
//!     .dispatch(&table, &InvokerKind::Interactive, &["move", "3", "4"])
//!     .unwrap();
//! assert_eq!(done.arguments.int(1), Some(4));
//!
//! let err = dispatcher
//!     .dispatch(&table, &InvokerKind::Interactive, &["move", "3"])
//!     .unwrap_err();
//! assert!(matches!(err, Rejection::ArgumentCountMismatch { .. }));
//! # Ok::<(), cmdwright::RegistrationError>(())
//! ```
//!
//! # Threading
//!
//! Tables are immutable once built and `Send + Sync` whenever the invoker
//! type allows it; share them behind an `Arc`. Dispatch never suspends and
//! keeps all scratch state on the caller's stack.
//!
//! # Logging
//!
//! The crate emits `tracing` events (resolution and binding at `debug`,
//! overwritten keys and failed actions at `warn`, completion at `trace`) and
//! never installs a subscriber.

// Core modules
mod action;
mod args;
mod completion;
mod config;
mod definition;
mod dispatch;
mod error;
mod flag;
mod hooks;
mod invoker;
mod registry;
mod resolver;
mod suggest;
mod table;
mod value;

// Re-export core types
pub use action::{Action, FnAction};
pub use args::{Arguments, FlagValue};
pub use completion::{split_id, CompletionProviders, CompletionRequest, ProviderFn};
pub use config::{CollisionPolicy, ConfigError, EngineConfig};
pub use definition::{CommandDefinition, DefinitionBuilder, InvokerConstraint, ParameterSpec};
pub use dispatch::{DispatchResult, Dispatched, Dispatcher};
pub use error::{ActionError, ArgumentError, RegistrationError, Rejection};
pub use flag::{FlagGrammar, FlagKind, FlagSpec};
pub use hooks::{HookError, Hooks, PostDispatchFn, PreDispatchFn};
pub use invoker::{AllowAll, Authorizer, DenyAll, Invoker, InvokerKind};
pub use registry::CommandRegistry;
pub use resolver::{ArgumentResolvers, ResolverFn};
pub use suggest::Suggester;
pub use table::{CommandTable, TableBuilder};
pub use value::{ArgEnum, ArgType, EnumSpec, EnumValue, Value};
