//! Command dispatch.
//!
//! [`Dispatcher::dispatch`] runs one token sequence through a table:
//!
//! ```text
//! resolve → authorize sender → authorize permission
//!   → bind flags → bind positionals → pre-dispatch hooks → invoke
//! ```
//!
//! Each stage either advances or ends the call with a [`Rejection`]. No
//! stage panics and no stage is skipped: a permission failure is reported
//! before any resolver runs. Post-dispatch hooks see every result.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::args::{Arguments, FlagValue};
use crate::definition::{CommandDefinition, ParameterSpec};
use crate::error::{ActionError, Rejection};
use crate::invoker::{AllowAll, Authorizer, Invoker};
use crate::resolver::ArgumentResolvers;
use crate::table::CommandTable;
use crate::value::Value;

/// A successful dispatch: which command ran and what it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Primary name of the definition that ran.
    pub command: String,
    pub arguments: Arguments,
}

/// Outcome of one dispatch call.
pub type DispatchResult = Result<Dispatched, Rejection>;

/// Runs token sequences against command tables.
///
/// Holds the host's permission predicate; the table is passed per call so
/// one dispatcher serves any number of tables.
pub struct Dispatcher<S> {
    authorizer: Arc<dyn Authorizer<S>>,
}

impl<S> Dispatcher<S> {
    pub fn new(authorizer: impl Authorizer<S> + 'static) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
        }
    }

    pub(crate) fn with_shared_authorizer(authorizer: Arc<dyn Authorizer<S>>) -> Self {
        Self { authorizer }
    }

    pub fn authorizer(&self) -> &dyn Authorizer<S> {
        self.authorizer.as_ref()
    }
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new(AllowAll)
    }
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

impl<S: Invoker> Dispatcher<S> {
    /// Dispatches `tokens` (the selector, if any, followed by its arguments).
    pub fn dispatch<T: AsRef<str>>(
        &self,
        table: &CommandTable<S>,
        invoker: &S,
        tokens: &[T],
    ) -> DispatchResult {
        let result = self.run(table, invoker, tokens);
        table.hooks().run_post_dispatch(invoker, &result);
        result
    }

    fn run<T: AsRef<str>>(
        &self,
        table: &CommandTable<S>,
        invoker: &S,
        tokens: &[T],
    ) -> DispatchResult {
        let (definition, rest) = table.resolve_root(tokens).ok_or_else(|| {
            Rejection::UnknownCommand {
                token: tokens.first().map(|t| t.as_ref().to_string()),
            }
        })?;
        let command = definition.name();
        debug!(table = table.name(), command, args = rest.len(), "command resolved");

        if !definition.constraint().admits(invoker.kind()) {
            return Err(Rejection::SenderNotAllowed {
                command: command.to_string(),
            });
        }

        if let Some(permission) = definition.permission() {
            if !self.authorizer.is_permitted(invoker, permission) {
                debug!(command, permission, "permission denied");
                return Err(Rejection::PermissionDenied {
                    command: command.to_string(),
                    permission: permission.to_string(),
                });
            }
        }

        let mut arguments = Arguments::new();
        let positional = bind_flags(definition, table.resolvers(), invoker, rest, &mut arguments)?;
        bind_positionals(definition, table.resolvers(), invoker, &positional, &mut arguments)?;

        table
            .hooks()
            .run_pre_dispatch(invoker, definition, &arguments)
            .map_err(|err| {
                debug!(command, reason = %err, "dispatch vetoed");
                Rejection::Vetoed {
                    message: err.message,
                }
            })?;

        invoke(definition, invoker, &arguments, table.config().catch_panics)?;

        Ok(Dispatched {
            command: command.to_string(),
            arguments,
        })
    }
}

/// Binds flag tokens into `arguments` and returns the remaining positional
/// tokens with their offsets in `tokens`.
fn bind_flags<'t, S, T: AsRef<str>>(
    definition: &CommandDefinition<S>,
    resolvers: &ArgumentResolvers<S>,
    invoker: &S,
    tokens: &'t [T],
    arguments: &mut Arguments,
) -> Result<Vec<(usize, &'t str)>, Rejection> {
    let grammar = definition.flags();
    if grammar.is_empty() {
        return Ok(tokens.iter().map(|t| t.as_ref()).enumerate().collect());
    }

    let mut positional = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        let token = tokens[index].as_ref();
        let Some(spec) = grammar.matching(token) else {
            positional.push((index, token));
            index += 1;
            continue;
        };

        match spec.value_type() {
            None => arguments.set_flag(spec.key(), FlagValue::Present),
            Some(ty) => {
                index += 1;
                let raw = tokens
                    .get(index)
                    .map(|t| t.as_ref())
                    .ok_or_else(|| Rejection::MissingFlagValue {
                        flag: spec.key().to_string(),
                    })?;
                let value = resolvers
                    .resolve(ty, raw, invoker)
                    .map_err(|cause| Rejection::InvalidArgument {
                        index,
                        raw: raw.to_string(),
                        cause,
                    })?;
                arguments.set_flag(spec.key(), FlagValue::Value(value));
            }
        }
        index += 1;
    }
    Ok(positional)
}

/// Binds positional tokens against the definition's signature.
fn bind_positionals<S>(
    definition: &CommandDefinition<S>,
    resolvers: &ArgumentResolvers<S>,
    invoker: &S,
    tokens: &[(usize, &str)],
    arguments: &mut Arguments,
) -> Result<(), Rejection> {
    let raw_tail = |from: usize| -> Vec<String> {
        tokens[from..].iter().map(|(_, raw)| raw.to_string()).collect()
    };

    if definition.captures_raw() {
        arguments.push(Value::Rest(raw_tail(0)));
        return Ok(());
    }

    let params = definition.parameters();
    if params.is_empty() && tokens.is_empty() {
        return Ok(());
    }

    let variadic = definition.has_variadic_tail();
    let fixed = if variadic { params.len() - 1 } else { params.len() };
    let count_ok = if variadic {
        tokens.len() >= fixed
    } else {
        tokens.len() == fixed
    };
    if !count_ok {
        return Err(Rejection::ArgumentCountMismatch {
            command: definition.name().to_string(),
            expected: fixed,
            variadic,
            actual: tokens.len(),
        });
    }

    let coerce = |(index, raw): &(usize, &str), param: &ParameterSpec| {
        resolvers
            .resolve(param.ty(), raw, invoker)
            .map_err(|cause| Rejection::InvalidArgument {
                index: *index,
                raw: raw.to_string(),
                cause,
            })
    };

    for (token, param) in tokens.iter().zip(&params[..fixed]) {
        arguments.push(coerce(token, param)?);
    }

    if let Some(tail) = params.last().filter(|_| variadic) {
        if tail.ty().is_rest() {
            arguments.push(Value::Rest(raw_tail(fixed)));
        } else {
            let values = tokens[fixed..]
                .iter()
                .map(|token| coerce(token, tail))
                .collect::<Result<Vec<_>, _>>()?;
            arguments.push(Value::List(values));
        }
    }
    Ok(())
}

fn invoke<S>(
    definition: &CommandDefinition<S>,
    invoker: &S,
    arguments: &Arguments,
    catch_panics: bool,
) -> Result<(), Rejection> {
    let outcome = if catch_panics {
        catch_unwind(AssertUnwindSafe(|| definition.invoke(invoker, arguments))).unwrap_or_else(
            |payload| Err(anyhow::anyhow!("action panicked: {}", panic_message(&*payload))),
        )
    } else {
        definition.invoke(invoker, arguments)
    };

    outcome.map_err(|cause| {
        warn!(command = definition.name(), error = %cause, "command action failed");
        Rejection::ActionFailed {
            command: definition.name().to_string(),
            cause: ActionError::new(cause),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgumentError;
    use crate::flag::FlagSpec;
    use crate::hooks::{HookError, Hooks};
    use crate::invoker::{DenyAll, InvokerKind};
    use crate::value::ArgType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Def = CommandDefinition<InvokerKind>;

    fn table_with(def: Def) -> CommandTable<InvokerKind> {
        CommandTable::builder("t").command(def).build().unwrap()
    }

    fn run(table: &CommandTable<InvokerKind>, tokens: &[&str]) -> DispatchResult {
        Dispatcher::default().dispatch(table, &InvokerKind::Interactive, tokens)
    }

    #[test]
    fn test_unknown_command_carries_token() {
        let table = table_with(Def::builder("a").action(|_, _| Ok(())).build().unwrap());
        assert_eq!(
            run(&table, &["zzz"]),
            Err(Rejection::UnknownCommand {
                token: Some("zzz".into())
            })
        );
        assert_eq!(run(&table, &[]), Err(Rejection::UnknownCommand { token: None }));
    }

    #[test]
    fn test_interactive_only_refuses_console() {
        let table = table_with(
            Def::builder("fly")
                .interactive_only()
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let result = Dispatcher::default().dispatch(&table, &InvokerKind::Console, &["fly"]);
        assert_eq!(
            result,
            Err(Rejection::SenderNotAllowed {
                command: "fly".into()
            })
        );
        assert!(run(&table, &["fly"]).is_ok());
    }

    #[test]
    fn test_permission_checked_before_resolvers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolvers = ArgumentResolvers::new().register("counted", move |raw, _: &InvokerKind| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(raw))
        });
        let table = CommandTable::builder("t")
            .resolvers(resolvers)
            .command(
                Def::builder("ban")
                    .permission("mod.ban")
                    .param("who", ArgType::custom("counted"))
                    .action(|_, _| Ok(()))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let result = Dispatcher::new(DenyAll).dispatch(&table, &InvokerKind::Console, &["ban", "x"]);
        assert!(matches!(result, Err(Rejection::PermissionDenied { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(run(&table, &["ban", "x"]).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flags_leave_positional_stream() {
        let table = table_with(
            Def::builder("build")
                .param("what", ArgType::String)
                .param("size", ArgType::Int)
                .flag(FlagSpec::valued("c", ArgType::String).long("color"))
                .flag(FlagSpec::presence("f"))
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let done = run(&table, &["build", "house", "--color", "red", "5", "-f"]).unwrap();
        assert_eq!(done.command, "build");
        assert_eq!(done.arguments.str(0), Some("house"));
        assert_eq!(done.arguments.int(1), Some(5));
        assert_eq!(done.arguments.flag("c").and_then(Value::as_str), Some("red"));
        assert!(done.arguments.has_flag("f"));
    }

    #[test]
    fn test_missing_flag_value() {
        let table = table_with(
            Def::builder("build")
                .flag(FlagSpec::valued("c", ArgType::String))
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        assert_eq!(
            run(&table, &["build", "-c"]),
            Err(Rejection::MissingFlagValue { flag: "c".into() })
        );
    }

    #[test]
    fn test_invalid_flag_value_index() {
        let table = table_with(
            Def::builder("build")
                .param("what", ArgType::String)
                .flag(FlagSpec::valued("n", ArgType::Int))
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let err = run(&table, &["build", "house", "-n", "many"]).unwrap_err();
        assert_eq!(
            err,
            Rejection::InvalidArgument {
                index: 2,
                raw: "many".into(),
                cause: ArgumentError::invalid("int", "many"),
            }
        );
    }

    #[test]
    fn test_invalid_positional_index_counts_flag_tokens() {
        let table = table_with(
            Def::builder("move")
                .param("x", ArgType::Int)
                .param("y", ArgType::Int)
                .flag(FlagSpec::presence("q"))
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let err = run(&table, &["move", "-q", "3", "up"]).unwrap_err();
        assert!(matches!(err, Rejection::InvalidArgument { index: 2, .. }));
    }

    #[test]
    fn test_empty_grammar_keeps_hyphen_tokens_positional() {
        let table = table_with(
            Def::builder("add")
                .param("n", ArgType::Int)
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let done = run(&table, &["add", "-5"]).unwrap();
        assert_eq!(done.arguments.int(0), Some(-5));
    }

    #[test]
    fn test_count_mismatch() {
        let table = table_with(
            Def::builder("move")
                .param("x", ArgType::Int)
                .param("y", ArgType::Int)
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        assert_eq!(
            run(&table, &["move", "3"]),
            Err(Rejection::ArgumentCountMismatch {
                command: "move".into(),
                expected: 2,
                variadic: false,
                actual: 1,
            })
        );
        assert!(matches!(
            run(&table, &["move", "1", "2", "3"]),
            Err(Rejection::ArgumentCountMismatch { actual: 3, .. })
        ));
    }

    #[test]
    fn test_no_parameters() {
        let table = table_with(Def::builder("ping").action(|_, _| Ok(())).build().unwrap());
        let done = run(&table, &["ping"]).unwrap();
        assert!(done.arguments.is_empty());
        assert!(matches!(
            run(&table, &["ping", "extra"]),
            Err(Rejection::ArgumentCountMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn test_typed_variadic_tail() {
        let table = table_with(
            Def::builder("sum")
                .param("label", ArgType::String)
                .variadic("n", ArgType::Int)
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let done = run(&table, &["sum", "total", "1", "2", "3"]).unwrap();
        let values: Vec<i64> = done
            .arguments
            .list(1)
            .unwrap()
            .iter()
            .filter_map(Value::as_int)
            .collect();
        assert_eq!(values, vec![1, 2, 3]);

        let done = run(&table, &["sum", "none"]).unwrap();
        assert_eq!(done.arguments.list(1), Some(&[][..]));

        assert!(matches!(
            run(&table, &["sum", "t", "1", "x"]),
            Err(Rejection::InvalidArgument { index: 2, .. })
        ));
    }

    #[test]
    fn test_rest_after_fixed_parameters() {
        let table = table_with(
            Def::builder("tell")
                .param("who", ArgType::String)
                .rest("message")
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        );
        let done = run(&table, &["tell", "bob", "hi", "there"]).unwrap();
        assert_eq!(done.arguments.str(0), Some("bob"));
        assert_eq!(
            done.arguments.rest(1),
            Some(&["hi".to_string(), "there".to_string()][..])
        );
    }

    #[test]
    fn test_action_error_becomes_action_failed() {
        let table = table_with(
            Def::builder("fail")
                .action(|_, _| Err(anyhow::anyhow!("disk full")))
                .build()
                .unwrap(),
        );
        let err = run(&table, &["fail"]).unwrap_err();
        assert!(err.is_action_failure());
        assert_eq!(err.to_string(), "command 'fail' failed: disk full");
    }

    #[test]
    fn test_panicking_action_becomes_action_failed() {
        let table = table_with(
            Def::builder("boom")
                .action(|_, _| panic!("kaboom"))
                .build()
                .unwrap(),
        );
        let err = run(&table, &["boom"]).unwrap_err();
        match err {
            Rejection::ActionFailed { command, cause } => {
                assert_eq!(command, "boom");
                assert_eq!(cause.to_string(), "action panicked: kaboom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_veto_stops_before_action() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_in_action = Arc::clone(&ran);
        let table = CommandTable::builder("t")
            .hooks(Hooks::<InvokerKind>::new().pre_dispatch(|_, def, _| {
                if def.name() == "nuke" {
                    Err(HookError::new("not today"))
                } else {
                    Ok(())
                }
            }))
            .command(
                Def::builder("nuke")
                    .action(move |_, _| {
                        ran_in_action.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(
            run(&table, &["nuke"]),
            Err(Rejection::Vetoed {
                message: "not today".into()
            })
        );
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_post_dispatch_sees_rejections() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let table = CommandTable::builder("t")
            .hooks(Hooks::<InvokerKind>::new().post_dispatch(move |_, result| {
                if result.is_err() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .build()
            .unwrap();
        let _ = run(&table, &["anything"]);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
