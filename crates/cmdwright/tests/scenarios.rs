//! End-to-end dispatch and completion scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use cmdwright::{
    AllowAll, ArgEnum, ArgType, ArgumentError, ArgumentResolvers, CommandDefinition,
    CommandRegistry, CommandTable, CompletionProviders, Dispatcher, EngineConfig, FlagSpec,
    InvokerKind, Rejection, Suggester, Value,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    Red,
    Green,
    Blue,
}

impl ArgEnum for Color {
    const NAME: &'static str = "Color";
    const SYMBOLS: &'static [&'static str] = &["RED", "GREEN", "BLUE"];

    fn from_ordinal(ordinal: usize) -> Option<Self> {
        [Color::Red, Color::Green, Color::Blue].get(ordinal).copied()
    }
}

/// A player-like invoker carrying its granted permissions.
#[derive(Debug)]
struct Player {
    kind: InvokerKind,
    granted: Vec<&'static str>,
}

impl cmdwright::Invoker for Player {
    fn kind(&self) -> InvokerKind {
        self.kind
    }
}

fn player(granted: &[&'static str]) -> Player {
    Player {
        kind: InvokerKind::Interactive,
        granted: granted.to_vec(),
    }
}

fn has_permission(player: &Player, permission: &str) -> bool {
    player.granted.iter().any(|granted| *granted == permission)
}

type Log = Arc<Mutex<Vec<String>>>;

fn build_table(log: &Log) -> CommandTable<Player> {
    let moved = Arc::clone(log);
    let painted = Arc::clone(log);
    let said = Arc::clone(log);
    let built = Arc::clone(log);

    CommandTable::builder("build")
        .completions(
            CompletionProviders::<Player>::new()
                .register_static("#structures", ["house", "tower", "hut"])
                .register("#colors", |req| {
                    req.param_type
                        .and_then(ArgType::as_enum)
                        .map(|spec| spec.symbols().iter().map(|s| s.to_lowercase()).collect())
                        .unwrap_or_default()
                }),
        )
        .command(
            CommandDefinition::builder("house")
                .default_command()
                .param("size", ArgType::Int)
                .action(move |_, args| {
                    built.lock().unwrap().push(format!("house {:?}", args.int(0)));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .command(
            CommandDefinition::builder("move")
                .aliases(["mv", "m"])
                .param("x", ArgType::Int)
                .param("y", ArgType::Int)
                .action(move |_, args| {
                    let (x, y) = (args.int(0).unwrap_or(0), args.int(1).unwrap_or(0));
                    moved.lock().unwrap().push(format!("move {} {}", x, y));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .command(
            CommandDefinition::builder("paint")
                .permission("build.paint")
                .param("structure", ArgType::String)
                .param("color", ArgType::enumeration::<Color>())
                .flag(FlagSpec::presence("g").long("glossy"))
                .flag(FlagSpec::valued("l", ArgType::Int).long("layers"))
                .complete(0, "#structures")
                .complete(1, "#colors")
                .action(move |_, args| {
                    let color = args.enumeration::<Color>(1);
                    painted.lock().unwrap().push(format!(
                        "paint {} {:?} glossy={} layers={:?}",
                        args.str(0).unwrap_or_default(),
                        color,
                        args.has_flag("g"),
                        args.flag("l").and_then(Value::as_int),
                    ));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .command(
            CommandDefinition::builder("say")
                .rest("message")
                .action(move |_, args| {
                    said.lock()
                        .unwrap()
                        .push(args.rest(0).unwrap_or_default().join(" "));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn fixture() -> (CommandTable<Player>, Dispatcher<Player>, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let table = build_table(&log);
    (table, Dispatcher::new(has_permission), log)
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn move_three_four_end_to_end() {
    let (table, dispatcher, log) = fixture();
    let done = dispatcher
        .dispatch(&table, &player(&[]), &["move", "3", "4"])
        .unwrap();
    assert_eq!(done.command, "move");
    assert_eq!(done.arguments.values(), &[Value::Int(3), Value::Int(4)]);
    assert_eq!(entries(&log), vec!["move 3 4"]);
}

#[test]
fn aliases_bind_identically() {
    let (table, dispatcher, _log) = fixture();
    let by_name = dispatcher.dispatch(&table, &player(&[]), &["move", "1", "2"]);
    for alias in ["mv", "m"] {
        let by_alias = dispatcher.dispatch(&table, &player(&[]), &[alias, "1", "2"]);
        assert_eq!(by_alias, by_name);
    }
}

#[test]
fn default_fallback_keeps_root_token() {
    let (table, dispatcher, log) = fixture();
    dispatcher
        .dispatch(&table, &player(&[]), &["7"])
        .unwrap();
    assert_eq!(entries(&log), vec!["house Some(7)"]);

    // A token naming nothing goes to the default, which then rejects it.
    let err = dispatcher
        .dispatch(&table, &player(&[]), &["castle"])
        .unwrap_err();
    assert_eq!(
        err,
        Rejection::InvalidArgument {
            index: 0,
            raw: "castle".into(),
            cause: ArgumentError::invalid("int", "castle"),
        }
    );
}

#[test]
fn rest_captures_raw_tokens() {
    let (table, dispatcher, log) = fixture();
    let done = dispatcher
        .dispatch(&table, &player(&[]), &["say", "hello", "-x", "--y", "world"])
        .unwrap();
    assert_eq!(
        done.arguments.rest(0),
        Some(&["hello", "-x", "--y", "world"].map(String::from)[..])
    );
    assert_eq!(entries(&log), vec!["hello -x --y world"]);

    let done = dispatcher.dispatch(&table, &player(&[]), &["say"]).unwrap();
    assert_eq!(done.arguments.rest(0), Some(&[][..]));
}

#[test]
fn enum_coercion_ignores_case() {
    let (table, dispatcher, log) = fixture();
    let painter = player(&["build.paint"]);
    for raw in ["red", "RED", "Red", "rEd"] {
        let done = dispatcher
            .dispatch(&table, &painter, &["paint", "hut", raw])
            .unwrap();
        assert_eq!(done.arguments.enumeration::<Color>(1), Some(Color::Red));
    }
    assert_eq!(entries(&log).len(), 4);

    let err = dispatcher
        .dispatch(&table, &painter, &["paint", "hut", "purple"])
        .unwrap_err();
    assert!(matches!(
        err,
        Rejection::InvalidArgument {
            index: 1,
            cause: ArgumentError::InvalidEnumValue { .. },
            ..
        }
    ));
}

#[test]
fn flags_bind_in_any_position() {
    let (table, dispatcher, log) = fixture();
    let painter = player(&["build.paint"]);
    dispatcher
        .dispatch(
            &table,
            &painter,
            &["paint", "--layers", "3", "tower", "-g", "blue"],
        )
        .unwrap();
    assert_eq!(
        entries(&log),
        vec!["paint tower Some(Blue) glossy=true layers=Some(3)"]
    );
}

#[test]
fn permission_short_circuits_before_resolvers() {
    let resolved = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&resolved);
    let table = CommandTable::builder("admin")
        .resolvers(ArgumentResolvers::new().register("target", move |raw, _: &Player| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(raw))
        }))
        .command(
            CommandDefinition::builder("ban")
                .permission("admin.ban")
                .param("who", ArgType::custom("target"))
                .flag(FlagSpec::valued("r", ArgType::custom("target")))
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let dispatcher = Dispatcher::new(has_permission);
    let err = dispatcher
        .dispatch(&table, &player(&[]), &["ban", "steve", "-r", "griefing"])
        .unwrap_err();
    assert_eq!(
        err,
        Rejection::PermissionDenied {
            command: "ban".into(),
            permission: "admin.ban".into()
        }
    );
    assert_eq!(resolved.load(Ordering::SeqCst), 0);
}

#[test]
fn console_cannot_run_interactive_only() {
    let table = CommandTable::builder("t")
        .command(
            CommandDefinition::builder("fly")
                .interactive_only()
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let console = Player {
        kind: InvokerKind::Console,
        granted: vec![],
    };
    let err = Dispatcher::new(AllowAll)
        .dispatch(&table, &console, &["fly"])
        .unwrap_err();
    assert!(err.is_access_denied());
}

#[test]
fn suggestions_are_sorted() {
    let (table, _dispatcher, _log) = fixture();
    let suggester = Suggester::new();
    let who = player(&[]);
    assert_eq!(
        suggester.suggest(&table, &who, &["m"]),
        vec!["m", "move", "mv"]
    );
    assert_eq!(
        suggester.suggest(&table, &who, &[""]),
        vec!["house", "m", "move", "mv", "paint", "say"]
    );
    assert_eq!(
        suggester.suggest(&table, &who, &["paint", "h"]),
        vec!["house", "hut"]
    );
    assert_eq!(
        suggester.suggest(&table, &who, &["paint", "hut", "R"]),
        vec!["green", "red"]
    );
    assert!(suggester.suggest(&table, &who, &["move", "1", ""]).is_empty());
}

#[test]
fn failures_are_values_not_panics() {
    let table = CommandTable::builder("t")
        .command(
            CommandDefinition::builder("explode")
                .action(|_, _: &cmdwright::Arguments| -> anyhow::Result<()> {
                    panic!("kaboom")
                })
                .build()
                .unwrap(),
        )
        .command(
            CommandDefinition::builder("fail")
                .action(|_, _| anyhow::bail!("refused"))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let dispatcher = Dispatcher::new(AllowAll);
    for name in ["explode", "fail"] {
        let err = dispatcher
            .dispatch(&table, &player(&[]), &[name])
            .unwrap_err();
        assert!(err.is_action_failure(), "{name}: {err}");
    }
}

#[test]
fn table_is_shared_across_threads() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let table = Arc::new(build_table(&log));
    let dispatcher = Dispatcher::new(has_permission);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let table = Arc::clone(&table);
            let dispatcher = dispatcher.clone();
            thread::spawn(move || {
                let x = i.to_string();
                dispatcher
                    .dispatch(&table, &player(&[]), &["move", x.as_str(), "0"])
                    .map(|done| done.command)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "move");
    }
    let mut seen = entries(&log);
    seen.sort();
    assert_eq!(seen, vec!["move 0 0", "move 1 0", "move 2 0", "move 3 0"]);
}

#[test]
fn registry_routes_root_labels() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = CommandRegistry::new(has_permission)
        .register(build_table(&log))
        .unwrap();
    registry
        .dispatch(&player(&[]), "build", &["mv", "5", "6"])
        .unwrap();
    assert_eq!(entries(&log), vec!["move 5 6"]);
    assert_eq!(
        registry.suggest(&player(&[]), "build", &["sa"]),
        vec!["say"]
    );
}

#[test]
fn config_file_drives_collision_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.yaml");
    std::fs::write(&path, "collisions: last_wins\n").unwrap();
    let config = EngineConfig::from_path(&path).unwrap();

    let table = CommandTable::<Player>::builder("t")
        .config(config)
        .command(
            CommandDefinition::builder("warp")
                .alias("w")
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        )
        .command(
            CommandDefinition::builder("wave")
                .alias("w")
                .action(|_, _| Ok(()))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    assert_eq!(table.get("w").unwrap().name(), "wave");
}
