//! The demo command set: one `build` root with a handful of commands.

use cmdwright::{
    ArgEnum, ArgType, CommandDefinition, CommandRegistry, CommandTable, CompletionProviders,
    EngineConfig, FlagSpec, HookError, Hooks, Invoker, InvokerKind, RegistrationError, Value,
};
use tracing::info;

/// The session typing commands.
#[derive(Debug, Clone)]
pub struct Session {
    pub kind: InvokerKind,
    pub grants: Vec<String>,
}

impl Session {
    pub fn new(kind: InvokerKind, grants: Vec<String>) -> Self {
        Self { kind, grants }
    }

    /// `*` grants everything.
    pub fn is_granted(&self, permission: &str) -> bool {
        self.grants.iter().any(|g| g == "*" || g == permission)
    }
}

impl Invoker for Session {
    fn kind(&self) -> InvokerKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    White,
}

impl ArgEnum for Color {
    const NAME: &'static str = "Color";
    const SYMBOLS: &'static [&'static str] = &["RED", "GREEN", "BLUE", "WHITE"];

    fn from_ordinal(ordinal: usize) -> Option<Self> {
        [Color::Red, Color::Green, Color::Blue, Color::White]
            .get(ordinal)
            .copied()
    }
}

const STRUCTURES: &[&str] = &["house", "hut", "tower", "castle", "bridge"];

/// Builds the demo registry.
pub fn registry(config: EngineConfig) -> Result<CommandRegistry<Session>, RegistrationError> {
    CommandRegistry::new(|session: &Session, permission: &str| session.is_granted(permission))
        .register(build_table(config)?)
}

fn build_table(config: EngineConfig) -> Result<CommandTable<Session>, RegistrationError> {
    let completions = CompletionProviders::<Session>::new()
        .register_static("#structures", STRUCTURES.iter().copied())
        .register("#symbols", |req| {
            req.param_type
                .and_then(ArgType::as_enum)
                .map(|spec| spec.symbols().iter().map(|s| s.to_lowercase()).collect())
                .unwrap_or_default()
        });

    let hooks = Hooks::new().pre_dispatch(|session: &Session, def, args| {
        // Console sessions may not build anything taller than 50.
        if def.name() == "house" && session.kind == InvokerKind::Console && args.int(0) > Some(50) {
            return Err(HookError::new("console builds are capped at size 50"));
        }
        Ok(())
    });

    CommandTable::builder("build")
        .alias("b")
        .config(config)
        .completions(completions)
        .hooks(hooks)
        .command(
            CommandDefinition::builder("house")
                .default_command()
                .description("Build a house of the given size")
                .param("size", ArgType::Int)
                .flag(FlagSpec::valued("c", ArgType::enumeration::<Color>()).long("color"))
                .action(|_, args| {
                    let color = args
                        .flag("c")
                        .and_then(Value::as_enum)
                        .and_then(|e| e.to_enum::<Color>())
                        .unwrap_or(Color::White);
                    println!("built a {:?} house of size {}", color, args.int(0).unwrap_or(0));
                    Ok(())
                })
                .build()?,
        )
        .command(
            CommandDefinition::builder("move")
                .alias("mv")
                .description("Move the cursor to x, y")
                .param("x", ArgType::Int)
                .param("y", ArgType::Int)
                .action(|_, args| {
                    println!(
                        "moved to {}, {}",
                        args.int(0).unwrap_or(0),
                        args.int(1).unwrap_or(0)
                    );
                    Ok(())
                })
                .build()?,
        )
        .command(
            CommandDefinition::builder("paint")
                .description("Paint a structure")
                .permission("build.paint")
                .param("structure", ArgType::String)
                .param("color", ArgType::enumeration::<Color>())
                .flag(FlagSpec::presence("g").long("glossy"))
                .complete(0, "#structures")
                .complete(1, "#symbols")
                .action(|_, args| {
                    let structure = args.str(0).unwrap_or_default();
                    if !STRUCTURES.iter().any(|known| *known == structure) {
                        anyhow::bail!("there is no {} to paint", structure);
                    }
                    let finish = if args.has_flag("g") { "glossy " } else { "" };
                    println!(
                        "painted the {} {}{:?}",
                        structure,
                        finish,
                        args.enumeration::<Color>(1).unwrap_or(Color::White)
                    );
                    Ok(())
                })
                .build()?,
        )
        .command(
            CommandDefinition::builder("announce")
                .description("Broadcast a message")
                .interactive_only()
                .rest("message")
                .action(|_, args| {
                    let message = args.rest(0).unwrap_or_default().join(" ");
                    info!(%message, "announcement");
                    println!("[announce] {}", message);
                    Ok(())
                })
                .build()?,
        )
        .build()
}
