//! `cmdw`: a line-oriented console over the demo command set.
//!
//! Reads one command per line from stdin. Run it on a terminal to act as an
//! interactive invoker, or pipe a script into it to act as the console.

mod demo;
mod repl;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cmdwright::{EngineConfig, InvokerKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::demo::Session;
use crate::repl::Reply;

#[derive(Parser, Debug)]
#[command(name = "cmdw", version, about)]
struct Cli {
    /// Engine config file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter such as `debug` or `cmdwright=trace` (defaults to RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Permission granted to this session; repeatable, `*` grants all
    #[arg(short, long = "grant", value_name = "PERMISSION")]
    grants: Vec<String>,

    /// Act as the console even when stdin is a terminal
    #[arg(long)]
    console: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let registry = demo::registry(config).context("failed to build the demo commands")?;

    let interactive = !cli.console && atty::is(atty::Stream::Stdin);
    let kind = if interactive {
        InvokerKind::Interactive
    } else {
        InvokerKind::Console
    };
    let session = Session::new(kind, cli.grants);
    debug!(?kind, grants = ?session.grants, "session started");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt(&mut stdout, interactive)?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match repl::handle_line(&registry, &session, &line) {
            Reply::Quit => break,
            Reply::Nothing | Reply::Done(_) => {}
            Reply::Rejected(message) => eprintln!("error: {}", message),
            Reply::Malformed(message) => eprintln!("error: {}", message),
            Reply::Suggestions(candidates) if candidates.is_empty() => {
                writeln!(stdout, "(no suggestions)")?
            }
            Reply::Suggestions(candidates) => writeln!(stdout, "{}", candidates.join("  "))?,
        }
        prompt(&mut stdout, interactive)?;
    }
    Ok(())
}

fn prompt(out: &mut impl Write, interactive: bool) -> io::Result<()> {
    if interactive {
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
