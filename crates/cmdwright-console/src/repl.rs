//! Turns one input line into a dispatch or a completion request.
//!
//! Lines look like chat commands: `/build move 3 4`. The leading slash is
//! optional. A line ending in `?` asks for completions of its last word
//! instead of running anything (`build paint h?`, or `build paint hut ?` to
//! complete an empty word).

use cmdwright::CommandRegistry;
use tracing::debug;

use crate::demo::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Blank line.
    Nothing,
    Quit,
    /// The named command ran.
    Done(String),
    Rejected(String),
    Suggestions(Vec<String>),
    /// The line could not be split into words.
    Malformed(String),
}

pub fn handle_line(registry: &CommandRegistry<Session>, session: &Session, line: &str) -> Reply {
    let line = line.trim_start();
    let line = line.strip_prefix('/').unwrap_or(line);
    let trimmed = line.trim_end();

    match trimmed {
        "" => return Reply::Nothing,
        "quit" | "exit" => return Reply::Quit,
        _ => {}
    }

    if let Some(body) = trimmed.strip_suffix('?') {
        return complete(registry, session, body);
    }

    let words = match shell_words::split(trimmed) {
        Ok(words) => words,
        Err(e) => return Reply::Malformed(e.to_string()),
    };
    let Some((label, tokens)) = words.split_first() else {
        return Reply::Nothing;
    };

    match registry.dispatch(session, label, tokens) {
        Ok(done) => {
            debug!(command = %done.command, "dispatched");
            Reply::Done(done.command)
        }
        Err(rejection) => Reply::Rejected(rejection.to_string()),
    }
}

fn complete(registry: &CommandRegistry<Session>, session: &Session, body: &str) -> Reply {
    let mut words = match shell_words::split(body) {
        Ok(words) => words,
        Err(e) => return Reply::Malformed(e.to_string()),
    };
    if body.is_empty() || body.ends_with(char::is_whitespace) {
        words.push(String::new());
    }

    match words.split_first() {
        Some((partial, [])) => {
            let needle = partial.to_lowercase();
            let labels = registry
                .labels()
                .into_iter()
                .filter(|label| label.to_lowercase().starts_with(&needle))
                .map(str::to_string)
                .collect();
            Reply::Suggestions(labels)
        }
        Some((label, tokens)) => Reply::Suggestions(registry.suggest(session, label, tokens)),
        None => Reply::Nothing,
    }
}
