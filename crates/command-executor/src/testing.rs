//! Scripted launcher for tests
//!
//! [`ScriptedLauncher`] never spawns a process. It records every command it
//! is handed and answers from rules keyed by an argv prefix, so code that
//! drives `docker` or `sti` can be tested for exact arguments, call counts
//! and failure handling on hosts without those tools.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::process::CapturedOutput;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum Reply {
    Output(CapturedOutput),
    SpawnError(String),
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    reply: Reply,
    sticky: bool,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<Rule>,
    calls: Vec<Command>,
}

/// A [`Launcher`] answering from scripted replies
///
/// Clones share the same script and call log. Commands matching no rule
/// succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    state: Arc<Mutex<State>>,
}

impl ScriptedLauncher {
    /// Create a launcher with no rules
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, prefix: Vec<String>, reply: Reply, sticky: bool) {
        self.state().rules.push(Rule {
            prefix,
            reply,
            sticky,
        });
    }

    /// Answer the next command starting with `prefix` with `output`, once
    ///
    /// One-shot replies for the same prefix are used in the order added.
    pub fn respond<I, S>(&self, prefix: I, output: CapturedOutput) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(collect(prefix), Reply::Output(output), false);
        self
    }

    /// Answer every command starting with `prefix` with `output`
    pub fn respond_always<I, S>(&self, prefix: I, output: CapturedOutput) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(collect(prefix), Reply::Output(output), true);
        self
    }

    /// Make the next command starting with `prefix` fail to spawn
    pub fn fail_to_spawn<I, S>(&self, prefix: I, reason: impl Into<String>) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(collect(prefix), Reply::SpawnError(reason.into()), false);
        self
    }

    /// Every command received so far, in order
    pub fn calls(&self) -> Vec<Command> {
        self.state().calls.clone()
    }

    /// Every command received so far as argv vectors
    pub fn argv_log(&self) -> Vec<Vec<String>> {
        self.state().calls.iter().map(Command::argv).collect()
    }

    /// Number of received commands whose argv starts with `prefix`
    pub fn count_matching<I, S>(&self, prefix: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = collect(prefix);
        self.state()
            .calls
            .iter()
            .filter(|cmd| starts_with(&cmd.argv(), &prefix))
            .count()
    }

    fn answer(&self, command: &Command) -> Reply {
        let argv = command.argv();
        let mut state = self.state();
        state.calls.push(command.clone());

        let position = state
            .rules
            .iter()
            .position(|rule| starts_with(&argv, &rule.prefix));

        match position {
            Some(i) if state.rules[i].sticky => state.rules[i].reply.clone(),
            Some(i) => state.rules.remove(i).reply,
            None => Reply::Output(CapturedOutput::success(Vec::new())),
        }
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    async fn output(&self, command: &Command) -> Result<CapturedOutput> {
        match self.answer(command) {
            Reply::Output(output) => Ok(output),
            Reply::SpawnError(reason) => Err(Error::spawn_failed(
                command.get_program().to_string_lossy(),
                reason,
            )),
        }
    }
}

fn collect<I, S>(prefix: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    prefix.into_iter().map(Into::into).collect()
}

fn starts_with(argv: &[String], prefix: &[String]) -> bool {
    argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, p)| a == p)
}
