use crate::command::{CommandFactory, ExecutableCommand, Outcome};
use crate::error::ShellError;
use crate::interpreter::Interpreter;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "history".
    fn name() -> &'static str;

    /// Build the command from its arguments.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::name()], args)
    }

    fn execute(self, shell: &mut Interpreter) -> Result<Outcome>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, shell: &mut Interpreter) -> Result<Outcome, ShellError> {
        match <T as BuiltinCommand>::execute(*self, shell) {
            Ok(outcome) => Ok(outcome),
            Err(e) => match e.downcast::<ShellError>() {
                Ok(shell_error) => Err(shell_error),
                Err(e) => {
                    writeln!(shell.diagnostics(), "{:#}", e)?;
                    Ok(Outcome::Continue)
                }
            },
        }
    }
}

struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, shell: &mut Interpreter) -> Result<Outcome, ShellError> {
        writeln!(shell.diagnostics(), "{}", self.output.trim_end())?;
        Ok(Outcome::Continue)
    }
}

/// Creates builtin `T` when its name is seen.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::parse(args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
            })
        } else {
            None
        }
    }
}

/// The reserved command names, in dispatch order.
pub(crate) fn builtins() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<ShowHistory>::default()),
        Box::new(Factory::<Recall>::default()),
        Box::new(Factory::<Timeout>::default()),
    ]
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    // Anything after `exit`, flags included, is ignored.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit {
            _args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    fn execute(self, _shell: &mut Interpreter) -> Result<Outcome> {
        Ok(Outcome::Exit)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, or with `~`, changes to the directory named by HOME.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::name()], first_only(args))
    }

    fn execute(self, shell: &mut Interpreter) -> Result<Outcome> {
        let target = match self.target.as_deref() {
            None | Some("~") => shell
                .environment()
                .home_dir()
                .context("cd: HOME not set")?,
            Some(path) => PathBuf::from(path),
        };
        let new_dir = shell.environment().resolve(&target);

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: {}", target.display()))?;
        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: {}", target.display()))?;

        tracing::debug!(dir = %canonical.display(), "changed directory");
        shell.environment_mut().current_dir = canonical;
        Ok(Outcome::Continue)
    }
}

#[derive(FromArgs)]
/// List previously entered command lines with their indices.
pub struct ShowHistory {}

impl BuiltinCommand for ShowHistory {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, shell: &mut Interpreter) -> Result<Outcome> {
        let listing: String = shell
            .history()
            .list()
            .map(|(index, line)| format!("{}: {}\n", index, line))
            .collect();
        shell.diagnostics().write_all(listing.as_bytes())?;
        Ok(Outcome::Continue)
    }
}

#[derive(FromArgs)]
/// Run the history entry with the given index again.
pub struct Recall {
    #[argh(positional, greedy)]
    /// index of the entry, counted from 0.
    pub args: Vec<String>,
}

impl BuiltinCommand for Recall {
    fn name() -> &'static str {
        "!"
    }

    // Any argument shape is accepted; only a single index does something.
    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Recall {
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    fn execute(self, shell: &mut Interpreter) -> Result<Outcome> {
        let [index] = self.args.as_slice() else {
            return Ok(Outcome::Continue);
        };
        let Some(line) = index
            .parse::<usize>()
            .ok()
            .and_then(|index| shell.history().get(index))
            .map(str::to_owned)
        else {
            return Ok(Outcome::Continue);
        };

        // The recalled line's own outcome is not forwarded; only a runaway
        // recall chain escalates.
        match shell.resubmit(&line) {
            Ok(_) => Ok(Outcome::Continue),
            Err(e @ ShellError::RecallDepth { .. }) => Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "recalled command failed");
                writeln!(shell.diagnostics(), "{}", e)?;
                Ok(Outcome::Continue)
            }
        }
    }
}

#[derive(FromArgs)]
/// Show or change how long an external command may run before it is killed.
pub struct Timeout {
    #[argh(positional)]
    /// deadline in seconds; 0 disables it.
    pub seconds: Option<u64>,
}

impl BuiltinCommand for Timeout {
    fn name() -> &'static str {
        "timeout"
    }

    fn parse(args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[Self::name()], first_only(args))
    }

    fn execute(self, shell: &mut Interpreter) -> Result<Outcome> {
        let message = match self.seconds {
            None if shell.timeout().is_enabled() => {
                format!("Current timeout is {}", seconds(shell.timeout().seconds()))
            }
            None | Some(0) => {
                shell.timeout_mut().set_seconds(0);
                "Timeout is disabled".to_string()
            }
            Some(n) => {
                shell.timeout_mut().set_seconds(n);
                format!("Timeout is set to {}", seconds(n))
            }
        };
        writeln!(shell.diagnostics(), "{}", message)?;
        Ok(Outcome::Continue)
    }
}

/// Arguments past the first are ignored.
fn first_only<'a, 'b>(args: &'a [&'b str]) -> &'a [&'b str] {
    &args[..args.len().min(1)]
}

fn seconds(n: u64) -> String {
    if n == 1 {
        "1 second".to_string()
    } else {
        format!("{} seconds", n)
    }
}
