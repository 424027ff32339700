use crate::error::ShellError;
use crate::interpreter::Interpreter;

/// What the shell should do after a command line has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran (whatever its own fate); keep reading input.
    Continue,
    /// The user asked the shell to terminate.
    Exit,
    /// The command could not be run; carries a negative errno-style code.
    Error(i32),
}

/// Object-safe trait for a command handled inside the shell process.
///
/// Commands get the whole interpreter, so they can read the history, change
/// the timeout, move the working directory or re-submit a line.
pub trait ExecutableCommand {
    fn execute(self: Box<Self>, shell: &mut Interpreter) -> Result<Outcome, ShellError>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
