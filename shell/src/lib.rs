//! A minimal interactive shell with per-command timeouts.
//!
//! Each input line is split into words and either handled in-process by a
//! built-in (`exit`, `cd`, `history`, `!`, `timeout`) or run as an external
//! program. External programs run under a deadline: when it passes, the child
//! is killed with `SIGKILL` and the shell moves on to the next line.
//!
//! The main entry point is [`Interpreter`]; [`Interpreter::submit`] runs a line
//! and records it in the history, and [`Interpreter::repl`] drives an
//! interactive session.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod supervisor;

pub use command::Outcome;
pub use config::ShellConfig;
pub use error::ShellError;
pub use interpreter::Interpreter;
