use crate::builtin;
use crate::command::{CommandFactory, ExecutableCommand, Outcome};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external;
use crate::history::History;
use crate::lexer;
use crate::supervisor::TimeoutState;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// A minimal interactive shell that runs built-ins in-process and external
/// programs under a deadline.
///
/// The interpreter owns the command [`History`], the [`TimeoutState`] and the
/// [`Environment`] commands run in. Built-in output, timeout notices and exec
/// failures go to a separate diagnostic stream (stderr unless replaced with
/// [`with_diagnostics`](Self::with_diagnostics)).
///
/// Example
/// ```
/// use timeshell::{Interpreter, Outcome, ShellConfig};
/// let mut sh = Interpreter::new(ShellConfig::default());
/// assert_eq!(sh.submit("timeout 5"), Outcome::Continue);
/// assert_eq!(sh.timeout().seconds(), 5);
/// assert_eq!(sh.submit("exit now"), Outcome::Exit);
/// assert_eq!(sh.history().len(), 2);
/// ```
pub struct Interpreter {
    env: Environment,
    history: History,
    timeout: TimeoutState,
    diagnostics: Box<dyn Write>,
    builtins: Vec<Box<dyn CommandFactory>>,
    prompt: String,
    max_recall_depth: usize,
    recall_depth: usize,
}

impl Interpreter {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            env: Environment::new(),
            history: History::new(),
            timeout: TimeoutState::new(config.timeout_secs),
            diagnostics: Box::new(std::io::stderr()),
            builtins: builtin::builtins(),
            prompt: config.prompt,
            max_recall_depth: config.max_recall_depth,
            recall_depth: 0,
        }
    }

    /// Replace the environment captured from the process.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Send diagnostics somewhere other than stderr.
    pub fn with_diagnostics(mut self, diagnostics: impl Write + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn timeout(&self) -> &TimeoutState {
        &self.timeout
    }

    pub fn timeout_mut(&mut self) -> &mut TimeoutState {
        &mut self.timeout
    }

    pub fn diagnostics(&mut self) -> &mut dyn Write {
        self.diagnostics.as_mut()
    }

    /// Run one command line and report what the shell should do next.
    ///
    /// Errors are written to the diagnostic stream and become [`Outcome::Error`].
    /// The line is not recorded in the history; see [`submit`](Self::submit).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn process(&mut self, line: &str) -> Outcome {
        match self.dispatch(line) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                let _ = writeln!(self.diagnostics, "{}", e);
                Outcome::Error(e.code())
            }
        }
    }

    /// [`process`](Self::process) a freshly entered line, then append it to
    /// the history whatever the outcome.
    pub fn submit(&mut self, line: &str) -> Outcome {
        let outcome = self.process(line);
        self.history.append(line);
        outcome
    }

    /// Run `line` as if it had just been entered, from inside another command.
    ///
    /// Nested re-submissions are limited to the configured recall depth.
    pub fn resubmit(&mut self, line: &str) -> Result<Outcome, ShellError> {
        if self.recall_depth >= self.max_recall_depth {
            return Err(ShellError::RecallDepth {
                limit: self.max_recall_depth,
            });
        }
        self.recall_depth += 1;
        let result = self.dispatch(line);
        self.recall_depth -= 1;
        result
    }

    fn dispatch(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let tokens = match lexer::split_into_words(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                writeln!(self.diagnostics, "{}", e)?;
                return Ok(Outcome::Continue);
            }
        };
        let Some((name, args)) = tokens.split_first() else {
            return Ok(Outcome::Continue);
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let builtin = self
            .builtins
            .iter()
            .find_map(|factory| factory.try_create(name, &args));

        match builtin {
            Some(cmd) => {
                tracing::debug!(command = %name, depth = self.recall_depth, "builtin");
                cmd.execute(self)
            }
            None => external::run_external(
                &tokens,
                &self.env,
                &mut self.timeout,
                self.diagnostics.as_mut(),
            ),
        }
    }

    /// Read lines until `exit` or end of input.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if self.submit(&line) == Outcome::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::io_adapters::SharedBuffer;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use nix::errno::Errno;
    use std::env as stdenv;
    use std::fs;
    use std::time::{Duration, Instant};

    fn shell_with(config: ShellConfig) -> (Interpreter, SharedBuffer) {
        let diagnostics = SharedBuffer::new();
        let shell = Interpreter::new(config).with_diagnostics(diagnostics.clone());
        (shell, diagnostics)
    }

    fn shell() -> (Interpreter, SharedBuffer) {
        shell_with(ShellConfig::default())
    }

    #[test]
    fn test_blank_line_is_a_no_op() {
        let (mut sh, diagnostics) = shell();
        assert_eq!(sh.process(""), Outcome::Continue);
        assert_eq!(sh.process("   "), Outcome::Continue);
        assert_eq!(diagnostics.contents(), "");
    }

    #[test]
    fn test_exit_regardless_of_trailing_tokens() {
        let (mut sh, _) = shell();
        assert_eq!(sh.process("exit"), Outcome::Exit);
        assert_eq!(sh.process("exit 1 2 --now"), Outcome::Exit);
        assert_eq!(sh.process("  exit  "), Outcome::Exit);
    }

    #[test]
    fn test_submit_appends_whatever_the_outcome() {
        let (mut sh, _) = shell();
        sh.submit("definitely-not-a-real-binary-xyz");
        sh.submit("exit");
        sh.submit("");

        let lines: Vec<&str> = sh.history().list().map(|(_, line)| line).collect();
        assert_eq!(lines, vec!["definitely-not-a-real-binary-xyz", "exit", ""]);
    }

    #[test]
    fn test_history_lists_previous_lines() {
        let (mut sh, diagnostics) = shell();
        sh.submit("timeout 3");
        sh.submit("true");
        diagnostics.clear();

        assert_eq!(sh.submit("history"), Outcome::Continue);
        assert_eq!(diagnostics.contents(), "0: timeout 3\n1: true\n");
    }

    #[test]
    fn test_recall_reexecutes_entry_recursively() {
        let (mut sh, _) = shell();
        sh.submit("timeout 4");
        sh.submit("! 0");
        sh.submit("timeout 9");
        assert_eq!(sh.timeout().seconds(), 9);

        // Entry 1 is itself a recall of entry 0.
        assert_eq!(sh.submit("! 1"), Outcome::Continue);
        assert_eq!(sh.timeout().seconds(), 4);
    }

    #[test]
    fn test_recall_out_of_range_is_a_no_op() {
        let (mut sh, diagnostics) = shell();
        sh.submit("timeout 3");
        diagnostics.clear();

        assert_eq!(sh.submit("! 42"), Outcome::Continue);
        assert_eq!(sh.submit("!"), Outcome::Continue);
        assert_eq!(sh.submit("! 0 0"), Outcome::Continue);
        assert_eq!(diagnostics.contents(), "");
    }

    #[test]
    fn test_recalled_exit_continues() {
        let (mut sh, _) = shell();
        sh.history_mut().append("exit");
        assert_eq!(sh.submit("! 0"), Outcome::Continue);
        assert_eq!(sh.history().len(), 2);
    }

    #[test]
    fn test_self_referential_recall_fails_closed() {
        let (mut sh, diagnostics) = shell_with(ShellConfig {
            max_recall_depth: 8,
            ..ShellConfig::default()
        });
        sh.submit("! 0");

        assert_eq!(sh.process("! 0"), Outcome::Error(-(Errno::ELOOP as i32)));
        assert!(diagnostics
            .contents()
            .ends_with("!: recall nested more than 8 levels deep\n"));

        // The counter unwinds, so ordinary recalls keep working.
        sh.history_mut().append("timeout 6");
        assert_eq!(sh.process("! 1"), Outcome::Continue);
        assert_eq!(sh.timeout().seconds(), 6);
    }

    #[test]
    fn test_timeout_kills_long_command() {
        let (mut sh, diagnostics) = shell();
        sh.submit("timeout 1");
        diagnostics.clear();
        let started = Instant::now();

        assert_eq!(sh.submit("sleep 10"), Outcome::Continue);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(diagnostics.contents(), "sleep is timed out\n");
        assert!(sh.timeout().current().is_none());
    }

    #[test]
    fn test_recalled_command_runs_under_the_deadline() {
        let (mut sh, diagnostics) = shell();
        sh.submit("timeout 1");
        sh.submit("sleep 10");
        diagnostics.clear();
        let started = Instant::now();

        assert_eq!(sh.submit("! 1"), Outcome::Continue);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(diagnostics.contents(), "sleep is timed out\n");
        assert!(sh.timeout().current().is_none());
    }

    #[test]
    fn test_timeout_zero_lets_command_finish() {
        let (mut sh, diagnostics) = shell();
        sh.submit("timeout 1");
        sh.submit("timeout 0");
        diagnostics.clear();
        let started = Instant::now();

        assert_eq!(sh.submit("sleep 2"), Outcome::Continue);

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(diagnostics.contents(), "");
    }

    #[test]
    fn test_missing_program_continues() {
        let (mut sh, diagnostics) = shell();
        assert_eq!(
            sh.submit("definitely-not-a-real-binary-xyz arg"),
            Outcome::Continue
        );
        assert_eq!(
            diagnostics.contents(),
            "Unable to execute definitely-not-a-real-binary-xyz\n"
        );
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let (mut sh, diagnostics) = shell();
        assert_eq!(sh.submit("echo 'oops"), Outcome::Continue);
        assert_eq!(diagnostics.contents(), "unterminated quote\n");
    }

    #[test]
    fn test_cd_home_then_nonexistent() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let home = fs::canonicalize(make_unique_temp_dir("home")).unwrap();
        let (mut sh, diagnostics) = shell();
        sh.environment_mut()
            .set_var("HOME", home.to_string_lossy().to_string());

        assert_eq!(sh.submit("cd"), Outcome::Continue);
        assert_eq!(sh.environment().current_dir, home);

        assert_eq!(sh.submit("cd /nonexistent"), Outcome::Continue);
        assert_eq!(sh.environment().current_dir, home);
        assert!(diagnostics.contents().starts_with("cd: /nonexistent: "));

        // External commands start in the new directory.
        assert_eq!(sh.submit("touch marker"), Outcome::Continue);
        assert!(home.join("marker").exists());

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(home);
    }
}
