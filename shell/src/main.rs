use argh::FromArgs;
use timeshell::config::{DEFAULT_MAX_RECALL_DEPTH, DEFAULT_PROMPT, DEFAULT_TIMEOUT_SECS};
use timeshell::{Interpreter, Outcome, ShellConfig};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal shell that kills external commands running past a deadline.
struct Args {
    #[argh(option, short = 't', default = "DEFAULT_TIMEOUT_SECS")]
    /// seconds an external command may run before it is killed; 0 disables the deadline.
    timeout: u64,

    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt shown before each line.
    prompt: String,

    #[argh(option, default = "DEFAULT_MAX_RECALL_DEPTH")]
    /// how deeply `!` recalls may nest.
    max_recall_depth: usize,

    #[argh(option, short = 'c')]
    /// run a single command line and exit.
    command: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let config = ShellConfig {
        timeout_secs: args.timeout,
        prompt: args.prompt,
        max_recall_depth: args.max_recall_depth,
    };
    let mut shell = Interpreter::new(config);

    match args.command {
        Some(line) => {
            if let Outcome::Error(_) = shell.submit(&line) {
                std::process::exit(1);
            }
        }
        None => shell.repl()?,
    }
    Ok(())
}
