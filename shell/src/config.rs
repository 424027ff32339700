/// Deadline applied to external commands when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// How many `!` recalls may nest before the shell gives up.
pub const DEFAULT_MAX_RECALL_DEPTH: usize = 64;

/// Prompt printed before each interactive line.
pub const DEFAULT_PROMPT: &str = "$ ";

/// Startup settings of an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Initial deadline for external commands in seconds; 0 disables it.
    pub timeout_secs: u64,
    /// Prompt printed by the interactive loop.
    pub prompt: String,
    /// Maximum nesting of history recalls.
    pub max_recall_depth: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prompt: DEFAULT_PROMPT.to_string(),
            max_recall_depth: DEFAULT_MAX_RECALL_DEPTH,
        }
    }
}
