use crate::error::ShellError;
use std::process::{Child, ExitStatus};
use std::time::Duration;
use wait_timeout::ChildExt;

/// The child process currently running under a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supervised {
    pub pid: u32,
    pub name: String,
}

/// Result of waiting for a supervised child.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub status: ExitStatus,
    /// The deadline fired and the child was killed.
    pub timed_out: bool,
}

impl Completion {
    /// Shell-style exit code: the child's own code, or `128 + signal`.
    pub fn code(&self) -> i32 {
        match self.status.code() {
            Some(x) => x,
            None => terminated_by_signal(self.status),
        }
    }
}

/// Deadline configuration plus the identity of the child it applies to.
///
/// A deadline of 0 seconds disables enforcement. The supervised child is only
/// recorded between spawn and reap.
#[derive(Debug)]
pub struct TimeoutState {
    seconds: u64,
    current: Option<Supervised>,
}

impl TimeoutState {
    pub fn new(seconds: u64) -> Self {
        Self {
            seconds,
            current: None,
        }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn set_seconds(&mut self, seconds: u64) {
        self.seconds = seconds;
    }

    pub fn is_enabled(&self) -> bool {
        self.seconds > 0
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.is_enabled().then(|| Duration::from_secs(self.seconds))
    }

    /// Child being waited on right now, if any.
    pub fn current(&self) -> Option<&Supervised> {
        self.current.as_ref()
    }

    /// Wait for `child` to terminate, killing it once the deadline passes.
    ///
    /// `child` must have been spawned just before this call: the deadline is
    /// counted from here.
    pub fn supervise(&mut self, name: &str, mut child: Child) -> Result<Completion, ShellError> {
        self.current = Some(Supervised {
            pid: child.id(),
            name: name.to_string(),
        });
        let result = self.wait_with_deadline(&mut child);
        self.current = None;
        result
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<Completion, ShellError> {
        let pid = child.id();
        let Some(deadline) = self.deadline() else {
            let status = child.wait()?;
            tracing::debug!(pid, ?status, "child reaped");
            return Ok(Completion {
                status,
                timed_out: false,
            });
        };

        // A child that outlives the deadline is still unreaped here, so the
        // kill cannot reach a recycled pid.
        let (status, timed_out) = match child.wait_timeout(deadline)? {
            Some(status) => (status, false),
            None => {
                tracing::info!(pid, ?deadline, "deadline reached, killing child");
                if let Err(e) = child.kill() {
                    tracing::warn!(pid, error = %e, "failed to kill timed out child");
                }
                (child.wait()?, true)
            }
        };
        tracing::debug!(pid, ?status, timed_out, "child reaped");
        Ok(Completion { status, timed_out })
    }
}

impl Default for TimeoutState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TIMEOUT_SECS)
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
