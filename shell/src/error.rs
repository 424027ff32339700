use nix::errno::Errno;
use std::io;
use thiserror::Error;

/// Failures that turn a command line into an [`Outcome::Error`](crate::Outcome::Error).
///
/// Everything else that can go wrong while running a command (a missing
/// program, a failed `cd`, a killed child) is reported on the diagnostic
/// stream and the shell simply continues.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The operating system refused to create the child process.
    #[error("{name}: cannot create process: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// `!` recalls nested deeper than the configured limit.
    #[error("!: recall nested more than {limit} levels deep")]
    RecallDepth { limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Negative errno-style code carried by the `Error` outcome.
    pub fn code(&self) -> i32 {
        let errno = match self {
            ShellError::Spawn { source, .. } | ShellError::Io(source) => {
                source.raw_os_error().unwrap_or(Errno::EIO as i32)
            }
            ShellError::RecallDepth { .. } => Errno::ELOOP as i32,
        };
        -errno
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_uses_os_errno() {
        let err = ShellError::Spawn {
            name: "prog".to_string(),
            source: io::Error::from_raw_os_error(Errno::EAGAIN as i32),
        };
        assert_eq!(err.code(), -(Errno::EAGAIN as i32));
        assert!(err.to_string().starts_with("prog: cannot create process"));
    }

    #[test]
    fn test_recall_depth_maps_to_eloop() {
        let err = ShellError::RecallDepth { limit: 3 };
        assert_eq!(err.code(), -(Errno::ELOOP as i32));
        assert_eq!(err.to_string(), "!: recall nested more than 3 levels deep");
    }

    #[test]
    fn test_synthetic_io_error_falls_back_to_eio() {
        let err = ShellError::from(io::Error::other("broken diagnostics"));
        assert_eq!(err.code(), -(Errno::EIO as i32));
    }
}
