use crate::command::Outcome;
use crate::env::Environment;
use crate::error::ShellError;
use crate::supervisor::TimeoutState;
use nix::errno::Errno;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run the program named by `tokens[0]` with the whole token list as its
/// argument vector, waiting for it under the deadline in `timeout`.
///
/// Every way the program itself can end (success, failure, signal, timeout
/// kill, or not being executable at all) yields [`Outcome::Continue`]; only a
/// failure to create the process is an error.
pub(crate) fn run_external(
    tokens: &[String],
    env: &Environment,
    timeout: &mut TimeoutState,
    diagnostics: &mut dyn Write,
) -> Result<Outcome, ShellError> {
    let Some((name, args)) = tokens.split_first() else {
        return Ok(Outcome::Continue);
    };

    let search_paths = env.get_var("PATH").unwrap_or_default();
    let Some(program) = find_command_path(
        OsStr::new(&search_paths),
        &env.current_dir,
        Path::new(name),
    ) else {
        tracing::debug!(command = %name, "no executable found");
        writeln!(diagnostics, "Unable to execute {}", name)?;
        return Ok(Outcome::Continue);
    };
    tracing::debug!(command = %name, program = %program.display(), "resolved external command");

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(name);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if is_exec_failure(&e) => {
            tracing::debug!(command = %name, error = %e, "exec failed");
            writeln!(diagnostics, "Unable to execute {}", name)?;
            return Ok(Outcome::Continue);
        }
        Err(source) => {
            return Err(ShellError::Spawn {
                name: name.clone(),
                source,
            });
        }
    };
    tracing::debug!(command = %name, pid = child.id(), "spawned");

    let completion = timeout.supervise(name, child)?;
    if completion.timed_out {
        writeln!(diagnostics, "{} is timed out", name)?;
    }
    tracing::debug!(command = %name, code = completion.code(), "external command finished");
    Ok(Outcome::Continue)
}

/// The program was found but could not be turned into a running image.
fn is_exec_failure(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || e.raw_os_error() == Some(Errno::ENOEXEC as i32)
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: used as is if it names an executable file.
/// - Relative path with a separator (`./foo`, `bin/sh`): resolved against `cwd`.
/// - Single component: the first executable of that name in `search_paths`
///   (PATH); entries that are not executable are skipped.
/// - Empty path: `None`.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    cwd: &Path,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => {
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            let candidate = cwd.join(path);
            find_by_path(&candidate)?;
            Some(Cow::Owned(candidate))
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| find_by_path(path).is_some())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
