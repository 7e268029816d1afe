//! Locating executables on the search path and running them as children.

use crate::env::Environment;
use crate::redirect::Redirection;
use anyhow::{Context, Result};
use nix::unistd::{getgid, getuid};
use std::fs;
use std::io::{self, ErrorKind};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code reported when a resolved program turns out not to be runnable.
pub const EXEC_FAILURE: ExitCode = 255;

/// Resolve a command name to an executable path the way the shell does.
///
/// A name containing a `/` or starting with `.` is treated as a path and
/// tested directly, bypassing the search path. A bare name is joined to each
/// search directory in order; the first candidate that is a regular file and
/// executable by us wins. `None` is the normal not-found outcome, not an
/// error.
pub fn find_executable(name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    if name.starts_with('.') || name.contains('/') {
        let direct = PathBuf::from(name);
        return is_executable(&direct).then_some(direct);
    }
    search_path
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Whether this process may execute `path`.
///
/// The owner, group and other execute bits are tried in that order against
/// the real uid/gid. A class that matches but lacks its x-bit falls through
/// to the next one.
fn is_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    let mode = meta.mode();
    if meta.uid() == getuid().as_raw() && mode & 0o100 != 0 {
        return true;
    }
    if meta.gid() == getgid().as_raw() && mode & 0o010 != 0 {
        return true;
    }
    mode & 0o001 != 0
}

/// Run `exe` with `argv[1..]` as arguments and wait for it to finish.
///
/// The child gets the full environment snapshot and the interpreter's
/// working directory. Standard streams are wired per `redirection`:
/// inherited as-is, stdin fed from the open input file through a pipe, or
/// stdout and stderr both duplicated onto the open output file.
///
/// Every termination is reported through the returned exit code, including
/// exec failure ([`EXEC_FAILURE`]) and death by signal (128 + signal).
/// Only resource exhaustion while spawning is an error.
pub fn launch(
    exe: &Path,
    argv: &[String],
    redirection: Redirection,
    env: &Environment,
) -> Result<ExitCode> {
    let mut cmd = Command::new(exe);
    cmd.args(&argv[1..])
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);

    let mut input = None;
    match redirection {
        Redirection::Inherit => {}
        Redirection::Input(file) => {
            cmd.stdin(Stdio::piped());
            input = Some(file);
        }
        Redirection::Output(file) => {
            let for_stdout = file
                .try_clone()
                .context("cannot duplicate the redirection target")?;
            cmd.stdout(Stdio::from(for_stdout));
            cmd.stderr(Stdio::from(file));
        }
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::OutOfMemory || e.kind() == ErrorKind::WouldBlock => {
            return Err(e).context("cannot create a child process");
        }
        Err(_) => {
            // The path resolver vouched for the file, so this is the program
            // itself failing to exec (e.g. a bad format).
            eprintln!("{}: unknown type of executable", exe.display());
            return Ok(EXEC_FAILURE);
        }
    };

    if let Some(mut file) = input {
        let mut pipe = child
            .stdin
            .take()
            .context("pipe to the child process is missing")?;
        // Relay the file into the pipe; dropping the handle closes the write
        // end and signals end-of-input. A child that exits without draining
        // its input breaks the pipe, which is not our failure.
        if let Err(e) = io::copy(&mut file, &mut pipe) {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e).context("cannot relay redirected input to the child");
            }
        }
    }

    let status = child.wait().context("cannot wait for the child process")?;
    Ok(status.code().unwrap_or_else(|| terminated_by_signal(status)))
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
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
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
