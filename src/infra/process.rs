//! Blocking external-tool invocation and search-path discovery.

use std::{
    env,
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("executable `{tool}` was not found")]
    NotFound { tool: String },
    #[error("failed to launch `{tool}`: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Run `tool` with `args`, blocking until the child exits.
///
/// The child inherits the parent's stdout and stderr so its own
/// diagnostics reach the console directly; only the exit status is
/// captured. There is no timeout.
pub fn run_for_status<I, S>(tool: &Path, args: I) -> Result<ExitStatus, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .map_err(|err| {
            let tool = tool.display().to_string();
            if err.kind() == io::ErrorKind::NotFound {
                ToolError::NotFound { tool }
            } else {
                ToolError::Launch { tool, source: err }
            }
        })
}

/// Locate `tool` the way the shell would.
///
/// An explicit path (anything with more than one component) is probed
/// directly; a bare name is tried against each entry of `PATH`.
pub fn find_on_search_path(tool: &Path) -> Option<PathBuf> {
    if tool.components().count() > 1 {
        return is_executable(tool).then(|| tool.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
