//! Privileged script execution
//!
//! Runs one of two pinned scripts with a positional argument vector. The
//! domain and email values are tenant-controlled, so they are only ever
//! passed as discrete arguments, never interpolated into a shell string.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{error, info};

use hostplane_shared::ScriptResult;

/// Pinned script names; nothing else under the scripts dir is runnable.
const CONFIGURE_SCRIPT: &str = "configure-custom-domain.sh";
const REMOVE_SCRIPT: &str = "remove-custom-domain-config.sh";

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Script exceeded {0:?} and was killed")]
    Timeout(Duration),
    #[error("Failed to start script: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Executes the pinned provisioning scripts with a hard timeout.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    sudo_path: PathBuf,
    scripts_dir: PathBuf,
    timeout: Duration,
    /// In debug mode the scripts get an extra trailing "true" so they run
    /// in dry-run mode.
    debug: bool,
}

impl ScriptExecutor {
    pub fn new(sudo_path: PathBuf, scripts_dir: PathBuf, timeout: Duration, debug: bool) -> Self {
        Self {
            sudo_path,
            scripts_dir,
            timeout,
            debug,
        }
    }

    fn script_path(&self, script: &str) -> PathBuf {
        self.scripts_dir.join(script)
    }

    /// Argument vector for configuring routing/TLS for a domain.
    pub fn configure_args(&self, custom_domain: &str, email: &str) -> Vec<String> {
        let mut args = vec![
            path_to_string(&self.sudo_path),
            path_to_string(&self.script_path(CONFIGURE_SCRIPT)),
            custom_domain.to_string(),
            email.to_string(),
        ];
        if self.debug {
            args.push("true".to_string());
        }
        args
    }

    /// Argument vector for tearing down a domain's configuration.
    pub fn remove_args(&self, custom_domain: &str) -> Vec<String> {
        let mut args = vec![
            path_to_string(&self.sudo_path),
            path_to_string(&self.script_path(REMOVE_SCRIPT)),
            custom_domain.to_string(),
        ];
        if self.debug {
            args.push("true".to_string());
        }
        args
    }

    /// Run an argument vector, capturing both streams and the exit status
    /// verbatim.
    pub async fn run(&self, args: Vec<String>) -> Result<ScriptResult, ExecError> {
        let (program, rest) = args.split_first().ok_or_else(|| {
            ExecError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty argument vector",
            ))
        })?;

        info!(command = %args.join(" "), "executing provisioning script");

        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result?,
            Err(_) => {
                error!(command = %args.join(" "), timeout = ?self.timeout, "script timed out");
                return Err(ExecError::Timeout(self.timeout));
            }
        };

        let result = ScriptResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            returncode: output.status.code().unwrap_or(-1),
        };

        info!(returncode = result.returncode, "script finished");

        Ok(result)
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn executor(debug: bool) -> ScriptExecutor {
        ScriptExecutor::new(
            PathBuf::from("/usr/bin/sudo"),
            PathBuf::from("/opt/hostplane/scripts"),
            Duration::from_secs(180),
            debug,
        )
    }

    #[test]
    fn test_configure_args_positional() {
        let args = executor(false).configure_args("example.org", "ops@example.org");
        assert_eq!(
            args,
            vec![
                "/usr/bin/sudo",
                "/opt/hostplane/scripts/configure-custom-domain.sh",
                "example.org",
                "ops@example.org",
            ]
        );
    }

    #[test]
    fn test_debug_appends_dry_run_flag() {
        let args = executor(true).configure_args("example.org", "ops@example.org");
        assert_eq!(args.last().map(String::as_str), Some("true"));

        let args = executor(true).remove_args("example.org");
        assert_eq!(args.last().map(String::as_str), Some("true"));
    }

    #[test]
    fn test_remove_args_positional() {
        let args = executor(false).remove_args("example.org");
        assert_eq!(
            args,
            vec![
                "/usr/bin/sudo",
                "/opt/hostplane/scripts/remove-custom-domain-config.sh",
                "example.org",
            ]
        );
    }

    #[test]
    fn test_hostile_values_stay_single_arguments() {
        // Injection attempts survive only as inert positional strings
        let args = executor(false).configure_args("example.org; rm -rf /", "a@b.c $(reboot)");
        assert_eq!(args.len(), 4);
        assert_eq!(args[2], "example.org; rm -rf /");
        assert_eq!(args[3], "a@b.c $(reboot)");
    }

    #[tokio::test]
    async fn test_run_captures_streams_and_exit_code() {
        let exec = executor(false);
        let result = exec
            .run(vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                "echo out; echo err >&2; exit 3".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(result.returncode, 3);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_run_enforces_timeout() {
        let exec = ScriptExecutor::new(
            PathBuf::from("/usr/bin/sudo"),
            PathBuf::from("/tmp"),
            Duration::from_millis(100),
            false,
        );
        let result = exec
            .run(vec!["/bin/sleep".to_string(), "5".to_string()])
            .await;

        assert!(matches!(result, Err(ExecError::Timeout(_))));
    }
}
