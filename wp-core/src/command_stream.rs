// Standard library
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader};

// External crates
use crate::error::{Result, WpError};
use duct::cmd;
use tracing::{debug, info};
use which::which;

/// Lines of output kept for error reporting when a streamed command fails.
const ERROR_CONTEXT_LINES: usize = 50;

fn to_os_args<A: AsRef<OsStr>>(args: &[A]) -> Vec<OsString> {
    args.iter().map(|a| a.as_ref().to_os_string()).collect()
}

/// Masks inline credentials (`-p<secret>`, `--password=<secret>`).
fn redact_arg(arg: &str) -> String {
    if let Some(rest) = arg.strip_prefix("--password=") {
        if !rest.is_empty() {
            return "--password=******".to_string();
        }
    }
    if arg.len() > 2 && arg.starts_with("-p") && !arg.starts_with("--") {
        return "-p******".to_string();
    }
    arg.to_string()
}

/// Command line as it appears in logs and error messages, secrets masked.
pub fn render_command<A: AsRef<OsStr>>(command: &str, args: &[A]) -> String {
    format!(
        "{} {}",
        command,
        args.iter()
            .map(|a| redact_arg(&a.as_ref().to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    )
}

/// Run a command to completion, forwarding its output to the log.
///
/// On failure the last lines of combined stdout/stderr are included in the
/// returned error so that engine diagnostics reach the user.
pub fn stream_command<A: AsRef<OsStr>>(command: &str, args: &[A]) -> Result<()> {
    let full_command = render_command(command, args);
    debug!("Running: {}", full_command);

    let output = cmd(command, to_os_args(args))
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()
        .map_err(|e| WpError::Command(format!("Failed to start '{}': {}", full_command, e)))?;

    let stdout_str = String::from_utf8_lossy(&output.stdout);
    for line in stdout_str.lines() {
        info!("{}", line);
    }

    if output.status.success() {
        return Ok(());
    }

    let error_context: Vec<&str> = stdout_str
        .lines()
        .rev()
        .take(ERROR_CONTEXT_LINES)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    Err(WpError::Command(format!(
        "{} exited with code {:?}\n\nOutput (last {} lines):\n{}",
        full_command,
        output.status.code(),
        ERROR_CONTEXT_LINES,
        error_context.join("\n")
    )))
}

/// Stream command output directly to stdout, bypassing the logging system.
/// Use this for long-running commands such as `logs -f`.
pub fn stream_command_visible<A: AsRef<OsStr>>(command: &str, args: &[A]) -> Result<()> {
    let reader = cmd(command, to_os_args(args)).stderr_to_stdout().reader()?;
    let lines = BufReader::new(reader).lines();
    for line in lines {
        println!("{}", line?);
    }
    Ok(())
}

/// Checks if a command-line tool is available in the system's PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command() {
        assert_eq!(
            render_command("docker", &["network", "ls"]),
            "docker network ls"
        );
    }

    #[test]
    fn test_render_command_masks_passwords() {
        assert_eq!(
            render_command("mysql", &["-uroot", "-phunter2", "--password=hunter2", "wordpress"]),
            "mysql -uroot -p****** --password=****** wordpress"
        );
        // A bare `-p` is compose's project flag.
        assert_eq!(
            render_command("docker", &["compose", "-p", "wp-alpha", "up"]),
            "docker compose -p wp-alpha up"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_failure_message_does_not_leak_passwords() {
        let err = stream_command("sh", &["-c", "exit 2", "-phunter2"]).unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    #[cfg(unix)]
    fn test_stream_command_reports_failure_output() {
        let err = stream_command("sh", &["-c", "echo broken >&2; exit 3"]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("exited with code Some(3)"));
        assert!(text.contains("broken"));
    }

    #[test]
    #[cfg(unix)]
    fn test_stream_command_success() {
        assert!(stream_command("sh", &["-c", "echo fine"]).is_ok());
    }
}
