//! Command-string launching through the platform shell
//!
//! The backend is configured as a single command string (e.g. `node main.js`)
//! plus forwarded arguments, so it is run through `sh -c` (or `cmd /C`).

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use opsh_core::prelude::*;

/// Everything needed to start one backend process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendLaunch {
    /// Full command line, forwarded arguments included
    pub command: String,
    /// Working directory of the child
    pub cwd: PathBuf,
    /// Extra environment variables, on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl BackendLaunch {
    pub fn new(command: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Builtins and keywords the platform shell handles itself
#[cfg(not(windows))]
const SHELL_BUILTINS: &[&str] = &[
    "exec", "exit", "read", "cd", "set", "export", "eval", ".", ":", "true", "false", "test", "[",
    "echo", "printf", "if", "for", "while", "case", "{", "(",
];

#[cfg(windows)]
const SHELL_BUILTINS: &[&str] = &["echo", "set", "cd", "exit", "call", "start", "if", "for"];

/// Build a shell invocation for a command string.
pub fn shell_command(command: &str) -> tokio::process::Command {
    #[cfg(windows)]
    {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// First word of a command string, honouring simple quoting.
pub fn program_of(command: &str) -> Option<&str> {
    let command = command.trim_start();
    let first = command.chars().next()?;
    let program = if first == '"' || first == '\'' {
        let rest = &command[1..];
        let end = rest.find(first).unwrap_or(rest.len());
        &rest[..end]
    } else {
        let end = command.find(char::is_whitespace).unwrap_or(command.len());
        &command[..end]
    };
    (!program.is_empty()).then_some(program)
}

/// Verify that the program a command string starts with can be found.
///
/// Paths are checked relative to `cwd`; bare names are looked up on `PATH`.
/// The shell itself would start fine either way and only fail later with
/// exit code 127, which would leave the GUI running without a backend.
pub fn check_program(command: &str, cwd: &Path) -> Result<PathBuf> {
    let program = program_of(command).ok_or_else(|| Error::backend_not_found(command))?;

    if SHELL_BUILTINS.contains(&program) {
        return Ok(PathBuf::from(program));
    }

    if program.contains('/') || program.contains('\\') {
        let path = Path::new(program);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        return if path.exists() {
            Ok(path)
        } else {
            Err(Error::backend_not_found(path.display().to_string()))
        };
    }

    which::which(program).map_err(|e| {
        debug!("which({}) failed: {}", program, e);
        Error::backend_not_found(program)
    })
}

/// Quote an argument so the platform shell passes it through unchanged.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    #[cfg(windows)]
    {
        if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || "\"&|<>^%".contains(c))
        {
            return Cow::Borrowed(arg);
        }
        Cow::Owned(format!("\"{}\"", arg.replace('"', "\\\"")))
    }

    #[cfg(not(windows))]
    {
        let safe = !arg.is_empty()
            && arg
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"_-./=:,@%+".contains(&b));
        if safe {
            return Cow::Borrowed(arg);
        }
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_of_plain() {
        assert_eq!(program_of("node main.js --flag"), Some("node"));
        assert_eq!(program_of("  ./bin/app"), Some("./bin/app"));
        assert_eq!(program_of(""), None);
    }

    #[test]
    fn test_program_of_quoted() {
        assert_eq!(
            program_of("\"/opt/my app/backend\" --x"),
            Some("/opt/my app/backend")
        );
        assert_eq!(program_of("'a b' c"), Some("a b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_program_on_path() {
        assert!(check_program("sh -c true", Path::new("/")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_check_program_accepts_builtins() {
        assert!(check_program("exec sleep 1", Path::new("/")).is_ok());
        assert!(check_program("exit 3", Path::new("/")).is_ok());
    }

    #[test]
    fn test_check_program_missing() {
        let err = check_program("definitely-not-a-real-binary-opsh --x", Path::new("."))
            .unwrap_err();
        assert!(matches!(err, Error::BackendNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_check_program_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("backend"), "").unwrap();

        assert!(check_program("./backend --x", dir.path()).is_ok());
        assert!(check_program("./missing", dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("build"), "build");
        assert_eq!(shell_quote("--target=ios"), "--target=ios");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
    }
}
