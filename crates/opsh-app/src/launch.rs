//! Command-line analysis and backend launch building
//!
//! The shell's own argv decides the run mode and is forwarded to the backend
//! together with a fixed tail of `--flag=value` arguments describing the
//! application.

use std::path::{Path, PathBuf};

use opsh_backend::{shell_quote, BackendLaunch};
use opsh_core::encode_uri_component;
use opsh_core::prelude::*;

use crate::config::AppConfig;
use crate::window::WindowOptions;

/// Recognized by prefix, not exact match
const HELP_PREFIXES: [&str; 3] = ["--help", "-help", "-h"];
const VERSION_PREFIXES: [&str; 4] = ["--version", "-version", "-v", "-V"];
const TEST_PREFIX: &str = "--test";

/// Environment variable carrying the forwarded environment to the backend
pub const FORWARDED_ENV_VAR: &str = "OPSH_ENV";

/// Size of the secondary (preview/progress) window
pub const SECONDARY_WIDTH: i32 = 350;
pub const SECONDARY_HEIGHT: i32 = 120;

/// How the shell runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Windows plus backend
    Gui,
    /// Forward a CLI invocation to the backend, no windows
    Command,
}

/// What the shell's own argv asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: RunMode,
    pub is_test: bool,
    pub wants_help: bool,
    pub wants_version: bool,
    /// Arguments forwarded ahead of the standard tail
    pub forward: Vec<String>,
    /// Quoted argv for surfaces, e.g. `'opsh', '--test'`
    pub argv_array: String,
}

impl Invocation {
    /// Analyze argv, program name included.
    pub fn analyze(argv: &[String]) -> Self {
        let mut invocation = Self {
            mode: RunMode::Gui,
            is_test: false,
            wants_help: false,
            wants_version: false,
            forward: Vec::new(),
            argv_array: argv_array(argv),
        };

        for (i, arg) in argv.iter().enumerate() {
            let help = HELP_PREFIXES.iter().any(|p| arg.starts_with(p));
            let version = VERSION_PREFIXES.iter().any(|p| arg.starts_with(p));

            invocation.wants_help |= help;
            invocation.wants_version |= version;

            if arg.starts_with(TEST_PREFIX) {
                invocation.is_test = true;
            } else if i >= 1 && !arg.starts_with('-') {
                invocation.mode = RunMode::Command;
            }

            if help || version {
                invocation.mode = RunMode::Command;
            }

            if help {
                invocation.forward.push("help".to_string());
                invocation.forward.push(format!("--warn-arg-usage={}", arg));
            } else if version {
                invocation.forward.push("version".to_string());
                invocation.forward.push(format!("--warn-arg-usage={}", arg));
            } else if i >= 1 {
                invocation.forward.push(arg.clone());
            }
        }

        invocation
    }

    pub fn is_command_mode(&self) -> bool {
        self.mode == RunMode::Command
    }

    /// Suffix appended to name and title
    pub fn suffix(&self) -> &'static str {
        if self.is_test {
            "-test"
        } else {
            ""
        }
    }

    /// Forwarded arguments followed by the `--version`, `--name` and
    /// (debug builds) `--debug` tail.
    pub fn forward_tail(&self, config: &AppConfig, debug: bool) -> Vec<String> {
        let mut args = self.forward.clone();
        args.push(format!("--version={}", config.version));
        args.push(format!("--name={}", config.name));
        if debug {
            args.push("--debug=1".to_string());
        }
        args
    }
}

/// Append `-dev` (debug builds) and the test suffix to name and title.
pub fn apply_identity(config: &mut AppConfig, invocation: &Invocation, debug: bool) {
    if debug {
        config.name.push_str("-dev");
        config.title.push_str("-dev");
    }
    config.name.push_str(invocation.suffix());
    config.title.push_str(invocation.suffix());
}

/// `'a', 'b', 'c'`, with embedded single quotes escaped
pub fn argv_array(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| format!("'{}'", arg.replace('\'', "\\'")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read the comma-separated variable names in `keys` from the host
/// environment and encode them as `KEY=value&KEY=value&`.
///
/// Unset variables forward as empty values.
pub fn forward_env(keys: &str) -> String {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| {
            let value = std::env::var(key).unwrap_or_default();
            format!("{}={}&", key, encode_uri_component(&value))
        })
        .collect()
}

/// Resolve a `.`-relative backend command against the application directory.
pub fn resolve_backend_command(cmd: &str, app_dir: &Path) -> String {
    let trimmed = cmd.trim_start();
    if !trimmed.starts_with('.') {
        return cmd.to_string();
    }

    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (program, rest) = trimmed.split_at(end);
    let path = app_dir.join(program);
    format!("{}{}", shell_quote(&path.to_string_lossy()), rest)
}

/// Command string with every argument quoted for the platform shell
pub fn compose_command(base: &str, args: &[String]) -> String {
    let mut command = base.to_string();
    for arg in args {
        command.push(' ');
        command.push_str(&shell_quote(arg));
    }
    command
}

/// Directories and build flags the launch depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Directory of the shell executable; the backend runs here
    pub app_dir: PathBuf,
    /// Directory the user invoked the shell from
    pub current_dir: PathBuf,
    pub debug: bool,
}

impl LaunchContext {
    /// Context of the running process
    pub fn detect() -> Self {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            app_dir: application_dir().unwrap_or_else(|| current_dir.clone()),
            current_dir,
            debug: cfg!(debug_assertions),
        }
    }
}

/// Canonical directory of the running executable
pub fn application_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe = dunce::canonicalize(&exe).unwrap_or(exe);
    exe.parent().map(Path::to_path_buf)
}

/// Build the backend launch for this run.
///
/// `webview_failed` is only meaningful in GUI mode.
pub fn backend_launch(
    config: &AppConfig,
    invocation: &Invocation,
    context: &LaunchContext,
    webview_failed: bool,
) -> Result<BackendLaunch> {
    let base = config
        .command_for_platform()
        .ok_or_else(|| Error::NoBackendCommand {
            platform: std::env::consts::OS.to_string(),
            key: AppConfig::platform_key().to_string(),
        })?;
    let base = resolve_backend_command(base, &context.app_dir);

    let mut args = invocation.forward_tail(config, context.debug);
    match invocation.mode {
        RunMode::Command => args.push(format!(
            "--op-current-directory={}",
            context.current_dir.display()
        )),
        RunMode::Gui if webview_failed => args.push("--webviewFailed".to_string()),
        RunMode::Gui => {}
    }

    let command = compose_command(&base, &args);
    debug!("Backend command: {}", command);

    Ok(BackendLaunch::new(command, &context.app_dir)
        .with_env(FORWARDED_ENV_VAR, forward_env(&config.env)))
}

/// Options for the main window (index 0) and the secondary window (index 1)
pub fn window_options(
    config: &AppConfig,
    invocation: &Invocation,
    context: &LaunchContext,
) -> [WindowOptions; 2] {
    let base = WindowOptions {
        index: 0,
        resizable: true,
        frameless: false,
        can_exit: true,
        width: config.width,
        height: config.height,
        debug: context.debug,
        is_test: invocation.is_test,
        forward_console: config.forward_console,
        cwd: context.app_dir.clone(),
        executable: config.executable.clone(),
        title: config.title.clone(),
        version: config.version.clone(),
        argv: invocation.argv_array.clone(),
        env: forward_env(&config.env),
    };

    let secondary = WindowOptions {
        index: 1,
        can_exit: false,
        width: SECONDARY_WIDTH,
        height: SECONDARY_HEIGHT,
        ..base.clone()
    };

    [base, secondary]
}
