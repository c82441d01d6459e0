//! Integration tests driving the `opsh` binary end to end
//!
//! Run with: cargo test --test cli_integration

#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Write `opsh.toml` and `backend.sh` into `dir`; returns the config path.
fn setup(dir: &Path, script: &str, extra_config: &str) -> std::path::PathBuf {
    let backend = dir.join("backend.sh");
    fs::write(&backend, script).unwrap();

    let cmd = format!("sh {}", backend.display());
    let config = dir.join("opsh.toml");
    fs::write(
        &config,
        format!(
            "env = \"OPSH_SAMPLE\"\nlinux_cmd = \"{cmd}\"\nmac_cmd = \"{cmd}\"\n{extra_config}"
        ),
    )
    .unwrap();
    config
}

fn opsh(config: &Path, cwd: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_opsh"))
        .args(args)
        .current_dir(cwd)
        .env("OPSH_CONFIG", config)
        .env("OPSH_SAMPLE", "a b")
        .env("OPSH_LOG_DIR", cwd.join("logs"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("opsh binary runs");

    if let Some(mut input) = child.stdin.take() {
        input.write_all(stdin.as_bytes()).unwrap();
    }
    child.wait_with_output().unwrap()
}

/// Names of the log files written under `dir/logs`
fn log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir.join("logs"))
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_command_mode_echoes_and_exits_with_backend_code() {
    let dir = TempDir::new().unwrap();
    let config = setup(
        dir.path(),
        "printf '%s\\n' \"$@\" > \"$(dirname \"$0\")/args\"\n\
         echo \"stdout value=env%3D$OPSH_ENV\"\n\
         echo 'progress value=building%20ios'\n\
         echo 'exit value=3'\n\
         exec sleep 10\n",
        "",
    );

    let output = opsh(&config, dir.path(), &["build", "--target=ios"], "");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stdout_lines(&output),
        vec!["env=OPSH_SAMPLE=a b&", "building ios"]
    );

    let args = fs::read_to_string(dir.path().join("args")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(&args[..2], &["build", "--target=ios"]);
    assert!(args.iter().any(|a| a.starts_with("--version=")));
    assert!(args.iter().any(|a| a.starts_with("--name=operator-shell")));
    let cwd = canonical(dir.path());
    assert_eq!(
        args.last().copied(),
        Some(format!("--op-current-directory={}", cwd).as_str())
    );

    let logs = log_files(dir.path());
    assert!(logs.iter().any(|name| name.starts_with("opsh-cli.")));
    assert!(!logs.iter().any(|name| name.starts_with("opsh-gui.")));
}

#[test]
fn test_command_mode_backend_exit_status_is_used() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), "echo 'plain text'\nexit 6\n", "");

    let output = opsh(&config, dir.path(), &["lint"], "");

    assert_eq!(output.status.code(), Some(6));
    assert_eq!(stdout_lines(&output), vec!["plain text"]);
}

#[test]
fn test_help_runs_in_command_mode() {
    let dir = TempDir::new().unwrap();
    let config = setup(
        dir.path(),
        "echo \"stdout value=$1%20$2\"\necho 'exit value=0'\n",
        "",
    );

    let output = opsh(&config, dir.path(), &["--help"], "");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_lines(&output), vec!["help --warn-arg-usage=--help"]);
}

#[test]
fn test_gui_mode_routes_stdin_and_screen_metrics() {
    let dir = TempDir::new().unwrap();
    let config = setup(
        dir.path(),
        "read line\n\
         case \"$line\" in ping*) echo 'stdout value=pong' ;; esac\n\
         echo 'getScreenSize seq=1'\n\
         read reply\n\
         echo \"stdout value=$(printf '%s' \"$reply\" | sed 's/ /%20/g')\"\n\
         echo 'exit value=4'\n\
         exec sleep 10\n",
        "[headless]\nscreen_width = 1280\nscreen_height = 800\n",
    );

    let output = opsh(&config, dir.path(), &[], "ping value=1\n");

    assert_eq!(output.status.code(), Some(4));
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "pong");
    assert!(lines[1].starts_with("resolve seq=1 state=0 value="));
    assert!(lines[1].contains("1280"));
    assert!(lines[1].contains("800"));
    assert!(log_files(dir.path())
        .iter()
        .any(|name| name.starts_with("opsh-gui.")));
}

#[test]
fn test_missing_backend_program_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("opsh.toml");
    fs::write(
        &config,
        "linux_cmd = \"opsh-no-such-backend\"\nmac_cmd = \"opsh-no-such-backend\"\n",
    )
    .unwrap();

    let output = opsh(&config, dir.path(), &["build"], "");

    assert!(!output.status.success());
}

/// Path as the child sees it from `getcwd`
fn canonical(path: &Path) -> String {
    fs::canonicalize(path).unwrap().display().to_string()
}
