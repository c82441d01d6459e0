//! Configuration types

use serde::{Deserialize, Serialize};

/// Application settings (`opsh.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Application name, forwarded as `--name=`
    #[serde(default = "default_name")]
    pub name: String,

    /// Window title
    #[serde(default = "default_title")]
    pub title: String,

    /// Application version, forwarded as `--version=`
    #[serde(default = "default_version")]
    pub version: String,

    /// Executable name reported to surfaces
    #[serde(default)]
    pub executable: String,

    /// Comma-separated names of environment variables to forward to surfaces
    #[serde(default)]
    pub env: String,

    /// Width of the main window
    #[serde(default = "default_width")]
    pub width: i32,

    /// Height of the main window
    #[serde(default = "default_height")]
    pub height: i32,

    /// Mirror surface console output to the host
    #[serde(default)]
    pub forward_console: bool,

    /// Backend command on Linux
    #[serde(default)]
    pub linux_cmd: Option<String>,

    /// Backend command on macOS
    #[serde(default)]
    pub mac_cmd: Option<String>,

    /// Backend command on Windows
    #[serde(default)]
    pub win_cmd: Option<String>,

    #[serde(default)]
    pub headless: HeadlessSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            title: default_title(),
            version: default_version(),
            executable: String::new(),
            env: String::new(),
            width: default_width(),
            height: default_height(),
            forward_console: false,
            linux_cmd: None,
            mac_cmd: None,
            win_cmd: None,
            headless: HeadlessSettings::default(),
        }
    }
}

impl AppConfig {
    /// Backend command configured for the OS this binary was built for
    pub fn command_for_platform(&self) -> Option<&str> {
        let cmd = if cfg!(target_os = "macos") {
            self.mac_cmd.as_deref()
        } else if cfg!(windows) {
            self.win_cmd.as_deref()
        } else {
            self.linux_cmd.as_deref()
        };
        cmd.filter(|c| !c.trim().is_empty())
    }

    /// Config key holding the backend command for this OS
    pub fn platform_key() -> &'static str {
        if cfg!(target_os = "macos") {
            "mac_cmd"
        } else if cfg!(windows) {
            "win_cmd"
        } else {
            "linux_cmd"
        }
    }
}

/// Settings of the built-in headless surface
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeadlessSettings {
    /// Screen width reported by `getScreenSize`
    #[serde(default = "default_screen_width")]
    pub screen_width: i32,

    /// Screen height reported by `getScreenSize`
    #[serde(default = "default_screen_height")]
    pub screen_height: i32,

    /// Actually launch the platform opener for `external`
    #[serde(default)]
    pub open_external: bool,
}

impl Default for HeadlessSettings {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            open_external: false,
        }
    }
}

fn default_name() -> String {
    "operator-shell".to_string()
}

fn default_title() -> String {
    "Operator Shell".to_string()
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_width() -> i32 {
    750
}

fn default_height() -> i32 {
    520
}

fn default_screen_width() -> i32 {
    1920
}

fn default_screen_height() -> i32 {
    1080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.width, 750);
        assert_eq!(config.height, 520);
        assert_eq!(config.headless.screen_width, 1920);
        assert_eq!(config.headless.screen_height, 1080);
        assert!(!config.headless.open_external);
        assert!(config.command_for_platform().is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            name = "demo"
            linux_cmd = "node main.js"
            mac_cmd = "node main.js"
            win_cmd = "node.exe main.js"

            [headless]
            screen_width = 1280
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "demo");
        assert_eq!(config.title, "Operator Shell");
        assert_eq!(config.headless.screen_width, 1280);
        assert_eq!(config.headless.screen_height, 1080);
        assert!(config.command_for_platform().is_some());
    }

    #[test]
    fn test_blank_command_is_absent() {
        let config = AppConfig {
            linux_cmd: Some("  ".to_string()),
            mac_cmd: Some(String::new()),
            win_cmd: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(config.command_for_platform().is_none());
    }
}
