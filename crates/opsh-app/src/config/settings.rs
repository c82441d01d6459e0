//! Loading `opsh.toml`

use std::path::{Path, PathBuf};

use opsh_core::prelude::*;

use super::types::AppConfig;

/// Config file name looked up in the application and current directories
pub const CONFIG_FILENAME: &str = "opsh.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "OPSH_CONFIG";

/// Locate the config file.
///
/// Order: `$OPSH_CONFIG`, then `<app_dir>/opsh.toml`, then
/// `<current_dir>/opsh.toml`. An `$OPSH_CONFIG` pointing nowhere is logged
/// and skipped.
pub fn find_config_file(app_dir: &Path, current_dir: &Path) -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(explicit);
        if path.is_file() {
            return Some(path);
        }
        warn!("{}", Error::ConfigNotFound { path });
    }

    [app_dir, current_dir]
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|path| path.is_file())
}

/// Parse one config file
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load settings, falling back to defaults when there is no usable file.
pub fn load_config(app_dir: &Path, current_dir: &Path) -> AppConfig {
    let Some(config_path) = find_config_file(app_dir, current_dir) else {
        debug!("No {} found, using defaults", CONFIG_FILENAME);
        return AppConfig::default();
    };

    match load_config_from(&config_path) {
        Ok(config) => {
            debug!("Loaded settings from {:?}", config_path);
            config
        }
        Err(e) => {
            warn!("{}", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_load_from_app_dir() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let app = tempdir().unwrap();
        let cwd = tempdir().unwrap();
        std::fs::write(app.path().join(CONFIG_FILENAME), "name = \"from-app\"\n").unwrap();
        std::fs::write(cwd.path().join(CONFIG_FILENAME), "name = \"from-cwd\"\n").unwrap();

        let config = load_config(app.path(), cwd.path());
        assert_eq!(config.name, "from-app");
    }

    #[test]
    #[serial]
    fn test_falls_back_to_current_dir() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let app = tempdir().unwrap();
        let cwd = tempdir().unwrap();
        std::fs::write(cwd.path().join(CONFIG_FILENAME), "name = \"from-cwd\"\n").unwrap();

        let config = load_config(app.path(), cwd.path());
        assert_eq!(config.name, "from-cwd");
    }

    #[test]
    #[serial]
    fn test_env_var_takes_precedence() {
        let app = tempdir().unwrap();
        let other = tempdir().unwrap();
        let explicit = other.path().join("custom.toml");
        std::fs::write(&explicit, "name = \"explicit\"\n").unwrap();
        std::fs::write(app.path().join(CONFIG_FILENAME), "name = \"from-app\"\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &explicit);
        let config = load_config(app.path(), app.path());
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.name, "explicit");
    }

    #[test]
    #[serial]
    fn test_missing_env_file_is_skipped() {
        let app = tempdir().unwrap();
        std::fs::write(app.path().join(CONFIG_FILENAME), "name = \"from-app\"\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, app.path().join("nope.toml"));
        let found = find_config_file(app.path(), app.path());
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(found, Some(app.path().join(CONFIG_FILENAME)));
    }

    #[test]
    #[serial]
    fn test_invalid_file_uses_defaults() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let app = tempdir().unwrap();
        std::fs::write(app.path().join(CONFIG_FILENAME), "width = \"wide\"\n").unwrap();

        let config = load_config(app.path(), app.path());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[[[").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    #[serial]
    fn test_no_file_uses_defaults() {
        std::env::remove_var(CONFIG_ENV_VAR);
        let app = tempdir().unwrap();

        assert_eq!(load_config(app.path(), app.path()), AppConfig::default());
    }
}
