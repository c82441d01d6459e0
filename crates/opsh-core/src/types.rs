//! Shared domain types

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one application run
///
/// `Starting → (CommandMode | GuiMode) → Running → ShuttingDown → Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    /// Arguments and configuration are being processed
    #[default]
    Starting,
    /// Forwarding a CLI invocation to the backend, no windows
    CommandMode,
    /// Windows are being constructed
    GuiMode,
    /// Backend and all windows are live
    Running,
    /// Teardown in progress
    ShuttingDown,
    /// Everything has been torn down
    Terminated,
}

impl AppPhase {
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, AppPhase::ShuttingDown | AppPhase::Terminated)
    }
}

/// Display metrics reported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Compact JSON object, e.g. `{"width":1920,"height":1080}`
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

impl WindowSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_size_json_shape() {
        let json = ScreenSize::new(1920, 1080).to_json().unwrap();
        assert_eq!(json, r#"{"width":1920,"height":1080}"#);
    }

    #[test]
    fn test_default_phase_is_starting() {
        assert_eq!(AppPhase::default(), AppPhase::Starting);
        assert!(!AppPhase::Running.is_shutting_down());
        assert!(AppPhase::ShuttingDown.is_shutting_down());
        assert!(AppPhase::Terminated.is_shutting_down());
    }
}
