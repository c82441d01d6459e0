//! Events produced by the backend process supervisor

/// Events from the backend process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Complete stdout line (terminator stripped)
    Stdout(String),

    /// Complete stderr line (terminator stripped)
    Stderr(String),

    /// Backend process has exited; `None` when killed by a signal
    Exited { code: Option<i32> },
}

impl BackendEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            BackendEvent::Stdout(_) => "Stdout",
            BackendEvent::Stderr(_) => "Stderr",
            BackendEvent::Exited { .. } => "Exited",
        }
    }
}
