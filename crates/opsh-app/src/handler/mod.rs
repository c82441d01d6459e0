//! Handler module - the two dispatch tables of the message router
//!
//! Organized into submodules:
//! - `backend`: lines the backend printed, applied to a window
//! - `surface`: lines a surface raised, handled locally or forwarded
//!
//! Handlers only touch window state. Anything that needs the backend process,
//! host stdout or the shutdown coordinator comes back as a [`RouterAction`]
//! for the engine to perform.

pub(crate) mod backend;
pub(crate) mod surface;


use crate::dispatch::RouterEvent;

pub use backend::route_backend;
pub use surface::route_surface;

/// Actions that the event loop should perform after routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Write a line to the backend's stdin
    ForwardToBackend(String),

    /// Kill the backend, wait for it, spawn a new one
    RestartBackend,

    /// Write text to the host's stdout
    WriteStdout(String),

    /// Request application shutdown with this exit code
    Shutdown(i32),
}

/// Result of routing one command
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RouteResult {
    /// Optional follow-up event to process before the next queued one
    pub message: Option<RouterEvent>,
    /// Optional action for the event loop to perform
    pub action: Option<RouterAction>,
}

impl RouteResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: RouterEvent) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: RouterAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    /// Feed `line` back in as if surface `index` had raised it
    pub fn reply(index: usize, line: String) -> Self {
        Self::message(RouterEvent::Surface { index, line })
    }

    /// Acknowledge `seq` through surface `index`, if there is a seq
    pub fn ack(index: usize, seq: Option<&str>) -> Self {
        match seq {
            Some(seq) => Self::reply(index, opsh_core::ipc::ack(seq)),
            None => Self::none(),
        }
    }
}
