//! opsh-app - Message routing and lifecycle orchestration for Operator Shell
//!
//! This crate owns the window entities, the two dispatch tables of the message
//! router, the dispatch queue, shutdown coordination, configuration loading
//! and the GUI and command-mode runners. Platform windows are plugged in
//! through the [`Surface`] trait.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod external;
pub mod handler;
pub mod launch;
pub mod runner;
pub mod shutdown;
pub mod signals;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod window;

// Re-export primary types
pub use config::{load_config, AppConfig, HeadlessSettings};
pub use dispatch::{Dispatcher, EventQueue, RouterEvent};
pub use engine::Engine;
pub use handler::{route_backend, route_surface, RouteResult, RouterAction};
pub use launch::{Invocation, LaunchContext, RunMode};
pub use runner::{run_command_mode, run_gui};
pub use shutdown::{LocalShutdownTarget, ShutdownCoordinator, ShutdownTarget};
pub use window::{DialogRequest, Surface, SurfaceFactory, Window, WindowOptions, WindowSet};
