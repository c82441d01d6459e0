//! # opsh-core - Core Protocol Types
//!
//! Foundation crate for Operator Shell. Provides the line protocol parser,
//! field encoding, reply builders, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing, percent-encoding).
//!
//! ## Public API
//!
//! ### Protocol (`command`, `encoding`, `ipc`)
//! - [`Command`] - One parsed protocol line (verb, target index, fields)
//! - [`Verb`] - Closed set of verbs the routers dispatch on
//! - [`encode_uri_component()`] / [`decode_uri_component()`] - Field value encoding
//! - [`ipc`] - Reply lines for the backend and scripts for surfaces
//!
//! ### Domain Types (`types`, `events`)
//! - [`AppPhase`] - Lifecycle phase of one application run
//! - [`ScreenSize`], [`WindowSize`] - Surface metrics
//! - [`BackendEvent`] - Backend stdout/stderr/exit events
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use opsh_core::prelude::*;
//! ```

pub mod command;
pub mod encoding;
pub mod error;
pub mod events;
pub mod ipc;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Operator Shell crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use command::{parse_int, Command, Verb};
pub use encoding::{decode_uri_component, encode_uri_component};
pub use error::{Error, Result, ResultExt};
pub use events::BackendEvent;
pub use types::{AppPhase, ScreenSize, WindowSize};
