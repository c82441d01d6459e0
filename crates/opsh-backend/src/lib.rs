//! # opsh-backend - Backend Process Management
//!
//! Spawns and supervises the single backend child process that drives an
//! Operator Shell application over the line protocol.
//!
//! Depends on [`opsh_core`] for events and error handling.
//!
//! ## Public API
//!
//! ### Process Management
//! - [`BackendProcess`] - Spawn, feed, observe and kill the backend
//! - [`BackendLaunch`] - Command string and working directory of one launch
//!
//! ### Shell Utilities
//! - [`shell_command()`] - Run a command string through the platform shell
//! - [`check_program()`] - Pre-flight lookup of the backend program
//! - [`shell_quote()`] - Quote forwarded arguments for the platform shell

pub mod process;
pub mod shell;

pub use process::BackendProcess;
pub use shell::{check_program, program_of, shell_command, shell_quote, BackendLaunch};
