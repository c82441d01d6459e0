//! Shutdown coordination
//!
//! Every way the application can end (a signal, `exit` reaching a window
//! that may exit, the main surface being closed, command-mode `exit`) goes
//! through one [`ShutdownCoordinator`]. The first request wins and fixes the
//! exit code; teardown then runs exactly once, in a fixed order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

use opsh_core::prelude::*;

/// Owner of the resources torn down at shutdown.
///
/// Teardown order is always backend, then windows, then the shell itself.
#[trait_variant::make(ShutdownTarget: Send)]
pub trait LocalShutdownTarget {
    /// Kill the backend process and wait for it to be reaped
    async fn kill_backend(&mut self);

    /// Destroy every window
    fn kill_windows(&mut self);

    /// Stop the event loop
    fn kill_shell(&mut self);
}

/// Shared, once-only shutdown latch
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    /// Exit code of the winning request
    code: OnceLock<i32>,
    torn_down: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request shutdown with `code`.
    ///
    /// Returns `true` for the request that wins. Later requests are ignored
    /// and do not change the exit code.
    pub fn request(&self, code: i32) -> bool {
        if self.code.set(code).is_err() {
            debug!("Shutdown already requested, ignoring code {}", code);
            return false;
        }

        info!("Shutdown requested with exit code {}", code);
        self.notify.notify_waiters();
        true
    }

    pub fn is_requested(&self) -> bool {
        self.code.get().is_some()
    }

    /// Exit code of the winning request (0 before any request)
    pub fn code(&self) -> i32 {
        self.code.get().copied().unwrap_or(0)
    }

    /// Resolve once shutdown has been requested.
    ///
    /// Any number of waiters may race this against other work; all of them
    /// wake on the winning request.
    pub async fn requested(&self) -> i32 {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a request in between is not missed
            notified.as_mut().enable();
            if self.is_requested() {
                return self.code();
            }
            notified.await;
        }
    }

    /// Tear `target` down and return the exit code.
    ///
    /// Runs at most once; a second call returns the code without touching
    /// the target. A teardown without a prior request counts as a request
    /// with code 0.
    pub async fn teardown<T: ShutdownTarget>(&self, target: &mut T) -> i32 {
        self.request(0);

        if self.torn_down.swap(true, Ordering::AcqRel) {
            debug!("Teardown already done");
            return self.code();
        }

        info!("Tearing down: backend");
        target.kill_backend().await;
        info!("Tearing down: windows");
        target.kill_windows();
        info!("Tearing down: shell");
        target.kill_shell();

        self.code()
    }
}
