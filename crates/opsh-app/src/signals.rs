//! OS signal handling for graceful shutdown

use std::sync::Arc;

use opsh_core::prelude::*;

use crate::shutdown::ShutdownCoordinator;

/// Exit code for SIGHUP
pub const SIGHUP: i32 = 1;

/// Exit code for SIGINT (and Ctrl-C on Windows)
pub const SIGINT: i32 = 2;

/// Install signal handlers and spawn the task that serves them.
///
/// The first termination signal becomes a shutdown request with the signal
/// number as exit code. A second one while teardown is still running exits
/// the process immediately with the recorded code.
///
/// Handlers are registered before this returns, so a signal sent right after
/// is never handled by the default disposition.
pub fn spawn_signal_handler(coordinator: Arc<ShutdownCoordinator>) -> Result<()> {
    let mut listener = SignalListener::new()?;

    tokio::spawn(async move {
        let Some(signum) = listener.next().await else {
            return;
        };
        info!("Shutdown signal received ({})", signum);
        coordinator.request(signum);

        if let Some(again) = listener.next().await {
            let code = coordinator.code();
            warn!("Second signal ({}) during shutdown, exiting with {}", again, code);
            std::process::exit(code);
        }
    });

    Ok(())
}

/// Registered termination signal streams
pub struct SignalListener {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sighup: tokio::signal::unix::Signal,
}

impl SignalListener {
    /// Register the handlers. Must be called inside the tokio runtime.
    pub fn new() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let sigint = signal(SignalKind::interrupt())
                .map_err(|e| Error::process(format!("Failed to create SIGINT handler: {}", e)))?;
            let sighup = signal(SignalKind::hangup())
                .map_err(|e| Error::process(format!("Failed to create SIGHUP handler: {}", e)))?;
            Ok(Self { sigint, sighup })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next termination signal and return its number.
    ///
    /// `None` when the signal source is gone.
    pub async fn next(&mut self) -> Option<i32> {
        #[cfg(unix)]
        {
            tokio::select! {
                received = self.sigint.recv() => received.map(|()| {
                    info!("Received SIGINT");
                    SIGINT
                }),
                received = self.sighup.recv() => received.map(|()| {
                    info!("Received SIGHUP");
                    SIGHUP
                }),
            }
        }

        #[cfg(windows)]
        {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C");
                    Some(SIGINT)
                }
                Err(e) => {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    None
                }
            }
        }

        #[cfg(not(any(unix, windows)))]
        {
            std::future::pending::<Option<i32>>().await
        }
    }
}
