//! Engine - the single event-loop consumer for GUI mode
//!
//! The Engine owns every window and the backend process. All mutation of
//! either happens here, one [`RouterEvent`] at a time, so the routers never
//! race with each other or with teardown.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use opsh_backend::{BackendLaunch, BackendProcess};
use opsh_core::prelude::*;
use opsh_core::{AppPhase, BackendEvent, Command};

use crate::dispatch::{Dispatcher, EventQueue, RouterEvent, QUEUE_CAPACITY};
use crate::handler::{route_backend, route_surface, RouteResult, RouterAction};
use crate::shutdown::{ShutdownCoordinator, ShutdownTarget};
use crate::window::WindowSet;

/// How long `restart` waits for the old backend before spawning the new one
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(5);

/// How long teardown waits for the backend to be reaped
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestration engine for a GUI run.
///
/// Owns:
/// - the windows and their surfaces
/// - the backend process and its generation counter
/// - the receiving end of the dispatch queue
/// - host stdout, for the `stdout` command
pub struct Engine {
    /// Lifecycle phase of this run
    pub phase: AppPhase,

    windows: WindowSet,

    /// How to (re)start the backend
    launch: BackendLaunch,

    backend: Option<BackendProcess>,

    /// Incremented on every spawn; events from older spawns are dropped
    generation: u64,

    /// Producer handle, cloned into backend forwarding tasks
    dispatcher: Dispatcher,

    /// Consumer end of the dispatch queue
    events: EventQueue,

    coordinator: Arc<ShutdownCoordinator>,

    stdout: Box<dyn Write + Send>,
}

impl Engine {
    pub fn new(
        windows: WindowSet,
        launch: BackendLaunch,
        dispatcher: Dispatcher,
        events: EventQueue,
        coordinator: Arc<ShutdownCoordinator>,
    ) -> Self {
        Self {
            phase: AppPhase::GuiMode,
            windows,
            launch,
            backend: None,
            generation: 0,
            dispatcher,
            events,
            coordinator,
            stdout: Box::new(std::io::stdout()),
        }
    }

    /// Send `stdout` command output somewhere other than host stdout.
    pub fn with_stdout(mut self, out: impl Write + Send + 'static) -> Self {
        self.stdout = Box::new(out);
        self
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Generation of the current (or last) backend; 0 before the first spawn
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn backend_pid(&self) -> Option<u32> {
        self.backend.as_ref().and_then(BackendProcess::id)
    }

    /// Spawn the backend as a new generation.
    ///
    /// Its events are tagged with the generation and forwarded into the
    /// dispatch queue in the order they were read.
    pub fn start_backend(&mut self) -> Result<()> {
        let generation = self.generation + 1;
        let (tx, mut rx) = mpsc::channel::<BackendEvent>(QUEUE_CAPACITY);

        let process = BackendProcess::spawn(&self.launch, tx)?;
        self.generation = generation;

        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !dispatcher.send_backend(generation, event).await {
                    break;
                }
            }
            debug!("Backend generation {} forwarder finished", generation);
        });

        info!(
            "Backend generation {} running (pid {:?})",
            generation,
            process.id()
        );
        self.backend = Some(process);
        Ok(())
    }

    /// Run until shutdown is requested, then tear everything down.
    ///
    /// Returns the exit code.
    pub async fn run(&mut self) -> i32 {
        self.phase = AppPhase::Running;
        let coordinator = Arc::clone(&self.coordinator);

        loop {
            tokio::select! {
                biased;

                _ = coordinator.requested() => break,

                event = self.events.recv() => match event {
                    Some(event) => self.process_event(event).await,
                    None => {
                        info!("Dispatch queue closed");
                        coordinator.request(0);
                        break;
                    }
                },
            }
        }

        self.shutdown().await
    }

    /// Tear down backend, windows and event loop. Idempotent.
    pub async fn shutdown(&mut self) -> i32 {
        self.phase = AppPhase::ShuttingDown;
        let coordinator = Arc::clone(&self.coordinator);
        let code = coordinator.teardown(self).await;
        self.phase = AppPhase::Terminated;
        info!("Exiting with code {}", code);
        code
    }

    /// Process one event and every follow-up it produces.
    pub async fn process_event(&mut self, event: RouterEvent) {
        let mut next = Some(event);
        while let Some(event) = next.take() {
            if self.coordinator.is_requested() {
                debug!("Shutdown requested, dropping {:?}", event);
                break;
            }
            next = self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: RouterEvent) -> Option<RouterEvent> {
        match event {
            RouterEvent::Backend { generation, event } if generation != self.generation => {
                trace!(
                    "Dropping {} from stale backend generation {}",
                    event.kind(),
                    generation
                );
                None
            }
            RouterEvent::Backend { event, .. } => self.handle_backend_event(event).await,
            RouterEvent::Surface { index, line } => {
                let cmd = Command::parse(&line);
                let result = route_surface(&mut self.windows, index, &cmd, &line);
                self.apply(result).await
            }
            RouterEvent::SurfaceClosed { index } => {
                self.handle_surface_closed(index);
                None
            }
            RouterEvent::SurfaceResized { index, size } => {
                if let Some(window) = self.windows.get_mut(index) {
                    window.record_size(size);
                }
                None
            }
        }
    }

    async fn handle_backend_event(&mut self, event: BackendEvent) -> Option<RouterEvent> {
        match event {
            BackendEvent::Stdout(line) => {
                let cmd = Command::parse(&line);
                match route_backend(&mut self.windows, &cmd) {
                    Ok(result) => self.apply(result).await,
                    Err(e) => {
                        warn!("Ignoring '{}': {}", line, e);
                        None
                    }
                }
            }
            BackendEvent::Stderr(line) => {
                eprintln!("{}", line);
                None
            }
            BackendEvent::Exited { code } => {
                warn!("Backend exited on its own ({:?}), windows stay open", code);
                self.backend = None;
                None
            }
        }
    }

    fn handle_surface_closed(&mut self, index: usize) {
        let Some(window) = self.windows.get_mut(index) else {
            return;
        };
        if window.can_exit() {
            info!("Window {} closed by the user", index);
            self.coordinator.request(0);
        } else {
            window.record_hidden();
        }
    }

    /// Perform the action of a route result and hand back its follow-up.
    async fn apply(&mut self, result: RouteResult) -> Option<RouterEvent> {
        if let Some(action) = result.action {
            self.perform(action).await;
        }
        result.message
    }

    async fn perform(&mut self, action: RouterAction) {
        match action {
            RouterAction::ForwardToBackend(line) => self.forward_to_backend(&line).await,
            RouterAction::RestartBackend => self.restart_backend().await,
            RouterAction::WriteStdout(text) => self.write_stdout(&text),
            RouterAction::Shutdown(code) => {
                self.coordinator.request(code);
            }
        }
    }

    /// Write a line to backend stdin.
    ///
    /// A backend that stops reading its stdin makes this wait; a shutdown
    /// request abandons the write so the loop can tear down.
    async fn forward_to_backend(&mut self, line: &str) {
        let Some(backend) = &self.backend else {
            warn!("No backend running, dropping '{}'", line);
            return;
        };

        let coordinator = Arc::clone(&self.coordinator);
        tokio::select! {
            biased;

            _ = coordinator.requested() => {
                debug!("Shutdown requested, abandoning write of '{}'", line);
            }
            result = backend.write(line) => {
                if let Err(e) = result {
                    warn!("Failed to forward to backend: {}", e);
                }
            }
        }
    }

    /// Kill the backend, wait for it, then spawn the next generation.
    async fn restart_backend(&mut self) {
        info!("Restarting backend");
        if let Some(mut old) = self.backend.take() {
            old.terminate(RESTART_TIMEOUT).await;
        }
        if let Err(e) = self.start_backend() {
            error!("Failed to restart backend: {}", e);
            self.coordinator.request(1);
        }
    }

    fn write_stdout(&mut self, text: &str) {
        let result = writeln!(self.stdout, "{}", text).and_then(|()| self.stdout.flush());
        if let Err(e) = result {
            warn!("Failed to write to stdout: {}", e);
        }
    }
}

impl ShutdownTarget for Engine {
    async fn kill_backend(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.terminate(TEARDOWN_TIMEOUT).await;
        }
    }

    fn kill_windows(&mut self) {
        self.windows.kill_all();
    }

    fn kill_shell(&mut self) {
        // Later sends fail, queued events are dropped with the receiver
        self.events.close();
    }
}
