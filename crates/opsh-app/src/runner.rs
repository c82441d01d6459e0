//! Entry points for the two run modes
//!
//! - [`run_gui`] builds the windows, spawns the backend and hands both to the
//!   [`Engine`].
//! - [`run_command_mode`] forwards a CLI invocation to the backend with no
//!   windows, echoing its output to the host.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;

use opsh_backend::{BackendLaunch, BackendProcess};
use opsh_core::prelude::*;
use opsh_core::{AppPhase, BackendEvent, Command, Verb};

use crate::config::AppConfig;
use crate::dispatch::{self, QUEUE_CAPACITY};
use crate::engine::{Engine, TEARDOWN_TIMEOUT};
use crate::handler::backend::exit_code;
use crate::launch::{backend_launch, window_options, Invocation, LaunchContext};
use crate::shutdown::{ShutdownCoordinator, ShutdownTarget};
use crate::window::{SurfaceFactory, Window, WindowSet};

/// Run with windows until shutdown; returns the exit code.
pub async fn run_gui<F: SurfaceFactory>(
    config: &AppConfig,
    invocation: &Invocation,
    context: &LaunchContext,
    factory: &mut F,
    coordinator: Arc<ShutdownCoordinator>,
) -> Result<i32> {
    info!("Starting {} in GUI mode", config.title);

    let (dispatcher, events) = dispatch::channel();
    let mut windows = WindowSet::new();

    let [main_options, secondary_options] = window_options(config, invocation, context);
    let main = factory.create(&main_options, dispatcher.clone())?;
    let webview_failed = main.webview_failed();
    if webview_failed {
        warn!("Main surface reports a failed webview");
    }
    windows.push(Window::new(&main_options, main));

    let launch = match factory
        .create(&secondary_options, dispatcher.clone())
        .and_then(|secondary| {
            windows.push(Window::new(&secondary_options, secondary));
            backend_launch(config, invocation, context, webview_failed)
        }) {
        Ok(launch) => launch,
        Err(e) => {
            windows.kill_all();
            return Err(e);
        }
    };

    let mut engine = Engine::new(windows, launch, dispatcher, events, coordinator);
    if let Err(e) = engine.start_backend() {
        error!("Failed to start backend: {}", e);
        engine.shutdown().await;
        return Err(e);
    }

    Ok(engine.run().await)
}

/// Forward a CLI invocation to the backend; returns the exit code.
///
/// Backend stdout lines are echoed decoded to `out` until the backend sends
/// `exit value=N` or exits on its own. Stderr passes through to host stderr.
pub async fn run_command_mode<W: Write + Send>(
    launch: &BackendLaunch,
    coordinator: Arc<ShutdownCoordinator>,
    out: W,
) -> Result<i32> {
    let (tx, mut events) = mpsc::channel::<BackendEvent>(QUEUE_CAPACITY);
    let backend = BackendProcess::spawn(launch, tx)?;

    let mut session = CommandSession {
        phase: AppPhase::CommandMode,
        backend: Some(backend),
        out,
    };

    session.phase = AppPhase::Running;
    loop {
        tokio::select! {
            biased;

            _ = coordinator.requested() => break,

            event = events.recv() => match event {
                Some(BackendEvent::Stdout(line)) => session.stdout_line(&line, &coordinator),
                Some(BackendEvent::Stderr(line)) => eprintln!("{}", line),
                Some(BackendEvent::Exited { code }) => {
                    info!("Backend exited with {:?}", code);
                    coordinator.request(code.unwrap_or(0));
                }
                None => {
                    coordinator.request(0);
                }
            },
        }
    }

    session.phase = AppPhase::ShuttingDown;
    let code = coordinator.teardown(&mut session).await;
    session.phase = AppPhase::Terminated;
    Ok(code)
}

/// Resources of a command-mode run
struct CommandSession<W> {
    phase: AppPhase,
    backend: Option<BackendProcess>,
    out: W,
}

impl<W: Write> CommandSession<W> {
    fn stdout_line(&mut self, line: &str, coordinator: &ShutdownCoordinator) {
        let cmd = Command::parse(line);
        if cmd.verb() == Some(Verb::Exit) {
            coordinator.request(exit_code(&cmd));
            return;
        }

        let text = if cmd.has("value") {
            cmd.decoded("value")
        } else {
            line.to_string()
        };
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|()| self.out.flush()) {
            warn!("Failed to write to stdout: {}", e);
        }
    }
}

impl<W: Write + Send> ShutdownTarget for CommandSession<W> {
    async fn kill_backend(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.terminate(TEARDOWN_TIMEOUT).await;
        }
    }

    fn kill_windows(&mut self) {
        trace!("No windows in {:?}", self.phase);
    }

    fn kill_shell(&mut self) {
        let _ = self.out.flush();
    }
}
