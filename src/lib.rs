//! Operator Shell
//!
//! A control plane that runs a backend program as a child process and routes
//! a line protocol between it and the windows it drives. The routing and
//! lifecycle live in `opsh-app`; this crate wires them to the host process.

pub mod headless;

use opsh_app::config::load_config;
use opsh_app::launch::{apply_identity, backend_launch};
use opsh_app::{run_command_mode, run_gui, signals, Invocation, LaunchContext, ShutdownCoordinator};
use opsh_core::logging::LogMode;
use opsh_core::prelude::*;

use headless::HeadlessFactory;

/// Log file family for the run `argv` asks for
pub fn log_mode(argv: &[String]) -> LogMode {
    if Invocation::analyze(argv).is_command_mode() {
        LogMode::Command
    } else {
        LogMode::Gui
    }
}

/// Run the shell for the raw command line `argv`; returns the exit code.
pub async fn run(argv: Vec<String>) -> Result<i32> {
    let context = LaunchContext::detect();
    let invocation = Invocation::analyze(&argv);
    let mut config = load_config(&context.app_dir, &context.current_dir);
    apply_identity(&mut config, &invocation, context.debug);
    info!(
        "{} {} starting ({:?})",
        config.name, config.version, invocation.mode
    );

    let coordinator = ShutdownCoordinator::new();
    signals::spawn_signal_handler(coordinator.clone())?;

    if invocation.is_command_mode() {
        let launch = backend_launch(&config, &invocation, &context, false)?;
        return run_command_mode(&launch, coordinator, std::io::stdout()).await;
    }

    let mut factory = HeadlessFactory::new(config.headless.clone());
    run_gui(&config, &invocation, &context, &mut factory, coordinator).await
}
