//! Operator Shell - runs a backend and routes its line protocol to windows
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use color_eyre::eyre::WrapErr;
use opsh_core::logging;

/// Operator Shell - control plane for a backend-driven application
#[derive(Parser, Debug)]
#[command(name = "opsh", version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Arguments forwarded to the backend (`help`/`version`/`--test` are recognized)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let program = std::env::args().next().unwrap_or_else(|| "opsh".to_string());
    let argv: Vec<String> = std::iter::once(program).chain(args.args).collect();

    let log_mode = operator_shell::log_mode(&argv);
    if let Err(e) = logging::init(log_mode) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let code = match operator_shell::run(argv).await {
        Ok(code) => code,
        Err(e) => {
            if let Ok(log) = logging::get_current_log_file(log_mode) {
                eprintln!("Log file: {}", log.display());
            }
            return Err(e).wrap_err("operator shell failed");
        }
    };

    std::process::exit(code)
}
