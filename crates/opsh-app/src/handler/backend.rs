//! Backend → surface dispatch table

use opsh_core::ipc;
use opsh_core::prelude::*;
use opsh_core::{encode_uri_component, parse_int, Command, Verb, WindowSize};

use super::{RouteResult, RouterAction};
use crate::window::{Window, WindowSet};

/// Apply one line the backend printed.
///
/// The target window is `cmd.index()`. Commands for a window that does not
/// exist are dropped, except `restart` and `stdout`, which need none.
/// Replies (`seq` acknowledgements, screen metrics) come back as a follow-up
/// message raised by the target window, so they reach the backend through
/// the surface table like any other surface output.
///
/// Returns `Err` only for a malformed `size`; the caller logs it and moves on.
pub fn route_backend(windows: &mut WindowSet, cmd: &Command) -> Result<RouteResult> {
    let Some(verb) = cmd.verb() else {
        if !cmd.is_empty() {
            trace!("Ignoring unknown backend command '{}'", cmd.name());
        }
        return Ok(RouteResult::none());
    };

    match verb {
        Verb::Restart => return Ok(RouteResult::action(RouterAction::RestartBackend)),
        Verb::Stdout => {
            return Ok(RouteResult::action(RouterAction::WriteStdout(
                cmd.decoded("value"),
            )))
        }
        Verb::Dialog | Verb::Context | Verb::Inspect => {
            trace!("'{}' is not a backend command, ignoring", cmd.name());
            return Ok(RouteResult::none());
        }
        _ => {}
    }

    let index = cmd.index();
    let Some(window) = windows.get_mut(index) else {
        warn!(
            "Dropping '{}' for window {}: no such window",
            cmd.name(),
            index
        );
        return Ok(RouteResult::none());
    };

    let seq = cmd.seq();

    let result = match verb {
        Verb::Title => {
            window.set_title(&cmd.decoded("value"));
            RouteResult::ack(index, seq)
        }
        Verb::Show => {
            window.show();
            RouteResult::ack(index, seq)
        }
        Verb::Hide => {
            window.hide();
            RouteResult::ack(index, seq)
        }
        Verb::Navigate => {
            window.navigate(&cmd.decoded("value"));
            RouteResult::ack(index, seq)
        }
        Verb::Size => {
            let width = parse_int("width", cmd.get("width"))?;
            let height = parse_int("height", cmd.get("height"))?;
            window.set_size(WindowSize::new(width, height));
            RouteResult::ack(index, seq)
        }
        Verb::GetScreenSize => screen_size(window, seq)?,
        Verb::Menu => {
            window.set_system_menu(&cmd.decoded("value"));
            RouteResult::ack(index, seq)
        }
        Verb::External => external(window, cmd, seq),
        Verb::Exit => {
            let code = exit_code(cmd);
            match window.exit(code) {
                Some(code) => RouteResult::action(RouterAction::Shutdown(code)),
                None => RouteResult::ack(index, seq),
            }
        }
        Verb::Resolve => {
            window.eval(&ipc::resolve_to_surface(
                cmd.get("seq"),
                cmd.get("state"),
                cmd.value(),
            ));
            RouteResult::none()
        }
        Verb::Send => {
            window.eval(&ipc::emit_to_surface(&cmd.decoded("event"), cmd.value()));
            RouteResult::none()
        }
        Verb::Restart | Verb::Stdout | Verb::Dialog | Verb::Context | Verb::Inspect => {
            RouteResult::none()
        }
    };

    Ok(result)
}

/// `{"width":W,"height":H}`, encoded, resolved through the window
fn screen_size(window: &Window, seq: Option<&str>) -> Result<RouteResult> {
    let json = window.screen_size().to_json()?;
    let seq = seq.unwrap_or_default();
    Ok(RouteResult::reply(
        window.index(),
        ipc::resolve_to_backend(seq, ipc::STATE_OK, &encode_uri_component(&json)),
    ))
}

fn external(window: &mut Window, cmd: &Command, seq: Option<&str>) -> RouteResult {
    let uri = cmd.decoded("value");
    match window.open_external(&uri) {
        Ok(()) => RouteResult::ack(window.index(), seq),
        Err(e) => {
            warn!("Failed to open '{}': {}", uri, e);
            match seq {
                Some(seq) => RouteResult::reply(window.index(), ipc::reject(seq, &e.to_string())),
                None => RouteResult::none(),
            }
        }
    }
}

/// Exit code carried by an `exit` command; 0 when missing or not a number.
pub(crate) fn exit_code(cmd: &Command) -> i32 {
    parse_int("value", &cmd.decoded("value")).unwrap_or_else(|e| {
        debug!("{}, exiting with 0", e);
        0
    })
}
