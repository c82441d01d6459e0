//! Surface → backend dispatch table

use opsh_core::prelude::*;
use opsh_core::{Command, Verb};

use super::backend::exit_code;
use super::{RouteResult, RouterAction};
use crate::window::{DialogRequest, WindowSet};

/// Handle one line raised by surface `source`.
///
/// A handful of verbs act on a window directly. The window is the command's
/// explicit `index` if it has one, otherwise the raising surface; `exit`
/// always acts on the raising surface. Everything else, malformed lines
/// included, is forwarded verbatim to the backend.
pub fn route_surface(
    windows: &mut WindowSet,
    source: usize,
    cmd: &Command,
    line: &str,
) -> RouteResult {
    let local = match cmd.verb() {
        Some(
            verb @ (Verb::Title
            | Verb::Exit
            | Verb::Hide
            | Verb::Inspect
            | Verb::External
            | Verb::Dialog
            | Verb::Context),
        ) => verb,
        _ => return RouteResult::action(RouterAction::ForwardToBackend(line.to_string())),
    };

    let index = if local == Verb::Exit || !cmd.has_explicit_index() {
        source
    } else {
        cmd.index()
    };

    let Some(window) = windows.get_mut(index) else {
        warn!(
            "Dropping '{}' from surface {}: no window {}",
            cmd.name(),
            source,
            index
        );
        return RouteResult::none();
    };

    match local {
        Verb::Title => window.set_title(&cmd.decoded("value")),
        Verb::Exit => {
            if let Some(code) = window.exit(exit_code(cmd)) {
                return RouteResult::action(RouterAction::Shutdown(code));
            }
        }
        Verb::Hide => window.hide(),
        Verb::Inspect => window.show_inspector(),
        Verb::External => {
            let uri = cmd.decoded("value");
            if let Err(e) = window.open_external(&uri) {
                warn!("Failed to open '{}': {}", uri, e);
            }
        }
        Verb::Dialog => window.open_dialog(dialog_request(cmd)),
        Verb::Context => {
            window.set_context_menu(cmd.get("seq"), &cmd.decoded("value"));
        }
        _ => {}
    }

    RouteResult::none()
}

fn dialog_request(cmd: &Command) -> DialogRequest {
    DialogRequest {
        seq: cmd.get("seq").to_string(),
        is_save: cmd.get("type") == "save",
        allow_dirs: cmd.get("allowDirs") == "true",
        allow_files: cmd.get("allowFiles") == "true",
        allow_multiple: cmd.get("allowMultiple") == "true",
        default_path: cmd.decoded("defaultPath"),
        title: cmd.decoded("title"),
        default_name: cmd.decoded("defaultName"),
    }
}
