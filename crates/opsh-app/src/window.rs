//! Window entities and the `Surface` seam
//!
//! A [`Window`] is the shell's record of one presentation surface: its index,
//! title, size, visibility and whether it may end the application. The actual
//! rendering lives behind the [`Surface`] trait, implemented outside this crate.

use std::path::PathBuf;

use opsh_core::prelude::*;
use opsh_core::{ScreenSize, WindowSize};

use crate::dispatch::Dispatcher;

/// Native file dialog request raised by a surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogRequest {
    /// Correlation token for the reply
    pub seq: String,
    pub is_save: bool,
    pub allow_dirs: bool,
    pub allow_files: bool,
    pub allow_multiple: bool,
    pub default_path: String,
    pub title: String,
    pub default_name: String,
}

/// A presentation surface (webview window or stand-in).
///
/// Surfaces report inbound protocol lines, close requests and resizes through
/// the [`Dispatcher`] they were created with. All methods are called from the
/// single event-loop consumer.
pub trait Surface: Send {
    fn set_title(&mut self, title: &str);

    fn show(&mut self);

    fn hide(&mut self);

    fn navigate(&mut self, url: &str);

    fn set_size(&mut self, size: WindowSize);

    /// Metrics of the display the surface is on
    fn screen_size(&self) -> ScreenSize;

    fn set_system_menu(&mut self, menu: &str);

    fn set_context_menu(&mut self, seq: &str, menu: &str);

    /// Open a URI with the platform's default handler
    fn open_external(&mut self, uri: &str) -> Result<()>;

    /// Evaluate a script inside the surface
    fn eval(&mut self, script: &str);

    fn show_inspector(&mut self);

    /// Show a file dialog. The surface answers later with a `resolve` line.
    fn open_dialog(&mut self, request: DialogRequest);

    /// Destroy the native resources. Called once.
    fn close(&mut self);

    /// Whether the embedded webview failed to initialize
    fn webview_failed(&self) -> bool {
        false
    }
}

/// Creates surfaces for the windows the shell opens
pub trait SurfaceFactory {
    fn create(
        &mut self,
        options: &WindowOptions,
        dispatcher: Dispatcher,
    ) -> Result<Box<dyn Surface>>;
}

/// Construction options for one window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowOptions {
    pub index: usize,
    pub resizable: bool,
    pub frameless: bool,
    /// An `exit` reaching this window ends the application
    pub can_exit: bool,
    pub width: i32,
    pub height: i32,
    pub debug: bool,
    pub is_test: bool,
    pub forward_console: bool,
    /// Application directory
    pub cwd: PathBuf,
    pub executable: String,
    pub title: String,
    pub version: String,
    /// Quoted argv array, e.g. `'opsh', '--test'`
    pub argv: String,
    /// Forwarded environment, `KEY=value&KEY=value&`
    pub env: String,
}

/// Shell-side state of one surface
pub struct Window {
    index: usize,
    title: String,
    size: WindowSize,
    visible: bool,
    can_exit: bool,
    /// Latched when the exit callback has fired
    exiting: bool,
    killed: bool,
    surface: Box<dyn Surface>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("index", &self.index)
            .field("title", &self.title)
            .field("size", &self.size)
            .field("visible", &self.visible)
            .field("can_exit", &self.can_exit)
            .field("exiting", &self.exiting)
            .field("killed", &self.killed)
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Wrap a freshly created surface, applying the initial title and size.
    pub fn new(options: &WindowOptions, mut surface: Box<dyn Surface>) -> Self {
        let size = WindowSize::new(options.width, options.height);
        surface.set_title(&options.title);
        surface.set_size(size);

        Self {
            index: options.index,
            title: options.title.clone(),
            size,
            visible: false,
            can_exit: options.can_exit,
            exiting: false,
            killed: false,
            surface,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> WindowSize {
        self.size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn can_exit(&self) -> bool {
        self.can_exit
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.surface.set_title(title);
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.surface.show();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.surface.hide();
    }

    pub fn navigate(&mut self, url: &str) {
        self.surface.navigate(url);
    }

    pub fn set_size(&mut self, size: WindowSize) {
        self.size = size;
        self.surface.set_size(size);
    }

    /// Record a size change the user made; the surface already has it.
    pub fn record_size(&mut self, size: WindowSize) {
        self.size = size;
    }

    /// Record that the surface was hidden by the user.
    pub fn record_hidden(&mut self) {
        self.visible = false;
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.surface.screen_size()
    }

    pub fn set_system_menu(&mut self, menu: &str) {
        self.surface.set_system_menu(menu);
    }

    pub fn set_context_menu(&mut self, seq: &str, menu: &str) {
        self.surface.set_context_menu(seq, menu);
    }

    pub fn open_external(&mut self, uri: &str) -> Result<()> {
        self.surface.open_external(uri)
    }

    pub fn eval(&mut self, script: &str) {
        self.surface.eval(script);
    }

    pub fn show_inspector(&mut self) {
        self.surface.show_inspector();
    }

    pub fn open_dialog(&mut self, request: DialogRequest) {
        self.surface.open_dialog(request);
    }

    pub fn webview_failed(&self) -> bool {
        self.surface.webview_failed()
    }

    /// Ask this window to end the application with `code`.
    ///
    /// Returns the code to shut down with the first time it is called on a
    /// `can_exit` window. Any other window just hides.
    pub fn exit(&mut self, code: i32) -> Option<i32> {
        if !self.can_exit {
            debug!("Window {} cannot exit the app, hiding instead", self.index);
            self.hide();
            return None;
        }
        if self.exiting {
            debug!("Window {} already exiting", self.index);
            return None;
        }
        self.exiting = true;
        Some(code)
    }

    /// Destroy the surface. Safe to call more than once.
    pub fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        self.visible = false;
        debug!("Closing window {}", self.index);
        self.surface.close();
    }
}

/// All windows owned by the event loop, addressed by index
#[derive(Debug, Default)]
pub struct WindowSet {
    windows: Vec<Window>,
}

impl WindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window. Indices are positional, so windows must be pushed in
    /// index order.
    pub fn push(&mut self, window: Window) {
        debug_assert_eq!(window.index(), self.windows.len());
        self.windows.push(window);
    }

    pub fn get(&self, index: usize) -> Option<&Window> {
        self.windows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Window> {
        self.windows.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    /// Close every window, in index order
    pub fn kill_all(&mut self) {
        for window in &mut self.windows {
            window.kill();
        }
    }
}
