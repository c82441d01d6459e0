//! A surface with no window behind it

use opsh_app::external::{open_external, validate_external};
use opsh_app::{DialogRequest, Dispatcher, HeadlessSettings, Surface};
use opsh_core::prelude::*;
use opsh_core::{ipc, ScreenSize, WindowSize};

/// Reply text for dialogs, which need a native window
pub const NO_DIALOG: &str = "File dialogs are not available without a window";

/// Records what the backend asks of a window and answers what it must.
#[derive(Debug)]
pub struct HeadlessSurface {
    index: usize,
    screen: ScreenSize,
    open_external: bool,
    dispatcher: Dispatcher,
    title: String,
    url: Option<String>,
    size: WindowSize,
    visible: bool,
    closed: bool,
}

impl HeadlessSurface {
    pub fn new(index: usize, settings: &HeadlessSettings, dispatcher: Dispatcher) -> Self {
        Self {
            index,
            screen: ScreenSize::new(settings.screen_width, settings.screen_height),
            open_external: settings.open_external,
            dispatcher,
            title: String::new(),
            url: None,
            size: WindowSize::default(),
            visible: false,
            closed: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn size(&self) -> WindowSize {
        self.size
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Surface for HeadlessSurface {
    fn set_title(&mut self, title: &str) {
        debug!(index = self.index, "title: {}", title);
        self.title = title.to_string();
    }

    fn show(&mut self) {
        info!(index = self.index, "show");
        self.visible = true;
    }

    fn hide(&mut self) {
        info!(index = self.index, "hide");
        self.visible = false;
    }

    fn navigate(&mut self, url: &str) {
        info!(index = self.index, "navigate: {}", url);
        self.url = Some(url.to_string());
    }

    fn set_size(&mut self, size: WindowSize) {
        debug!(index = self.index, "size: {}x{}", size.width, size.height);
        self.size = size;
    }

    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn set_system_menu(&mut self, menu: &str) {
        debug!(index = self.index, "system menu: {}", menu);
    }

    fn set_context_menu(&mut self, seq: &str, menu: &str) {
        debug!(index = self.index, seq, "context menu: {}", menu);
    }

    fn open_external(&mut self, uri: &str) -> Result<()> {
        if self.open_external {
            return open_external(uri);
        }
        let url = validate_external(uri)?;
        info!(index = self.index, "external: {}", url);
        Ok(())
    }

    fn eval(&mut self, script: &str) {
        trace!(index = self.index, "eval: {}", script);
    }

    fn show_inspector(&mut self) {
        debug!(index = self.index, "inspector requested");
    }

    fn open_dialog(&mut self, request: DialogRequest) {
        info!(index = self.index, seq = %request.seq, "dialog: {}", request.title);
        self.dispatcher
            .message(self.index, ipc::reject(&request.seq, NO_DIALOG));
    }

    fn close(&mut self) {
        debug!(index = self.index, "close");
        self.visible = false;
        self.closed = true;
    }
}
