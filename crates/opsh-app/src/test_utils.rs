//! Test doubles for surfaces and host output.
//!
//! Available to this crate's unit tests and, through the `test-helpers`
//! feature, to integration tests of dependent crates.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use opsh_core::prelude::*;
use opsh_core::{ScreenSize, WindowSize};

use crate::dispatch::Dispatcher;
use crate::window::{DialogRequest, Surface, SurfaceFactory, WindowOptions};

/// Shared record of the calls made on a [`RecordingSurface`]
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl SurfaceLog {
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: String) {
        self.lock().push(call);
    }

    /// Every call, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// Number of calls exactly equal to `call`
    pub fn count(&self, call: &str) -> usize {
        self.lock().iter().filter(|c| *c == call).count()
    }

    /// Calls starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Surface that records every call as a short string
#[derive(Debug)]
pub struct RecordingSurface {
    log: SurfaceLog,
    screen: ScreenSize,
    external_error: Option<String>,
    webview_failed: bool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            log: SurfaceLog::default(),
            screen: ScreenSize::new(1920, 1080),
            external_error: None,
            webview_failed: false,
        }
    }

    pub fn with_screen(mut self, screen: ScreenSize) -> Self {
        self.screen = screen;
        self
    }

    /// Make `open_external` fail with `message`
    pub fn failing_external(mut self, message: &str) -> Self {
        self.external_error = Some(message.to_string());
        self
    }

    pub fn with_webview_failed(mut self) -> Self {
        self.webview_failed = true;
        self
    }

    /// Handle on the call log that outlives the boxed surface
    pub fn log(&self) -> SurfaceLog {
        self.log.clone()
    }
}

impl Surface for RecordingSurface {
    fn set_title(&mut self, title: &str) {
        self.log.push(format!("set_title {}", title));
    }

    fn show(&mut self) {
        self.log.push("show".to_string());
    }

    fn hide(&mut self) {
        self.log.push("hide".to_string());
    }

    fn navigate(&mut self, url: &str) {
        self.log.push(format!("navigate {}", url));
    }

    fn set_size(&mut self, size: WindowSize) {
        self.log
            .push(format!("set_size {}x{}", size.width, size.height));
    }

    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn set_system_menu(&mut self, menu: &str) {
        self.log.push(format!("set_system_menu {}", menu));
    }

    fn set_context_menu(&mut self, seq: &str, menu: &str) {
        self.log.push(format!("set_context_menu {} {}", seq, menu));
    }

    fn open_external(&mut self, uri: &str) -> Result<()> {
        self.log.push(format!("open_external {}", uri));
        match &self.external_error {
            Some(message) => Err(Error::surface(message.clone())),
            None => Ok(()),
        }
    }

    fn eval(&mut self, script: &str) {
        self.log.push(format!("eval {}", script));
    }

    fn show_inspector(&mut self) {
        self.log.push("show_inspector".to_string());
    }

    fn open_dialog(&mut self, request: DialogRequest) {
        self.log.push(format!(
            "open_dialog seq={} save={} dirs={} files={} multiple={} path={} title={} name={}",
            request.seq,
            request.is_save,
            request.allow_dirs,
            request.allow_files,
            request.allow_multiple,
            request.default_path,
            request.title,
            request.default_name
        ));
    }

    fn close(&mut self) {
        self.log.push("close".to_string());
    }

    fn webview_failed(&self) -> bool {
        self.webview_failed
    }
}

/// Factory producing [`RecordingSurface`]s and keeping their logs and
/// dispatchers, in creation order.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    pub logs: Vec<SurfaceLog>,
    pub dispatchers: Vec<Dispatcher>,
    pub options: Vec<WindowOptions>,
    /// Surface 0 reports a failed webview
    pub webview_failed: bool,
}

impl SurfaceFactory for RecordingFactory {
    fn create(
        &mut self,
        options: &WindowOptions,
        dispatcher: Dispatcher,
    ) -> Result<Box<dyn Surface>> {
        let mut surface = RecordingSurface::new();
        if self.webview_failed && options.index == 0 {
            surface = surface.with_webview_failed();
        }
        self.logs.push(surface.log());
        self.dispatchers.push(dispatcher);
        self.options.push(options.clone());
        Ok(Box::new(surface))
    }
}

/// In-memory host stdout
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
