//! Headless surfaces
//!
//! Operator Shell ships without a native webview. The headless factory stands
//! in for one: each window is a [`HeadlessSurface`] that records what the
//! backend asks of it in the log, and the main window reads its inbound
//! protocol lines from host stdin.

pub mod stdin;
pub mod surface;

use opsh_app::{Dispatcher, HeadlessSettings, Surface, SurfaceFactory, WindowOptions};
use opsh_core::prelude::*;

pub use surface::HeadlessSurface;

/// Creates [`HeadlessSurface`]s; the first one is fed from host stdin.
#[derive(Debug)]
pub struct HeadlessFactory {
    settings: HeadlessSettings,
}

impl HeadlessFactory {
    pub fn new(settings: HeadlessSettings) -> Self {
        Self { settings }
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(
        &mut self,
        options: &WindowOptions,
        dispatcher: Dispatcher,
    ) -> Result<Box<dyn Surface>> {
        if options.index == 0 {
            stdin::spawn_stdin_reader(options.index, dispatcher.clone())?;
        }
        Ok(Box::new(HeadlessSurface::new(
            options.index,
            &self.settings,
            dispatcher,
        )))
    }
}
