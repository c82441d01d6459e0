//! The dispatch queue feeding the event loop
//!
//! Every producer (backend readers, surfaces, the host stdin bridge) enqueues
//! typed [`RouterEvent`]s; the engine is the only consumer. Per-producer order
//! is preserved by the channels.
//!
//! There are two lanes. Backend output goes through a bounded lane so a
//! chatty backend is slowed down instead of growing memory. Surface events
//! go through an unbounded lane: surfaces run on the event loop and cannot
//! wait, and a lost `resolve` or close would leave the other side hanging.

use tokio::sync::mpsc;

use opsh_core::prelude::*;
use opsh_core::{BackendEvent, WindowSize};

/// Capacity of the backend lane
pub const QUEUE_CAPACITY: usize = 256;

/// One unit of work for the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    /// Output or exit of the backend spawned as `generation`
    Backend {
        generation: u64,
        event: BackendEvent,
    },

    /// Protocol line raised by surface `index`
    Surface { index: usize, line: String },

    /// The user closed surface `index`
    SurfaceClosed { index: usize },

    /// The user resized surface `index`
    SurfaceResized { index: usize, size: WindowSize },
}

impl RouterEvent {
    /// Protocol line raised by a surface
    pub fn surface(index: usize, line: impl Into<String>) -> Self {
        RouterEvent::Surface {
            index,
            line: line.into(),
        }
    }
}

/// Create the dispatch queue
pub fn channel() -> (Dispatcher, EventQueue) {
    let (backend_tx, backend_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (surface_tx, surface_rx) = mpsc::unbounded_channel();
    (
        Dispatcher {
            backend: backend_tx,
            surface: surface_tx,
        },
        EventQueue {
            backend: backend_rx,
            surface: surface_rx,
            backend_done: false,
            surface_done: false,
        },
    )
}

/// Producer handle for the dispatch queue.
///
/// Sends after the event loop has stopped are dropped silently.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    backend: mpsc::Sender<RouterEvent>,
    surface: mpsc::UnboundedSender<RouterEvent>,
}

impl Dispatcher {
    /// Enqueue backend output, waiting for room in the backend lane
    pub async fn send_backend(&self, generation: u64, event: BackendEvent) -> bool {
        match self.backend.send(RouterEvent::Backend { generation, event }).await {
            Ok(()) => true,
            Err(_) => {
                trace!("Dispatch queue closed, dropping backend event");
                false
            }
        }
    }

    /// Enqueue a surface event. Never waits and never drops while the event
    /// loop is alive, so it is safe from plain threads and from the loop.
    pub fn push(&self, event: RouterEvent) -> bool {
        match self.surface.send(event) {
            Ok(()) => true,
            Err(_) => {
                trace!("Dispatch queue closed, dropping event");
                false
            }
        }
    }

    /// Report a protocol line from surface `index`
    pub fn message(&self, index: usize, line: impl Into<String>) -> bool {
        self.push(RouterEvent::surface(index, line))
    }

    /// Report that the user closed surface `index`
    pub fn closed(&self, index: usize) -> bool {
        self.push(RouterEvent::SurfaceClosed { index })
    }

    /// Report that the user resized surface `index`
    pub fn resized(&self, index: usize, size: WindowSize) -> bool {
        self.push(RouterEvent::SurfaceResized { index, size })
    }

    pub fn is_closed(&self) -> bool {
        self.surface.is_closed()
    }
}

/// Consumer end of both lanes
#[derive(Debug)]
pub struct EventQueue {
    backend: mpsc::Receiver<RouterEvent>,
    surface: mpsc::UnboundedReceiver<RouterEvent>,
    backend_done: bool,
    surface_done: bool,
}

impl EventQueue {
    /// Next event, surface lane first. `None` once both lanes are closed and
    /// drained. Cancel safe.
    pub async fn recv(&mut self) -> Option<RouterEvent> {
        loop {
            tokio::select! {
                biased;

                event = self.surface.recv(), if !self.surface_done => match event {
                    Some(event) => return Some(event),
                    None => self.surface_done = true,
                },

                event = self.backend.recv(), if !self.backend_done => match event {
                    Some(event) => return Some(event),
                    None => self.backend_done = true,
                },

                else => return None,
            }
        }
    }

    /// Next event if one is ready
    pub fn try_recv(&mut self) -> Option<RouterEvent> {
        self.surface
            .try_recv()
            .or_else(|_| self.backend.try_recv())
            .ok()
    }

    /// Refuse further sends; events already queued are dropped with the queue.
    pub fn close(&mut self) {
        self.surface.close();
        self.backend.close();
    }
}
