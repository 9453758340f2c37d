//! State shared between a [`SpriteEngine`](crate::engine::SpriteEngine) and
//! its simulation worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;

use crate::events::sprite::SpriteEvent;
use crate::resources::registry::SpriteRegistry;

/// Lifecycle of the simulation loop.
///
/// `Stopped -> Running <-> Paused`; any state may go to `Closed`, which is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
    Closed,
}

pub struct SimulationShared {
    pub registry: Arc<SpriteRegistry>,
    state: Mutex<LoopState>,
    listeners: Mutex<Vec<Sender<SpriteEvent>>>,
    /// Capacity-1 channel; a full channel already has a redraw pending.
    redraw: Sender<()>,
}

impl SimulationShared {
    pub fn new(registry: Arc<SpriteRegistry>, redraw: Sender<()>) -> Self {
        Self {
            registry,
            state: Mutex::new(LoopState::Stopped),
            listeners: Mutex::new(Vec::new()),
            redraw,
        }
    }

    /// Lock the loop state for a check-and-set transition.
    pub fn lock_state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LoopState {
        *self.lock_state()
    }

    pub fn subscribe(&self) -> Receiver<SpriteEvent> {
        let (tx, rx) = unbounded();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Send events to every subscriber, forgetting the ones that hung up.
    pub fn deliver(&self, events: Vec<SpriteEvent>) {
        if events.is_empty() {
            return;
        }
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    /// Ask the host to repaint; coalesces with a request already pending.
    pub fn request_redraw(&self) {
        let _ = self.redraw.try_send(());
    }
}
