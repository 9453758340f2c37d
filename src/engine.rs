//! Host-facing engine.
//!
//! A [`SpriteEngine`] owns one registry, one simulation worker thread and
//! one scheduler thread. Each engine is independent; nothing is global.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ambisprite::engine::SpriteEngine;
//! use ambisprite::resources::catalog::AssetCatalog;
//! use ambisprite::resources::engineconfig::EngineConfig;
//! use ambisprite::resources::providers::Providers;
//!
//! let providers = Providers::from_catalog(Arc::new(AssetCatalog::builtin()));
//! let engine = SpriteEngine::new(&EngineConfig::new(), providers);
//! let events = engine.subscribe();
//! engine.start();
//! for event in events.iter().take(10) {
//!     println!("{:?}", event);
//! }
//! engine.close();
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{info, warn};

use crate::components::sprite::{Sprite, SpriteSnapshot};
use crate::events::control::{SchedulerCmd, WorkerSignal};
use crate::events::sprite::SpriteEvent;
use crate::resources::canvas::CanvasSize;
use crate::resources::engineconfig::{EngineConfig, RandomDelay};
use crate::resources::providers::Providers;
use crate::resources::registry::SpriteRegistry;
use crate::resources::simulation::{LoopState, SimulationShared};
use crate::systems::scheduler::{CreationScheduler, scheduler_thread};
use crate::systems::simulation::simulation_thread;

/// How long `close` waits for the background threads.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

struct Threads {
    worker: JoinHandle<()>,
    scheduler: JoinHandle<()>,
}

pub struct SpriteEngine {
    shared: Arc<SimulationShared>,
    tx_wake: Sender<WorkerSignal>,
    tx_sched: Sender<SchedulerCmd>,
    rx_redraw: Receiver<()>,
    rx_done: Receiver<()>,
    threads: Mutex<Option<Threads>>,
}

impl SpriteEngine {
    /// Build the registry and spawn the worker and scheduler threads.
    ///
    /// The engine starts out `Stopped`.
    pub fn new(config: &EngineConfig, providers: Providers) -> Self {
        let canvas = CanvasSize::new(config.canvas_width as f64, config.canvas_height as f64);
        let registry = Arc::new(SpriteRegistry::new(
            canvas,
            config.effective_max_sprites(),
            providers.clone(),
        ));
        registry.set_hover_linger(config.hover_linger);

        let (tx_redraw, rx_redraw) = bounded::<()>(1);
        let shared = Arc::new(SimulationShared::new(registry.clone(), tx_redraw.clone()));

        let (tx_wake, rx_wake) = unbounded::<WorkerSignal>();
        let (tx_sched, rx_sched) = unbounded::<SchedulerCmd>();
        let (tx_done, rx_done) = unbounded::<()>();

        let worker = {
            let shared = shared.clone();
            let period = config.tick_period();
            let done = tx_done.clone();
            std::thread::spawn(move || simulation_thread(rx_wake, shared, period, done))
        };
        let scheduler = {
            let creation = CreationScheduler::new(providers);
            let (creation_delay, release_delay) = (config.creation_delay, config.release_delay);
            std::thread::spawn(move || {
                scheduler_thread(
                    rx_sched,
                    registry,
                    creation,
                    creation_delay,
                    release_delay,
                    tx_redraw,
                );
                let _ = tx_done.send(());
            })
        };

        info!(
            "engine ready: canvas {}x{}, cap {}",
            canvas.w,
            canvas.h,
            config.effective_max_sprites()
        );
        SpriteEngine {
            shared,
            tx_wake,
            tx_sched,
            rx_redraw,
            rx_done,
            threads: Mutex::new(Some(Threads { worker, scheduler })),
        }
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Start or resume ticking and arm the timers. Only valid from
    /// `Stopped` or `Paused`; returns whether the state changed.
    pub fn start(&self) -> bool {
        let mut state = self.shared.lock_state();
        if !matches!(*state, LoopState::Stopped | LoopState::Paused) {
            return false;
        }
        *state = LoopState::Running;
        drop(state);
        let _ = self.tx_sched.send(SchedulerCmd::Arm);
        let _ = self.tx_wake.send(WorkerSignal::Wake);
        info!("simulation running");
        true
    }

    /// Suspend ticking and disarm the timers, keeping all sprites.
    pub fn pause(&self) -> bool {
        let mut state = self.shared.lock_state();
        if *state != LoopState::Running {
            return false;
        }
        *state = LoopState::Paused;
        drop(state);
        let _ = self.tx_sched.send(SchedulerCmd::Disarm { ack: None });
        let _ = self.tx_wake.send(WorkerSignal::Wake);
        info!("simulation paused");
        true
    }

    /// Disarm the timers and remove every sprite. Returns the removed
    /// sprites, closed.
    pub fn stop(&self) -> Vec<Sprite> {
        let mut state = self.shared.lock_state();
        if *state == LoopState::Closed {
            return Vec::new();
        }
        *state = LoopState::Stopped;
        drop(state);
        self.disarm_and_wait();
        let _ = self.tx_wake.send(WorkerSignal::Wake);
        let removed = self.shared.registry.clear();
        self.shared.request_redraw();
        info!("simulation stopped, {} sprites removed", removed.len());
        removed
    }

    /// Stop and shut the engine down for good.
    ///
    /// Waits up to a bounded time for the background threads; if they do
    /// not finish in time they are left to exit on their own. Safe to call
    /// more than once.
    pub fn close(&self) {
        {
            let mut state = self.shared.lock_state();
            if *state == LoopState::Closed {
                return;
            }
            *state = LoopState::Closed;
        }
        self.disarm_and_wait();
        let removed = self.shared.registry.clear();
        let _ = self.tx_sched.send(SchedulerCmd::Shutdown);
        let _ = self.tx_wake.send(WorkerSignal::Shutdown);

        let Some(threads) = self
            .threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        let deadline = Instant::now() + CLOSE_TIMEOUT;
        let finished = (0..2).all(|_| self.rx_done.recv_deadline(deadline).is_ok());
        if finished {
            let _ = threads.worker.join();
            let _ = threads.scheduler.join();
        } else {
            warn!("background threads did not exit within {:?}", CLOSE_TIMEOUT);
        }
        info!("engine closed, {} sprites removed", removed.len());
    }

    /// Disarm the timers and wait until no creation or release is in
    /// flight, so a following `clear` cannot race a new sprite.
    fn disarm_and_wait(&self) {
        let (ack, done) = bounded(1);
        if self
            .tx_sched
            .send(SchedulerCmd::Disarm { ack: Some(ack) })
            .is_ok()
        {
            let _ = done.recv_timeout(CLOSE_TIMEOUT);
        }
    }

    /// Change the population cap, evicting the oldest sprites if needed.
    pub fn set_max_sprites(&self, max_sprites: usize) -> Vec<Sprite> {
        let evicted = self.shared.registry.set_max_sprites(max_sprites);
        if !evicted.is_empty() {
            self.shared.request_redraw();
        }
        evicted
    }

    pub fn max_sprites(&self) -> usize {
        self.shared.registry.max_sprites()
    }

    pub fn set_creation_delay(&self, min: Duration, max: Duration) {
        let _ = self
            .tx_sched
            .send(SchedulerCmd::CreationDelay(RandomDelay::new(min, max)));
    }

    pub fn set_release_delay(&self, min: Duration, max: Duration) {
        let _ = self
            .tx_sched
            .send(SchedulerCmd::ReleaseDelay(RandomDelay::new(min, max)));
    }

    /// Ordered snapshot of all sprites, oldest first.
    pub fn get_sprites(&self) -> Vec<SpriteSnapshot> {
        self.shared.registry.snapshot()
    }

    /// New stream of sprite events. Every subscriber sees every event.
    pub fn subscribe(&self) -> Receiver<SpriteEvent> {
        self.shared.subscribe()
    }

    /// Redraw requests. At most one is pending at a time.
    pub fn redraw_requests(&self) -> Receiver<()> {
        self.rx_redraw.clone()
    }

    pub fn on_pointer_moved(&self, x: f64, y: f64) {
        if self.shared.registry.pointer_moved(x, y) {
            self.shared.request_redraw();
        }
    }

    /// Resize the canvas; bounded sprites are pulled back inside at once.
    pub fn set_canvas_size(&self, width: f64, height: f64) {
        self.shared.registry.set_canvas(CanvasSize::new(width, height));
        self.shared.request_redraw();
    }

    pub fn registry(&self) -> &Arc<SpriteRegistry> {
        &self.shared.registry
    }
}

impl Drop for SpriteEngine {
    fn drop(&mut self) {
        self.close();
    }
}
