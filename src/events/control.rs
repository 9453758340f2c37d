use crossbeam_channel::Sender;

use crate::resources::engineconfig::RandomDelay;

/// Commands sent *to* the scheduler thread
#[derive(Debug, Clone)]
pub enum SchedulerCmd {
    /// Start both timers with freshly drawn delays.
    Arm,
    /// Stop both timers; pending firings are dropped. `ack` is signalled
    /// once no firing is in progress any more.
    Disarm { ack: Option<Sender<()>> },
    CreationDelay(RandomDelay),
    ReleaseDelay(RandomDelay),
    Shutdown,
}

/// Signals sent *to* the simulation worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSignal {
    /// Re-check the loop state (start, pause, stop).
    Wake,
    Shutdown,
}
