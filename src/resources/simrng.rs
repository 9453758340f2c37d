//! Random source shared by the tick systems.
//!
//! Production registries seed it from entropy; tests pass a fixed seed so a
//! tick sequence can be replayed.

use bevy_ecs::prelude::Resource;
use fastrand::Rng;

#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub Rng);

impl Default for SimRng {
    fn default() -> Self {
        SimRng(Rng::new())
    }
}

impl SimRng {
    pub fn with_seed(seed: u64) -> Self {
        SimRng(Rng::with_seed(seed))
    }
}
