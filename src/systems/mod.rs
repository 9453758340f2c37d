//! Simulation systems and background threads.
//!
//! Submodules overview
//! - [`advance`] – frame stepping, movement and vanishing
//! - [`boundary`] – edge tests and mirror-table reflection
//! - [`collision`] – pairwise overlap on predicted positions and turning away
//! - [`highlight`] – expire lingering hover highlights
//! - [`scheduler`] – creation and release timers on their own thread
//! - [`sequence`] – choose the next action when a cycle ends
//! - [`simulation`] – fixed-rate worker loop

pub mod advance;
pub mod boundary;
pub mod collision;
pub mod highlight;
pub mod scheduler;
pub mod sequence;
pub mod simulation;
