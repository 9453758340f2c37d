//! Event and command types.
//!
//! Submodules:
//! - [`control`] – commands for the scheduler thread and simulation worker
//! - [`sprite`] – per-tick sprite events reported to the host
pub mod control;
pub mod sprite;
