//! Long-lived state used by the simulation.
//!
//! Overview
//! - `canvas` – size of the drawing surface
//! - `catalog` – JSON-backed asset catalog implementing the provider traits
//! - `engineconfig` – INI configuration and random delay ranges
//! - `providers` – asset capability traits consumed by the engine
//! - `registry` – the lock-guarded sprite population and its tick
//! - `simrng` – seeded random source for the tick systems
//! - `simulation` – loop state and event fan-out shared with the worker
pub mod canvas;
pub mod catalog;
pub mod engineconfig;
pub mod providers;
pub mod registry;
pub mod simrng;
pub mod simulation;
