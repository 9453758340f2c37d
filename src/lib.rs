//! Ambient sprite simulation library.
//!
//! Decorative creatures wander a canvas, play action sequences, bounce off
//! the edges, steer away from each other and eventually wander off. The
//! crate exposes the ECS components, resources, systems and events that make
//! up the simulation, plus the [`engine::SpriteEngine`] host API.

pub mod components;
pub mod engine;
pub mod events;
pub mod resources;
pub mod systems;
