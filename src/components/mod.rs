//! ECS components for sprite entities.
//!
//! Submodules overview:
//! - [`direction`] – the sixteen headings, their unit vectors and the edge
//!   mirror tables
//! - [`sequence`] – action sequences and how fast each one moves
//! - [`sprite`] – the sprite itself, its hover highlight and the read-only
//!   snapshot handed to hosts

pub mod direction;
pub mod sequence;
pub mod sprite;
