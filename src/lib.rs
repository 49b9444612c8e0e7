//! Interact viewer library
//!
//! Core modules behind the `interact` binary: sample tables and hit
//! testing, image equalization and channel stacking, static rendering and
//! the interactive window.

pub mod config;
pub mod gui;
pub mod interact;
pub mod pipeline;
pub mod render;
