//! Presentation layer: theme state and rendering of request state.

pub mod render;
pub mod theme;
