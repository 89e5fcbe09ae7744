//! HTTP handlers for the orchard

mod apple;
mod health;

pub use apple::*;
pub use health::*;
