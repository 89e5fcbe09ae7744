//! Domain models for the orchard

mod apple;
mod color;
mod stats;
mod status;

pub use apple::*;
pub use color::*;
pub use stats::*;
pub use status::*;
