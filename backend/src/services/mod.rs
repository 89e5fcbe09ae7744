//! Business logic services for the orchard

pub mod apple;

pub use apple::AppleService;
