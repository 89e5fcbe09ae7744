//! Shared types and models for the orchard
//!
//! This crate holds the apple lifecycle model and everything it needs that
//! does not touch storage or HTTP: the clock abstraction, validation rules and
//! domain errors.

pub mod clock;
pub mod error;
pub mod models;
pub mod validation;

pub use clock::*;
pub use error::*;
pub use models::*;
pub use validation::*;
