//! Storage for apples
//!
//! Services only see [`AppleRepository`]; PostgreSQL backs it in production and
//! an in-memory map backs it in tests.

mod memory;
mod postgres;

pub use memory::InMemoryAppleRepository;
pub use postgres::PgAppleRepository;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{Apple, AppleStatus};
use uuid::Uuid;

use crate::error::AppResult;

/// The lifecycle columns of an apple as its writer last read them.
///
/// Guarded writes only go through while the stored row still matches, so two
/// requests working from the same read cannot overwrite each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppleVersion {
    pub status: AppleStatus,
    pub eaten_percent: Decimal,
}

impl From<&Apple> for AppleVersion {
    fn from(apple: &Apple) -> Self {
        Self {
            status: apple.status,
            eaten_percent: apple.eaten_percent,
        }
    }
}

#[async_trait]
pub trait AppleRepository: Send + Sync {
    async fn insert(&self, apple: &Apple) -> AppResult<()>;

    async fn find(&self, id: Uuid) -> AppResult<Option<Apple>>;

    /// All apples, ordered by status then newest appearance first
    async fn list(&self) -> AppResult<Vec<Apple>>;

    async fn list_by_status(&self, status: AppleStatus) -> AppResult<Vec<Apple>>;

    /// Persist the mutable columns of an existing apple whose stored row
    /// still matches `expected`.
    /// Fails with `NotFound` when the row is gone and `Conflict` when it moved on.
    async fn update(&self, apple: &Apple, expected: AppleVersion) -> AppResult<()>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Remove a row only while it still matches `expected`.
    /// Fails like [`AppleRepository::update`].
    async fn delete_if_unchanged(&self, id: Uuid, expected: AppleVersion) -> AppResult<()>;

    async fn delete_by_status(&self, status: AppleStatus) -> AppResult<u64>;

    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> AppResult<()>;
}
