//! Orchard service: batch creation, lifecycle transitions and queries

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use shared::{Apple, AppleStats, AppleStatus, Clock, EatOutcome};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{AppleRepository, AppleVersion};

/// Apple service for managing the orchard
#[derive(Clone)]
pub struct AppleService {
    repo: Arc<dyn AppleRepository>,
    clock: Arc<dyn Clock>,
}

impl AppleService {
    /// Create a new AppleService instance
    pub fn new(repo: Arc<dyn AppleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// All apples after a rot check, ordered by status then newest first
    pub async fn list_apples(&self) -> AppResult<Vec<Apple>> {
        self.check_all_for_rot().await?;
        self.repo.list().await
    }

    /// Load one apple, catching up on rot that happened since the last write
    pub async fn get_apple(&self, apple_id: Uuid) -> AppResult<Apple> {
        let mut apple = self
            .repo
            .find(apple_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Apple".to_string()))?;

        let read = AppleVersion::from(&apple);
        if apple.update_rotten_status(self.clock.now()) {
            tracing::info!(apple_id = %apple.id, "Apple rotted on the ground");
            self.save(&apple, read).await?;
        }

        Ok(apple)
    }

    pub async fn find_by_status(&self, status: AppleStatus) -> AppResult<Vec<Apple>> {
        if status != AppleStatus::OnTree {
            self.check_all_for_rot().await?;
        }
        self.repo.list_by_status(status).await
    }

    /// Grow a random number of apples within `min..=max`
    pub async fn generate_apples(&self, min: u32, max: u32) -> AppResult<usize> {
        if min == 0 || min > max {
            return Err(AppError::Validation {
                field: "batch_size".to_string(),
                message: format!("Invalid batch size range {}..={}", min, max),
            });
        }
        let count = rand::thread_rng().gen_range(min..=max) as usize;
        self.create_random_batch(count).await
    }

    /// Grow `count` random apples. Returns how many were actually stored;
    /// rows that fail are logged and skipped.
    pub async fn create_random_batch(&self, count: usize) -> AppResult<usize> {
        let now = self.clock.now();
        let apples: Vec<Apple> = {
            let mut rng = rand::thread_rng();
            (0..count).map(|_| Apple::new_random(&mut rng, now)).collect()
        };

        let mut created = 0;
        for apple in &apples {
            if let Err(e) = apple.validate() {
                tracing::warn!(apple_id = %apple.id, "Skipping invalid apple: {}", e);
                continue;
            }
            match self.repo.insert(apple).await {
                Ok(()) => created += 1,
                Err(e) => tracing::warn!(apple_id = %apple.id, "Failed to store apple: {}", e),
            }
        }

        tracing::info!(requested = count, created, "Generated random apples");
        Ok(created)
    }

    /// Drop an apple from the tree
    pub async fn fall_apple(&self, apple_id: Uuid) -> AppResult<Apple> {
        let mut apple = self.get_apple(apple_id).await?;
        let read = AppleVersion::from(&apple);

        apple.fall(self.clock.now())?;
        self.save(&apple, read).await?;

        tracing::info!(apple_id = %apple.id, "Apple fell");
        Ok(apple)
    }

    /// Eat `percent` of an apple.
    ///
    /// Finishing the apple deletes its record instead of storing an eaten
    /// percent of 100. A bite that races another write to the same apple
    /// fails with `Conflict` and changes nothing.
    pub async fn eat_apple(&self, apple_id: Uuid, percent: Decimal) -> AppResult<EatOutcome> {
        let mut apple = self.get_apple(apple_id).await?;
        let read = AppleVersion::from(&apple);

        let outcome = apple.eat(percent, self.clock.now())?;
        match &outcome {
            EatOutcome::Consumed => {
                self.repo.delete_if_unchanged(apple.id, read).await?;
                tracing::info!(apple_id = %apple.id, "Apple fully eaten and removed");
            }
            EatOutcome::Bitten { size, .. } => {
                self.save(&apple, read).await?;
                tracing::debug!(apple_id = %apple.id, %percent, %size, "Apple bitten");
            }
        }

        Ok(outcome)
    }

    /// Remove an apple that is fully eaten or rotten
    pub async fn delete_apple(&self, apple_id: Uuid) -> AppResult<()> {
        let apple = self.get_apple(apple_id).await?;

        if !apple.can_delete(self.clock.now()) {
            return Err(AppError::InvalidStateTransition(
                "Only fully eaten or rotten apples can be deleted".to_string(),
            ));
        }

        if !self.repo.delete(apple.id).await? {
            return Err(AppError::NotFound("Apple".to_string()));
        }

        tracing::info!(apple_id = %apple.id, "Apple deleted");
        Ok(())
    }

    /// Remove every rotten apple, including ones that rotted since the last check
    pub async fn delete_all_rotten(&self) -> AppResult<u64> {
        self.check_all_for_rot().await?;
        let deleted = self.repo.delete_by_status(AppleStatus::Rotten).await?;

        tracing::info!(deleted, "Deleted rotten apples");
        Ok(deleted)
    }

    /// Flip every on-ground apple past the rot threshold. Returns how many rotted.
    ///
    /// Rows another request changed or removed since the listing are skipped;
    /// the next check picks them up.
    pub async fn check_all_for_rot(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let mut rotted = 0;

        for mut apple in self.repo.list_by_status(AppleStatus::OnGround).await? {
            let read = AppleVersion::from(&apple);
            if !apple.update_rotten_status(now) {
                continue;
            }
            match self.save(&apple, read).await {
                Ok(()) => rotted += 1,
                Err(AppError::Conflict { .. } | AppError::NotFound(_)) => {
                    tracing::debug!(apple_id = %apple.id, "Apple changed during rot check");
                }
                Err(e) => return Err(e),
            }
        }

        if rotted > 0 {
            tracing::info!(rotted, "Apples rotted on the ground");
        }
        Ok(rotted)
    }

    pub async fn get_stats(&self) -> AppResult<AppleStats> {
        let apples = self.list_apples().await?;
        Ok(AppleStats::from_apples(&apples))
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.repo.ping().await
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    async fn save(&self, apple: &Apple, read: AppleVersion) -> AppResult<()> {
        apple.validate()?;
        self.repo.update(apple, read).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryAppleRepository;
    use chrono::{Duration, TimeZone, Utc};
    use shared::{AppleColor, ManualClock, ROTTEN_TIME_SECS};

    fn service_with(apples: Vec<Apple>, clock: Arc<ManualClock>) -> AppleService {
        AppleService::new(Arc::new(InMemoryAppleRepository::with_apples(apples)), clock)
    }

    /// What another request does to an apple right after this one reads it
    enum Interference {
        Remove,
        Bite(Decimal),
    }

    /// Wraps the in-memory store and lets a concurrent request slip in
    /// between a read and the write that follows it
    struct RacingRepository {
        inner: InMemoryAppleRepository,
        interference: Interference,
        clock: Arc<ManualClock>,
    }

    #[async_trait::async_trait]
    impl AppleRepository for RacingRepository {
        async fn insert(&self, apple: &Apple) -> AppResult<()> {
            self.inner.insert(apple).await
        }

        async fn find(&self, id: Uuid) -> AppResult<Option<Apple>> {
            let found = self.inner.find(id).await?;
            if let Some(apple) = &found {
                match self.interference {
                    Interference::Remove => {
                        self.inner.delete(id).await?;
                    }
                    Interference::Bite(percent) => {
                        let mut other = apple.clone();
                        other.eat(percent, self.clock.now())?;
                        self.inner.update(&other, AppleVersion::from(apple)).await?;
                    }
                }
            }
            Ok(found)
        }

        async fn list(&self) -> AppResult<Vec<Apple>> {
            self.inner.list().await
        }

        async fn list_by_status(&self, status: AppleStatus) -> AppResult<Vec<Apple>> {
            self.inner.list_by_status(status).await
        }

        async fn update(&self, apple: &Apple, expected: AppleVersion) -> AppResult<()> {
            self.inner.update(apple, expected).await
        }

        async fn delete(&self, id: Uuid) -> AppResult<bool> {
            self.inner.delete(id).await
        }

        async fn delete_if_unchanged(&self, id: Uuid, expected: AppleVersion) -> AppResult<()> {
            self.inner.delete_if_unchanged(id, expected).await
        }

        async fn delete_by_status(&self, status: AppleStatus) -> AppResult<u64> {
            self.inner.delete_by_status(status).await
        }

        async fn ping(&self) -> AppResult<()> {
            self.inner.ping().await
        }
    }

    fn racing_service(interference: Interference) -> (AppleService, Arc<RacingRepository>, Uuid) {
        let clock = Arc::new(ManualClock::at_secs(100_000));
        let mut apple = Apple::new(AppleColor::Red, Utc.timestamp_opt(0, 0).unwrap(), clock.now());
        apple.fall(clock.now()).unwrap();
        let id = apple.id;
        let repo = Arc::new(RacingRepository {
            inner: InMemoryAppleRepository::with_apples(vec![apple]),
            interference,
            clock: clock.clone(),
        });
        (AppleService::new(repo.clone(), clock), repo, id)
    }

    #[tokio::test]
    async fn test_get_apple_persists_passive_rot() {
        let clock = Arc::new(ManualClock::at_secs(100_000));
        let mut apple = Apple::new(AppleColor::Red, Utc.timestamp_opt(0, 0).unwrap(), clock.now());
        apple.fall(clock.now()).unwrap();
        let id = apple.id;
        let service = service_with(vec![apple], clock.clone());

        clock.advance(Duration::seconds(ROTTEN_TIME_SECS));
        let loaded = service.get_apple(id).await.unwrap();

        assert_eq!(loaded.status, AppleStatus::Rotten);
        let stored = service.repo.find(id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppleStatus::Rotten);
        assert_eq!(stored.rotten_date, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_finishing_an_already_removed_apple_is_not_found() {
        let (service, repo, id) = racing_service(Interference::Remove);

        let err = service.eat_apple(id, Decimal::ONE_HUNDRED).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_bites_do_not_lose_updates() {
        let (service, repo, id) = racing_service(Interference::Bite(Decimal::from(60)));

        let err = service.eat_apple(id, Decimal::from(60)).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
        let stored = repo.inner.find(id).await.unwrap().unwrap();
        assert_eq!(stored.eaten_percent, Decimal::from(60));
    }

    #[tokio::test]
    async fn test_finishing_bite_after_concurrent_bite_keeps_the_apple() {
        let (service, repo, id) = racing_service(Interference::Bite(Decimal::from(10)));

        let err = service.eat_apple(id, Decimal::ONE_HUNDRED).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
        let stored = repo.inner.find(id).await.unwrap().unwrap();
        assert_eq!(stored.eaten_percent, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_generate_apples_rejects_bad_range() {
        let service = service_with(vec![], Arc::new(ManualClock::at_secs(0)));
        assert!(matches!(
            service.generate_apples(5, 2).await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            service.generate_apples(0, 2).await,
            Err(AppError::Validation { .. })
        ));
    }
}
