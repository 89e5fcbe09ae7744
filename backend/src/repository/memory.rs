//! In-memory apple storage, used by tests and local experiments

use std::collections::HashMap;

use async_trait::async_trait;
use shared::{Apple, AppleStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AppleRepository, AppleVersion};
use crate::error::{AppError, AppResult};

#[derive(Default)]
pub struct InMemoryAppleRepository {
    apples: RwLock<HashMap<Uuid, Apple>>,
}

impl InMemoryAppleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apples(apples: impl IntoIterator<Item = Apple>) -> Self {
        Self {
            apples: RwLock::new(apples.into_iter().map(|a| (a.id, a)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.apples.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.apples.read().await.is_empty()
    }
}

fn sort_for_listing(apples: &mut [Apple]) {
    apples.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| b.appearance_date.cmp(&a.appearance_date))
    });
}

#[async_trait]
impl AppleRepository for InMemoryAppleRepository {
    async fn insert(&self, apple: &Apple) -> AppResult<()> {
        let mut apples = self.apples.write().await;
        if apples.contains_key(&apple.id) {
            return Err(AppError::Internal(format!("Duplicate apple id {}", apple.id)));
        }
        apples.insert(apple.id, apple.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Apple>> {
        Ok(self.apples.read().await.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Apple>> {
        let mut apples: Vec<Apple> = self.apples.read().await.values().cloned().collect();
        sort_for_listing(&mut apples);
        Ok(apples)
    }

    async fn list_by_status(&self, status: AppleStatus) -> AppResult<Vec<Apple>> {
        let mut apples: Vec<Apple> = self
            .apples
            .read()
            .await
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        sort_for_listing(&mut apples);
        Ok(apples)
    }

    async fn update(&self, apple: &Apple, expected: AppleVersion) -> AppResult<()> {
        match self.apples.write().await.get_mut(&apple.id) {
            Some(stored) if AppleVersion::from(&*stored) == expected => {
                *stored = apple.clone();
                Ok(())
            }
            Some(_) => Err(AppError::stale("Apple")),
            None => Err(AppError::NotFound("Apple".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.apples.write().await.remove(&id).is_some())
    }

    async fn delete_if_unchanged(&self, id: Uuid, expected: AppleVersion) -> AppResult<()> {
        let mut apples = self.apples.write().await;
        match apples.get(&id).map(AppleVersion::from) {
            Some(current) if current == expected => {
                apples.remove(&id);
                Ok(())
            }
            Some(_) => Err(AppError::stale("Apple")),
            None => Err(AppError::NotFound("Apple".to_string())),
        }
    }

    async fn delete_by_status(&self, status: AppleStatus) -> AppResult<u64> {
        let mut apples = self.apples.write().await;
        let before = apples.len();
        apples.retain(|_, a| a.status != status);
        Ok((before - apples.len()) as u64)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::AppleColor;

    fn fallen_apple() -> Apple {
        let now = Utc.timestamp_opt(10_000, 0).unwrap();
        let mut apple = Apple::new(AppleColor::Red, now, now);
        apple.fall(now).unwrap();
        apple
    }

    #[tokio::test]
    async fn test_stale_update_is_rejected() {
        let apple = fallen_apple();
        let repo = InMemoryAppleRepository::with_apples(vec![apple.clone()]);
        let read = AppleVersion::from(&apple);

        let now = apple.updated_at;
        let mut first = apple.clone();
        first.eat(Decimal::from(60), now).unwrap();
        let mut second = apple.clone();
        second.eat(Decimal::from(60), now).unwrap();

        repo.update(&first, read).await.unwrap();
        let err = repo.update(&second, read).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
        let stored = repo.find(apple.id).await.unwrap().unwrap();
        assert_eq!(stored.eaten_percent, Decimal::from(60));
    }

    #[tokio::test]
    async fn test_update_missing_apple_is_not_found() {
        let apple = fallen_apple();
        let repo = InMemoryAppleRepository::new();

        let err = repo.update(&apple, AppleVersion::from(&apple)).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_if_unchanged() {
        let apple = fallen_apple();
        let repo = InMemoryAppleRepository::with_apples(vec![apple.clone()]);
        let read = AppleVersion::from(&apple);

        let mut bitten = apple.clone();
        bitten.eat(Decimal::from(10), apple.updated_at).unwrap();
        repo.update(&bitten, read).await.unwrap();

        let err = repo.delete_if_unchanged(apple.id, read).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(repo.len().await, 1);

        repo.delete_if_unchanged(apple.id, AppleVersion::from(&bitten))
            .await
            .unwrap();
        assert!(repo.is_empty().await);

        let err = repo.delete_if_unchanged(apple.id, read).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
