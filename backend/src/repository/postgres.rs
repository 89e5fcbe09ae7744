//! PostgreSQL-backed apple storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{Apple, AppleColor, AppleStatus};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AppleRepository, AppleVersion};
use crate::error::{AppError, AppResult};

const SELECT_APPLES: &str = r#"
    SELECT id, color, appearance_date, fall_date, status, eaten_percent,
           rotten_date, created_at, updated_at
    FROM apples
"#;

#[derive(Clone)]
pub struct PgAppleRepository {
    db: PgPool,
}

/// Database row for an apple
#[derive(Debug, sqlx::FromRow)]
struct AppleRow {
    id: Uuid,
    color: String,
    appearance_date: DateTime<Utc>,
    fall_date: Option<DateTime<Utc>>,
    status: i16,
    eaten_percent: Decimal,
    rotten_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppleRow> for Apple {
    type Error = AppError;

    fn try_from(row: AppleRow) -> Result<Self, Self::Error> {
        let color = AppleColor::from_hex(&row.color).ok_or_else(|| {
            AppError::Internal(format!("Unknown color {} on apple {}", row.color, row.id))
        })?;
        let status = AppleStatus::from_code(row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown status {} on apple {}", row.status, row.id))
        })?;

        Ok(Apple {
            id: row.id,
            color,
            appearance_date: row.appearance_date,
            fall_date: row.fall_date,
            status,
            eaten_percent: row.eaten_percent,
            rotten_date: row.rotten_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_apples(rows: Vec<AppleRow>) -> AppResult<Vec<Apple>> {
    rows.into_iter().map(Apple::try_from).collect()
}

impl PgAppleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Tell a vanished row apart from one a concurrent write changed
    async fn guard_miss(&self, id: Uuid) -> AppError {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM apples WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await;

        match exists {
            Ok(true) => AppError::stale("Apple"),
            Ok(false) => AppError::NotFound("Apple".to_string()),
            Err(e) => AppError::DatabaseError(e),
        }
    }
}

#[async_trait]
impl AppleRepository for PgAppleRepository {
    async fn insert(&self, apple: &Apple) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO apples (id, color, appearance_date, fall_date, status, eaten_percent,
                                rotten_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(apple.id)
        .bind(apple.color.hex())
        .bind(apple.appearance_date)
        .bind(apple.fall_date)
        .bind(apple.status.code())
        .bind(apple.eaten_percent)
        .bind(apple.rotten_date)
        .bind(apple.created_at)
        .bind(apple.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Apple>> {
        let row = sqlx::query_as::<_, AppleRow>(&format!("{} WHERE id = $1", SELECT_APPLES))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(Apple::try_from).transpose()
    }

    async fn list(&self) -> AppResult<Vec<Apple>> {
        let rows = sqlx::query_as::<_, AppleRow>(&format!(
            "{} ORDER BY status ASC, appearance_date DESC",
            SELECT_APPLES
        ))
        .fetch_all(&self.db)
        .await?;

        into_apples(rows)
    }

    async fn list_by_status(&self, status: AppleStatus) -> AppResult<Vec<Apple>> {
        let rows = sqlx::query_as::<_, AppleRow>(&format!(
            "{} WHERE status = $1 ORDER BY appearance_date DESC",
            SELECT_APPLES
        ))
        .bind(status.code())
        .fetch_all(&self.db)
        .await?;

        into_apples(rows)
    }

    async fn update(&self, apple: &Apple, expected: AppleVersion) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE apples
            SET fall_date = $2, status = $3, eaten_percent = $4, rotten_date = $5, updated_at = $6
            WHERE id = $1 AND status = $7 AND eaten_percent = $8
            "#,
        )
        .bind(apple.id)
        .bind(apple.fall_date)
        .bind(apple.status.code())
        .bind(apple.eaten_percent)
        .bind(apple.rotten_date)
        .bind(apple.updated_at)
        .bind(expected.status.code())
        .bind(expected.eaten_percent)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.guard_miss(apple.id).await);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM apples WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_unchanged(&self, id: Uuid, expected: AppleVersion) -> AppResult<()> {
        let result =
            sqlx::query("DELETE FROM apples WHERE id = $1 AND status = $2 AND eaten_percent = $3")
                .bind(id)
                .bind(expected.status.code())
                .bind(expected.eaten_percent)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(self.guard_miss(id).await);
        }

        Ok(())
    }

    async fn delete_by_status(&self, status: AppleStatus) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM apples WHERE status = $1")
            .bind(status.code())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
