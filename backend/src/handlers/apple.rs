//! Orchard HTTP handlers
//!
//! Action endpoints answer with a `{success, message}` envelope, including on
//! failure, so the page script can show the message as-is.

use std::str::FromStr;

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{format_countdown, Apple, AppleStats, EatOutcome};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::AppleService;
use crate::AppState;

/// `?id=` on action endpoints
#[derive(Debug, Deserialize)]
pub struct AppleIdQuery {
    pub id: Uuid,
}

/// Form body of `POST /eat-apple`
#[derive(Debug, Deserialize)]
pub struct EatAppleForm {
    pub percent: Option<String>,
}

/// An apple with everything the page needs to render it
#[derive(Debug, Serialize)]
pub struct AppleView {
    #[serde(flatten)]
    pub apple: Apple,
    pub status_name: String,
    pub color_name: String,
    pub size: Decimal,
    pub is_rotten: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_rot: Option<String>,
    pub can_fall: bool,
    pub can_eat: bool,
    pub can_delete: bool,
}

impl AppleView {
    pub fn new(apple: Apple, now: DateTime<Utc>) -> Self {
        Self {
            status_name: apple.status.to_string(),
            color_name: apple.color.to_string(),
            size: apple.size(),
            is_rotten: apple.is_rotten(now),
            time_to_rot: apple.time_to_rot(now).map(format_countdown),
            can_fall: apple.can_fall(),
            can_eat: apple.can_eat(now),
            can_delete: apple.can_delete(now),
            apple,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrchardResponse {
    pub apples: Vec<AppleView>,
    pub stats: AppleStats,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl ActionResponse {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
            created: None,
            deleted: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EatResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eaten_percent: Option<Decimal>,
    /// The apple was finished and its record removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

/// Render a failure in the action envelope, keeping the error's status code
fn action_failure(prefix: &str, err: AppError) -> Response {
    tracing::error!("Error: {:?}", err);
    let status = err.status_code();
    let body = ActionResponse {
        success: false,
        message: format!("{}: {}", prefix, err.detail().message),
        created: None,
        deleted: None,
    };
    (status, Json(body)).into_response()
}

/// Read the bite size from the form. A missing value counts as zero; range
/// and precision are left to [`Apple::eat`].
fn parse_percent(raw: Option<&str>) -> Result<Decimal, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Decimal::from_str)
        .transpose()
        .map(|percent| percent.unwrap_or(Decimal::ZERO))
        .map_err(|_| AppError::OutOfRange("Percent must be a number".to_string()))
}

/// Unwrap `?id=`, turning a malformed query into an error the envelope can carry
fn apple_id(query: Result<Query<AppleIdQuery>, QueryRejection>) -> Result<Uuid, AppError> {
    query
        .map(|Query(query)| query.id)
        .map_err(|rejection| AppError::Validation {
            field: "id".to_string(),
            message: rejection.body_text(),
        })
}

async fn take_bite(
    service: &AppleService,
    query: Result<Query<AppleIdQuery>, QueryRejection>,
    form: Result<Form<EatAppleForm>, FormRejection>,
) -> Result<(Decimal, EatOutcome), AppError> {
    let apple_id = apple_id(query)?;
    let Form(form) = form.map_err(|rejection| AppError::Validation {
        field: "percent".to_string(),
        message: rejection.body_text(),
    })?;
    let percent = parse_percent(form.percent.as_deref())?;
    let outcome = service.eat_apple(apple_id, percent).await?;
    Ok((percent, outcome))
}

/// List the orchard after catching up on rot
pub async fn list_apples(State(state): State<AppState>) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());

    match service.list_apples().await {
        Ok(apples) => {
            let now = service.now();
            let stats = AppleStats::from_apples(&apples);
            let apples = apples.into_iter().map(|a| AppleView::new(a, now)).collect();
            (StatusCode::OK, Json(OrchardResponse { apples, stats })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Orchard statistics
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());

    match service.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Grow a random batch of apples
pub async fn generate_apples(State(state): State<AppState>) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());
    let orchard = &state.config.orchard;

    match service
        .generate_apples(orchard.min_batch_size, orchard.max_batch_size)
        .await
    {
        Ok(created) if created > 0 => {
            let mut body = ActionResponse::ok(format!("Generated {} random apples!", created));
            body.created = Some(created);
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(_) => action_failure(
            "Could not generate apples",
            AppError::Internal("no apple could be stored".to_string()),
        ),
        Err(e) => action_failure("Could not generate apples", e),
    }
}

/// Drop an apple from the tree
pub async fn fall_apple(
    State(state): State<AppState>,
    query: Result<Query<AppleIdQuery>, QueryRejection>,
) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());
    let apple_id = match apple_id(query) {
        Ok(id) => id,
        Err(e) => return action_failure("Could not drop the apple", e),
    };

    match service.fall_apple(apple_id).await {
        Ok(apple) => {
            let body = ActionResponse::ok(format!("Apple {} fell!", apple.id));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => action_failure("Could not drop the apple", e),
    }
}

/// Take a bite of an apple
pub async fn eat_apple(
    State(state): State<AppState>,
    query: Result<Query<AppleIdQuery>, QueryRejection>,
    form: Result<Form<EatAppleForm>, FormRejection>,
) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());

    match take_bite(&service, query, form).await {
        Ok((_, EatOutcome::Consumed)) => {
            let body = EatResponse {
                success: true,
                message: "The apple has been eaten completely!".to_string(),
                size: None,
                eaten_percent: None,
                deleted: Some(true),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok((percent, EatOutcome::Bitten { size, eaten_percent })) => {
            let body = EatResponse {
                success: true,
                message: format!("Ate {}% of the apple. Left: {}%", percent, size),
                size: Some(size),
                eaten_percent: Some(eaten_percent),
                deleted: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!("Error: {:?}", e);
            let status = e.status_code();
            let body = EatResponse {
                success: false,
                message: format!("Could not eat the apple: {}", e.detail().message),
                size: None,
                eaten_percent: None,
                deleted: None,
            };
            (status, Json(body)).into_response()
        }
    }
}

/// Remove a fully eaten or rotten apple
pub async fn delete_apple(
    State(state): State<AppState>,
    query: Result<Query<AppleIdQuery>, QueryRejection>,
) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());
    let apple_id = match apple_id(query) {
        Ok(id) => id,
        Err(e) => return action_failure("Could not delete the apple", e),
    };

    match service.delete_apple(apple_id).await {
        Ok(()) => {
            let body = ActionResponse::ok(format!("Apple {} deleted!", apple_id));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => action_failure("Could not delete the apple", e),
    }
}

/// Remove every rotten apple
pub async fn delete_rotten_apples(State(state): State<AppState>) -> impl IntoResponse {
    let service = AppleService::new(state.repo.clone(), state.clock.clone());

    match service.delete_all_rotten().await {
        Ok(deleted) => {
            let mut body = ActionResponse::ok(format!("Deleted {} rotten apples", deleted));
            body.deleted = Some(deleted);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => action_failure("Could not delete rotten apples", e),
    }
}
