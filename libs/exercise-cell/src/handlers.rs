// libs/exercise-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    DailyAnalyticsQuery, ProgressListQuery, RecordProgressRequest, StreakQuery, SubjectQuery,
};
use crate::services::progress::ExerciseProgressService;

#[axum::debug_handler]
pub async fn list_progress(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ProgressListQuery>,
) -> Result<Json<Value>, AppError> {
    let progress_service = ExerciseProgressService::new(&state);

    let progress = progress_service
        .list_progress(&user, &query, auth.token())
        .await?;

    Ok(Json(json!({
        "progress": progress,
        "total": progress.len()
    })))
}

#[axum::debug_handler]
pub async fn record_progress(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordProgressRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let progress_service = ExerciseProgressService::new(&state);

    let progress = progress_service
        .record_progress(&user, request, Utc::now().date_naive(), auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!(progress))))
}

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<Arc<AppConfig>>,
    Path(progress_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let progress_service = ExerciseProgressService::new(&state);

    let progress = progress_service
        .get_progress(&user, progress_id, auth.token())
        .await?;

    Ok(Json(json!(progress)))
}

#[axum::debug_handler]
pub async fn get_progress_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<Value>, AppError> {
    let progress_service = ExerciseProgressService::new(&state);

    let stats = progress_service
        .progress_stats(&user, query.patient_id, Utc::now().date_naive(), auth.token())
        .await?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn get_streak(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<StreakQuery>,
) -> Result<Json<Value>, AppError> {
    let progress_service = ExerciseProgressService::new(&state);
    let reference_date = query.reference_date.unwrap_or_else(|| Utc::now().date_naive());

    let streak = progress_service
        .current_streak(&user, query.patient_id, reference_date, auth.token())
        .await?;

    Ok(Json(json!(streak)))
}

#[axum::debug_handler]
pub async fn get_daily_analytics(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DailyAnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let progress_service = ExerciseProgressService::new(&state);

    let analytics = progress_service
        .daily_analytics(
            &user,
            query.patient_id,
            query.from,
            query.to,
            Utc::now().date_naive(),
            auth.token(),
        )
        .await?;

    Ok(Json(json!(analytics)))
}
