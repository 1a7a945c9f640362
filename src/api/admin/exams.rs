use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::types::NotificationKind;
use crate::repositories;
use crate::schemas::admin::{ExamCreate, ExamStatsResponse, ExamUpdate};
use crate::schemas::exam::ExamMetaResponse;
use crate::services::notifications;

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<ExamMetaResponse>>, ApiError> {
    require_permission(&admin, "exams")?;
    let exams = repositories::exams::list_by_subject(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    Ok(Json(exams.into_iter().map(ExamMetaResponse::from).collect()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
    Json(payload): Json<ExamCreate>,
) -> Result<Json<ExamMetaResponse>, ApiError> {
    require_permission(&admin, "exams")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    let existing =
        repositories::exams::find_by_subject_and_level(state.db(), &subject_id, payload.level)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check exam level"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "An exam already exists at level {} for this subject",
            payload.level
        )));
    }

    let now = primitive_now_utc();
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            subject_id: &subject_id,
            level: payload.level,
            name: payload.name.trim(),
            status: payload.status,
            open_at: payload.open_at.map(to_primitive_utc),
            close_at: payload.close_at.map(to_primitive_utc),
            pass_percentage: payload.pass_percentage,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    let message = notifications::new_exam_message(&subject.name, exam.level);
    if let Err(err) =
        notifications::broadcast(state.db(), &message, NotificationKind::Exam, None, now).await
    {
        tracing::warn!(error = %err, "Failed to broadcast new-exam notification");
    }

    Ok(Json(exam.into()))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamMetaResponse>, ApiError> {
    require_permission(&admin, "exams")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            name: payload.name,
            status: payload.status,
            open_at: payload.open_at.map(to_primitive_utc),
            close_at: payload.close_at.map(to_primitive_utc),
            pass_percentage: payload.pass_percentage,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;
    if !updated {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;
    Ok(Json(exam.into()))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "exams")?;

    let deleted = repositories::exams::delete(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn stats(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamStatsResponse>, ApiError> {
    require_permission(&admin, "exams")?;

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let stats = repositories::attempts::stats_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute exam stats"))?;

    Ok(Json(ExamStatsResponse {
        exam_id: exam.id,
        attempts: stats.attempts,
        average_score: stats.average_score,
        best_score: stats.best_score,
        worst_score: stats.worst_score,
        passed_count: stats.passed_count,
        failed_count: stats.attempts - stats.passed_count,
    }))
}
