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
use crate::schemas::admin::{ImageCreate, PdfCreate, SubjectCreate, SubjectUpdate};
use crate::schemas::subject::{ImageResponse, PdfResponse, SubjectResponse};
use crate::services::notifications;

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    require_permission(&admin, "subjects")?;
    let subjects = repositories::subjects::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;
    Ok(Json(subjects.into_iter().map(SubjectResponse::from).collect()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<SubjectCreate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let term = repositories::terms::find_by_id(state.db(), &payload.term_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load term"))?;
    if term.is_none() {
        return Err(ApiError::NotFound("Term not found".to_string()));
    }

    let now = primitive_now_utc();
    let subject = repositories::subjects::create(
        state.db(),
        repositories::subjects::CreateSubject {
            id: &Uuid::new_v4().to_string(),
            term_id: &payload.term_id,
            name: payload.name.trim(),
            description: payload.description.as_deref(),
            cover_image: payload.cover_image.as_deref(),
            status: payload.status,
            scheduled_at: payload.scheduled_at.map(to_primitive_utc),
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create subject"))?;

    let message = notifications::new_subject_message(&subject.name);
    if let Err(err) =
        notifications::broadcast(state.db(), &message, NotificationKind::Info, None, now).await
    {
        tracing::warn!(error = %err, "Failed to broadcast new-subject notification");
    }

    Ok(Json(subject.into()))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let updated = repositories::subjects::update(
        state.db(),
        &subject_id,
        repositories::subjects::UpdateSubject {
            name: payload.name,
            description: payload.description,
            cover_image: payload.cover_image,
            status: payload.status,
            scheduled_at: payload.scheduled_at.map(to_primitive_utc),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update subject"))?;
    if !updated {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;
    Ok(Json(subject.into()))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "subjects")?;

    let deleted = repositories::subjects::delete(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete subject"))?;
    if !deleted {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn add_pdf(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
    Json(payload): Json<PdfCreate>,
) -> Result<Json<PdfResponse>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?;
    if subject.is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    let pdf = repositories::materials::create_pdf(
        state.db(),
        repositories::materials::CreatePdf {
            id: &Uuid::new_v4().to_string(),
            subject_id: &subject_id,
            title: payload.title.trim(),
            file_url: payload.file_url.trim(),
            file_size: payload.file_size,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store PDF record"))?;
    Ok(Json(pdf.into()))
}

pub(crate) async fn remove_pdf(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(pdf_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "subjects")?;

    let deleted = repositories::materials::delete_pdf(state.db(), &pdf_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete PDF record"))?;
    if !deleted {
        return Err(ApiError::NotFound("PDF not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn add_image(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(subject_id): Path<String>,
    Json(payload): Json<ImageCreate>,
) -> Result<Json<ImageResponse>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let subject = repositories::subjects::find_by_id(state.db(), &subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?;
    if subject.is_none() {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }

    let image = repositories::materials::create_image(
        state.db(),
        repositories::materials::CreateImage {
            id: &Uuid::new_v4().to_string(),
            subject_id: &subject_id,
            title: payload.title.as_deref(),
            file_url: payload.file_url.trim(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store image record"))?;
    Ok(Json(image.into()))
}

pub(crate) async fn remove_image(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(image_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "subjects")?;

    let deleted = repositories::materials::delete_image(state.db(), &image_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete image record"))?;
    if !deleted {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}
