use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Subject;
use crate::db::types::{LifecycleStatus, PointsAction};
use crate::repositories;
use crate::schemas::exam::GatedExamResponse;
use crate::schemas::subject::{
    MaterialPointsResponse, RateSubjectRequest, RateSubjectResponse, SubjectDetailResponse,
    SubjectResponse, SubjectSummaryResponse, TermResponse,
};
use crate::services::{level_gate, points};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects))
        .route("/:subject_id", get(subject_detail))
        .route("/:subject_id/rate", post(rate_subject))
        .route("/pdfs/:pdf_id/download", post(download_pdf))
        .route("/images/:image_id/view", post(view_image))
}

pub(crate) async fn list_terms(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<TermResponse>>, ApiError> {
    let terms = repositories::terms::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list terms"))?;
    Ok(Json(terms.into_iter().map(TermResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectListQuery {
    #[serde(default)]
    term_id: Option<String>,
}

fn is_visible(subject: &Subject, now: PrimitiveDateTime) -> bool {
    subject.status == LifecycleStatus::Open
        && subject.scheduled_at.map(|at| at <= now).unwrap_or(true)
}

async fn list_subjects(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SubjectListQuery>,
) -> Result<Json<Vec<SubjectSummaryResponse>>, ApiError> {
    let now = primitive_now_utc();
    let subjects = match query.term_id {
        Some(term_id) => repositories::subjects::list_by_term(state.db(), &term_id).await,
        None => repositories::subjects::list_all(state.db()).await,
    }
    .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;

    let mut summaries = Vec::new();
    for subject in subjects.into_iter().filter(|subject| is_visible(subject, now)) {
        let average_rating = repositories::ratings::average_for_subject(state.db(), &subject.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load subject ratings"))?;
        let ratings_count = repositories::ratings::count_for_subject(state.db(), &subject.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load subject ratings"))?;
        summaries.push(SubjectSummaryResponse {
            subject: SubjectResponse::from(subject),
            average_rating,
            ratings_count,
        });
    }

    Ok(Json(summaries))
}

async fn load_visible_subject(
    state: &AppState,
    subject_id: &str,
) -> Result<Subject, ApiError> {
    let subject = repositories::subjects::find_by_id(state.db(), subject_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject"))?
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;

    if !is_visible(&subject, primitive_now_utc()) {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }
    Ok(subject)
}

/// Subject detail with the per-level gate resolved fresh for the
/// requesting user.
async fn subject_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<String>,
) -> Result<Json<SubjectDetailResponse>, ApiError> {
    let subject = load_visible_subject(&state, &subject_id).await?;

    let pdfs = repositories::materials::list_pdfs(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subject PDFs"))?;
    let images = repositories::materials::list_images(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subject images"))?;
    let exams = repositories::exams::list_by_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subject exams"))?;

    let mut best_by_level: HashMap<i32, f64> = HashMap::new();
    let mut gated = Vec::with_capacity(exams.len());
    for exam in &exams {
        let best = repositories::attempts::best_score(state.db(), &user.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load attempt history"))?;
        let passed = repositories::attempts::has_passed(state.db(), &user.id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load attempt history"))?;
        if let Some(best) = best {
            best_by_level.insert(exam.level, best);
        }

        let access = level_gate::resolve_access(
            exam.level,
            best_by_level.get(&(exam.level - 1)).copied(),
        );

        gated.push(GatedExamResponse {
            id: exam.id.clone(),
            level: exam.level,
            name: exam.name.clone(),
            status: exam.status,
            open_at: exam.open_at.map(crate::core::time::format_primitive),
            close_at: exam.close_at.map(crate::core::time::format_primitive),
            pass_percentage: exam.pass_percentage,
            is_locked: !access.is_unlocked(),
            user_best_score: best,
            user_passed: passed,
        });
    }

    let average_rating = repositories::ratings::average_for_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject ratings"))?;
    let ratings_count = repositories::ratings::count_for_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject ratings"))?;

    Ok(Json(SubjectDetailResponse {
        subject: SubjectResponse::from(subject),
        average_rating,
        ratings_count,
        pdfs: pdfs.into_iter().map(Into::into).collect(),
        images: images.into_iter().map(Into::into).collect(),
        exams: gated,
    }))
}

/// First rating awards points; later calls only move the stored value.
async fn rate_subject(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(subject_id): Path<String>,
    Json(payload): Json<RateSubjectRequest>,
) -> Result<Json<RateSubjectResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let subject = load_visible_subject(&state, &subject_id).await?;
    let now = primitive_now_utc();

    let existing =
        repositories::ratings::find_by_user_and_subject(state.db(), &user.id, &subject.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load rating"))?;

    let points_awarded = match existing {
        Some(rating) => {
            repositories::ratings::update_value(state.db(), &rating.id, payload.rating)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to update rating"))?;
            0
        }
        None => {
            let mut tx = state
                .db()
                .begin()
                .await
                .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;
            repositories::ratings::create(
                &mut *tx,
                repositories::ratings::CreateRating {
                    id: &Uuid::new_v4().to_string(),
                    user_id: &user.id,
                    subject_id: &subject.id,
                    rating: payload.rating,
                    created_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store rating"))?;
            points::award(
                &mut tx,
                &user.id,
                PointsAction::RateSubject,
                points::RATE_SUBJECT_POINTS,
                serde_json::json!({"subject_id": subject.id, "subject_name": subject.name}),
                now,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to award rating points"))?;
            tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit rating"))?;
            points::RATE_SUBJECT_POINTS
        }
    };

    let average_rating = repositories::ratings::average_for_subject(state.db(), &subject.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load subject ratings"))?;

    Ok(Json(RateSubjectResponse { rating: payload.rating, points_awarded, average_rating }))
}

async fn download_pdf(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(pdf_id): Path<String>,
) -> Result<Json<MaterialPointsResponse>, ApiError> {
    let pdf = repositories::materials::find_pdf(state.db(), &pdf_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load PDF"))?
        .ok_or_else(|| ApiError::NotFound("PDF not found".to_string()))?;

    repositories::materials::increment_pdf_downloads(state.db(), &pdf.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count download"))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;
    let total = points::award(
        &mut tx,
        &user.id,
        PointsAction::DownloadPdf,
        points::DOWNLOAD_PDF_POINTS,
        serde_json::json!({"pdf_id": pdf.id, "title": pdf.title}),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to award download points"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit points"))?;

    Ok(Json(MaterialPointsResponse {
        points_awarded: points::DOWNLOAD_PDF_POINTS,
        total_points: total.unwrap_or(user.total_points),
    }))
}

async fn view_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(image_id): Path<String>,
) -> Result<Json<MaterialPointsResponse>, ApiError> {
    let image = repositories::materials::find_image(state.db(), &image_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load image"))?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    repositories::materials::increment_image_views(state.db(), &image.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count view"))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;
    let total = points::award(
        &mut tx,
        &user.id,
        PointsAction::ViewImage,
        points::VIEW_IMAGE_POINTS,
        serde_json::json!({"image_id": image.id, "title": image.title}),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to award view points"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit points"))?;

    Ok(Json(MaterialPointsResponse {
        points_awarded: points::VIEW_IMAGE_POINTS,
        total_points: total.unwrap_or(user.total_points),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::LifecycleStatus;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn first_rating_awards_points_and_rerating_does_not() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        let token = test_support::student_token(&user.id, ctx.state.settings());

        let uri = format!("/api/v1/subjects/{}/rate", subject.id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({"rating": 5})),
            ))
            .await
            .expect("first rating");
        let status = response.status();
        let first = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {first}");
        assert_eq!(first["points_awarded"], 3);
        assert_eq!(first["average_rating"], 5.0);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({"rating": 2})),
            ))
            .await
            .expect("second rating");
        let second = test_support::read_json(response).await;
        assert_eq!(second["points_awarded"], 0);
        assert_eq!(second["average_rating"], 2.0);

        let user = repositories::users::find_by_id(db, &user.id)
            .await
            .expect("load user")
            .expect("user exists");
        assert_eq!(user.total_points, 3);
    }

    #[tokio::test]
    async fn hidden_subject_is_not_found() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Hidden").await;
        repositories::subjects::update(
            db,
            &subject.id,
            repositories::subjects::UpdateSubject {
                name: None,
                description: None,
                cover_image: None,
                status: Some(LifecycleStatus::Closed),
                scheduled_at: None,
            },
        )
        .await
        .expect("close subject");

        let token = test_support::student_token(&user.id, ctx.state.settings());
        let uri = format!("/api/v1/subjects/{}", subject.id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
            .await
            .expect("fetch subject");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
