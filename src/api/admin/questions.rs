use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::db::models::Exam;
use crate::db::types::QuestionKind;
use crate::repositories;
use crate::schemas::admin::{
    ImportResponse, ImportTextRequest, QuestionAdminResponse, QuestionCreate, QuestionUpdate,
};
use crate::services::question_import::{self, NewQuestion};

/// Options use the same canonical keys the importers produce: `a..d`
/// for multiple choice, exactly `a` and `b` for true/false.
fn check_option_keys(
    kind: QuestionKind,
    options: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
    let valid = match kind {
        QuestionKind::TrueFalse => {
            options.len() == 2 && options.contains_key("a") && options.contains_key("b")
        }
        QuestionKind::Multiple => {
            (2..=4).contains(&options.len())
                && options.keys().all(|key| matches!(key.as_str(), "a" | "b" | "c" | "d"))
        }
    };

    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(match kind {
            QuestionKind::TrueFalse => {
                "true_false questions must have exactly the options a and b".to_string()
            }
            QuestionKind::Multiple => {
                "multiple questions take 2 to 4 options keyed a through d".to_string()
            }
        }))
    }
}

async fn load_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
) -> Result<Json<Vec<QuestionAdminResponse>>, ApiError> {
    require_permission(&admin, "questions")?;
    load_exam(&state, &exam_id).await?;

    let questions = repositories::questions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    Ok(Json(questions.into_iter().map(QuestionAdminResponse::from).collect()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
    Json(payload): Json<QuestionCreate>,
) -> Result<Json<QuestionAdminResponse>, ApiError> {
    require_permission(&admin, "questions")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    load_exam(&state, &exam_id).await?;

    check_option_keys(payload.kind, &payload.options)?;
    let correct_answer = payload.correct_answer.trim().to_lowercase();
    if !payload.options.contains_key(&correct_answer) {
        return Err(ApiError::BadRequest(
            "correct_answer must be one of the option keys".to_string(),
        ));
    }

    let question_order = match payload.question_order {
        Some(order) => order,
        None => {
            repositories::questions::max_order(state.db(), &exam_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to compute question order"))?
                + 1
        }
    };

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam_id,
            question_text: payload.question_text.trim(),
            kind: payload.kind,
            options: payload.options,
            correct_answer: &correct_answer,
            question_order,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
    Ok(Json(question.into()))
}

/// Persists one normalized batch after the exam's current tail; all
/// rows land or none do.
async fn persist_batch(
    state: &AppState,
    exam_id: &str,
    batch: Vec<NewQuestion>,
) -> Result<usize, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let base_order = repositories::questions::max_order(&mut *tx, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute question order"))?;

    let count = batch.len();
    for question in batch {
        repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                exam_id,
                question_text: &question.question_text,
                kind: question.kind,
                options: question.options,
                correct_answer: &question.correct_answer,
                question_order: base_order + question.question_order,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store imported question"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit import"))?;
    Ok(count)
}

pub(crate) async fn import_spreadsheet(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    require_permission(&admin, "questions")?;
    load_exam(&state, &exam_id).await?;

    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") || file_bytes.is_none() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
            file_bytes = Some(bytes);
        }
    }

    let bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("file field is required".to_string()))?;

    let batch = question_import::parse_spreadsheet(&bytes)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let imported = persist_batch(&state, &exam_id, batch).await?;
    Ok(Json(ImportResponse { imported }))
}

pub(crate) async fn import_text(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
    Json(payload): Json<ImportTextRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    require_permission(&admin, "questions")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    load_exam(&state, &exam_id).await?;

    let batch =
        question_import::parse_text(&payload.text).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let imported = persist_batch(&state, &exam_id, batch).await?;
    Ok(Json(ImportResponse { imported }))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionAdminResponse>, ApiError> {
    require_permission(&admin, "questions")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let correct_answer = payload.correct_answer.map(|answer| answer.trim().to_lowercase());
    let effective_answer = correct_answer.clone().unwrap_or(existing.correct_answer);
    let effective_options = payload.options.clone().unwrap_or(existing.options.0);
    let effective_kind = payload.kind.unwrap_or(existing.kind);
    check_option_keys(effective_kind, &effective_options)?;
    if !effective_options.contains_key(&effective_answer) {
        return Err(ApiError::BadRequest(
            "correct_answer must be one of the option keys".to_string(),
        ));
    }

    repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            question_text: payload.question_text,
            kind: payload.kind,
            options: payload.options,
            correct_answer,
            question_order: payload.question_order,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    Ok(Json(question.into()))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(question_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "questions")?;

    let deleted = repositories::questions::delete(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support::{self, TestContext};

    async fn seed_exam_uri(ctx: &TestContext) -> (String, String) {
        let db = ctx.state.db();
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        let exam = test_support::insert_exam(db, &subject.id, 1, 80).await;
        let admin = test_support::insert_admin(db, "Admin", "admin@madrasa.local", "admin-pass", true)
            .await;
        let token = test_support::admin_token(&admin.id, ctx.state.settings());
        (format!("/api/v1/admin/exams/{}/questions", exam.id), token)
    }

    async fn create_question(
        ctx: &TestContext,
        uri: &str,
        token: &str,
        payload: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::POST, uri, Some(token), Some(payload)))
            .await
            .expect("create question");
        let status = response.status();
        (status, test_support::read_json(response).await)
    }

    #[tokio::test]
    async fn manual_entry_enforces_canonical_option_keys() {
        let ctx = test_support::setup_test_context().await;
        let (uri, token) = seed_exam_uri(&ctx).await;

        let (status, body) = create_question(
            &ctx,
            &uri,
            &token,
            json!({
                "question_text": "الأرض كروية",
                "kind": "true_false",
                "options": {"yes": "صح", "no": "خطأ"},
                "correct_answer": "yes",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

        let (status, body) = create_question(
            &ctx,
            &uri,
            &token,
            json!({
                "question_text": "اختر الإجابة",
                "kind": "multiple",
                "options": {"a": "1", "b": "2", "c": "3", "e": "4"},
                "correct_answer": "a",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

        let (status, body) = create_question(
            &ctx,
            &uri,
            &token,
            json!({
                "question_text": "الأرض كروية",
                "kind": "true_false",
                "options": {"a": "صح", "b": "خطأ"},
                "correct_answer": "a",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["kind"], "true_false");
    }
}
