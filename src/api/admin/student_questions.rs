use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::NotificationKind;
use crate::repositories;
use crate::schemas::admin::ReplyRequest;
use crate::schemas::student_question::StudentQuestionResponse;
use crate::services::notifications;

#[derive(Debug, Deserialize)]
pub(crate) struct InboxQuery {
    #[serde(default)]
    unreplied: bool,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Vec<StudentQuestionResponse>>, ApiError> {
    require_permission(&admin, "questions")?;
    let questions = repositories::student_questions::list_all(state.db(), query.unreplied)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list student questions"))?;
    Ok(Json(questions.into_iter().map(StudentQuestionResponse::from).collect()))
}

pub(crate) async fn reply(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(question_id): Path<String>,
    Json(payload): Json<ReplyRequest>,
) -> Result<Json<StudentQuestionResponse>, ApiError> {
    require_permission(&admin, "questions")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let question = repositories::student_questions::reply(
        state.db(),
        &question_id,
        &admin.id,
        payload.reply.trim(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store reply"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let message = notifications::question_replied_message();
    if let Err(err) = notifications::notify_user(
        state.db(),
        &question.user_id,
        &message,
        NotificationKind::Reply,
        None,
        now,
    )
    .await
    {
        tracing::warn!(error = %err, "Failed to write reply notification");
    }

    Ok(Json(question.into()))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(question_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "questions")?;

    let deleted = repositories::student_questions::delete(state.db(), &question_id)
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

    use crate::core::time::primitive_now_utc;
    use crate::repositories;
    use crate::test_support;
    use uuid::Uuid;

    #[tokio::test]
    async fn reply_marks_question_and_notifies_student() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let question = repositories::student_questions::create(
            db,
            &Uuid::new_v4().to_string(),
            &user.id,
            "كيف أفتح المستوى الثاني؟",
            primitive_now_utc(),
        )
        .await
        .expect("insert question");

        let admin = test_support::insert_admin(db, "Admin", "admin@madrasa.local", "admin-pass", true)
            .await;
        let token = test_support::admin_token(&admin.id, ctx.state.settings());

        let uri = format!("/api/v1/admin/student-questions/{}/reply", question.id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({"reply": "اجتز اختبار المستوى الأول بنسبة 80% أو أكثر"})),
            ))
            .await
            .expect("reply");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["is_replied"], true);

        let unreplied = repositories::student_questions::count_unreplied(db)
            .await
            .expect("count unreplied");
        assert_eq!(unreplied, 0);

        let unread = repositories::notifications::unread_count(db, &user.id)
            .await
            .expect("unread count");
        assert_eq!(unread, 1);
    }
}
