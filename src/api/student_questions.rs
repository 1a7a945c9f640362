use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::student_question::{
    AskQuestionRequest, AskQuestionResponse, StudentQuestionResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_mine).post(ask))
}

/// Students get a fixed number of questions per calendar month; the
/// quota is counted from the stored rows, not a mutable counter.
async fn ask(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AskQuestionRequest>,
) -> Result<Json<AskQuestionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let limit = state.settings().limits().monthly_question_limit;
    let now = primitive_now_utc();

    let used = repositories::student_questions::count_in_month(state.db(), &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check question quota"))?;
    if used >= limit {
        return Err(ApiError::Forbidden("Monthly question limit reached"));
    }

    let question = repositories::student_questions::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        payload.question_text.trim(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store question"))?;

    Ok(Json(AskQuestionResponse {
        question: question.into(),
        remaining_this_month: (limit - used - 1).max(0),
    }))
}

async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StudentQuestionResponse>>, ApiError> {
    let questions = repositories::student_questions::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    Ok(Json(questions.into_iter().map(StudentQuestionResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn monthly_quota_is_enforced() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let token = test_support::student_token(&user.id, ctx.state.settings());
        let limit = ctx.state.settings().limits().monthly_question_limit;

        for i in 0..limit {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/questions",
                    Some(&token),
                    Some(json!({"question_text": format!("Question number {i}")})),
                ))
                .await
                .expect("ask question");
            let status = response.status();
            let body = test_support::read_json(response).await;
            assert_eq!(status, StatusCode::OK, "response: {body}");
            assert_eq!(body["remaining_this_month"], limit - i - 1);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/questions",
                Some(&token),
                Some(json!({"question_text": "One over the limit"})),
            ))
            .await
            .expect("ask question");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/questions",
                Some(&token),
                None,
            ))
            .await
            .expect("list questions");
        let listed = test_support::read_json(response).await;
        assert_eq!(listed.as_array().expect("list").len(), limit as usize);
    }
}
