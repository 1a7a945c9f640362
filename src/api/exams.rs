use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, User};
use crate::db::types::NotificationKind;
use crate::repositories;
use crate::schemas::exam::{
    AttemptResponse, ExamForTakingResponse, ExamMetaResponse, ExamQuestionResponse,
    SubmitExamRequest, SubmitExamResponse,
};
use crate::services::exam_assembly::{self, ExamWindowError};
use crate::services::{grading, level_gate, notifications};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:exam_id", get(fetch_for_taking)).route("/:exam_id/submit", post(submit))
}

fn window_error(err: ExamWindowError) -> ApiError {
    match err {
        ExamWindowError::Closed => ApiError::Forbidden("Exam is currently closed"),
        ExamWindowError::NotYetOpen => ApiError::Forbidden("Exam has not opened yet"),
        ExamWindowError::Expired => ApiError::Forbidden("Exam time is over"),
    }
}

async fn load_accessible_exam(
    state: &AppState,
    user: &User,
    exam_id: &str,
) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    exam_assembly::check_exam_window(&exam, primitive_now_utc()).map_err(window_error)?;

    let access = level_gate::access_for_exam(state.db(), &user.id, &exam)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve level access"))?;
    if !access.is_unlocked() {
        return Err(ApiError::Forbidden("Previous level must be cleared first"));
    }

    Ok(exam)
}

/// Timing and gate checks run on every fetch; the question order is
/// re-shuffled each time.
async fn fetch_for_taking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamForTakingResponse>, ApiError> {
    let exam = load_accessible_exam(&state, &user, &exam_id).await?;

    let questions = exam_assembly::assemble_paper(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assemble exam"))?;
    let attempts = repositories::attempts::list_by_user_and_exam(state.db(), &user.id, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt history"))?;
    let best_score = repositories::attempts::best_score(state.db(), &user.id, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load best score"))?;

    Ok(Json(ExamForTakingResponse {
        exam: ExamMetaResponse::from(exam),
        questions: questions.into_iter().map(ExamQuestionResponse::from).collect(),
        attempts: attempts.into_iter().map(AttemptResponse::from).collect(),
        best_score,
    }))
}

async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(exam_id): Path<String>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<Json<SubmitExamResponse>, ApiError> {
    let exam = load_accessible_exam(&state, &user, &exam_id).await?;
    let now = primitive_now_utc();

    let outcome = grading::submit_exam(state.db(), &user.id, &exam, payload.answers, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?;

    if outcome.attempt.passed {
        // Best-effort; the graded attempt is already durable.
        let message = notifications::level_passed_message(&exam.name, outcome.attempt.score);
        if let Err(err) = notifications::notify_user(
            state.db(),
            &user.id,
            &message,
            NotificationKind::Success,
            None,
            now,
        )
        .await
        {
            tracing::warn!(error = %err, "Failed to write level-passed notification");
        }
    }

    Ok(Json(SubmitExamResponse {
        attempt_id: outcome.attempt.id,
        score: outcome.attempt.score,
        passed: outcome.attempt.passed,
        correct_count: outcome.correct,
        total_questions: outcome.total,
        required_percentage: exam.pass_percentage,
        points_awarded: outcome.points_awarded,
        total_points: outcome.new_total_points,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::repositories;
    use crate::test_support::{self, TestContext};

    struct ExamFixture {
        exam_id: String,
        question_ids: Vec<String>,
        user_id: String,
        token: String,
    }

    async fn seed_exam(ctx: &TestContext, question_count: usize) -> ExamFixture {
        let db = ctx.state.db();
        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        let exam = test_support::insert_exam(db, &subject.id, 1, 80).await;

        let mut question_ids = Vec::new();
        for i in 0..question_count {
            let question = test_support::insert_question(
                db,
                &exam.id,
                &format!("Question {}", i + 1),
                "a",
                (i + 1) as i32,
            )
            .await;
            question_ids.push(question.id);
        }

        let token = test_support::student_token(&user.id, ctx.state.settings());
        ExamFixture { exam_id: exam.id, question_ids, user_id: user.id, token }
    }

    #[tokio::test]
    async fn fetch_strips_answers_and_keeps_question_set() {
        let ctx = test_support::setup_test_context().await;
        let fixture = seed_exam(&ctx, 5).await;

        let uri = format!("/api/v1/exams/{}", fixture.exam_id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &uri, Some(&fixture.token), None))
            .await
            .expect("fetch exam");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");

        let questions = body["questions"].as_array().expect("questions");
        assert_eq!(questions.len(), 5);
        for question in questions {
            assert!(question.get("correct_answer").is_none(), "answer leaked: {question}");
        }

        let fetched_ids: BTreeSet<String> = questions
            .iter()
            .map(|q| q["id"].as_str().expect("question id").to_string())
            .collect();
        let seeded_ids: BTreeSet<String> = fixture.question_ids.iter().cloned().collect();
        assert_eq!(fetched_ids, seeded_ids);
    }

    #[tokio::test]
    async fn passing_submission_awards_tiered_points() {
        let ctx = test_support::setup_test_context().await;
        let fixture = seed_exam(&ctx, 5).await;

        // 4 of 5 correct: 80.00, passes at 80 and lands in the 60-point tier.
        let mut answers = serde_json::Map::new();
        for (i, question_id) in fixture.question_ids.iter().enumerate() {
            let answer = if i < 4 { "a" } else { "b" };
            answers.insert(question_id.clone(), json!(answer));
        }

        let uri = format!("/api/v1/exams/{}/submit", fixture.exam_id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&fixture.token),
                Some(json!({"answers": answers})),
            ))
            .await
            .expect("submit exam");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");

        assert_eq!(body["score"], 80.0);
        assert_eq!(body["passed"], true);
        assert_eq!(body["correct_count"], 4);
        assert_eq!(body["total_questions"], 5);
        assert_eq!(body["points_awarded"], 60);
        assert_eq!(body["total_points"], 60);

        let user = repositories::users::find_by_id(ctx.state.db(), &fixture.user_id)
            .await
            .expect("load user")
            .expect("user exists");
        assert_eq!(user.total_points, 60);

        let ledger_sum = repositories::points::sum_for_user(ctx.state.db(), &fixture.user_id)
            .await
            .expect("ledger sum");
        assert_eq!(ledger_sum, user.total_points);
    }

    #[tokio::test]
    async fn failing_submission_records_attempt_without_points() {
        let ctx = test_support::setup_test_context().await;
        let fixture = seed_exam(&ctx, 5).await;

        let mut answers = serde_json::Map::new();
        for (i, question_id) in fixture.question_ids.iter().enumerate() {
            let answer = if i < 2 { "a" } else { "b" };
            answers.insert(question_id.clone(), json!(answer));
        }

        let uri = format!("/api/v1/exams/{}/submit", fixture.exam_id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&fixture.token),
                Some(json!({"answers": answers})),
            ))
            .await
            .expect("submit exam");
        let body = test_support::read_json(response).await;

        assert_eq!(body["score"], 40.0);
        assert_eq!(body["passed"], false);
        assert_eq!(body["points_awarded"], 0);

        let attempts =
            repositories::attempts::list_by_user(ctx.state.db(), &fixture.user_id)
                .await
                .expect("attempts");
        assert_eq!(attempts.len(), 1);

        let entries = repositories::points::list_by_user(ctx.state.db(), &fixture.user_id, 10)
            .await
            .expect("points log");
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn refetching_leaves_history_and_best_score_unchanged() {
        let ctx = test_support::setup_test_context().await;
        let fixture = seed_exam(&ctx, 3).await;

        // One recorded attempt (2 of 3 correct, 66.67) before the fetches.
        let mut answers = serde_json::Map::new();
        for (i, question_id) in fixture.question_ids.iter().enumerate() {
            let answer = if i < 2 { "a" } else { "b" };
            answers.insert(question_id.clone(), json!(answer));
        }
        let submit_uri = format!("/api/v1/exams/{}/submit", fixture.exam_id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &submit_uri,
                Some(&fixture.token),
                Some(json!({"answers": answers})),
            ))
            .await
            .expect("submit exam");
        assert_eq!(response.status(), StatusCode::OK);

        let fetch_uri = format!("/api/v1/exams/{}", fixture.exam_id);
        let mut bodies = Vec::new();
        for _ in 0..2 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::GET,
                    &fetch_uri,
                    Some(&fixture.token),
                    None,
                ))
                .await
                .expect("fetch exam");
            let status = response.status();
            let body = test_support::read_json(response).await;
            assert_eq!(status, StatusCode::OK, "response: {body}");
            bodies.push(body);
        }

        assert_eq!(bodies[0]["attempts"], bodies[1]["attempts"]);
        assert_eq!(bodies[0]["best_score"], bodies[1]["best_score"]);
        assert_eq!(bodies[0]["attempts"].as_array().expect("attempts").len(), 1);
        assert_eq!(bodies[0]["best_score"], 66.67);
    }

    #[tokio::test]
    async fn deeper_level_is_locked_until_previous_is_cleared() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        test_support::insert_exam(db, &subject.id, 1, 80).await;
        let level_two = test_support::insert_exam(db, &subject.id, 2, 80).await;
        test_support::insert_question(db, &level_two.id, "Question 1", "a", 1).await;

        let token = test_support::student_token(&user.id, ctx.state.settings());
        let uri = format!("/api/v1/exams/{}", level_two.id);
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
            .await
            .expect("fetch exam");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
