use axum::extract::State;
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::admin::{DashboardStatsResponse, TopPdfEntry, TopStudentEntry};

const TOP_LIST_SIZE: i64 = 5;

pub(crate) async fn dashboard(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<DashboardStatsResponse>, ApiError> {
    require_permission(&admin, "stats")?;
    let db = state.db();

    let total_students = repositories::users::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let total_subjects = repositories::subjects::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count subjects"))?;
    let total_exams = repositories::exams::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let total_attempts = repositories::attempts::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    let attempts_today = repositories::attempts::count_on_day(db, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count today's attempts"))?;
    let average_score = repositories::attempts::average_score(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute average score"))?;
    let unanswered_questions = repositories::student_questions::count_unreplied(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unanswered questions"))?;

    let top_students = repositories::users::leaderboard(db, TOP_LIST_SIZE)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load top students"))?
        .into_iter()
        .map(|user| TopStudentEntry { name: user.name, total_points: user.total_points })
        .collect();
    let top_pdfs = repositories::materials::top_downloaded_pdfs(db, TOP_LIST_SIZE)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load top PDFs"))?
        .into_iter()
        .map(|(title, downloads_count)| TopPdfEntry { title, downloads_count })
        .collect();

    Ok(Json(DashboardStatsResponse {
        total_students,
        total_subjects,
        total_exams,
        total_attempts,
        attempts_today,
        average_score,
        unanswered_questions,
        top_students,
        top_pdfs,
    }))
}
