use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::core::state::AppState;

pub(crate) mod admins;
pub(crate) mod auth;
pub(crate) mod exams;
pub(crate) mod notifications;
pub(crate) mod questions;
pub(crate) mod stats;
pub(crate) mod student_questions;
pub(crate) mod students;
pub(crate) mod subjects;
pub(crate) mod terms;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/admins", get(admins::list).post(admins::create))
        .route("/admins/:admin_id/permissions", put(admins::update_permissions))
        .route("/admins/:admin_id", delete(admins::remove))
        .route("/terms", get(terms::list).post(terms::create))
        .route("/terms/:term_id", put(terms::update).delete(terms::remove))
        .route("/subjects", get(subjects::list).post(subjects::create))
        .route("/subjects/:subject_id", put(subjects::update).delete(subjects::remove))
        .route("/subjects/:subject_id/pdfs", post(subjects::add_pdf))
        .route("/pdfs/:pdf_id", delete(subjects::remove_pdf))
        .route("/subjects/:subject_id/images", post(subjects::add_image))
        .route("/images/:image_id", delete(subjects::remove_image))
        .route("/subjects/:subject_id/exams", get(exams::list).post(exams::create))
        .route("/exams/:exam_id", put(exams::update).delete(exams::remove))
        .route("/exams/:exam_id/stats", get(exams::stats))
        .route("/exams/:exam_id/questions", get(questions::list).post(questions::create))
        .route("/exams/:exam_id/questions/import", post(questions::import_spreadsheet))
        .route("/exams/:exam_id/questions/import-text", post(questions::import_text))
        .route("/questions/:question_id", put(questions::update).delete(questions::remove))
        .route("/students", get(students::list))
        .route("/students/export", get(students::export_csv))
        .route("/students/:student_id/block", post(students::block))
        .route("/students/:student_id/unblock", post(students::unblock))
        .route("/students/:student_id", delete(students::remove))
        .route("/blocked", get(students::blocked_list))
        .route("/blocked/:entry_id", delete(students::unban))
        .route("/student-questions", get(student_questions::list))
        .route("/student-questions/:question_id", delete(student_questions::remove))
        .route("/student-questions/:question_id/reply", post(student_questions::reply))
        .route("/notifications/broadcast", post(notifications::broadcast))
        .route("/stats/dashboard", get(stats::dashboard))
}
