use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, ExamAttempt, Question};
use crate::db::types::{LifecycleStatus, QuestionKind};

#[derive(Debug, Serialize)]
pub(crate) struct ExamMetaResponse {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) level: i32,
    pub(crate) name: String,
    pub(crate) status: LifecycleStatus,
    pub(crate) open_at: Option<String>,
    pub(crate) close_at: Option<String>,
    pub(crate) pass_percentage: i32,
}

impl From<Exam> for ExamMetaResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            subject_id: exam.subject_id,
            level: exam.level,
            name: exam.name,
            status: exam.status,
            open_at: exam.open_at.map(format_primitive),
            close_at: exam.close_at.map(format_primitive),
            pass_percentage: exam.pass_percentage,
        }
    }
}

/// Question as shown to a student taking the exam. The answer key is
/// deliberately absent from this shape.
#[derive(Debug, Serialize)]
pub(crate) struct ExamQuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) options: BTreeMap<String, String>,
}

impl From<Question> for ExamQuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            kind: question.kind,
            options: question.options.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) attempted_at: String,
}

impl From<ExamAttempt> for AttemptResponse {
    fn from(attempt: ExamAttempt) -> Self {
        Self {
            id: attempt.id,
            score: attempt.score,
            passed: attempt.passed,
            attempted_at: format_primitive(attempt.attempted_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamForTakingResponse {
    pub(crate) exam: ExamMetaResponse,
    pub(crate) questions: Vec<ExamQuestionResponse>,
    pub(crate) attempts: Vec<AttemptResponse>,
    pub(crate) best_score: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitExamRequest {
    pub(crate) answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitExamResponse {
    pub(crate) attempt_id: String,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) correct_count: usize,
    pub(crate) total_questions: usize,
    pub(crate) required_percentage: i32,
    pub(crate) points_awarded: i64,
    pub(crate) total_points: Option<i64>,
}

/// Exam entry in a subject detail view, annotated by the level gate.
#[derive(Debug, Serialize)]
pub(crate) struct GatedExamResponse {
    pub(crate) id: String,
    pub(crate) level: i32,
    pub(crate) name: String,
    pub(crate) status: LifecycleStatus,
    pub(crate) open_at: Option<String>,
    pub(crate) close_at: Option<String>,
    pub(crate) pass_percentage: i32,
    pub(crate) is_locked: bool,
    pub(crate) user_best_score: Option<f64>,
    pub(crate) user_passed: bool,
}
