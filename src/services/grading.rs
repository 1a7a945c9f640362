use std::collections::BTreeMap;

use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Exam, ExamAttempt, Question};
use crate::db::types::PointsAction;
use crate::repositories;
use crate::services::points;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GradeResult {
    pub(crate) score: f64,
    pub(crate) correct: usize,
    pub(crate) total: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct SubmissionOutcome {
    pub(crate) attempt: ExamAttempt,
    pub(crate) correct: usize,
    pub(crate) total: usize,
    pub(crate) points_awarded: i64,
    pub(crate) new_total_points: Option<i64>,
}

/// Scores a submitted answer sheet against the canonical questions.
/// Matching is case-insensitive after trimming; a missing answer counts
/// as wrong. An exam with no questions grades to 0.00.
pub(crate) fn score_submission(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
) -> GradeResult {
    let total = questions.len();
    if total == 0 {
        return GradeResult { score: 0.0, correct: 0, total: 0 };
    }

    let correct = questions
        .iter()
        .filter(|question| {
            answers
                .get(&question.id)
                .map(|given| answers_match(given, &question.correct_answer))
                .unwrap_or(false)
        })
        .count();

    let score = round2(100.0 * correct as f64 / total as f64);
    GradeResult { score, correct, total }
}

fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Grades and persists one attempt. The answer-key read, the attempt
/// row, the points total bump and the ledger row share one transaction,
/// so the sheet is scored against the question set the attempt commits
/// with.
pub(crate) async fn submit_exam(
    pool: &PgPool,
    user_id: &str,
    exam: &Exam,
    answers: BTreeMap<String, String>,
    now: PrimitiveDateTime,
) -> Result<SubmissionOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let questions = repositories::questions::list_by_exam(&mut *tx, &exam.id).await?;
    let grade = score_submission(&questions, &answers);
    let passed = grade.score >= exam.pass_percentage as f64;
    let reward = points::exam_reward(grade.score);

    let attempt = repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            user_id,
            exam_id: &exam.id,
            score: grade.score,
            passed,
            answers,
            attempted_at: now,
        },
    )
    .await?;

    let new_total = points::award(
        &mut tx,
        user_id,
        PointsAction::ExamCompleted,
        reward,
        serde_json::json!({
            "exam_id": exam.id,
            "exam_name": exam.name,
            "level": exam.level,
            "score": grade.score,
        }),
        now,
    )
    .await?;

    tx.commit().await?;

    Ok(SubmissionOutcome {
        attempt,
        correct: grade.correct,
        total: grade.total,
        points_awarded: reward,
        new_total_points: new_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    use crate::core::time::primitive_now_utc;
    use crate::test_support;

    fn question(id: &str, correct: &str) -> Question {
        Question {
            id: id.into(),
            exam_id: "exam-1".into(),
            question_text: format!("question {id}"),
            kind: crate::db::types::QuestionKind::Multiple,
            options: Json(BTreeMap::new()),
            correct_answer: correct.into(),
            question_order: 0,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn four_of_five_scores_eighty() {
        let questions: Vec<_> =
            ["q1", "q2", "q3", "q4", "q5"].iter().map(|id| question(id, "a")).collect();
        let sheet = answers(&[("q1", "a"), ("q2", "a"), ("q3", "a"), ("q4", "a"), ("q5", "b")]);
        let grade = score_submission(&questions, &sheet);
        assert_eq!(grade.score, 80.0);
        assert_eq!(grade.correct, 4);
        assert_eq!(grade.total, 5);
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let questions = vec![question("q1", "True")];
        let sheet = answers(&[("q1", "  true ")]);
        assert_eq!(score_submission(&questions, &sheet).score, 100.0);
    }

    #[test]
    fn missing_answers_count_as_wrong() {
        let questions = vec![question("q1", "a"), question("q2", "b")];
        let sheet = answers(&[("q1", "a")]);
        assert_eq!(score_submission(&questions, &sheet).score, 50.0);
    }

    #[test]
    fn empty_exam_grades_to_zero() {
        let grade = score_submission(&[], &BTreeMap::new());
        assert_eq!(grade.score, 0.0);
        assert_eq!(grade.total, 0);
    }

    #[test]
    fn one_of_three_rounds_to_two_decimals() {
        let questions = vec![question("q1", "a"), question("q2", "a"), question("q3", "a")];
        let sheet = answers(&[("q1", "a"), ("q2", "x"), ("q3", "x")]);
        assert_eq!(score_submission(&questions, &sheet).score, 33.33);
    }

    #[test]
    fn two_of_three_rounds_up() {
        let questions = vec![question("q1", "a"), question("q2", "a"), question("q3", "a")];
        let sheet = answers(&[("q1", "a"), ("q2", "a"), ("q3", "x")]);
        assert_eq!(score_submission(&questions, &sheet).score, 66.67);
    }

    #[tokio::test]
    async fn submit_exam_persists_attempt_and_reward_together() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let user = test_support::insert_user(db, "Student", "student@gmail.com", "device-1").await;
        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        let exam = test_support::insert_exam(db, &subject.id, 1, 80).await;
        let q1 = test_support::insert_question(db, &exam.id, "Question 1", "a", 1).await;
        let q2 = test_support::insert_question(db, &exam.id, "Question 2", "b", 2).await;

        let sheet = answers(&[(q1.id.as_str(), "A"), (q2.id.as_str(), "b")]);
        let outcome = submit_exam(db, &user.id, &exam, sheet, primitive_now_utc())
            .await
            .expect("submit");

        assert_eq!(outcome.attempt.score, 100.0);
        assert!(outcome.attempt.passed);
        assert_eq!(outcome.points_awarded, 100);
        assert_eq!(outcome.new_total_points, Some(100));

        let attempts = repositories::attempts::list_by_user(db, &user.id).await.expect("attempts");
        assert_eq!(attempts.len(), 1);

        let stored = repositories::users::find_by_id(db, &user.id)
            .await
            .expect("load user")
            .expect("user exists");
        let ledger_sum = repositories::points::sum_for_user(db, &user.id).await.expect("ledger sum");
        assert_eq!(stored.total_points, 100);
        assert_eq!(ledger_sum, stored.total_points);
    }
}
