use rand::seq::SliceRandom;
use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::models::{Exam, Question};
use crate::db::types::LifecycleStatus;
use crate::repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ExamWindowError {
    #[error("Exam is currently closed")]
    Closed,
    #[error("Exam has not opened yet")]
    NotYetOpen,
    #[error("Exam time is over")]
    Expired,
}

/// Admin `closed` status wins over the schedule; the open bound is
/// inclusive and the close bound is exclusive.
pub(crate) fn check_exam_window(
    exam: &Exam,
    now: PrimitiveDateTime,
) -> Result<(), ExamWindowError> {
    if exam.status == LifecycleStatus::Closed {
        return Err(ExamWindowError::Closed);
    }

    if let Some(open_at) = exam.open_at {
        if now < open_at {
            return Err(ExamWindowError::NotYetOpen);
        }
    }

    if let Some(close_at) = exam.close_at {
        if now >= close_at {
            return Err(ExamWindowError::Expired);
        }
    }

    Ok(())
}

/// Loads the paper for one sitting: every question of the exam in a
/// fresh uniform order. Correct answers stay on the rows here and are
/// stripped at the response layer.
pub(crate) async fn assemble_paper(pool: &PgPool, exam_id: &str) -> Result<Vec<Question>, sqlx::Error> {
    let mut questions = repositories::questions::list_by_exam(pool, exam_id).await?;
    questions.shuffle(&mut rand::thread_rng());
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use time::{Date, Duration, Time};

    use crate::test_support;

    fn exam_at(
        status: LifecycleStatus,
        open_at: Option<PrimitiveDateTime>,
        close_at: Option<PrimitiveDateTime>,
    ) -> Exam {
        let created = moment(0);
        Exam {
            id: "exam-1".into(),
            subject_id: "subject-1".into(),
            level: 1,
            name: "Level 1".into(),
            status,
            open_at,
            close_at,
            pass_percentage: 80,
            created_at: created,
        }
    }

    fn moment(offset_minutes: i64) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::March, 10).unwrap();
        let base = PrimitiveDateTime::new(date, Time::from_hms(12, 0, 0).unwrap());
        base + Duration::minutes(offset_minutes)
    }

    #[test]
    fn closed_status_overrides_schedule() {
        let exam = exam_at(LifecycleStatus::Closed, Some(moment(-60)), Some(moment(60)));
        assert_eq!(check_exam_window(&exam, moment(0)), Err(ExamWindowError::Closed));
    }

    #[test]
    fn before_open_at_is_rejected() {
        let exam = exam_at(LifecycleStatus::Open, Some(moment(5)), None);
        assert_eq!(check_exam_window(&exam, moment(0)), Err(ExamWindowError::NotYetOpen));
        assert_eq!(check_exam_window(&exam, moment(5)), Ok(()));
    }

    #[test]
    fn close_at_bound_is_exclusive() {
        let exam = exam_at(LifecycleStatus::Open, None, Some(moment(30)));
        assert_eq!(check_exam_window(&exam, moment(29)), Ok(()));
        assert_eq!(check_exam_window(&exam, moment(30)), Err(ExamWindowError::Expired));
        assert_eq!(check_exam_window(&exam, moment(31)), Err(ExamWindowError::Expired));
    }

    #[test]
    fn unscheduled_open_exam_is_available() {
        let exam = exam_at(LifecycleStatus::Open, None, None);
        assert_eq!(check_exam_window(&exam, moment(0)), Ok(()));
    }

    // With 20 questions the odds of two independent shuffles agreeing
    // are 1/20!, so an order match means the shuffle is broken.
    #[tokio::test]
    async fn repeated_assembly_reorders_the_same_question_set() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();

        let term = test_support::insert_term(db, "First term").await;
        let subject = test_support::insert_subject(db, &term.id, "Math").await;
        let exam = test_support::insert_exam(db, &subject.id, 1, 80).await;
        for i in 0..20 {
            test_support::insert_question(db, &exam.id, &format!("Question {}", i + 1), "a", i + 1)
                .await;
        }

        let first: Vec<String> = assemble_paper(db, &exam.id)
            .await
            .expect("first paper")
            .into_iter()
            .map(|question| question.id)
            .collect();
        let second: Vec<String> = assemble_paper(db, &exam.id)
            .await
            .expect("second paper")
            .into_iter()
            .map(|question| question.id)
            .collect();

        let first_set: BTreeSet<&String> = first.iter().collect();
        let second_set: BTreeSet<&String> = second.iter().collect();
        assert_eq!(first_set, second_set);
        assert_ne!(first, second, "both assemblies returned the same order");
    }
}
