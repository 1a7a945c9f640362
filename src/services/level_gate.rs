use sqlx::PgPool;

use crate::db::models::Exam;
use crate::repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelAccess {
    Unlocked,
    Locked,
}

impl LevelAccess {
    pub(crate) fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

/// Best score required on the previous level before the next one opens.
/// The gate ignores each exam's own pass_percentage on purpose: passing
/// an exam and unlocking the next level are separate bars.
pub(crate) fn unlock_threshold(cleared_level: i32) -> f64 {
    if cleared_level <= 1 {
        80.0
    } else {
        85.0
    }
}

/// Pure decision for a single level given the best score recorded on the
/// level directly below it. `None` means no attempt exists there.
pub(crate) fn resolve_access(level: i32, best_previous_score: Option<f64>) -> LevelAccess {
    if level <= 1 {
        return LevelAccess::Unlocked;
    }

    match best_previous_score {
        Some(score) if score >= unlock_threshold(level - 1) => LevelAccess::Unlocked,
        _ => LevelAccess::Locked,
    }
}

/// Looks up the previous level's exam for the subject and the user's best
/// score on it. A missing previous exam keeps the level locked.
pub(crate) async fn access_for_exam(
    pool: &PgPool,
    user_id: &str,
    exam: &Exam,
) -> Result<LevelAccess, sqlx::Error> {
    if exam.level <= 1 {
        return Ok(LevelAccess::Unlocked);
    }

    let previous =
        repositories::exams::find_by_subject_and_level(pool, &exam.subject_id, exam.level - 1)
            .await?;

    let Some(previous) = previous else {
        return Ok(LevelAccess::Locked);
    };

    let best = repositories::attempts::best_score(pool, user_id, &previous.id).await?;
    Ok(resolve_access(exam.level, best))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_is_always_open() {
        assert_eq!(resolve_access(1, None), LevelAccess::Unlocked);
        assert_eq!(resolve_access(1, Some(0.0)), LevelAccess::Unlocked);
    }

    #[test]
    fn level_two_needs_eighty_on_level_one() {
        assert_eq!(resolve_access(2, Some(80.0)), LevelAccess::Unlocked);
        assert_eq!(resolve_access(2, Some(82.5)), LevelAccess::Unlocked);
        assert_eq!(resolve_access(2, Some(79.99)), LevelAccess::Locked);
        assert_eq!(resolve_access(2, None), LevelAccess::Locked);
    }

    #[test]
    fn deeper_levels_need_eighty_five() {
        assert_eq!(resolve_access(3, Some(85.0)), LevelAccess::Unlocked);
        assert_eq!(resolve_access(3, Some(84.99)), LevelAccess::Locked);
        assert_eq!(resolve_access(5, Some(85.0)), LevelAccess::Unlocked);
        assert_eq!(resolve_access(5, Some(80.0)), LevelAccess::Locked);
    }

    #[test]
    fn threshold_steps_once_after_level_one() {
        assert_eq!(unlock_threshold(1), 80.0);
        assert_eq!(unlock_threshold(2), 85.0);
        assert_eq!(unlock_threshold(9), 85.0);
    }
}
