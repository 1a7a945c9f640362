use sqlx::PgConnection;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::types::PointsAction;
use crate::repositories;

pub(crate) const DOWNLOAD_PDF_POINTS: i64 = 5;
pub(crate) const VIEW_IMAGE_POINTS: i64 = 2;
pub(crate) const RATE_SUBJECT_POINTS: i64 = 3;

/// Flat reward for one graded attempt. Scores below 60 earn nothing and
/// leave no ledger row.
pub(crate) fn exam_reward(score: f64) -> i64 {
    if score >= 100.0 {
        100
    } else if score >= 90.0 {
        80
    } else if score >= 80.0 {
        60
    } else if score >= 70.0 {
        40
    } else if score >= 60.0 {
        20
    } else {
        0
    }
}

/// Bumps the running total and appends the matching ledger row on the
/// same connection, so callers decide the transaction boundary. Returns
/// the new total. A non-positive amount is a no-op.
pub(crate) async fn award(
    conn: &mut PgConnection,
    user_id: &str,
    action: PointsAction,
    points: i64,
    detail: serde_json::Value,
    at: PrimitiveDateTime,
) -> Result<Option<i64>, sqlx::Error> {
    if points <= 0 {
        return Ok(None);
    }

    let total = repositories::users::add_points(&mut *conn, user_id, points).await?;

    repositories::points::append(
        &mut *conn,
        repositories::points::CreatePointsEntry {
            id: &Uuid::new_v4().to_string(),
            user_id,
            action,
            points,
            detail,
            created_at: at,
        },
    )
    .await?;

    Ok(Some(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_tiers_follow_score_bands() {
        assert_eq!(exam_reward(100.0), 100);
        assert_eq!(exam_reward(99.99), 80);
        assert_eq!(exam_reward(90.0), 80);
        assert_eq!(exam_reward(89.99), 60);
        assert_eq!(exam_reward(80.0), 60);
        assert_eq!(exam_reward(79.99), 40);
        assert_eq!(exam_reward(70.0), 40);
        assert_eq!(exam_reward(69.99), 20);
        assert_eq!(exam_reward(60.0), 20);
        assert_eq!(exam_reward(59.99), 0);
        assert_eq!(exam_reward(0.0), 0);
    }
}
