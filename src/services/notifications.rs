use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::types::NotificationKind;
use crate::repositories;

pub(crate) async fn notify_user(
    pool: &PgPool,
    user_id: &str,
    message: &str,
    kind: NotificationKind,
    link: Option<&str>,
    at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    repositories::notifications::create(
        pool,
        repositories::notifications::CreateNotification {
            id: &Uuid::new_v4().to_string(),
            user_id,
            message,
            kind,
            link,
            created_at: at,
        },
    )
    .await?;
    Ok(())
}

pub(crate) async fn broadcast(
    pool: &PgPool,
    message: &str,
    kind: NotificationKind,
    link: Option<&str>,
    at: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    repositories::notifications::create_for_all_users(pool, message, kind, link, at).await
}

pub(crate) fn level_passed_message(exam_name: &str, score: f64) -> String {
    format!("مبروك! لقد اجتزت {exam_name} بنتيجة {score:.2}%")
}

pub(crate) fn new_subject_message(subject_name: &str) -> String {
    format!("تمت إضافة مادة جديدة: {subject_name}")
}

pub(crate) fn new_exam_message(subject_name: &str, level: i32) -> String {
    format!("اختبار جديد متاح في مادة {subject_name} (المستوى {level})")
}

pub(crate) fn question_replied_message() -> String {
    "تم الرد على سؤالك من قبل الإدارة".to_string()
}
