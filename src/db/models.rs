use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{LifecycleStatus, NotificationKind, PointsAction, QuestionKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) device_id: String,
    pub(crate) total_points: i64,
    pub(crate) is_blocked: bool,
    pub(crate) blocked_reason: Option<String>,
    pub(crate) registered_at: PrimitiveDateTime,
    pub(crate) last_login: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Admin {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) permissions: Json<serde_json::Value>,
    pub(crate) is_super_admin: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Term {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) term_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) cover_image: Option<String>,
    pub(crate) status: LifecycleStatus,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubjectPdf {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) title: String,
    pub(crate) file_url: String,
    pub(crate) file_size: Option<i64>,
    pub(crate) downloads_count: i64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubjectImage {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) title: Option<String>,
    pub(crate) file_url: String,
    pub(crate) views_count: i64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) level: i32,
    pub(crate) name: String,
    pub(crate) status: LifecycleStatus,
    pub(crate) open_at: Option<PrimitiveDateTime>,
    pub(crate) close_at: Option<PrimitiveDateTime>,
    pub(crate) pass_percentage: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) options: Json<BTreeMap<String, String>>,
    pub(crate) correct_answer: String,
    pub(crate) question_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAttempt {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) answers: Json<BTreeMap<String, String>>,
    pub(crate) attempted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct PointsLogEntry {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) action: PointsAction,
    pub(crate) points: i64,
    pub(crate) detail: Json<serde_json::Value>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Rating {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) subject_id: String,
    pub(crate) rating: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Notification {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) message: String,
    pub(crate) kind: NotificationKind,
    pub(crate) link: Option<String>,
    pub(crate) is_read: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct BlockedEntry {
    pub(crate) id: String,
    pub(crate) email: Option<String>,
    pub(crate) device_id: Option<String>,
    pub(crate) reason: Option<String>,
    pub(crate) blocked_by: Option<String>,
    pub(crate) blocked_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentQuestion {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_text: String,
    pub(crate) admin_reply: Option<String>,
    pub(crate) replied_by: Option<String>,
    pub(crate) replied_at: Option<PrimitiveDateTime>,
    pub(crate) is_replied: bool,
    pub(crate) created_at: PrimitiveDateTime,
}
