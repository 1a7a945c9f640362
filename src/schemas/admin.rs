use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{BlockedEntry, Question, User};
use crate::db::types::{LifecycleStatus, NotificationKind, QuestionKind};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TermCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, message = "term_id must not be empty"))]
    pub(crate) term_id: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "coverImage")]
    pub(crate) cover_image: Option<String>,
    #[serde(default = "default_status_open")]
    pub(crate) status: LifecycleStatus,
    #[serde(
        default,
        alias = "scheduledAt",
        deserialize_with = "deserialize_option_datetime_flexible"
    )]
    pub(crate) scheduled_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "coverImage")]
    pub(crate) cover_image: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<LifecycleStatus>,
    #[serde(
        default,
        alias = "scheduledAt",
        deserialize_with = "deserialize_option_datetime_flexible"
    )]
    pub(crate) scheduled_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PdfCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(alias = "fileUrl")]
    #[validate(length(min = 1, message = "file_url must not be empty"))]
    pub(crate) file_url: String,
    #[serde(default)]
    #[serde(alias = "fileSize")]
    pub(crate) file_size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ImageCreate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(alias = "fileUrl")]
    #[validate(length(min = 1, message = "file_url must not be empty"))]
    pub(crate) file_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(range(min = 1, message = "level must be positive"))]
    pub(crate) level: i32,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default = "default_status_open")]
    pub(crate) status: LifecycleStatus,
    #[serde(default, alias = "openAt", deserialize_with = "deserialize_option_datetime_flexible")]
    pub(crate) open_at: Option<OffsetDateTime>,
    #[serde(default, alias = "closeAt", deserialize_with = "deserialize_option_datetime_flexible")]
    pub(crate) close_at: Option<OffsetDateTime>,
    #[serde(default = "default_pass_percentage")]
    #[serde(alias = "passPercentage")]
    #[validate(range(min = 0, max = 100, message = "pass_percentage must be between 0 and 100"))]
    pub(crate) pass_percentage: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<LifecycleStatus>,
    #[serde(default, alias = "openAt", deserialize_with = "deserialize_option_datetime_flexible")]
    pub(crate) open_at: Option<OffsetDateTime>,
    #[serde(default, alias = "closeAt", deserialize_with = "deserialize_option_datetime_flexible")]
    pub(crate) close_at: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "passPercentage")]
    #[validate(range(min = 0, max = 100, message = "pass_percentage must be between 0 and 100"))]
    pub(crate) pass_percentage: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) options: BTreeMap<String, String>,
    #[serde(alias = "correctAnswer")]
    #[validate(length(min = 1, message = "correct_answer must not be empty"))]
    pub(crate) correct_answer: String,
    #[serde(default)]
    #[serde(alias = "questionOrder")]
    pub(crate) question_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: Option<String>,
    #[serde(default)]
    pub(crate) kind: Option<QuestionKind>,
    #[serde(default)]
    pub(crate) options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "questionOrder")]
    pub(crate) question_order: Option<i32>,
}

/// Admin view of a question, answer key included.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionAdminResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) options: BTreeMap<String, String>,
    pub(crate) correct_answer: String,
    pub(crate) question_order: i32,
}

impl From<Question> for QuestionAdminResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_text: question.question_text,
            kind: question.kind,
            options: question.options.0,
            correct_answer: question.correct_answer,
            question_order: question.question_order,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ImportTextRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) imported: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(email(message = "invalid email"))]
    pub(crate) email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) permissions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PermissionsUpdate {
    pub(crate) permissions: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BlockStudentRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReplyRequest {
    #[validate(length(min = 1, message = "reply must not be empty"))]
    pub(crate) reply: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BroadcastRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub(crate) message: String,
    #[serde(default = "default_kind_info")]
    pub(crate) kind: NotificationKind,
    #[serde(default)]
    pub(crate) link: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BroadcastResponse {
    pub(crate) delivered: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentAdminResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) device_id: String,
    pub(crate) total_points: i64,
    pub(crate) is_blocked: bool,
    pub(crate) blocked_reason: Option<String>,
    pub(crate) registered_at: String,
    pub(crate) last_login: Option<String>,
}

impl From<User> for StudentAdminResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            device_id: user.device_id,
            total_points: user.total_points,
            is_blocked: user.is_blocked,
            blocked_reason: user.blocked_reason,
            registered_at: format_primitive(user.registered_at),
            last_login: user.last_login.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BlockedEntryResponse {
    pub(crate) id: String,
    pub(crate) email: Option<String>,
    pub(crate) device_id: Option<String>,
    pub(crate) reason: Option<String>,
    pub(crate) blocked_at: String,
}

impl From<BlockedEntry> for BlockedEntryResponse {
    fn from(entry: BlockedEntry) -> Self {
        Self {
            id: entry.id,
            email: entry.email,
            device_id: entry.device_id,
            reason: entry.reason,
            blocked_at: format_primitive(entry.blocked_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardStatsResponse {
    pub(crate) total_students: i64,
    pub(crate) total_subjects: i64,
    pub(crate) total_exams: i64,
    pub(crate) total_attempts: i64,
    pub(crate) attempts_today: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) unanswered_questions: i64,
    pub(crate) top_students: Vec<TopStudentEntry>,
    pub(crate) top_pdfs: Vec<TopPdfEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopStudentEntry {
    pub(crate) name: String,
    pub(crate) total_points: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopPdfEntry {
    pub(crate) title: String,
    pub(crate) downloads_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamStatsResponse {
    pub(crate) exam_id: String,
    pub(crate) attempts: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) best_score: Option<f64>,
    pub(crate) worst_score: Option<f64>,
    pub(crate) passed_count: i64,
    pub(crate) failed_count: i64,
}

fn default_status_open() -> LifecycleStatus {
    LifecycleStatus::Open
}

fn default_pass_percentage() -> i32 {
    80
}

fn default_kind_info() -> NotificationKind {
    NotificationKind::Info
}

fn parse_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // datetime-local inputs come without a timezone suffix.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        if let Ok(value) = OffsetDateTime::parse(&format!("{raw}:00Z"), &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        if let Ok(value) = OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339) {
            return Some(value);
        }
    }

    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_option_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flexible_datetime_accepts_common_shapes() {
        assert!(parse_datetime_flexible("2025-03-10T12:00:00Z").is_some());
        assert!(parse_datetime_flexible("2025-03-10T12:00").is_some());
        assert!(parse_datetime_flexible("2025-03-10T12:00:00").is_some());
        assert!(parse_datetime_flexible("10/03/2025").is_none());
    }
}
