use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::StudentQuestion;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AskQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "question_text must be 1 to 2000 characters"))]
    pub(crate) question_text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentQuestionResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_text: String,
    pub(crate) admin_reply: Option<String>,
    pub(crate) is_replied: bool,
    pub(crate) replied_at: Option<String>,
    pub(crate) created_at: String,
}

impl From<StudentQuestion> for StudentQuestionResponse {
    fn from(question: StudentQuestion) -> Self {
        Self {
            id: question.id,
            user_id: question.user_id,
            question_text: question.question_text,
            admin_reply: question.admin_reply,
            is_replied: question.is_replied,
            replied_at: question.replied_at.map(format_primitive),
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AskQuestionResponse {
    pub(crate) question: StudentQuestionResponse,
    pub(crate) remaining_this_month: i64,
}
