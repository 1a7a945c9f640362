pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod notifications;
pub(crate) mod profile;
pub(crate) mod router;
pub(crate) mod student_questions;
pub(crate) mod subjects;
