pub(crate) mod admins;
pub(crate) mod attempts;
pub(crate) mod blocked;
pub(crate) mod exams;
pub(crate) mod materials;
pub(crate) mod notifications;
pub(crate) mod points;
pub(crate) mod questions;
pub(crate) mod ratings;
pub(crate) mod student_questions;
pub(crate) mod subjects;
pub(crate) mod terms;
pub(crate) mod users;
