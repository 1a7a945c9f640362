pub(crate) mod exam_assembly;
pub(crate) mod grading;
pub(crate) mod level_gate;
pub(crate) mod notifications;
pub(crate) mod points;
pub(crate) mod question_import;
