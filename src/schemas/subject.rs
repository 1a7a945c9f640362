use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Subject, SubjectImage, SubjectPdf, Term};
use crate::db::types::LifecycleStatus;
use crate::schemas::exam::GatedExamResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TermResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: String,
}

impl From<Term> for TermResponse {
    fn from(term: Term) -> Self {
        Self { id: term.id, name: term.name, created_at: format_primitive(term.created_at) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) term_id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) cover_image: Option<String>,
    pub(crate) status: LifecycleStatus,
    pub(crate) scheduled_at: Option<String>,
    pub(crate) created_at: String,
}

impl From<Subject> for SubjectResponse {
    fn from(subject: Subject) -> Self {
        Self {
            id: subject.id,
            term_id: subject.term_id,
            name: subject.name,
            description: subject.description,
            cover_image: subject.cover_image,
            status: subject.status,
            scheduled_at: subject.scheduled_at.map(format_primitive),
            created_at: format_primitive(subject.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectSummaryResponse {
    #[serde(flatten)]
    pub(crate) subject: SubjectResponse,
    pub(crate) average_rating: Option<f64>,
    pub(crate) ratings_count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PdfResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) file_url: String,
    pub(crate) file_size: Option<i64>,
    pub(crate) downloads_count: i64,
    pub(crate) created_at: String,
}

impl From<SubjectPdf> for PdfResponse {
    fn from(pdf: SubjectPdf) -> Self {
        Self {
            id: pdf.id,
            title: pdf.title,
            file_url: pdf.file_url,
            file_size: pdf.file_size,
            downloads_count: pdf.downloads_count,
            created_at: format_primitive(pdf.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageResponse {
    pub(crate) id: String,
    pub(crate) title: Option<String>,
    pub(crate) file_url: String,
    pub(crate) views_count: i64,
    pub(crate) created_at: String,
}

impl From<SubjectImage> for ImageResponse {
    fn from(image: SubjectImage) -> Self {
        Self {
            id: image.id,
            title: image.title,
            file_url: image.file_url,
            views_count: image.views_count,
            created_at: format_primitive(image.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectDetailResponse {
    #[serde(flatten)]
    pub(crate) subject: SubjectResponse,
    pub(crate) average_rating: Option<f64>,
    pub(crate) ratings_count: i64,
    pub(crate) pdfs: Vec<PdfResponse>,
    pub(crate) images: Vec<ImageResponse>,
    pub(crate) exams: Vec<GatedExamResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RateSubjectRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub(crate) rating: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct RateSubjectResponse {
    pub(crate) rating: i32,
    pub(crate) points_awarded: i64,
    pub(crate) average_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaterialPointsResponse {
    pub(crate) points_awarded: i64,
    pub(crate) total_points: i64,
}
