// Submitted CVs: Postgres rows plus a Markdown export on S3.

pub mod render;
pub mod repository;

pub use repository::{form_data_of, CvRepository, CvSubmission, PgCvRepository};
