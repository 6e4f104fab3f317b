use std::sync::Arc;

use crate::cv::CvRepository;
use crate::i18n::Translate;
use crate::wizard::WizardSessions;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: WizardSessions,
    /// Where finished CVs go. Default: `PgCvRepository`.
    pub cvs: Arc<dyn CvRepository>,
    /// Message catalog for validation messages, picked via `LOCALE`.
    pub translator: Arc<dyn Translate>,
}
