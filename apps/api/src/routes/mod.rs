pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard sessions
        .route(
            "/api/v1/wizard/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/wizard/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_dispose_session),
        )
        .route(
            "/api/v1/wizard/sessions/:id/progress",
            get(handlers::handle_get_progress),
        )
        .route(
            "/api/v1/wizard/sessions/:id/form",
            put(handlers::handle_set_form).patch(handlers::handle_update_field),
        )
        .route(
            "/api/v1/wizard/sessions/:id/entries/move",
            post(handlers::handle_move_entry),
        )
        .route(
            "/api/v1/wizard/sessions/:id/entries/remove",
            post(handlers::handle_remove_entry),
        )
        // Navigation
        .route(
            "/api/v1/wizard/sessions/:id/next",
            post(handlers::handle_next),
        )
        .route(
            "/api/v1/wizard/sessions/:id/previous",
            post(handlers::handle_previous),
        )
        .route(
            "/api/v1/wizard/sessions/:id/reset",
            post(handlers::handle_reset),
        )
        // Identity and CV persistence
        .route(
            "/api/v1/wizard/sessions/:id/user",
            put(handlers::handle_set_user),
        )
        .route(
            "/api/v1/wizard/sessions/:id/load/:cv_id",
            post(handlers::handle_load_cv),
        )
        .route(
            "/api/v1/wizard/sessions/:id/submit",
            post(handlers::handle_submit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::cv::repository::SubmitReceipt;
    use crate::cv::{CvRepository, CvSubmission};
    use crate::errors::AppError;
    use crate::i18n::MessageCatalog;
    use crate::models::cv::CvRow;
    use crate::wizard::{MemoryStorage, WizardSessions};

    struct NullRepo;

    #[async_trait]
    impl CvRepository for NullRepo {
        async fn save(&self, submission: CvSubmission) -> Result<SubmitReceipt, AppError> {
            Ok(SubmitReceipt {
                cv_id: Uuid::new_v4(),
                user_id: submission.user_id.unwrap_or_else(Uuid::new_v4),
            })
        }

        async fn fetch(&self, _cv_id: Uuid) -> Result<Option<CvRow>, AppError> {
            Ok(None)
        }
    }

    fn app() -> Router {
        build_router(AppState {
            sessions: WizardSessions::new(Arc::new(MemoryStorage::new()), Duration::from_secs(3600)),
            cvs: Arc::new(NullRepo),
            translator: Arc::new(MessageCatalog::for_locale("en").unwrap()),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/api/v1/wizard/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_new_session_starts_at_first_screen() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/v1/wizard/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body["stepInfo"],
            json!({
                "currentStep": 0,
                "currentSubStep": 0,
                "totalSteps": 4,
                "totalSubSteps": 5,
                "isLastStep": false,
                "isLastSubStep": false
            })
        );
        assert_eq!(body["progress"]["progress"], 0);
    }

    #[tokio::test]
    async fn test_next_with_empty_form_returns_translated_errors() {
        let app = app();
        let id = new_session(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizard/sessions/{id}/next"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["advanced"], false);
        assert_eq!(
            body["formErrors"]["personalInfo.firstName"],
            "First name is required"
        );
    }

    #[tokio::test]
    async fn test_patch_then_next_advances() {
        let app = app();
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizard/sessions/{id}/form"),
            Some(json!({
                "field": "personalInfo",
                "value": { "firstName": "Grace", "lastName": "Hopper" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizard/sessions/{id}/next"),
            None,
        )
        .await;
        assert_eq!(body["advanced"], true);
        assert_eq!(body["currentSubStep"], 1);
        assert_eq!(body["canGoPrevious"], true);
    }

    #[tokio::test]
    async fn test_move_entry_reports_change() {
        let app = app();
        let id = new_session(&app).await;
        call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizard/sessions/{id}/form"),
            Some(json!({ "field": "hobbies", "value": ["chess", "tennis"] })),
        )
        .await;
        let (_, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizard/sessions/{id}/entries/move"),
            Some(json!({ "section": "hobbies", "index": 1, "direction": "up" })),
        )
        .await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["formData"]["hobbies"], json!(["tennis", "chess"]));
    }

    #[tokio::test]
    async fn test_submit_before_final_step_conflicts() {
        let app = app();
        let id = new_session(&app).await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizard/sessions/{id}/submit"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_load_missing_cv_is_not_found() {
        let app = app();
        let id = new_session(&app).await;
        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizard/sessions/{id}/load/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispose_then_get_is_not_found() {
        let app = app();
        let id = new_session(&app).await;
        let uri = format!("/api/v1/wizard/sessions/{id}");
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
