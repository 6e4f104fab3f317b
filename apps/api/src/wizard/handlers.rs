use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::wizard::form_data::{CvFormData, FormPatch, ListSection, MoveDirection};
use crate::wizard::progress::FormProgressSnapshot;
use crate::wizard::session::{self, StepOutcome, SubmitOutcome, WizardSession};
use crate::wizard::store::StepInfo;
use crate::wizard::topology::WizardPosition;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEntryRequest {
    pub section: ListSection,
    pub index: usize,
    pub direction: MoveDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEntryRequest {
    pub section: ListSection,
    pub index: usize,
}

/// Everything a step screen needs to render itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub position: WizardPosition,
    pub step_info: StepInfo,
    pub progress: FormProgressSnapshot,
    pub form_data: CvFormData,
    pub is_editing: bool,
    pub editing_cv_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub durable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryEditResponse {
    pub changed: bool,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

fn snapshot(session: &WizardSession) -> SessionSnapshot {
    let store = session.store();
    SessionSnapshot {
        session_id: session.id(),
        position: store.position(),
        step_info: store.step_info(),
        progress: session.progress(),
        form_data: store.form_data().clone(),
        is_editing: store.is_editing(),
        editing_cv_id: store.editing_cv_id(),
        user_id: store.user_id(),
        last_saved_at: store.last_saved_at(),
        durable: session.is_durable(),
    }
}

/// POST /api/v1/wizard/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let (_, handle) = state.sessions.create(req.user_id).await;
    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(snapshot(&session))))
}

/// GET /api/v1/wizard/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let session = handle.lock().await;
    Ok(Json(snapshot(&session)))
}

/// DELETE /api/v1/wizard/sessions/:id
pub async fn handle_dispose_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.dispose(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/wizard/sessions/:id/progress
pub async fn handle_get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormProgressSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let session = handle.lock().await;
    Ok(Json(session.progress()))
}

/// PUT /api/v1/wizard/sessions/:id/form
pub async fn handle_set_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<CvFormData>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    session.mutate(|s| s.set_form_data(data)).await?;
    Ok(Json(snapshot(&session)))
}

/// PATCH /api/v1/wizard/sessions/:id/form
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FormPatch>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    session.mutate(|s| s.update_form_field(patch)).await?;
    Ok(Json(snapshot(&session)))
}

/// POST /api/v1/wizard/sessions/:id/entries/move
pub async fn handle_move_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveEntryRequest>,
) -> Result<Json<EntryEditResponse>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    let changed = session
        .mutate(|s| s.move_entry(req.section, req.index, req.direction))
        .await?;
    Ok(Json(EntryEditResponse {
        changed,
        snapshot: snapshot(&session),
    }))
}

/// POST /api/v1/wizard/sessions/:id/entries/remove
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveEntryRequest>,
) -> Result<Json<EntryEditResponse>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    let changed = session
        .mutate(|s| s.remove_entry(req.section, req.index))
        .await?;
    Ok(Json(EntryEditResponse {
        changed,
        snapshot: snapshot(&session),
    }))
}

/// POST /api/v1/wizard/sessions/:id/next
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepOutcome>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.advance(state.translator.as_ref()).await?))
}

/// POST /api/v1/wizard/sessions/:id/previous
pub async fn handle_previous(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepOutcome>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.retreat().await?))
}

/// POST /api/v1/wizard/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    session.reset().await?;
    Ok(Json(snapshot(&session)))
}

/// PUT /api/v1/wizard/sessions/:id/user
pub async fn handle_set_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetUserRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    session.mutate(|s| s.set_user_id(req.user_id)).await?;
    Ok(Json(snapshot(&session)))
}

/// POST /api/v1/wizard/sessions/:id/load/:cv_id
pub async fn handle_load_cv(
    State(state): State<AppState>,
    Path((id, cv_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.open(id).await?;
    let mut session = handle.lock().await;
    session.load_cv(state.cvs.as_ref(), cv_id).await?;
    Ok(Json(snapshot(&session)))
}

/// POST /api/v1/wizard/sessions/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitOutcome>, AppError> {
    let handle = state.sessions.open(id).await?;
    let outcome = session::submit(&handle, state.cvs.as_ref(), state.translator.as_ref()).await?;
    Ok(Json(outcome))
}
