//! Wizard sessions: one `FormStore` per client, written through to durable
//! storage after every mutation.
//!
//! Each session sits behind its own async mutex, so operations on a session
//! run one at a time in arrival order. Submission releases the lock while
//! the repository call is in flight; `isSubmitting` blocks other mutations
//! meanwhile.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cv::{form_data_of, CvRepository, CvSubmission};
use crate::errors::AppError;
use crate::i18n::Translate;
use crate::wizard::progress::{snapshot_of, FormProgressFacade, FormProgressSnapshot};
use crate::wizard::storage::{storage_key, DurableStorage};
use crate::wizard::store::{FormStore, PersistedWizardState};
use crate::wizard::validation::{validate_all, validate_step};

pub type SessionHandle = Arc<Mutex<WizardSession>>;

pub struct WizardSession {
    id: Uuid,
    store: FormStore,
    storage: Arc<dyn DurableStorage>,
    durable: bool,
    /// Set by `WizardSessions::dispose`; handles obtained earlier go inert.
    disposed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub advanced: bool,
    #[serde(flatten)]
    pub progress: FormProgressSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub submitted: bool,
    pub cv_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub progress: FormProgressSnapshot,
}

impl WizardSession {
    /// A fresh session with an empty form at the first screen.
    pub fn create(id: Uuid, storage: Arc<dyn DurableStorage>) -> Self {
        WizardSession {
            id,
            store: FormStore::new(),
            storage,
            durable: true,
            disposed: false,
        }
    }

    /// Rebuilds a session from durable storage. `None` when nothing usable
    /// is stored or storage cannot be reached.
    pub async fn restore(id: Uuid, storage: Arc<dyn DurableStorage>) -> Option<Self> {
        let key = storage_key(id);
        let raw = match storage.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cannot restore wizard session {id}: {e}");
                return None;
            }
        };
        match PersistedWizardState::from_json(&raw) {
            Ok(persisted) => {
                info!("Restored wizard session {id}");
                Some(WizardSession {
                    id,
                    store: FormStore::restore(persisted),
                    storage,
                    durable: true,
                    disposed: false,
                })
            }
            Err(e) => {
                warn!("Discarding stored state of wizard session {id}: {e}");
                None
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn progress(&self) -> FormProgressSnapshot {
        snapshot_of(&self.store)
    }

    /// Writes the persisted subset through to storage. Failures switch the
    /// session to in-memory mode until a later write succeeds.
    pub async fn flush(&mut self) {
        if self.disposed {
            return;
        }
        let payload = match self.store.persisted().to_json() {
            Ok(p) => p,
            Err(e) => {
                warn!("Cannot encode wizard session {}: {e}", self.id);
                return;
            }
        };
        match self.storage.set(&storage_key(self.id), &payload).await {
            Ok(()) => {
                if !self.durable {
                    info!("Wizard session {} is durable again", self.id);
                }
                self.durable = true;
            }
            Err(e) => {
                if self.durable {
                    warn!("Wizard session {} continues in memory only: {e}", self.id);
                }
                self.durable = false;
            }
        }
    }

    async fn purge(&mut self) {
        if let Err(e) = self.storage.remove(&storage_key(self.id)).await {
            warn!("Cannot purge stored state of wizard session {}: {e}", self.id);
        }
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.disposed {
            return Err(AppError::NotFound(format!(
                "Wizard session {} not found",
                self.id
            )));
        }
        if self.store.is_submitting() {
            return Err(AppError::Conflict(
                "A submission is in progress for this session".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies a synchronous store mutation and persists the result.
    pub async fn mutate<R>(&mut self, f: impl FnOnce(&mut FormStore) -> R) -> Result<R, AppError> {
        self.ensure_idle()?;
        let result = f(&mut self.store);
        self.flush().await;
        Ok(result)
    }

    /// Validates the current screen and moves forward if it passes. Errors
    /// for the current screen replace the previous ones; other screens keep
    /// theirs.
    pub async fn advance(&mut self, t: &dyn Translate) -> Result<StepOutcome, AppError> {
        self.ensure_idle()?;
        let advanced = match self.store.current_slice() {
            Some(slice) if self.store.can_navigate_next() => {
                let outcome = validate_step(slice, self.store.form_data(), t);
                let passed = outcome.is_ok();
                self.store.record_validation(slice, outcome);
                passed && FormProgressFacade::new(&mut self.store).go_next()
            }
            _ => false,
        };
        debug!(
            "Wizard session {} next: advanced={advanced} at {:?}",
            self.id,
            self.store.position()
        );
        self.flush().await;
        Ok(StepOutcome {
            advanced,
            progress: self.progress(),
        })
    }

    pub async fn retreat(&mut self) -> Result<StepOutcome, AppError> {
        self.ensure_idle()?;
        let moved = FormProgressFacade::new(&mut self.store).go_previous();
        debug!(
            "Wizard session {} previous: moved={moved} at {:?}",
            self.id,
            self.store.position()
        );
        self.flush().await;
        Ok(StepOutcome {
            advanced: moved,
            progress: self.progress(),
        })
    }

    /// Clears the form. The stored form is overwritten with the defaults
    /// rather than removed, so the session and its `userId` outlive a restart.
    pub async fn reset(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.store.reset_form();
        self.flush().await;
        info!("Wizard session {} reset", self.id);
        Ok(())
    }

    /// Loads a stored CV into the form for editing.
    pub async fn load_cv(&mut self, repo: &dyn CvRepository, cv_id: Uuid) -> Result<(), AppError> {
        self.ensure_idle()?;
        let row = repo
            .fetch(cv_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
        if let Some(user) = self.store.user_id() {
            if user != row.user_id {
                return Err(AppError::NotFound(format!("CV {cv_id} not found")));
            }
        }
        let data = form_data_of(&row)?;
        self.store.set_user_id(Some(row.user_id));
        self.store.begin_editing(cv_id, data);
        self.flush().await;
        info!("Wizard session {} editing CV {cv_id}", self.id);
        Ok(())
    }
}

/// Final submission. Validates every screen, hands the form to `repo`, and
/// resets the form on success. On failure the position and form data stay
/// as they were and `isSubmitting` is cleared.
pub async fn submit(
    handle: &SessionHandle,
    repo: &dyn CvRepository,
    t: &dyn Translate,
) -> Result<SubmitOutcome, AppError> {
    let submission = {
        let mut session = handle.lock().await;
        session.ensure_idle()?;
        if !session.store.is_final_position() {
            return Err(AppError::Conflict(
                "The CV can only be submitted from the last step".to_string(),
            ));
        }
        if let Err(errors) = validate_all(session.store.form_data(), t) {
            info!(
                "Wizard session {} submission blocked by {} field error(s)",
                session.id,
                errors.len()
            );
            session.store.set_form_errors(errors);
            return Ok(SubmitOutcome {
                submitted: false,
                cv_id: None,
                user_id: session.store.user_id(),
                progress: session.progress(),
            });
        }
        session.store.clear_form_errors();
        session.store.set_submitting(true);
        CvSubmission {
            user_id: session.store.user_id(),
            cv_id: session.store.editing_cv_id(),
            data: session.store.form_data().clone(),
        }
    };

    let result = repo.save(submission).await;

    let mut session = handle.lock().await;
    session.store.set_submitting(false);
    match result {
        Ok(receipt) => {
            session.store.set_user_id(Some(receipt.user_id));
            session.store.reset_form();
            session.flush().await;
            info!(
                "Wizard session {} submitted CV {}",
                session.id, receipt.cv_id
            );
            Ok(SubmitOutcome {
                submitted: true,
                cv_id: Some(receipt.cv_id),
                user_id: Some(receipt.user_id),
                progress: session.progress(),
            })
        }
        Err(e) => {
            warn!("Wizard session {} submission failed: {e}", session.id);
            session.flush().await;
            Err(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

struct LiveSession {
    handle: SessionHandle,
    touched: Instant,
}

impl LiveSession {
    fn new(handle: SessionHandle) -> Self {
        LiveSession {
            handle,
            touched: Instant::now(),
        }
    }

    fn touch(&mut self) -> SessionHandle {
        self.touched = Instant::now();
        self.handle.clone()
    }
}

/// Live sessions of this process, backed by durable storage.
///
/// Sessions idle for longer than `idle_ttl` are dropped from memory by
/// `evict_idle`; their stored state stays and is restored on next use.
#[derive(Clone)]
pub struct WizardSessions {
    live: Arc<Mutex<HashMap<Uuid, LiveSession>>>,
    storage: Arc<dyn DurableStorage>,
    idle_ttl: Duration,
}

impl WizardSessions {
    pub fn new(storage: Arc<dyn DurableStorage>, idle_ttl: Duration) -> Self {
        WizardSessions {
            live: Arc::new(Mutex::new(HashMap::new())),
            storage,
            idle_ttl,
        }
    }

    pub async fn create(&self, user_id: Option<Uuid>) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let mut session = WizardSession::create(id, self.storage.clone());
        session.store.set_user_id(user_id);
        session.flush().await;
        let handle = Arc::new(Mutex::new(session));
        self.live
            .lock()
            .await
            .insert(id, LiveSession::new(handle.clone()));
        info!("Created wizard session {id}");
        (id, handle)
    }

    /// Returns the live session, restoring it from storage after a restart
    /// or an eviction.
    pub async fn open(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        if let Some(entry) = self.live.lock().await.get_mut(&id) {
            return Ok(entry.touch());
        }

        // The registry is not locked while storage is read.
        let session = WizardSession::restore(id, self.storage.clone())
            .await
            .ok_or_else(|| AppError::NotFound(format!("Wizard session {id} not found")))?;

        // Another request may have restored the same session meanwhile.
        let mut live = self.live.lock().await;
        let entry = live
            .entry(id)
            .or_insert_with(|| LiveSession::new(Arc::new(Mutex::new(session))));
        Ok(entry.touch())
    }

    /// Drops the session and its stored state.
    pub async fn dispose(&self, id: Uuid) -> Result<(), AppError> {
        let handle = self.open(id).await?;
        let mut session = handle.lock().await;
        session.ensure_idle()?;
        session.disposed = true;
        session.purge().await;
        self.live.lock().await.remove(&id);
        info!("Disposed wizard session {id}");
        Ok(())
    }

    /// Drops sessions untouched for longer than the idle TTL from memory.
    /// Sessions with a request in flight are kept. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut live = self.live.lock().await;
        let before = live.len();
        live.retain(|_, entry| {
            now.duration_since(entry.touched) < self.idle_ttl
                || Arc::strong_count(&entry.handle) > 1
        });
        let evicted = before - live.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle wizard session(s), {} live", live.len());
        }
        evicted
    }

    /// Runs `evict_idle` every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                sessions.evict_idle().await;
            }
        })
    }

    #[cfg(test)]
    async fn is_live(&self, id: Uuid) -> bool {
        self.live.lock().await.contains_key(&id)
    }
}
