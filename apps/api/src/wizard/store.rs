//! Form state store: form data, wizard position and the navigation rules.
//!
//! State is split into `PersistedWizardState` (survives reloads, written
//! through to durable storage by `wizard::session`) and
//! `TransientWizardState` (dirty/submitting flags, errors, timestamps).
//! All operations are synchronous; navigation never fails, a blocked move
//! is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::wizard::form_data::{CvFormData, FormPatch, ListSection, MoveDirection};
use crate::wizard::progress::progress_percent;
use crate::wizard::topology::{
    WizardPosition, COMBINED_FORM_STEP, COMBINED_FORM_SUBSTEPS, PERSONAL_INFO_STEP,
    PERSONAL_INFO_SUBSTEPS, TOTAL_STEPS,
};
use crate::wizard::validation::{StepSlice, ValidationErrorMap};

/// Bumped whenever the persisted layout changes incompatibly.
pub const PERSISTED_STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistedStateError {
    #[error("Persisted wizard state is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Persisted wizard state has version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWizardState {
    pub version: u32,
    pub form_data: CvFormData,
    pub main_step: usize,
    pub personal_info_sub_step: usize,
    pub combined_form_sub_step: usize,
    pub is_editing: bool,
    /// CV being edited when `is_editing` is set.
    #[serde(default)]
    pub editing_cv_id: Option<Uuid>,
    /// Opaque identity correlation handed over by auth or by a submission.
    pub user_id: Option<Uuid>,
}

impl Default for PersistedWizardState {
    fn default() -> Self {
        PersistedWizardState {
            version: PERSISTED_STATE_VERSION,
            form_data: CvFormData::default(),
            main_step: PERSONAL_INFO_STEP,
            personal_info_sub_step: 0,
            combined_form_sub_step: 0,
            is_editing: false,
            editing_cv_id: None,
            user_id: None,
        }
    }
}

impl PersistedWizardState {
    pub fn to_json(&self) -> Result<String, PersistedStateError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a stored payload. Out-of-range step counters are clamped so a
    /// restored store always satisfies the topology.
    pub fn from_json(raw: &str) -> Result<Self, PersistedStateError> {
        let mut state: PersistedWizardState = serde_json::from_str(raw)?;
        if state.version != PERSISTED_STATE_VERSION {
            return Err(PersistedStateError::Version {
                found: state.version,
                expected: PERSISTED_STATE_VERSION,
            });
        }
        state.main_step = state.main_step.min(TOTAL_STEPS - 1);
        state.personal_info_sub_step = state.personal_info_sub_step.min(PERSONAL_INFO_SUBSTEPS - 1);
        state.combined_form_sub_step = state.combined_form_sub_step.min(COMBINED_FORM_SUBSTEPS - 1);
        Ok(state)
    }
}

/// Session-only state, reset on reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransientWizardState {
    pub is_dirty: bool,
    pub is_submitting: bool,
    pub form_errors: ValidationErrorMap,
    pub last_saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub current_step: usize,
    pub current_sub_step: Option<usize>,
    pub total_steps: usize,
    pub total_sub_steps: usize,
    pub is_last_step: bool,
    pub is_last_sub_step: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Navigation rules, shared with the progress facade
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn next_allowed(main_step: usize, personal_sub: usize, combined_sub: usize) -> bool {
    match main_step {
        PERSONAL_INFO_STEP => personal_sub < PERSONAL_INFO_SUBSTEPS - 1 || main_step < TOTAL_STEPS - 1,
        COMBINED_FORM_STEP => combined_sub < COMBINED_FORM_SUBSTEPS - 1,
        _ => main_step < TOTAL_STEPS - 1,
    }
}

pub(crate) fn previous_allowed(main_step: usize, personal_sub: usize, combined_sub: usize) -> bool {
    match main_step {
        PERSONAL_INFO_STEP => personal_sub > 0,
        COMBINED_FORM_STEP => combined_sub > 0 || main_step > 0,
        _ => main_step > 0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FormStore {
    persisted: PersistedWizardState,
    transient: TransientWizardState,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted state; transient fields start fresh.
    pub fn restore(persisted: PersistedWizardState) -> Self {
        FormStore {
            persisted,
            transient: TransientWizardState::default(),
        }
    }

    pub fn persisted(&self) -> &PersistedWizardState {
        &self.persisted
    }

    pub fn transient(&self) -> &TransientWizardState {
        &self.transient
    }

    fn in_personal_info(&self) -> bool {
        self.persisted.main_step == PERSONAL_INFO_STEP
    }

    fn in_combined_form(&self) -> bool {
        self.persisted.main_step == COMBINED_FORM_STEP
    }

    pub fn position(&self) -> WizardPosition {
        let sub_step = if self.in_personal_info() {
            Some(self.persisted.personal_info_sub_step)
        } else if self.in_combined_form() {
            Some(self.persisted.combined_form_sub_step)
        } else {
            None
        };
        WizardPosition {
            main_step: self.persisted.main_step,
            sub_step,
        }
    }

    pub fn step_info(&self) -> StepInfo {
        let p = &self.persisted;
        let (current_sub_step, total_sub_steps) = if self.in_personal_info() {
            (Some(p.personal_info_sub_step), PERSONAL_INFO_SUBSTEPS)
        } else if self.in_combined_form() {
            (Some(p.combined_form_sub_step), COMBINED_FORM_SUBSTEPS)
        } else {
            (None, 0)
        };
        let is_last_sub_step = (self.in_personal_info()
            && p.personal_info_sub_step == PERSONAL_INFO_SUBSTEPS - 1)
            || (self.in_combined_form() && p.combined_form_sub_step == COMBINED_FORM_SUBSTEPS - 1);

        StepInfo {
            current_step: p.main_step,
            current_sub_step,
            total_steps: TOTAL_STEPS,
            total_sub_steps,
            is_last_step: p.main_step == TOTAL_STEPS - 1,
            is_last_sub_step,
        }
    }

    /// Last sub-step of the last step: the only position a CV is submitted from.
    pub fn is_final_position(&self) -> bool {
        let info = self.step_info();
        info.is_last_step && info.is_last_sub_step
    }

    pub fn current_slice(&self) -> Option<StepSlice> {
        StepSlice::at(self.position())
    }

    pub fn can_navigate_next(&self) -> bool {
        let p = &self.persisted;
        next_allowed(p.main_step, p.personal_info_sub_step, p.combined_form_sub_step)
    }

    pub fn can_navigate_previous(&self) -> bool {
        let p = &self.persisted;
        previous_allowed(p.main_step, p.personal_info_sub_step, p.combined_form_sub_step)
    }

    /// Moves one screen forward. Returns false when already at the end.
    pub fn navigate_next(&mut self) -> bool {
        let p = &mut self.persisted;
        if p.main_step == PERSONAL_INFO_STEP && p.personal_info_sub_step < PERSONAL_INFO_SUBSTEPS - 1 {
            p.personal_info_sub_step += 1;
        } else if p.main_step == COMBINED_FORM_STEP
            && p.combined_form_sub_step < COMBINED_FORM_SUBSTEPS - 1
        {
            p.combined_form_sub_step += 1;
        } else if p.main_step < TOTAL_STEPS - 1 {
            p.main_step += 1;
            p.personal_info_sub_step = 0;
            p.combined_form_sub_step = 0;
        } else {
            return false;
        }
        true
    }

    /// Moves one screen back. Stepping back from education into personal
    /// info lands on its last sub-step, not on the one last visited.
    pub fn navigate_previous(&mut self) -> bool {
        let p = &mut self.persisted;
        if p.main_step == PERSONAL_INFO_STEP && p.personal_info_sub_step > 0 {
            p.personal_info_sub_step -= 1;
        } else if p.main_step == COMBINED_FORM_STEP {
            if p.combined_form_sub_step > 0 {
                p.combined_form_sub_step -= 1;
            } else {
                p.main_step -= 1;
                p.combined_form_sub_step = 0;
            }
        } else if p.main_step > 0 {
            p.main_step -= 1;
            p.personal_info_sub_step = if p.main_step == PERSONAL_INFO_STEP {
                PERSONAL_INFO_SUBSTEPS - 1
            } else {
                0
            };
            p.combined_form_sub_step = 0;
        } else {
            return false;
        }
        true
    }

    /// Completion percentage in `0..=100`.
    pub fn progress(&self) -> u8 {
        progress_percent(self.position())
    }

    pub fn form_data(&self) -> &CvFormData {
        &self.persisted.form_data
    }

    fn touch(&mut self) {
        self.transient.is_dirty = true;
        self.transient.last_saved_at = Some(Utc::now());
    }

    pub fn set_form_data(&mut self, data: CvFormData) {
        self.persisted.form_data = data;
        self.touch();
    }

    pub fn update_form_field(&mut self, patch: FormPatch) {
        self.persisted.form_data.apply(patch);
        self.touch();
    }

    pub fn move_entry(&mut self, section: ListSection, index: usize, dir: MoveDirection) -> bool {
        let moved = self.persisted.form_data.move_entry(section, index, dir);
        if moved {
            self.touch();
        }
        moved
    }

    pub fn remove_entry(&mut self, section: ListSection, index: usize) -> bool {
        let removed = self.persisted.form_data.remove_entry(section, index);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn form_errors(&self) -> &ValidationErrorMap {
        &self.transient.form_errors
    }

    pub fn set_form_errors(&mut self, errors: ValidationErrorMap) {
        self.transient.form_errors = errors;
    }

    pub fn clear_form_errors(&mut self) {
        self.transient.form_errors.clear();
    }

    /// Replaces the errors of one slice with the outcome of validating it.
    pub fn record_validation(&mut self, slice: StepSlice, outcome: Result<(), ValidationErrorMap>) {
        let fresh = outcome.err().unwrap_or_default();
        self.transient.form_errors.replace_slice(slice, fresh);
    }

    pub fn is_dirty(&self) -> bool {
        self.transient.is_dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.transient.is_submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.transient.is_submitting = submitting;
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.transient.last_saved_at
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.persisted.user_id
    }

    pub fn set_user_id(&mut self, user_id: Option<Uuid>) {
        self.persisted.user_id = user_id;
    }

    pub fn is_editing(&self) -> bool {
        self.persisted.is_editing
    }

    pub fn editing_cv_id(&self) -> Option<Uuid> {
        self.persisted.editing_cv_id
    }

    /// Replaces the form with a stored CV and restarts the wizard on it.
    pub fn begin_editing(&mut self, cv_id: Uuid, data: CvFormData) {
        let user_id = self.persisted.user_id;
        self.persisted = PersistedWizardState {
            form_data: data,
            is_editing: true,
            editing_cv_id: Some(cv_id),
            user_id,
            ..Default::default()
        };
        self.transient = TransientWizardState::default();
    }

    /// Back to an empty form at the first screen. The identity correlation
    /// survives; everything else returns to defaults.
    pub fn reset_form(&mut self) {
        let user_id = self.persisted.user_id;
        self.persisted = PersistedWizardState {
            user_id,
            ..Default::default()
        };
        self.transient = TransientWizardState::default();
    }
}
