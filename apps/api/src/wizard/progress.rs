//! Read view over the store for navigation buttons and progress bars.
//!
//! Everything here is derived from the wizard position on demand; nothing is
//! cached between position changes.

use serde::{Deserialize, Serialize};

use crate::wizard::store::{next_allowed, previous_allowed, FormStore};
use crate::wizard::topology::{sub_step_count, WizardPosition, TOTAL_STEPS};
use crate::wizard::validation::ValidationErrorMap;

/// Share of the bar covered by each main step.
const STEP_BAND: f64 = 100.0 / (TOTAL_STEPS as f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProgressState {
    pub current_step: usize,
    pub current_sub_step: Option<usize>,
    pub total_steps: usize,
    pub total_sub_steps: usize,
    pub is_last_step: bool,
    pub is_last_sub_step: bool,
    pub has_sub_steps: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub progress: u8,
}

/// Progress state plus the store flags the navigation controls need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProgressSnapshot {
    #[serde(flatten)]
    pub state: FormProgressState,
    pub is_submitting: bool,
    pub is_dirty: bool,
    pub form_errors: ValidationErrorMap,
}

/// Completion percentage: each main step is a 25% band, filled linearly by
/// its sub-steps. 100 is reached only on the last sub-step of the last step.
pub fn progress_percent(position: WizardPosition) -> u8 {
    let main = position.main_step as f64 * STEP_BAND;
    let total_sub = sub_step_count(position.main_step);
    let sub = match position.sub_step {
        Some(s) if total_sub > 1 => s as f64 * (STEP_BAND / (total_sub - 1) as f64),
        _ => 0.0,
    };
    (main + sub).round().clamp(0.0, 100.0) as u8
}

pub fn derive_progress(position: WizardPosition) -> FormProgressState {
    let total_sub_steps = sub_step_count(position.main_step);
    let has_sub_steps = total_sub_steps > 0;
    let current_sub_step = if has_sub_steps {
        Some(position.sub_step.unwrap_or(0))
    } else {
        None
    };
    let sub = current_sub_step.unwrap_or(0);

    FormProgressState {
        current_step: position.main_step,
        current_sub_step,
        total_steps: TOTAL_STEPS,
        total_sub_steps,
        is_last_step: position.main_step == TOTAL_STEPS - 1,
        is_last_sub_step: has_sub_steps && sub == total_sub_steps - 1,
        has_sub_steps,
        // Each counter only matters on its own step.
        can_go_next: next_allowed(position.main_step, sub, sub),
        can_go_previous: previous_allowed(position.main_step, sub, sub),
        progress: progress_percent(position),
    }
}

/// Binds the derived view to a store so controls can also move through it.
pub struct FormProgressFacade<'a> {
    store: &'a mut FormStore,
}

impl<'a> FormProgressFacade<'a> {
    pub fn new(store: &'a mut FormStore) -> Self {
        FormProgressFacade { store }
    }

    pub fn state(&self) -> FormProgressState {
        derive_progress(self.store.position())
    }

    pub fn snapshot(&self) -> FormProgressSnapshot {
        snapshot_of(&*self.store)
    }

    pub fn go_next(&mut self) -> bool {
        self.store.navigate_next()
    }

    pub fn go_previous(&mut self) -> bool {
        self.store.navigate_previous()
    }

    pub fn is_submitting(&self) -> bool {
        self.store.is_submitting()
    }

    pub fn form_errors(&self) -> &ValidationErrorMap {
        self.store.form_errors()
    }
}

pub fn snapshot_of(store: &FormStore) -> FormProgressSnapshot {
    FormProgressSnapshot {
        state: derive_progress(store.position()),
        is_submitting: store.is_submitting(),
        is_dirty: store.is_dirty(),
        form_errors: store.form_errors().clone(),
    }
}
