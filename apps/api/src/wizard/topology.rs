//! Step topology of the CV wizard.
//!
//! Four main steps; only the first (personal info) and the last (skills,
//! languages and hobbies) are split into sub-steps. Navigation in
//! `wizard::store` is written directly against this layout.

use serde::{Deserialize, Serialize};

pub const TOTAL_STEPS: usize = 4;
pub const PERSONAL_INFO_SUBSTEPS: usize = 5;
pub const COMBINED_FORM_SUBSTEPS: usize = 3;

pub const PERSONAL_INFO_STEP: usize = 0;
pub const EDUCATION_STEP: usize = 1;
pub const WORK_EXPERIENCE_STEP: usize = 2;
pub const COMBINED_FORM_STEP: usize = TOTAL_STEPS - 1;

/// Number of sub-steps of a main step (0 when the step is a single screen).
pub fn sub_step_count(main_step: usize) -> usize {
    match main_step {
        PERSONAL_INFO_STEP => PERSONAL_INFO_SUBSTEPS,
        COMBINED_FORM_STEP => COMBINED_FORM_SUBSTEPS,
        _ => 0,
    }
}

pub fn has_sub_steps(main_step: usize) -> bool {
    sub_step_count(main_step) > 0
}

/// Where the user currently is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardPosition {
    pub main_step: usize,
    /// `None` for steps without sub-steps.
    pub sub_step: Option<usize>,
}

impl WizardPosition {
    pub fn initial() -> Self {
        WizardPosition {
            main_step: PERSONAL_INFO_STEP,
            sub_step: Some(0),
        }
    }

    /// True when the position respects the step/sub-step layout.
    pub fn is_valid(&self) -> bool {
        if self.main_step >= TOTAL_STEPS {
            return false;
        }
        match (sub_step_count(self.main_step), self.sub_step) {
            (0, None) => true,
            (n, Some(s)) if n > 0 => s < n,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalInfoSection {
    Identity,
    Contact,
    Address,
    Background,
    Profile,
}

impl PersonalInfoSection {
    pub fn from_sub_step(sub_step: usize) -> Option<Self> {
        match sub_step {
            0 => Some(Self::Identity),
            1 => Some(Self::Contact),
            2 => Some(Self::Address),
            3 => Some(Self::Background),
            4 => Some(Self::Profile),
            _ => None,
        }
    }

    pub fn all() -> [Self; PERSONAL_INFO_SUBSTEPS] {
        [
            Self::Identity,
            Self::Contact,
            Self::Address,
            Self::Background,
            Self::Profile,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedSection {
    Skills,
    Languages,
    Hobbies,
}

impl CombinedSection {
    pub fn from_sub_step(sub_step: usize) -> Option<Self> {
        match sub_step {
            0 => Some(Self::Skills),
            1 => Some(Self::Languages),
            2 => Some(Self::Hobbies),
            _ => None,
        }
    }

    pub fn all() -> [Self; COMBINED_FORM_SUBSTEPS] {
        [Self::Skills, Self::Languages, Self::Hobbies]
    }
}
