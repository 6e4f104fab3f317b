use serde::{Deserialize, Serialize};

/// Degree value that requires the free-text `customDegree` field.
pub const DEGREE_OTHER: &str = "other";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Nationality {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    /// `DD/MM/YYYY`, optional.
    pub birth_date: String,
    pub birth_place: String,
    pub gender: String,
    pub nationality: Vec<Nationality>,
    pub driving_license: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub custom_degree: Option<String>,
    pub field_of_study: String,
    pub city: String,
    /// `MM/YYYY`
    pub start_date: String,
    /// `MM/YYYY`; ignored while `ongoing` is set.
    pub end_date: Option<String>,
    pub ongoing: bool,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub ongoing: bool,
    pub description: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub has_work_experience: bool,
    pub experiences: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub name: String,
    pub level: Option<SkillLevel>,
}

/// CEFR levels plus native speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageProficiency {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "native")]
    Native,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub name: String,
    pub proficiency: Option<LanguageProficiency>,
    pub test_name: Option<String>,
    pub test_score: Option<String>,
}

/// The work-in-progress CV, filled in across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvFormData {
    pub personal_info: PersonalInfo,
    pub educations: Vec<EducationEntry>,
    pub work_experience: WorkExperience,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub hobbies: Vec<String>,
}

/// A single-field patch sent by a step screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FormPatch {
    PersonalInfo(PersonalInfo),
    Educations(Vec<EducationEntry>),
    WorkExperience(WorkExperience),
    Skills(Vec<Skill>),
    Languages(Vec<Language>),
    Hobbies(Vec<String>),
}

/// Ordered lists whose entries the user can reorder or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListSection {
    Educations,
    Experiences,
    Skills,
    Languages,
    Hobbies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl CvFormData {
    pub fn apply(&mut self, patch: FormPatch) {
        match patch {
            FormPatch::PersonalInfo(v) => self.personal_info = v,
            FormPatch::Educations(v) => self.educations = v,
            FormPatch::WorkExperience(v) => self.work_experience = v,
            FormPatch::Skills(v) => self.skills = v,
            FormPatch::Languages(v) => self.languages = v,
            FormPatch::Hobbies(v) => self.hobbies = v,
        }
    }

    /// Swaps an entry with its neighbour. Returns false (and changes nothing)
    /// when the move would leave the list.
    pub fn move_entry(&mut self, section: ListSection, index: usize, dir: MoveDirection) -> bool {
        match section {
            ListSection::Educations => move_in(&mut self.educations, index, dir),
            ListSection::Experiences => move_in(&mut self.work_experience.experiences, index, dir),
            ListSection::Skills => move_in(&mut self.skills, index, dir),
            ListSection::Languages => move_in(&mut self.languages, index, dir),
            ListSection::Hobbies => move_in(&mut self.hobbies, index, dir),
        }
    }

    pub fn remove_entry(&mut self, section: ListSection, index: usize) -> bool {
        match section {
            ListSection::Educations => remove_in(&mut self.educations, index),
            ListSection::Experiences => remove_in(&mut self.work_experience.experiences, index),
            ListSection::Skills => remove_in(&mut self.skills, index),
            ListSection::Languages => remove_in(&mut self.languages, index),
            ListSection::Hobbies => remove_in(&mut self.hobbies, index),
        }
    }
}

fn move_in<T>(list: &mut [T], index: usize, dir: MoveDirection) -> bool {
    let target = match dir {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => index.checked_add(1),
    };
    match target {
        Some(t) if index < list.len() && t < list.len() => {
            list.swap(index, t);
            true
        }
        _ => false,
    }
}

fn remove_in<T>(list: &mut Vec<T>, index: usize) -> bool {
    if index < list.len() {
        list.remove(index);
        true
    } else {
        false
    }
}
