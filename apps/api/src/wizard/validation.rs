//! Step validation gate.
//!
//! Each wizard screen maps to one `StepSlice`; validating a slice only looks
//! at the fields that screen edits and reports failures by dotted path
//! (`personalInfo.email`, `educations.0.endDate`). Message keys drop the
//! entry index (`educations.endDate.beforeStart`).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::i18n::Translate;
use crate::wizard::form_data::{
    CvFormData, EducationEntry, ExperienceEntry, PersonalInfo, DEGREE_OTHER,
};
use crate::wizard::topology::{
    CombinedSection, PersonalInfoSection, WizardPosition, COMBINED_FORM_STEP, EDUCATION_STEP,
    PERSONAL_INFO_STEP, WORK_EXPERIENCE_STEP,
};

const SUMMARY_MAX_CHARS: usize = 1000;
const PHONE_MIN_DIGITS: usize = 6;

// ────────────────────────────────────────────────────────────────────────────
// Error map
// ────────────────────────────────────────────────────────────────────────────

/// Field path → message. A missing path means the field has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrorMap(BTreeMap<String, String>);

impl ValidationErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.insert(path.into(), message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drops every error owned by `slice`, then adds `fresh`.
    /// Errors of other slices stay untouched.
    pub fn replace_slice(&mut self, slice: StepSlice, fresh: ValidationErrorMap) {
        self.0.retain(|path, _| !slice.owns(path));
        self.0.extend(fresh.0);
    }

    pub fn merge(&mut self, other: ValidationErrorMap) {
        self.0.extend(other.0);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Slices
// ────────────────────────────────────────────────────────────────────────────

/// The part of the form edited by a single wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "section", rename_all = "snake_case")]
pub enum StepSlice {
    PersonalInfo(PersonalInfoSection),
    Education,
    WorkExperience,
    Combined(CombinedSection),
}

impl StepSlice {
    /// The slice shown at `position`, if the position is well-formed.
    pub fn at(position: WizardPosition) -> Option<Self> {
        match (position.main_step, position.sub_step) {
            (PERSONAL_INFO_STEP, Some(s)) => PersonalInfoSection::from_sub_step(s).map(Self::PersonalInfo),
            (EDUCATION_STEP, _) => Some(Self::Education),
            (WORK_EXPERIENCE_STEP, _) => Some(Self::WorkExperience),
            (COMBINED_FORM_STEP, Some(s)) => CombinedSection::from_sub_step(s).map(Self::Combined),
            _ => None,
        }
    }

    /// Every slice in wizard order.
    pub fn all() -> Vec<Self> {
        let mut slices: Vec<Self> = PersonalInfoSection::all()
            .into_iter()
            .map(Self::PersonalInfo)
            .collect();
        slices.push(Self::Education);
        slices.push(Self::WorkExperience);
        slices.extend(CombinedSection::all().into_iter().map(Self::Combined));
        slices
    }

    fn field_paths(&self) -> &'static [&'static str] {
        match self {
            Self::PersonalInfo(PersonalInfoSection::Identity) => &[
                "personalInfo.firstName",
                "personalInfo.lastName",
                "personalInfo.title",
            ],
            Self::PersonalInfo(PersonalInfoSection::Contact) => {
                &["personalInfo.email", "personalInfo.phone"]
            }
            Self::PersonalInfo(PersonalInfoSection::Address) => &[
                "personalInfo.address",
                "personalInfo.city",
                "personalInfo.zip",
                "personalInfo.country",
            ],
            Self::PersonalInfo(PersonalInfoSection::Background) => &[
                "personalInfo.birthDate",
                "personalInfo.birthPlace",
                "personalInfo.gender",
                "personalInfo.nationality",
            ],
            Self::PersonalInfo(PersonalInfoSection::Profile) => {
                &["personalInfo.summary", "personalInfo.drivingLicense"]
            }
            Self::Education => &["educations"],
            Self::WorkExperience => &["workExperience"],
            Self::Combined(CombinedSection::Skills) => &["skills"],
            Self::Combined(CombinedSection::Languages) => &["languages"],
            Self::Combined(CombinedSection::Hobbies) => &["hobbies"],
        }
    }

    /// True when `path` addresses a field edited on this slice.
    pub fn owns(&self, path: &str) -> bool {
        self.field_paths().iter().any(|p| {
            path == *p
                || path
                    .strip_prefix(p)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dates
// ────────────────────────────────────────────────────────────────────────────

/// A `MM/YYYY` date; ordering is (year, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

pub fn parse_month_year(raw: &str) -> Option<MonthYear> {
    let (month, year) = raw.trim().split_once('/')?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(month) || month.len() > 2 || !digits(year) || year.len() != 4 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
    Some(MonthYear {
        year: date.year(),
        month: date.month(),
    })
}

fn is_valid_birth_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").is_ok()
}

// ────────────────────────────────────────────────────────────────────────────
// Gate
// ────────────────────────────────────────────────────────────────────────────

struct Collector<'a> {
    errors: ValidationErrorMap,
    t: &'a dyn Translate,
}

impl<'a> Collector<'a> {
    fn new(t: &'a dyn Translate) -> Self {
        Collector {
            errors: ValidationErrorMap::new(),
            t,
        }
    }

    fn fail(&mut self, path: impl Into<String>, key: &str) {
        let path = path.into();
        // First failure per field wins.
        if self.errors.get(&path).is_none() {
            let message = self.t.translate(key);
            self.errors.insert(path, message);
        }
    }

    fn require(&mut self, value: &str, path: &str, key_prefix: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(path, &format!("{key_prefix}.required"));
            false
        } else {
            true
        }
    }

    fn finish(self) -> Result<(), ValidationErrorMap> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validates the slice of `data` edited on one screen. Read-only over the
/// form data; the caller decides what to do with the returned errors.
pub fn validate_step(
    slice: StepSlice,
    data: &CvFormData,
    t: &dyn Translate,
) -> Result<(), ValidationErrorMap> {
    let mut c = Collector::new(t);
    match slice {
        StepSlice::PersonalInfo(section) => personal_info(&mut c, section, &data.personal_info),
        StepSlice::Education => educations(&mut c, &data.educations),
        StepSlice::WorkExperience => work_experience(&mut c, data),
        StepSlice::Combined(CombinedSection::Skills) => skills(&mut c, data),
        StepSlice::Combined(CombinedSection::Languages) => languages(&mut c, data),
        StepSlice::Combined(CombinedSection::Hobbies) => hobbies(&mut c, data),
    }
    c.finish()
}

/// Validates every slice, as done before final submission.
pub fn validate_all(data: &CvFormData, t: &dyn Translate) -> Result<(), ValidationErrorMap> {
    let mut errors = ValidationErrorMap::new();
    for slice in StepSlice::all() {
        if let Err(e) = validate_step(slice, data, t) {
            errors.merge(e);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn personal_info(c: &mut Collector<'_>, section: PersonalInfoSection, p: &PersonalInfo) {
    match section {
        PersonalInfoSection::Identity => {
            c.require(&p.first_name, "personalInfo.firstName", "personalInfo.firstName");
            c.require(&p.last_name, "personalInfo.lastName", "personalInfo.lastName");
        }
        PersonalInfoSection::Contact => {
            if c.require(&p.email, "personalInfo.email", "personalInfo.email")
                && !looks_like_email(&p.email)
            {
                c.fail("personalInfo.email", "personalInfo.email.invalid");
            }
            if c.require(&p.phone, "personalInfo.phone", "personalInfo.phone")
                && !looks_like_phone(&p.phone)
            {
                c.fail("personalInfo.phone", "personalInfo.phone.invalid");
            }
        }
        PersonalInfoSection::Address => {
            c.require(&p.address, "personalInfo.address", "personalInfo.address");
            c.require(&p.city, "personalInfo.city", "personalInfo.city");
            if c.require(&p.zip, "personalInfo.zip", "personalInfo.zip") && !looks_like_zip(&p.zip)
            {
                c.fail("personalInfo.zip", "personalInfo.zip.invalid");
            }
        }
        PersonalInfoSection::Background => {
            if !p.birth_date.trim().is_empty() && !is_valid_birth_date(&p.birth_date) {
                c.fail("personalInfo.birthDate", "personalInfo.birthDate.invalid");
            }
            if p.nationality.is_empty() {
                c.fail("personalInfo.nationality", "personalInfo.nationality.required");
            }
        }
        PersonalInfoSection::Profile => {
            if p.summary.chars().count() > SUMMARY_MAX_CHARS {
                c.fail("personalInfo.summary", "personalInfo.summary.tooLong");
            }
        }
    }
}

fn educations(c: &mut Collector<'_>, entries: &[EducationEntry]) {
    if entries.is_empty() {
        c.fail("educations", "educations.required");
        return;
    }
    for (i, e) in entries.iter().enumerate() {
        let at = |field: &str| format!("educations.{i}.{field}");
        c.require(&e.school, &at("school"), "educations.school");
        if c.require(&e.degree, &at("degree"), "educations.degree") && e.degree == DEGREE_OTHER {
            c.require(
                e.custom_degree.as_deref().unwrap_or_default(),
                &at("customDegree"),
                "educations.customDegree",
            );
        }
        c.require(&e.field_of_study, &at("fieldOfStudy"), "educations.fieldOfStudy");
        period(
            c,
            &format!("educations.{i}"),
            "educations",
            &e.start_date,
            e.end_date.as_deref(),
            e.ongoing,
        );
    }
}

fn work_experience(c: &mut Collector<'_>, data: &CvFormData) {
    let work = &data.work_experience;
    if !work.has_work_experience {
        return;
    }
    if work.experiences.is_empty() {
        c.fail(
            "workExperience.experiences",
            "workExperience.experiences.required",
        );
        return;
    }
    const KEY: &str = "workExperience.experiences";
    for (i, e) in work.experiences.iter().enumerate() {
        experience(c, i, e, KEY);
    }
}

fn experience(c: &mut Collector<'_>, i: usize, e: &ExperienceEntry, key: &str) {
    let base = format!("{key}.{i}");
    c.require(&e.company, &format!("{base}.company"), &format!("{key}.company"));
    c.require(&e.position, &format!("{base}.position"), &format!("{key}.position"));
    period(c, &base, key, &e.start_date, e.end_date.as_deref(), e.ongoing);
}

/// Start/end dates of one entry. The end date is neither required nor
/// checked while the entry is ongoing.
fn period(
    c: &mut Collector<'_>,
    base: &str,
    key: &str,
    start: &str,
    end: Option<&str>,
    ongoing: bool,
) {
    let start_path = format!("{base}.startDate");
    let start = if c.require(start, &start_path, &format!("{key}.startDate")) {
        let parsed = parse_month_year(start);
        if parsed.is_none() {
            c.fail(&start_path, &format!("{key}.startDate.invalid"));
        }
        parsed
    } else {
        None
    };

    if ongoing {
        return;
    }

    let end_path = format!("{base}.endDate");
    let end = end.unwrap_or_default();
    if !c.require(end, &end_path, &format!("{key}.endDate")) {
        return;
    }
    match (start, parse_month_year(end)) {
        (_, None) => c.fail(&end_path, &format!("{key}.endDate.invalid")),
        (Some(s), Some(e)) if e < s => c.fail(&end_path, &format!("{key}.endDate.beforeStart")),
        _ => {}
    }
}

fn skills(c: &mut Collector<'_>, data: &CvFormData) {
    if data.skills.is_empty() {
        c.fail("skills", "skills.required");
        return;
    }
    for (i, s) in data.skills.iter().enumerate() {
        c.require(&s.name, &format!("skills.{i}.name"), "skills.name");
        if s.level.is_none() {
            c.fail(format!("skills.{i}.level"), "skills.level.required");
        }
    }
}

fn languages(c: &mut Collector<'_>, data: &CvFormData) {
    if data.languages.is_empty() {
        c.fail("languages", "languages.required");
        return;
    }
    for (i, l) in data.languages.iter().enumerate() {
        c.require(&l.name, &format!("languages.{i}.name"), "languages.name");
        if l.proficiency.is_none() {
            c.fail(format!("languages.{i}.proficiency"), "languages.proficiency.required");
        }
        let has_score = l.test_score.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_test = l.test_name.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has_score && !has_test {
            c.fail(format!("languages.{i}.testName"), "languages.testName.required");
        }
    }
}

fn hobbies(c: &mut Collector<'_>, data: &CvFormData) {
    for (i, h) in data.hobbies.iter().enumerate() {
        if h.trim().is_empty() {
            c.fail(format!("hobbies.{i}"), "hobbies.blank");
        }
    }
}

fn looks_like_email(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn looks_like_phone(raw: &str) -> bool {
    let allowed = |ch: char| ch.is_ascii_digit() || " +-()/.".contains(ch);
    raw.trim().chars().all(allowed)
        && raw.chars().filter(char::is_ascii_digit).count() >= PHONE_MIN_DIGITS
}

fn looks_like_zip(raw: &str) -> bool {
    let raw = raw.trim();
    (3..=10).contains(&raw.len())
        && raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == ' ' || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::MessageCatalog;
    use crate::wizard::form_data::{
        Language, LanguageProficiency, Nationality, Skill, SkillLevel, WorkExperience,
    };

    /// Returns the message key, so assertions can check which rule fired.
    struct KeyEcho;

    impl Translate for KeyEcho {
        fn translate(&self, key: &str) -> String {
            key.to_string()
        }
    }

    fn education(start: &str, end: Option<&str>, ongoing: bool) -> EducationEntry {
        EducationEntry {
            school: "ETH Zurich".into(),
            degree: "master".into(),
            field_of_study: "Computer Science".into(),
            start_date: start.into(),
            end_date: end.map(str::to_string),
            ongoing,
            ..Default::default()
        }
    }

    fn experience_entry(start: &str, end: Option<&str>, ongoing: bool) -> ExperienceEntry {
        ExperienceEntry {
            company: "Acme".into(),
            position: "Engineer".into(),
            start_date: start.into(),
            end_date: end.map(str::to_string),
            ongoing,
            ..Default::default()
        }
    }

    fn with_educations(entries: Vec<EducationEntry>) -> CvFormData {
        CvFormData {
            educations: entries,
            ..Default::default()
        }
    }

    fn with_experiences(has: bool, entries: Vec<ExperienceEntry>) -> CvFormData {
        CvFormData {
            work_experience: WorkExperience {
                has_work_experience: has,
                experiences: entries,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(
            parse_month_year("06/2020"),
            Some(MonthYear { year: 2020, month: 6 })
        );
        assert_eq!(
            parse_month_year("6/2020"),
            Some(MonthYear { year: 2020, month: 6 })
        );
        assert_eq!(parse_month_year("13/2020"), None);
        assert_eq!(parse_month_year("00/2020"), None);
        assert_eq!(parse_month_year("06/20"), None);
        assert_eq!(parse_month_year("2020-06"), None);
        assert_eq!(parse_month_year(""), None);
    }

    #[test]
    fn test_month_year_orders_by_year_then_month() {
        let a = parse_month_year("12/2019").unwrap();
        let b = parse_month_year("01/2020").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_end_before_start_flags_end_date() {
        let data = with_educations(vec![education("06/2020", Some("01/2020"), false)]);
        let errors = validate_step(StepSlice::Education, &data, &KeyEcho).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("educations.0.endDate"),
            Some("educations.endDate.beforeStart")
        );
    }

    #[test]
    fn test_end_after_start_passes() {
        let data = with_educations(vec![education("01/2020", Some("06/2020"), false)]);
        assert!(validate_step(StepSlice::Education, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_same_month_passes() {
        let data = with_educations(vec![education("03/2021", Some("03/2021"), false)]);
        assert!(validate_step(StepSlice::Education, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_ongoing_ignores_missing_end_date() {
        for start in ["01/2020", "12/2099", "garbage", ""] {
            let data = with_educations(vec![education(start, None, true)]);
            if let Err(errors) = validate_step(StepSlice::Education, &data, &KeyEcho) {
                assert!(errors.get("educations.0.endDate").is_none());
            }
            let data = with_experiences(true, vec![experience_entry(start, None, true)]);
            if let Err(errors) = validate_step(StepSlice::WorkExperience, &data, &KeyEcho) {
                assert!(errors.get("workExperience.experiences.0.endDate").is_none());
            }
        }
    }

    #[test]
    fn test_ongoing_ignores_bad_end_date() {
        let data = with_educations(vec![education("06/2020", Some("01/2019"), true)]);
        assert!(validate_step(StepSlice::Education, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_missing_end_date_when_not_ongoing() {
        let data = with_educations(vec![education("06/2020", None, false)]);
        let errors = validate_step(StepSlice::Education, &data, &KeyEcho).unwrap_err();
        assert_eq!(
            errors.get("educations.0.endDate"),
            Some("educations.endDate.required")
        );
    }

    #[test]
    fn test_unparseable_start_skips_chronology() {
        let data = with_educations(vec![education("June 2020", Some("01/2020"), false)]);
        let errors = validate_step(StepSlice::Education, &data, &KeyEcho).unwrap_err();
        assert_eq!(
            errors.get("educations.0.startDate"),
            Some("educations.startDate.invalid")
        );
        assert!(errors.get("educations.0.endDate").is_none());
    }

    #[test]
    fn test_other_degree_requires_custom_degree() {
        let mut entry = education("01/2020", Some("06/2020"), false);
        entry.degree = DEGREE_OTHER.into();
        let data = with_educations(vec![entry.clone()]);
        let errors = validate_step(StepSlice::Education, &data, &KeyEcho).unwrap_err();
        assert_eq!(
            errors.get("educations.0.customDegree"),
            Some("educations.customDegree.required")
        );

        entry.custom_degree = Some("Meisterbrief".into());
        let data = with_educations(vec![entry]);
        assert!(validate_step(StepSlice::Education, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_custom_degree_optional_for_regular_degrees() {
        let data = with_educations(vec![education("01/2020", Some("06/2020"), false)]);
        assert!(validate_step(StepSlice::Education, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_empty_educations_is_list_error() {
        let errors =
            validate_step(StepSlice::Education, &CvFormData::default(), &KeyEcho).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("educations"), Some("educations.required"));
    }

    #[test]
    fn test_bad_entry_is_scoped_to_its_index() {
        let mut bad = education("01/2020", Some("06/2020"), false);
        bad.school = "  ".into();
        let data = with_educations(vec![education("01/2018", Some("06/2019"), false), bad]);
        let errors = validate_step(StepSlice::Education, &data, &KeyEcho).unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["educations.1.school"]);
    }

    #[test]
    fn test_no_work_experience_with_empty_list_passes() {
        let data = with_experiences(false, vec![]);
        assert!(validate_step(StepSlice::WorkExperience, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_no_work_experience_skips_entry_checks() {
        let data = with_experiences(false, vec![experience_entry("", None, false)]);
        assert!(validate_step(StepSlice::WorkExperience, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_work_experience_required_when_toggled() {
        let data = with_experiences(true, vec![]);
        let errors = validate_step(StepSlice::WorkExperience, &data, &KeyEcho).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("workExperience.experiences"),
            Some("workExperience.experiences.required")
        );
    }

    #[test]
    fn test_experience_chronology() {
        let data = with_experiences(true, vec![experience_entry("06/2020", Some("01/2020"), false)]);
        let errors = validate_step(StepSlice::WorkExperience, &data, &KeyEcho).unwrap_err();
        assert_eq!(
            errors.get("workExperience.experiences.0.endDate"),
            Some("workExperience.experiences.endDate.beforeStart")
        );
    }

    #[test]
    fn test_address_sub_step_only_checks_address_fields() {
        let data = CvFormData::default();
        let slice = StepSlice::PersonalInfo(PersonalInfoSection::Address);
        let errors = validate_step(slice, &data, &KeyEcho).unwrap_err();
        let paths: Vec<_> = errors.paths().collect();
        assert_eq!(
            paths,
            vec!["personalInfo.address", "personalInfo.city", "personalInfo.zip"]
        );
    }

    #[test]
    fn test_contact_formats() {
        let mut data = CvFormData::default();
        data.personal_info.email = "ada@example".into();
        data.personal_info.phone = "12".into();
        let slice = StepSlice::PersonalInfo(PersonalInfoSection::Contact);
        let errors = validate_step(slice, &data, &KeyEcho).unwrap_err();
        assert_eq!(errors.get("personalInfo.email"), Some("personalInfo.email.invalid"));
        assert_eq!(errors.get("personalInfo.phone"), Some("personalInfo.phone.invalid"));

        data.personal_info.email = "ada@example.org".into();
        data.personal_info.phone = "+41 (0)44 123 45 67".into();
        assert!(validate_step(slice, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_background_requires_nationality() {
        let mut data = CvFormData::default();
        data.personal_info.birth_date = "31/02/1990".into();
        let slice = StepSlice::PersonalInfo(PersonalInfoSection::Background);
        let errors = validate_step(slice, &data, &KeyEcho).unwrap_err();
        assert!(errors.get("personalInfo.birthDate").is_some());
        assert!(errors.get("personalInfo.nationality").is_some());

        data.personal_info.birth_date = "28/02/1990".into();
        data.personal_info.nationality = vec![Nationality {
            code: "CH".into(),
            label: "Swiss".into(),
        }];
        assert!(validate_step(slice, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_combined_sections() {
        let mut data = CvFormData {
            skills: vec![Skill {
                name: "Rust".into(),
                level: None,
            }],
            languages: vec![Language {
                name: "German".into(),
                proficiency: Some(LanguageProficiency::C1),
                test_name: None,
                test_score: Some("110".into()),
            }],
            hobbies: vec!["".into()],
            ..Default::default()
        };
        let skills = StepSlice::Combined(CombinedSection::Skills);
        let langs = StepSlice::Combined(CombinedSection::Languages);
        let hobbies = StepSlice::Combined(CombinedSection::Hobbies);
        assert!(validate_step(skills, &data, &KeyEcho)
            .unwrap_err()
            .get("skills.0.level")
            .is_some());
        assert!(validate_step(langs, &data, &KeyEcho)
            .unwrap_err()
            .get("languages.0.testName")
            .is_some());
        assert!(validate_step(hobbies, &data, &KeyEcho)
            .unwrap_err()
            .get("hobbies.0")
            .is_some());

        data.skills[0].level = Some(SkillLevel::Expert);
        data.languages[0].test_name = Some("TestDaF".into());
        data.hobbies.clear();
        assert!(validate_step(skills, &data, &KeyEcho).is_ok());
        assert!(validate_step(langs, &data, &KeyEcho).is_ok());
        assert!(validate_step(hobbies, &data, &KeyEcho).is_ok());
    }

    #[test]
    fn test_messages_come_from_catalog() {
        let catalog = MessageCatalog::for_locale("en").unwrap();
        let errors = validate_step(StepSlice::Education, &CvFormData::default(), &catalog)
            .unwrap_err();
        assert_eq!(
            errors.get("educations"),
            Some("At least one education entry is required")
        );
    }

    #[test]
    fn test_replace_slice_keeps_other_steps() {
        let mut errors = ValidationErrorMap::new();
        errors.insert("educations", "x");
        errors.insert("personalInfo.email", "old");
        errors.insert("personalInfo.firstName", "y");

        let mut fresh = ValidationErrorMap::new();
        fresh.insert("personalInfo.phone", "new");
        errors.replace_slice(StepSlice::PersonalInfo(PersonalInfoSection::Contact), fresh);

        assert_eq!(errors.get("educations"), Some("x"));
        assert_eq!(errors.get("personalInfo.firstName"), Some("y"));
        assert_eq!(errors.get("personalInfo.email"), None);
        assert_eq!(errors.get("personalInfo.phone"), Some("new"));
    }

    #[test]
    fn test_owns_matches_whole_segments() {
        let skills = StepSlice::Combined(CombinedSection::Skills);
        assert!(skills.owns("skills"));
        assert!(skills.owns("skills.0.name"));
        assert!(!skills.owns("skillset"));
    }

    #[test]
    fn test_slice_at_position() {
        assert_eq!(
            StepSlice::at(WizardPosition::initial()),
            Some(StepSlice::PersonalInfo(PersonalInfoSection::Identity))
        );
        assert_eq!(
            StepSlice::at(WizardPosition {
                main_step: 2,
                sub_step: None
            }),
            Some(StepSlice::WorkExperience)
        );
        assert_eq!(
            StepSlice::at(WizardPosition {
                main_step: 3,
                sub_step: Some(2)
            }),
            Some(StepSlice::Combined(CombinedSection::Hobbies))
        );
        assert_eq!(StepSlice::all().len(), 10);
    }

    #[test]
    fn test_validate_all_collects_every_step() {
        let errors = validate_all(&CvFormData::default(), &KeyEcho).unwrap_err();
        assert!(errors.get("personalInfo.firstName").is_some());
        assert!(errors.get("educations").is_some());
        assert!(errors.get("skills").is_some());
        assert!(errors.get("workExperience.experiences").is_none());
    }
}
