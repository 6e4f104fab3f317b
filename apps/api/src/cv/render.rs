use crate::wizard::form_data::{CvFormData, EducationEntry, ExperienceEntry, DEGREE_OTHER};

/// Renders a CV as a Markdown document for the S3 export.
pub fn render_cv_to_md(data: &CvFormData) -> String {
    let p = &data.personal_info;
    let name = format!("{} {}", p.first_name.trim(), p.last_name.trim());
    let mut md = format!("# {}\n\n", name.trim());
    if !p.title.trim().is_empty() {
        md.push_str(&format!("_{}_\n\n", p.title.trim()));
    }

    let contact: Vec<&str> = [p.email.as_str(), p.phone.as_str()]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !contact.is_empty() {
        md.push_str(&format!("{}\n\n", contact.join(" · ")));
    }
    let address: Vec<&str> = [p.address.as_str(), p.zip.as_str(), p.city.as_str(), p.country.as_str()]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !address.is_empty() {
        md.push_str(&format!("{}\n\n", address.join(", ")));
    }
    if !p.nationality.is_empty() {
        let labels: Vec<&str> = p.nationality.iter().map(|n| n.label.as_str()).collect();
        md.push_str(&format!("- **Nationality:** {}\n", labels.join(", ")));
    }
    if !p.birth_date.trim().is_empty() {
        md.push_str(&format!("- **Born:** {}\n", p.birth_date.trim()));
    }
    if !p.driving_license.trim().is_empty() {
        md.push_str(&format!("- **Driving licence:** {}\n", p.driving_license.trim()));
    }
    if !p.summary.trim().is_empty() {
        md.push_str(&format!("\n## Profile\n\n{}\n", p.summary.trim()));
    }

    if !data.educations.is_empty() {
        md.push_str("\n## Education\n\n");
        for e in &data.educations {
            push_education(&mut md, e);
        }
    }

    let work = &data.work_experience;
    if work.has_work_experience && !work.experiences.is_empty() {
        md.push_str("\n## Work Experience\n\n");
        for e in &work.experiences {
            push_experience(&mut md, e);
        }
    }

    if !data.skills.is_empty() {
        md.push_str("\n## Skills\n\n");
        for s in &data.skills {
            match s.level {
                Some(level) => md.push_str(&format!("- {} ({:?})\n", s.name, level)),
                None => md.push_str(&format!("- {}\n", s.name)),
            }
        }
    }

    if !data.languages.is_empty() {
        md.push_str("\n## Languages\n\n");
        for l in &data.languages {
            md.push_str(&format!("- {}", l.name));
            if let Some(level) = l.proficiency {
                md.push_str(&format!(" ({:?})", level));
            }
            if let (Some(test), Some(score)) = (&l.test_name, &l.test_score) {
                md.push_str(&format!(", {test}: {score}"));
            }
            md.push('\n');
        }
    }

    if !data.hobbies.is_empty() {
        md.push_str(&format!("\n## Hobbies\n\n{}\n", data.hobbies.join(", ")));
    }
    md
}

fn period(start: &str, end: Option<&str>, ongoing: bool) -> String {
    if ongoing {
        format!("{start} – present")
    } else {
        format!("{start} – {}", end.unwrap_or_default())
    }
}

fn push_education(md: &mut String, e: &EducationEntry) {
    let degree = if e.degree == DEGREE_OTHER {
        e.custom_degree.as_deref().unwrap_or_default()
    } else {
        e.degree.as_str()
    };
    md.push_str(&format!("### {degree}, {}\n", e.field_of_study));
    md.push_str(&format!(
        "{} · {}\n",
        e.school,
        period(&e.start_date, e.end_date.as_deref(), e.ongoing)
    ));
    for a in &e.achievements {
        md.push_str(&format!("- {a}\n"));
    }
    md.push('\n');
}

fn push_experience(md: &mut String, e: &ExperienceEntry) {
    md.push_str(&format!("### {} at {}\n", e.position, e.company));
    md.push_str(&format!(
        "{}\n",
        period(&e.start_date, e.end_date.as_deref(), e.ongoing)
    ));
    if !e.description.trim().is_empty() {
        md.push_str(&format!("\n{}\n", e.description.trim()));
    }
    for a in &e.achievements {
        md.push_str(&format!("- {a}\n"));
    }
    md.push('\n');
}
