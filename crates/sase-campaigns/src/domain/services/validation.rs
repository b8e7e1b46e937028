//! Wizard field validation
//!
//! Each step's rules return the complete set of field errors so they can be
//! shown inline at once.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::aggregates::CampaignDetails;
use crate::domain::value_objects::{
    BodySource, Email, InputMode, Schedule, ScheduleDraft, ScheduleMode, TargetingDraft, TargetingMode,
};

pub const NAME_LEN: (usize, usize) = (3, 100);
pub const SUBJECT_LEN: (usize, usize) = (3, 200);
pub const DESCRIPTION_MAX: usize = 500;

/// Field name -> message
#[derive(Clone, Debug, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_fields(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Absorb `other`, keeping the first message recorded per field
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.fields {
            self.fields.entry(field).or_insert(message);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn join_fields(fields: &BTreeMap<&'static str, String>) -> String {
    fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect::<Vec<_>>().join("; ")
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    (min, max): (usize, usize),
) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.add(field, format!("{} is required", label));
    } else if len < min {
        errors.add(field, format!("{} must be at least {} characters", label, min));
    } else if len > max {
        errors.add(field, format!("{} must be at most {} characters", label, max));
    }
}

/// Step 1: campaign details
pub fn validate_details(details: &CampaignDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_length(&mut errors, "name", "Campaign name", &details.name, NAME_LEN);
    check_length(&mut errors, "subject", "Subject", &details.subject, SUBJECT_LEN);

    let from_email = details.from_email.trim();
    if from_email.is_empty() {
        errors.add("from_email", "Sender email is required");
    } else if Email::new(from_email).is_err() {
        errors.add("from_email", "Sender email is not a valid address");
    }

    if details.from_name.trim().is_empty() {
        errors.add("from_name", "Sender name is required");
    }

    if details.description.chars().count() > DESCRIPTION_MAX {
        errors.add("description", format!("Description must be at most {} characters", DESCRIPTION_MAX));
    }

    if let Some(reply_to) = details.reply_to.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        if Email::new(reply_to).is_err() {
            errors.add("reply_to", "Reply-to is not a valid address");
        }
    }

    errors.into_result()
}

/// Step 2: either custom markup or a template selection must be present
pub fn validate_body(body: &BodySource) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match body.input_mode {
        InputMode::Custom => {
            if body.custom_html.trim().is_empty() {
                errors.add("custom_html", "Email content is required");
            }
        }
        InputMode::Template => {
            if body.template_id.as_deref().map(str::trim).unwrap_or("").is_empty() {
                errors.add("template_id", "Select a template");
            }
        }
    }
    errors.into_result()
}

/// Step 3: explicit modes need a non-empty selection
pub fn validate_recipients(targeting: &TargetingDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match targeting.mode {
        TargetingMode::All => {}
        TargetingMode::Groups => {
            if targeting.selected_groups.is_empty() {
                errors.add("selected_groups", "Select at least one group");
            }
        }
        TargetingMode::Contacts => {
            if targeting.selected_contacts.is_empty() {
                errors.add("selected_contacts", "Select at least one contact");
            }
        }
    }
    errors.into_result()
}

/// Step 4: `later` needs a date and time strictly after `now`
pub fn validate_schedule(schedule: &ScheduleDraft, now: DateTime<Utc>) -> Result<Schedule, ValidationErrors> {
    match schedule.mode {
        ScheduleMode::Now => Ok(Schedule::Now),
        ScheduleMode::Draft => Ok(Schedule::Draft),
        ScheduleMode::Later => {
            let mut errors = ValidationErrors::new();
            if schedule.date.is_none() {
                errors.add("schedule_date", "Pick a send date");
            }
            if schedule.time.is_none() {
                errors.add("schedule_time", "Pick a send time");
            }
            match schedule.send_at() {
                Some(at) if at > now => Ok(Schedule::Later(at)),
                Some(_) => {
                    errors.add("schedule_date", "Scheduled time must be in the future");
                    Err(errors)
                }
                None => Err(errors),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn valid_details() -> CampaignDetails {
        CampaignDetails {
            name: "Spring Launch".into(),
            subject: "Something new is here".into(),
            from_name: "OpenSASE".into(),
            from_email: "news@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_details() {
        assert!(validate_details(&valid_details()).is_ok());
    }

    #[test]
    fn test_name_bounds_use_trimmed_length() {
        let mut d = valid_details();
        d.name = "  ab  ".into();
        let errors = validate_details(&d).unwrap_err();
        assert!(errors.get("name").unwrap().contains("at least 3"));

        d.name = "x".repeat(101);
        assert!(validate_details(&d).unwrap_err().contains("name"));

        d.name = "x".repeat(100);
        assert!(validate_details(&d).is_ok());
    }

    #[test]
    fn test_subject_bounds() {
        let mut d = valid_details();
        d.subject = "x".repeat(201);
        assert!(validate_details(&d).unwrap_err().contains("subject"));
        d.subject = "x".repeat(200);
        assert!(validate_details(&d).is_ok());
    }

    #[test]
    fn test_collects_every_field_error() {
        let errors = validate_details(&CampaignDetails::default()).unwrap_err();
        for field in ["name", "subject", "from_email", "from_name"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("description"));
    }

    #[test]
    fn test_sender_email_pattern() {
        let mut d = valid_details();
        d.from_email = "news@localhost".into();
        assert!(validate_details(&d).unwrap_err().contains("from_email"));
    }

    #[test]
    fn test_description_limit() {
        let mut d = valid_details();
        d.description = "x".repeat(501);
        assert!(validate_details(&d).unwrap_err().contains("description"));
        d.description = "x".repeat(500);
        assert!(validate_details(&d).is_ok());
    }

    #[test]
    fn test_body_rules() {
        assert!(validate_body(&BodySource::custom("  ")).unwrap_err().contains("custom_html"));
        assert!(validate_body(&BodySource::custom("<p>hi</p>")).is_ok());
        assert!(validate_body(&BodySource::default()).unwrap_err().contains("template_id"));
        assert!(validate_body(&BodySource::template("newsletter")).is_ok());
    }

    #[test]
    fn test_recipient_rules() {
        let mut t = TargetingDraft { mode: TargetingMode::Groups, ..Default::default() };
        assert!(validate_recipients(&t).is_err());
        t.mode = TargetingMode::All;
        assert!(validate_recipients(&t).is_ok());
    }

    #[test]
    fn test_schedule_in_past_rejected() {
        let now = Utc::now();
        let past = ScheduleDraft::later(
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        let errors = validate_schedule(&past, now).unwrap_err();
        assert!(errors.get("schedule_date").unwrap().contains("future"));
    }

    #[test]
    fn test_schedule_in_future_accepted() {
        let now = Utc::now();
        let at = now + Duration::days(2);
        let draft = ScheduleDraft::later(at.date_naive(), at.time());
        assert!(matches!(validate_schedule(&draft, now), Ok(Schedule::Later(_))));
    }

    #[test]
    fn test_schedule_missing_parts() {
        let draft = ScheduleDraft { mode: ScheduleMode::Later, date: None, time: None };
        let errors = validate_schedule(&draft, Utc::now()).unwrap_err();
        assert!(errors.contains("schedule_date"));
        assert!(errors.contains("schedule_time"));
        assert_eq!(validate_schedule(&ScheduleDraft::draft(), Utc::now()), Ok(Schedule::Draft));
    }

    #[test]
    fn test_errors_display_and_merge() {
        let mut errors = ValidationErrors::new();
        errors.add("subject", "Subject is required");
        let mut more = ValidationErrors::new();
        more.add("name", "Campaign name is required");
        more.add("subject", "ignored");
        errors.merge(more);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("subject"), Some("Subject is required"));
        assert_eq!(errors.to_string(), "name: Campaign name is required; subject: Subject is required");
        let boxed: Box<dyn std::error::Error> = Box::new(errors);
        assert!(boxed.to_string().starts_with("name:"));
    }
}
