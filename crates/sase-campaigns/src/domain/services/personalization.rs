//! Merge-tag personalization
//!
//! Recognized tokens:
//!
//! | token                  | matching         | field        |
//! |------------------------|------------------|--------------|
//! | `{{MERGE:first_name}}` | case-sensitive   | first name   |
//! | `{{MERGE:last_name}}`  | case-sensitive   | last name    |
//! | `{{MERGE:email}}`      | case-sensitive   | email        |
//! | `{{firstname}}`        | case-insensitive | first name   |
//! | `{{lastname}}`         | case-insensitive | last name    |
//! | `{{email}}`            | case-insensitive | email        |
//!
//! Substitution is a single pass: text inserted from a contact field is
//! never rescanned, so a first name of `{{email}}` stays literal. Anything
//! else between braces is left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Contact;

static MERGE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{MERGE:(first_name|last_name|email)\}\}|(?i:\{\{(firstname|lastname|email)\}\})")
        .expect("merge tag pattern compiles")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MergeField {
    FirstName,
    LastName,
    Email,
}

impl MergeField {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        if let Some(strict) = caps.get(1) {
            return match strict.as_str() {
                "first_name" => Some(Self::FirstName),
                "last_name" => Some(Self::LastName),
                "email" => Some(Self::Email),
                _ => None,
            };
        }
        let loose = caps.get(2)?.as_str().to_ascii_lowercase();
        match loose.as_str() {
            "firstname" => Some(Self::FirstName),
            "lastname" => Some(Self::LastName),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    fn value<'a>(&self, contact: &'a Contact) -> &'a str {
        match self {
            Self::FirstName => contact.first_name().unwrap_or(""),
            Self::LastName => contact.last_name().unwrap_or(""),
            Self::Email => contact.email().as_str(),
        }
    }
}

/// Substitute merge tags with the contact's fields. Missing names become "".
pub fn personalize(template: &str, contact: &Contact) -> String {
    if template.is_empty() {
        return String::new();
    }
    MERGE_TAGS
        .replace_all(template, |caps: &Captures<'_>| match MergeField::from_captures(caps) {
            Some(field) => field.value(contact).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// True if the template contains at least one recognized merge tag.
pub fn has_merge_tags(template: &str) -> bool {
    MERGE_TAGS.is_match(template)
}

/// Raw, pre-substitution fields echoed to the transmission endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

impl From<&Contact> for PersonalizationPayload {
    fn from(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name().map(str::to_string),
            last_name: contact.last_name().map(str::to_string),
            email: contact.email().to_string(),
        }
    }
}
