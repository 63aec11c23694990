use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_SLUG: &str =
    "Enter a valid slug consisting of lowercase letters, numbers or hyphens.";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// Field-level validation failures, keyed by field name. Serializes as
/// `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("invalid input on field(s): {}", field_list(.0))]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn field_list(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

/// A request payload that can check itself before touching the database.
/// `partial` is set for PATCH requests, where required fields may be absent.
pub trait Validate {
    fn validate(&self, partial: bool) -> Result<(), FieldErrors>;
}

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

pub fn check_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
    max_length: Option<usize>,
) {
    match value {
        None if required => errors.add(field, REQUIRED),
        None => {}
        Some(v) if v.trim().is_empty() => errors.add(field, BLANK),
        Some(v) => {
            if let Some(max) = max_length {
                if v.trim().chars().count() > max {
                    errors.add(field, max_length_message(max));
                }
            }
        }
    }
}

pub fn check_email(errors: &mut FieldErrors, field: &str, value: Option<&str>, max_length: usize) {
    let before = errors.get(field).map_or(0, <[String]>::len);
    check_text(errors, field, value, true, Some(max_length));
    let after = errors.get(field).map_or(0, <[String]>::len);
    if before != after {
        return;
    }
    if let Some(v) = value {
        if !is_valid_email(v.trim()) {
            errors.add(field, INVALID_EMAIL);
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
