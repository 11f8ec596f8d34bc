use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::quote_request::{DraftField, QuoteDraft};

/// Error key for the line-item list as a whole.
pub const PRODUCTS_FIELD: &str = "products";

static EMAIL_SHAPE: OnceLock<Regex> = OnceLock::new();

fn email_shape() -> &'static Regex {
    EMAIL_SHAPE.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email shape pattern compiles"))
}

/// Loose `local@domain.tld` shape check. Not RFC validation.
pub fn is_plausible_email(value: &str) -> bool {
    email_shape().is_match(value)
}

/// Field name to message. Each validation pass produces a fresh map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Drops the entry for `field`; returns whether one was present.
    pub fn clear_field(&mut self, field: &str) -> bool {
        self.0.remove(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub(crate) fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if is_blank(value) {
        errors.insert(field, "Email is required");
    } else if !is_plausible_email(value) {
        errors.insert(field, "Email is invalid");
    }
}

pub fn validate_contact_step(draft: &QuoteDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if is_blank(&draft.customer_name) {
        errors.insert(DraftField::CustomerName.as_str(), "Name is required");
    }
    if is_blank(&draft.company) {
        errors.insert(DraftField::Company.as_str(), "Company is required");
    }
    check_email(&mut errors, DraftField::Email.as_str(), &draft.email);
    errors
}

pub fn validate_project_step(draft: &QuoteDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if is_blank(&draft.project_name) {
        errors.insert(DraftField::ProjectName.as_str(), "Project name is required");
    }
    if draft.timeline.is_none() {
        errors.insert(DraftField::Timeline.as_str(), "Timeline is required");
    }
    errors
}

/// Also guards submission: the review step has no fields of its own.
pub fn validate_requirements_step(draft: &QuoteDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let incomplete_item =
        draft.line_items.iter().any(|item| item.product_ref.is_empty() || item.quantity.is_empty());
    if incomplete_item {
        errors.insert(PRODUCTS_FIELD, "Please select products and specify quantities");
    }
    if is_blank(&draft.requirements) {
        errors.insert(DraftField::Requirements.as_str(), "Please describe your requirements");
    }
    errors
}
