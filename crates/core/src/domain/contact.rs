use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{check_email, ValidationErrors};

pub const MIN_MESSAGE_CHARS: usize = 10;

pub const CONTACT_SENT_NOTICE: &str = "Message sent successfully! We'll get back to you soon.";
pub const CONTACT_INVALID_NOTICE: &str = "Please correct the errors in the form";
pub const CONTACT_FAILED_NOTICE: &str = "Failed to send message. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactMessageId(pub String);

impl ContactMessageId {
    pub fn generate() -> Self {
        Self(format!("CM-{}", Uuid::new_v4().simple()))
    }
}

/// General enquiry sent from the contact page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required");
        }
        check_email(&mut errors, "email", &self.email);
        if self.company.trim().is_empty() {
            errors.insert("company", "Company is required");
        }
        if self.message.trim().is_empty() {
            errors.insert("message", "Message is required");
        } else if self.message.chars().count() < MIN_MESSAGE_CHARS {
            errors.insert("message", "Message must be at least 10 characters");
        }

        errors
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedContactMessage {
    pub id: ContactMessageId,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: ContactMessage,
}

impl SubmittedContactMessage {
    pub fn new(message: ContactMessage) -> Self {
        Self { id: ContactMessageId::generate(), submitted_at: Utc::now(), message }
    }
}
