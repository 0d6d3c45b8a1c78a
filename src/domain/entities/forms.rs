use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::entities::notification::non_blank;

/// The site form a submission came from. Determines recipient and template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormType {
    Contact,
    Expert,
    JobApplication,
    ContactPopup,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Contact => "contact",
            FormType::Expert => "expert",
            FormType::JobApplication => "jobApplication",
            FormType::ContactPopup => "contactPopup",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = String;

    /// Accepts the wire name as well as the kebab-case path segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(FormType::Contact),
            "expert" => Ok(FormType::Expert),
            "jobApplication" | "job-application" => Ok(FormType::JobApplication),
            "contactPopup" | "contact-popup" => Ok(FormType::ContactPopup),
            other => Err(format!("Unknown form type: {}", other)),
        }
    }
}

/// Contact page form. The contact popup posts the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[validate(custom(function = "non_blank", message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub service: Option<String>,

    #[validate(custom(function = "non_blank", message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpertForm {
    #[validate(custom(function = "non_blank", message = "First name is required"))]
    pub first_name: String,

    #[validate(custom(function = "non_blank", message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(custom(function = "non_blank", message = "Phone number is required"))]
    pub phone: String,

    #[serde(default)]
    pub industry: Option<String>,

    #[validate(custom(function = "non_blank", message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationForm {
    #[validate(custom(function = "non_blank", message = "First name is required"))]
    pub first_name: String,

    #[validate(custom(function = "non_blank", message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub experience: Option<String>,

    #[validate(custom(function = "non_blank", message = "Cover letter is required"))]
    pub cover_letter: String,

    /// Whether the applicant attached a resume file in the browser.
    #[serde(default)]
    pub resume: bool,

    #[validate(custom(function = "non_blank", message = "Role title is required"))]
    pub role_title: String,
}

/// A form submission tagged with the form it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    Contact(ContactForm),
    Expert(ExpertForm),
    JobApplication(JobApplicationForm),
    ContactPopup(ContactForm),
}

impl FormSubmission {
    pub fn form_type(&self) -> FormType {
        match self {
            FormSubmission::Contact(_) => FormType::Contact,
            FormSubmission::Expert(_) => FormType::Expert,
            FormSubmission::JobApplication(_) => FormType::JobApplication,
            FormSubmission::ContactPopup(_) => FormType::ContactPopup,
        }
    }

    pub fn sender_email(&self) -> &str {
        match self {
            FormSubmission::Contact(form) | FormSubmission::ContactPopup(form) => &form.email,
            FormSubmission::Expert(form) => &form.email,
            FormSubmission::JobApplication(form) => &form.email,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            FormSubmission::Contact(form) | FormSubmission::ContactPopup(form) => form.validate(),
            FormSubmission::Expert(form) => form.validate(),
            FormSubmission::JobApplication(form) => form.validate(),
        }
    }
}
