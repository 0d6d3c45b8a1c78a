use validator::Validate;

use crate::{
    entities::{
        forms::{ContactForm, ExpertForm, FormSubmission, JobApplicationForm},
        notification::{NotificationPayload, PayloadMetadata, NOT_PROVIDED, NOT_SPECIFIED},
    },
    errors::AppError,
    settings::RecipientSettings,
};

const CONTACT_SUBJECT: &str = "New Contact Form Submission - Scritique";
const CONTACT_POPUP_SUBJECT: &str = "New Contact Popup Form Submission - Scritique";
const EXPERT_SUBJECT: &str = "New Expert Consultation Request - Scritique";

/// Builds the notification for a form submission.
///
/// Pure: the same submission and recipients always give the same payload.
pub fn build_payload(
    submission: &FormSubmission,
    recipients: &RecipientSettings,
) -> Result<NotificationPayload, AppError> {
    submission.validate()?;

    let form_type = submission.form_type();
    let to_email = recipients.for_form(form_type).trim().to_string();

    let (subject, body, metadata) = match submission {
        FormSubmission::Contact(form) => contact(form, CONTACT_SUBJECT, "Contact Page"),
        FormSubmission::ContactPopup(form) => contact(form, CONTACT_POPUP_SUBJECT, "Contact Popup"),
        FormSubmission::Expert(form) => expert(form),
        FormSubmission::JobApplication(form) => job_application(form),
    };

    let payload = NotificationPayload {
        to_email,
        subject,
        body,
        metadata: PayloadMetadata {
            form_type: Some(form_type.as_str().to_string()),
            ..metadata
        },
    };
    payload.validate()?;

    Ok(payload)
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

fn contact(form: &ContactForm, subject: &str, source: &str) -> (String, String, PayloadMetadata) {
    let name = form.name.trim();
    let email = form.email.trim();
    let body = format!(
        "Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Service: {service}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         Submitted from: {source}",
        phone = or(&form.phone, NOT_PROVIDED),
        service = or(&form.service, NOT_SPECIFIED),
        message = form.message.trim(),
    );

    let metadata = PayloadMetadata {
        from_name: Some(name.to_string()),
        from_email: Some(email.to_string()),
        phone: present(&form.phone),
        service: present(&form.service),
        ..PayloadMetadata::default()
    };

    (subject.to_string(), body, metadata)
}

fn expert(form: &ExpertForm) -> (String, String, PayloadMetadata) {
    let full_name = format!("{} {}", form.first_name.trim(), form.last_name.trim());
    let email = form.email.trim();
    let phone = form.phone.trim();
    let body = format!(
        "Name: {full_name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Industry: {industry}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         Submitted from: Expert Form",
        industry = or(&form.industry, NOT_SPECIFIED),
        message = form.message.trim(),
    );

    let metadata = PayloadMetadata {
        from_name: Some(full_name),
        from_email: Some(email.to_string()),
        phone: Some(phone.to_string()),
        industry: present(&form.industry),
        ..PayloadMetadata::default()
    };

    (EXPERT_SUBJECT.to_string(), body, metadata)
}

fn job_application(form: &JobApplicationForm) -> (String, String, PayloadMetadata) {
    let full_name = format!("{} {}", form.first_name.trim(), form.last_name.trim());
    let email = form.email.trim();
    let role_title = form.role_title.trim();
    let resume = if form.resume { "Attached" } else { NOT_PROVIDED };
    let body = format!(
        "Applicant: {full_name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Experience: {experience}\n\
         \n\
         Cover Letter:\n\
         {cover_letter}\n\
         \n\
         Resume: {resume}\n\
         \n\
         Position: {role_title}\n\
         Submitted from: Careers Page",
        phone = or(&form.phone, NOT_PROVIDED),
        experience = or(&form.experience, NOT_SPECIFIED),
        cover_letter = form.cover_letter.trim(),
    );

    let metadata = PayloadMetadata {
        from_name: Some(full_name),
        from_email: Some(email.to_string()),
        phone: present(&form.phone),
        experience: present(&form.experience),
        cover_letter: Some(form.cover_letter.trim().to_string()),
        resume: Some(resume.to_string()),
        role_title: Some(role_title.to_string()),
        ..PayloadMetadata::default()
    };

    (format!("Job Application - {role_title} - Scritique"), body, metadata)
}
