use std::collections::HashSet;

use ammonia::Builder;

use crate::entities::notification::NotificationPayload;

/// Reduces user input to plain text safe for an HTML text node. Markup is
/// dropped, `&` and `<` come out as entities, spacing is left alone.
fn text(cleaner: &Builder<'_>, value: &str) -> String {
    cleaner.clean(value).to_string()
}

fn lines(cleaner: &Builder<'_>, value: &str) -> String {
    value
        .lines()
        .map(|line| text(cleaner, line))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// HTML alternative for a notification: metadata as a table, then the
/// plain-text body with line breaks kept. Every user value is sanitized.
pub fn render_html(payload: &NotificationPayload) -> String {
    let mut cleaner = Builder::empty();
    cleaner.clean_content_tags(HashSet::from(["script", "style"]));

    let rows: String = payload
        .metadata
        .labelled()
        .into_iter()
        .map(|(label, value)| {
            format!(
                "<tr><td style=\"padding:4px 12px 4px 0;font-weight:bold;\">{}</td><td style=\"padding:4px 0;\">{}</td></tr>",
                label,
                text(&cleaner, value)
            )
        })
        .collect();

    let cover_letter = payload
        .metadata
        .cover_letter
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| {
            format!(
                "<h3 style=\"margin:16px 0 8px;\">Cover Letter</h3><p>{}</p>",
                lines(&cleaner, c)
            )
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222;\">\
         <h2 style=\"margin:0 0 12px;\">{subject}</h2>\
         <table style=\"border-collapse:collapse;margin-bottom:16px;\">{rows}</table>\
         {cover_letter}\
         <div style=\"white-space:normal;\">{body}</div>\
         </body></html>",
        subject = text(&cleaner, &payload.subject),
        body = lines(&cleaner, &payload.body),
    )
}
