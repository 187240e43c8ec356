//! Markdown rendering of an extraction result for the chat transcript.

use crate::extraction::prompts::{FOUND_INTRO, MISSING_INTRO, MISSING_INVITATION};
use crate::extraction::result::{ExtractionResult, MissingFields};
use crate::schema::FieldSchema;

/// Found-fields summary: categories then fields in registry order, non-empty values only.
pub fn render_found_summary(result: &ExtractionResult, schema: &FieldSchema) -> String {
    let mut out = String::from(FOUND_INTRO);

    for category in schema.categories() {
        let lines: Vec<String> = category
            .fields
            .iter()
            .filter_map(|field| {
                result
                    .found_value(category.name, field)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| format!("- {field}: {value}\n"))
            })
            .collect();

        if lines.is_empty() {
            continue;
        }
        out.push_str(category.name);
        out.push_str(":\n");
        for line in lines {
            out.push_str(&line);
        }
    }

    out
}

/// Follow-up prompt listing missing fields, categories in the order the service returned.
pub fn render_missing_prompt(missing: &MissingFields) -> String {
    let mut out = String::from(MISSING_INTRO);

    for (category, fields) in missing.iter() {
        if fields.is_empty() {
            continue;
        }
        out.push_str(&format!("In the {category} category, we're missing:\n"));
        for field in fields {
            out.push_str(&format!("- {field}\n"));
        }
    }

    out.push('\n');
    out.push_str(MISSING_INVITATION);
    out
}

/// The assistant reply for a successful analysis: summary, blank line, follow-up prompt.
pub fn render_analysis_reply(result: &ExtractionResult, schema: &FieldSchema) -> String {
    format!(
        "{}\n{}",
        render_found_summary(result, schema),
        render_missing_prompt(&result.missing_fields)
    )
}
