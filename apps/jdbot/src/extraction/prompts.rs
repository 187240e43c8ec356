// All LLM prompt text and fixed reply fragments for the extraction step.

/// Extraction prompt template. Replace `{schema}` then `{jd_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are an expert Job Description Analyzer AI. Your task is to thoroughly analyze the provided job description
and extract all relevant information according to specific required fields. Then identify what information is missing.

Here is the job description to analyze:
{jd_text}

Please analyze this job description for the following categories and their specific fields:

{schema}
Use the category and field names exactly as written above.

Please provide output as a single JSON object in this format:
{"found_fields": {"category_name": {"field_name": "extracted_value"}}, "missing_fields": {"category_name": ["field1", "field2"]}}

For found_fields, include only the fields that are explicitly mentioned or can be clearly inferred from the job description.
For missing_fields, list all fields that are not mentioned or cannot be clearly inferred from the job description.
Do NOT include any text outside the JSON object. Do NOT use markdown code fences.
Be thorough and accurate in your analysis."#;

/// Heading of the found-fields summary.
pub const FOUND_INTRO: &str = "Here's what I found in your job description:\n\n";

/// Heading of the missing-fields follow-up prompt.
pub const MISSING_INTRO: &str = "I noticed some important details are missing from the job description. Let me help you fill them in:\n\n";

/// Closing sentence of every missing-fields prompt.
pub const MISSING_INVITATION: &str = "Would you like to provide more details about these missing fields? I can guide you through each one to make your job description more comprehensive.";
