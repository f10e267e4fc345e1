use serde_json::json;

use super::capability::ToolDefinition;
use crate::models::PiiCategory;

pub const RECORD_PII_TOOL: &str = "record_pii";

const EXTRACTION_PREAMBLE: &str = r#"
You are a PII extraction assistant. You receive one document (an image or a
PDF) and report every piece of personally identifiable information in it.

RULES, NO EXCEPTIONS:
1. Report each finding by calling the `record_pii` tool once, with the exact
   text as it appears in the document.
2. NEVER invent a value that is not visibly present in the document.
3. If you looked for a category and found nothing, call the tool with
   value "" for that category. An empty value means "nothing found".
4. `page` is the 1-based page number where the value appears. Images are
   always page 1.
5. Do not answer in prose. Tool calls are the only accepted output.
"#;

/// What the model should look for, per category.
///
/// An exhaustive match: a new category does not compile until it has
/// guidance here and a validator in `validation`.
pub fn prompt_guidance(category: PiiCategory) -> &'static str {
    match category {
        PiiCategory::Email => {
            "Addresses like user@domain.com, usually in contact blocks, headers, footers or \
             signatures, often after labels such as \"Email:\" or \"Contact:\"."
        }
        PiiCategory::Phone => {
            "Numbers like (123) 456-7890, 123-456-7890 or +1 123-456-7890, possibly with a \
             country code, often after \"Phone:\", \"Tel:\" or \"Mobile:\"."
        }
        PiiCategory::SocialSecurity => {
            "Numbers like 123-45-6789 or 123 45 6789 on tax, payroll or medical forms, often \
             after \"SSN:\" or \"SS#\". Report masked values exactly as printed."
        }
        PiiCategory::CreditCard => {
            "Card numbers like 4111 1111 1111 1111 on receipts, invoices or payment forms, \
             often after \"Card:\" or \"CC:\". Report masked values exactly as printed."
        }
        PiiCategory::Name => {
            "Personal names of people (not companies or places), typically first and last \
             name, found in signatures, greetings, headers or contact blocks."
        }
    }
}

/// The system prompt sent with every extraction run.
pub fn build_extraction_system_prompt() -> String {
    let mut prompt = String::from(EXTRACTION_PREAMBLE);
    prompt.push_str("\nCATEGORIES (use these exact tags for `type`):\n");
    for category in PiiCategory::ALL {
        prompt.push_str(&format!("\n{}:\n- {}\n", category, prompt_guidance(*category)));
    }
    prompt
}

/// The `record_pii` function definition. Its `type` enum is generated from
/// the category list.
pub fn record_pii_tool() -> ToolDefinition {
    let tags: Vec<&str> = PiiCategory::ALL.iter().map(|c| c.as_str()).collect();
    ToolDefinition {
        name: RECORD_PII_TOOL.to_string(),
        description: "Record one PII value found in the document.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "value": {
                    "type": "string",
                    "description": "The PII text exactly as it appears, or \"\" if none was found"
                },
                "type": {
                    "type": "string",
                    "enum": tags,
                    "description": "The PII category"
                },
                "page": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "1-based page number where the value appears"
                }
            },
            "required": ["value", "type", "page"]
        }),
    }
}

/// User-turn text for a PDF: the text layer of each page, labelled with its
/// page number, plus a note mapping attached images to their pages.
pub fn build_pdf_user_prompt(pages: &[(u32, String)], image_pages: &[u32]) -> String {
    let mut prompt = String::from("Find all PII in the following document.\n");
    for (number, text) in pages {
        if text.trim().is_empty() {
            continue;
        }
        prompt.push_str(&format!("\n<page number=\"{number}\">\n{}\n</page>\n", text.trim()));
    }
    if !image_pages.is_empty() {
        let listed: Vec<String> = image_pages.iter().map(u32::to_string).collect();
        prompt.push_str(&format!(
            "\nThe attached images are scans of pages {}, in that order.\n",
            listed.join(", ")
        ));
    }
    prompt
}

pub const IMAGE_USER_PROMPT: &str = "Find all PII in the attached image. It is page 1.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_every_category() {
        let prompt = build_extraction_system_prompt();
        for category in PiiCategory::ALL {
            assert!(prompt.contains(category.as_str()), "missing {category}");
            assert!(prompt.contains(prompt_guidance(*category)));
        }
    }

    #[test]
    fn system_prompt_states_empty_value_convention() {
        let prompt = build_extraction_system_prompt();
        assert!(prompt.contains("value \"\""));
        assert!(prompt.contains("NEVER invent"));
    }

    #[test]
    fn tool_enum_matches_categories() {
        let tool = record_pii_tool();
        let tags = tool.parameters["properties"]["type"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        let expected: Vec<String> = PiiCategory::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(tags, expected);
        assert_eq!(tool.parameters["required"], json!(["value", "type", "page"]));
    }

    #[test]
    fn pdf_prompt_labels_pages_and_skips_blank_ones() {
        let pages = vec![
            (1, "Contact: jane@example.com".to_string()),
            (2, "   ".to_string()),
            (3, "SSN 123-45-6789".to_string()),
        ];
        let prompt = build_pdf_user_prompt(&pages, &[2]);
        assert!(prompt.contains("<page number=\"1\">\nContact: jane@example.com"));
        assert!(!prompt.contains("<page number=\"2\">"));
        assert!(prompt.contains("<page number=\"3\">"));
        assert!(prompt.contains("scans of pages 2"));
    }

    #[test]
    fn pdf_prompt_without_images_has_no_scan_note() {
        let prompt = build_pdf_user_prompt(&[(1, "hello".into())], &[]);
        assert!(!prompt.contains("attached images"));
    }
}
