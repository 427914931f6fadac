//! Recovery of JSON objects from free-form model output.
//!
//! Models wrap JSON in prose or code fences, so parsing is a separate step:
//! find the first balanced `{...}` region, try to parse it, and let the
//! caller fall back to the raw text when nothing parses.

use serde_json::Value;

use super::schema::TenderExtraction;

/// Returns the first top-level balanced `{...}` region in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count toward the balance. Returns `None` when no opening brace is closed.
#[must_use]
pub fn find_json_object(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        search_from = start + 1;
    }

    None
}

/// Byte length of the balanced object starting at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parses the first JSON object found in `text`.
#[must_use]
pub fn parse_json_object(text: &str) -> Option<Value> {
    let candidate = find_json_object(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, len = candidate.len(), "balanced region is not valid JSON");
            None
        }
    }
}

/// Parses a [`TenderExtraction`] out of model output.
///
/// Returns `None` when the output holds no parseable JSON object; the
/// caller then surfaces the raw text instead.
#[must_use]
pub fn parse_tender_extraction(text: &str) -> Option<TenderExtraction> {
    parse_json_object(text).map(|v| TenderExtraction::from_value(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"a": 1}"# => Some(r#"{"a": 1}"#) ; "bare object")]
    #[test_case("Here is the result:\n```json\n{\"a\": {\"b\": 2}}\n```" => Some(r#"{"a": {"b": 2}}"#) ; "fenced with prose")]
    #[test_case(r#"{"a": "brace } in string"} trailing {"b": 1}"# => Some(r#"{"a": "brace } in string"}"#) ; "brace inside string")]
    #[test_case(r#"{"a": "escaped \" quote }"}"# => Some(r#"{"a": "escaped \" quote }"}"#) ; "escaped quote")]
    #[test_case("no json here" => None ; "no braces")]
    #[test_case("{ unclosed" => None ; "unclosed")]
    #[test_case("} stray { \"x\": 1 }" => Some("{ \"x\": 1 }") ; "stray closing brace first")]
    fn test_find_json_object(text: &str) -> Option<&str> {
        find_json_object(text)
    }

    #[test]
    fn test_skips_unclosed_prefix() {
        assert_eq!(find_json_object("{ {\"k\": 1}"), Some("{\"k\": 1}"));
    }

    #[test]
    fn test_parse_tender_extraction_from_prose() {
        let text = r#"Sure! The consolidated data:
{"basic_information": {"tender_number_reference": "PWD/2024/117"},
 "timeline": {"bid_submission_deadline": "15-03-2024 15:00"}}
Let me know if you need more."#;
        let ex = parse_tender_extraction(text).unwrap_or_default();
        assert_eq!(
            ex.get("basic_information", "tender_number_reference"),
            Some("PWD/2024/117")
        );
        assert_eq!(
            ex.get("timeline", "bid_submission_deadline"),
            Some("15-03-2024 15:00")
        );
    }

    #[test]
    fn test_parse_failure_returns_none() {
        assert!(parse_tender_extraction("{not: valid json}").is_none());
        assert!(parse_tender_extraction("plain prose only").is_none());
    }
}
