//! crates/flashdecks_core/src/parse.rs
//!
//! Turns the raw text returned by a generation provider into a validated,
//! bounded list of cards. Pure function of the input text; all failures are
//! returned as classified [`GenerationError`] values.

use serde_json::Value;

use crate::domain::GeneratedCard;
use crate::ports::{GenerationError, GenerationResult};

/// Parses and validates a provider response into at most `requested` cards.
///
/// The response is trimmed and a single surrounding code fence (with or
/// without a language tag) is stripped before JSON parsing. A response that
/// is not parseable, or parses to something other than an array, fails with
/// [`GenerationError::MalformedResponse`]. Array elements that are not
/// objects carrying non-empty `front` and `back` strings are dropped
/// silently; if nothing survives, the call fails with
/// [`GenerationError::NoValidCards`]. Surviving cards keep their original
/// order and are truncated to `requested` in case the model over-produced.
pub fn parse_generated_cards(raw: &str, requested: usize) -> GenerationResult<Vec<GeneratedCard>> {
    let cleaned = strip_code_fence(raw);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let items = value.as_array().ok_or_else(|| {
        GenerationError::MalformedResponse("response is not a JSON array".to_string())
    })?;

    let mut cards = Vec::new();
    for item in items {
        let front = item.get("front").and_then(Value::as_str).map(str::trim);
        let back = item.get("back").and_then(Value::as_str).map(str::trim);
        match (front, back) {
            (Some(front), Some(back)) if !front.is_empty() && !back.is_empty() => {
                cards.push(GeneratedCard {
                    front: front.to_string(),
                    back: back.to_string(),
                });
            }
            _ => {}
        }
    }

    if cards.is_empty() {
        return Err(GenerationError::NoValidCards);
    }

    cards.truncate(requested);
    Ok(cards)
}

/// Strips one leading and one trailing Markdown code-fence marker, tolerating
/// a language tag on the opening fence. Models add these despite being told
/// not to.
fn strip_code_fence(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, back: &str) -> GeneratedCard {
        GeneratedCard {
            front: front.to_string(),
            back: back.to_string(),
        }
    }

    #[test]
    fn parses_a_plain_json_array() {
        let cards =
            parse_generated_cards(r#"[{"front":"A","back":"B"},{"front":"C","back":"D"}]"#, 10)
                .unwrap();
        assert_eq!(cards, vec![card("A", "B"), card("C", "D")]);
    }

    #[test]
    fn strips_a_code_fence_with_language_tag() {
        let raw = "```json\n[{\"front\":\"A\",\"back\":\"B\"}]\n```";
        let cards = parse_generated_cards(raw, 10).unwrap();
        assert_eq!(cards, vec![card("A", "B")]);
    }

    #[test]
    fn strips_a_code_fence_without_language_tag() {
        let raw = "```\n[{\"front\":\"A\",\"back\":\"B\"}]\n```";
        let cards = parse_generated_cards(raw, 10).unwrap();
        assert_eq!(cards, vec![card("A", "B")]);
    }

    #[test]
    fn invalid_elements_are_dropped_silently() {
        let raw = r#"[{"front":"A","back":"B"},{"front":"","back":"C"},{"front":"D"}]"#;
        let cards = parse_generated_cards(raw, 10).unwrap();
        assert_eq!(cards, vec![card("A", "B")]);
    }

    #[test]
    fn non_object_and_non_string_elements_are_dropped() {
        let raw = r#"[42, null, {"front":1,"back":2}, {"front":"A","back":"B"}]"#;
        let cards = parse_generated_cards(raw, 10).unwrap();
        assert_eq!(cards, vec![card("A", "B")]);
    }

    #[test]
    fn whitespace_only_sides_do_not_survive_validation() {
        let raw = r#"[{"front":"  ","back":"B"},{"front":"A","back":" B "}]"#;
        let cards = parse_generated_cards(raw, 10).unwrap();
        // Values are trimmed on the way in.
        assert_eq!(cards, vec![card("A", "B")]);
    }

    #[test]
    fn all_invalid_elements_fail_with_no_valid_cards() {
        let result = parse_generated_cards(r#"[{"front":""},{}]"#, 10);
        assert!(matches!(result, Err(GenerationError::NoValidCards)));
    }

    #[test]
    fn over_production_is_truncated_preserving_order() {
        let raw = r#"[
            {"front":"1","back":"a"},
            {"front":"2","back":"b"},
            {"front":"3","back":"c"},
            {"front":"4","back":"d"},
            {"front":"5","back":"e"}
        ]"#;
        let cards = parse_generated_cards(raw, 2).unwrap();
        assert_eq!(cards, vec![card("1", "a"), card("2", "b")]);
    }

    #[test]
    fn under_fulfilment_is_returned_as_is() {
        let raw = r#"[{"front":"1","back":"a"}]"#;
        let cards = parse_generated_cards(raw, 5).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_classified_failure() {
        let result = parse_generated_cards("not json at all", 10);
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }

    #[test]
    fn a_json_object_is_rejected_as_not_an_array() {
        let result = parse_generated_cards(r#"{"front":"A","back":"B"}"#, 10);
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }
}
