//! Result decoder — raw model text to the caller's expected shape.
//!
//! Each expected shape has its own entry point: [`decode_classifications`],
//! [`decode_outfit_plan`] and [`decode_plain_text`]. Text that already
//! parses is taken as is. Otherwise models often wrap JSON in Markdown
//! fences (```` ```json ... ``` ````) or add a sentence around it, so the
//! fenced payload is extracted and parsed. Anything that still fails is
//! reported as `MalformedModelOutput` carrying the untouched raw text. A
//! half-parsed array is never returned.
//!
//! Every function here is pure and idempotent.

use serde::de::DeserializeOwned;
use wardrobe_core::error::Failure;
use wardrobe_core::wardrobe::{Classification, OutfitPlan};

const FENCE: &str = "```";

/// Parse a JSON array of per-image classifications.
pub fn decode_classifications(raw: &str) -> Result<Vec<Classification>, Failure> {
    parse_json(raw, "classification array")
}

/// Parse an `{outfit: [{item, reason}], tip}` object.
pub fn decode_outfit_plan(raw: &str) -> Result<OutfitPlan, Failure> {
    parse_json(raw, "outfit plan")
}

/// Plain text passes through unchanged.
pub fn decode_plain_text(raw: &str) -> String {
    raw.to_string()
}

/// Return the payload inside the first Markdown code fence, trimmed.
///
/// The opening fence may carry a language tag (```` ```json ````) followed
/// by a newline or a space. A missing closing fence takes everything after
/// the opening one. Text with no fence is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let body = strip_language_tag(&trimmed[open + FENCE.len()..]);
    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Drop a leading `json`/`JSON`/`c++`-style tag when whitespace follows it.
fn strip_language_tag(after_open: &str) -> &str {
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(after_open.len());
    let rest = &after_open[tag_len..];
    if tag_len > 0 && rest.chars().next().is_none_or(char::is_whitespace) {
        rest
    } else {
        after_open
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str, shape: &str) -> Result<T, Failure> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let payload = strip_code_fences(trimmed);
    if payload.is_empty() {
        return Err(Failure::malformed(
            format!("model returned no {shape}"),
            raw,
        ));
    }
    serde_json::from_str(payload).map_err(|e| {
        Failure::malformed(format!("model output is not a valid {shape}: {e}"), raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_core::error::FailureKind;
    use wardrobe_core::wardrobe::{Category, OutfitPick};

    const PLAN_JSON: &str = r#"{"outfit":[{"item":"top(white, casual)","reason":"breathable"},{"item":"shoes(black, formal)","reason":"smart"}],"tip":"bring an umbrella"}"#;

    #[test]
    fn strips_fences_with_and_without_tag() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```[1, 2]```"), "[1, 2]");
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn strips_fences_surrounded_by_prose() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy!";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn unterminated_fence_takes_rest() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn fenced_plan_equals_unfenced_plan() {
        let fenced = format!("```json\n{PLAN_JSON}\n```");
        let from_fenced = decode_outfit_plan(&fenced).unwrap();
        let direct: OutfitPlan = serde_json::from_str(PLAN_JSON).unwrap();
        assert_eq!(from_fenced, direct);
        assert_eq!(
            from_fenced.outfit[0],
            OutfitPick {
                item: "top(white, casual)".into(),
                reason: "breathable".into()
            }
        );
        assert_eq!(from_fenced.tip, "bring an umbrella");
    }

    #[test]
    fn decodes_classification_array() {
        let raw = r#"```json
[
  {"category": "top", "color": "white", "style": "casual", "material": "linen"},
  {"category": "shoes", "color": "black", "style": "formal"}
]
```"#;
        let items = decode_classifications(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, Category::Top);
        assert_eq!(items[0].material.as_deref(), Some("linen"));
        assert_eq!(items[1].category, Category::Shoes);
        assert!(items[1].material.is_none());
    }

    #[test]
    fn prose_instead_of_json_is_malformed_and_keeps_raw() {
        let raw = "Sure! Here's the analysis: not json";
        let err = decode_classifications(raw).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
        assert_eq!(err.raw_output.as_deref(), Some(raw));
    }

    #[test]
    fn half_valid_array_is_rejected_whole() {
        let raw = r#"[{"category":"top","color":"red","style":"casual"},{"category":"spaceship","color":"x","style":"y"}]"#;
        let err = decode_classifications(raw).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
        assert_eq!(err.raw_output.as_deref(), Some(raw));
    }

    #[test]
    fn object_where_array_expected_is_malformed() {
        let err = decode_classifications(PLAN_JSON).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
    }

    #[test]
    fn plan_missing_tip_is_malformed() {
        let err = decode_outfit_plan(r#"{"outfit": []}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
    }

    #[test]
    fn empty_fence_is_malformed() {
        let err = decode_outfit_plan("```json\n```").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
        assert_eq!(err.raw_output.as_deref(), Some("```json\n```"));
    }

    #[test]
    fn plain_text_passes_through_untouched() {
        let raw = "```\nnot stripped\n```  ";
        assert_eq!(decode_plain_text(raw), raw);
    }

    #[test]
    fn backticks_inside_unfenced_json_are_kept() {
        let raw = r#"{"outfit":[{"item":"top(white, casual)","reason":"clean"}],"tip":"format code like ```this```"}"#;
        let plan = decode_outfit_plan(raw).unwrap();
        assert_eq!(plan.tip, "format code like ```this```");
        assert_eq!(plan, serde_json::from_str::<OutfitPlan>(raw).unwrap());
    }

    #[test]
    fn single_line_tagged_fence_drops_the_tag() {
        assert_eq!(strip_code_fences("```json [1, 2] ```"), "[1, 2]");
        let raw = r#"```json [{"category":"top","color":"red","style":"casual"}] ```"#;
        let items = decode_classifications(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].color, "red");
    }

    #[test]
    fn bare_tag_with_nothing_after_is_empty() {
        assert_eq!(strip_code_fences("```json"), "");
        let err = decode_outfit_plan("```json").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedModelOutput);
    }

    #[test]
    fn decoding_is_idempotent() {
        for raw in [
            PLAN_JSON,
            "```json\n[]\n```",
            "Sure! Here's the analysis: not json",
            "",
        ] {
            assert_eq!(decode_classifications(raw), decode_classifications(raw));
            assert_eq!(decode_outfit_plan(raw), decode_outfit_plan(raw));
            assert_eq!(decode_plain_text(raw), decode_plain_text(raw));
        }
    }
}
