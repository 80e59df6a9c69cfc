use crate::domain::action::{ActionRecommendation, LlmActionRecommendation};
use crate::llm::error::ActionDecodeError;

/// Removes Markdown fence markers (```json and ```) wherever they appear.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_actions(text: &str) -> Result<Vec<ActionRecommendation>, ActionDecodeError> {
    let json_str = strip_code_fences(text);
    let parsed = serde_json::from_str::<Vec<LlmActionRecommendation>>(&json_str).map_err(|e| {
        ActionDecodeError {
            detail: format!("not a JSON array of action records: {e}"),
            raw_output: text.to_string(),
        }
    })?;

    if parsed.is_empty() {
        return Err(ActionDecodeError {
            detail: "empty action array".to_string(),
            raw_output: text.to_string(),
        });
    }

    Ok(parsed
        .into_iter()
        .map(LlmActionRecommendation::into_recommendation)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_actions_json() -> String {
        json!([
            {"title": "A", "target": "Digital Natives", "action": "Push", "impact": "High"},
            {"title": "B", "target": "Eco-Conscious Pros", "action": "Email", "impact": "Medium"},
            {"title": "C", "target": "Legacy Enterprise", "action": "Webinar", "impact": "Low"},
        ])
        .to_string()
    }

    #[test]
    fn strip_code_fences_handles_fenced_blocks() {
        let body = "[{\"a\":1}]";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(strip_code_fences(&fenced), body);
    }

    #[test]
    fn fenced_and_bare_output_decode_identically() {
        let bare = three_actions_json();
        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(parse_actions(&fenced).unwrap(), parse_actions(&bare).unwrap());
        assert_eq!(parse_actions(&bare).unwrap().len(), 3);
    }

    #[test]
    fn length_is_not_enforced() {
        let one = json!([{"title": "Only", "action": "Do it"}]).to_string();
        assert_eq!(parse_actions(&one).unwrap().len(), 1);
    }

    #[test]
    fn rejects_prose() {
        let err = parse_actions("Here are three ideas: ...").unwrap_err();
        assert_eq!(err.raw_output, "Here are three ideas: ...");
    }

    #[test]
    fn rejects_object_and_empty_array() {
        assert!(parse_actions("{\"title\":\"x\"}").is_err());
        assert!(parse_actions("[]").is_err());
        assert!(parse_actions("").is_err());
    }

    #[test]
    fn accepts_numeric_and_boolean_fields() {
        let v = json!([{"title": "A", "impact": 15, "channel": false}]).to_string();
        let actions = parse_actions(&v).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].impact, "15");
        assert_eq!(actions[0].channel, "false");
        assert!(!actions[0].is_error_sentinel());
    }

    #[test]
    fn rejects_array_of_non_objects() {
        assert!(parse_actions("[\"Launch AR try-on\"]").is_err());
    }
}
