use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TARGET: &str = "General";
pub const DEFAULT_TITLE: &str = "Next Best Action";
pub const DEFAULT_IMPACT: &str = "Calculated to improve engagement by 15%.";
pub const DEFAULT_CHANNEL: &str = "Omnichannel";

/// One "next best action" card. Regenerated on every fetch, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecommendation {
    pub title: String,
    pub target: String,
    pub action: String,
    pub impact: String,
    pub channel: String,
}

impl ActionRecommendation {
    /// Displayable placeholder returned when recommendations cannot be produced.
    pub fn error_sentinel() -> Self {
        Self {
            title: "Error".to_string(),
            target: "System".to_string(),
            action: "Check API Connection".to_string(),
            impact: "High".to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    pub fn is_error_sentinel(&self) -> bool {
        self == &Self::error_sentinel()
    }
}

/// Record as emitted by the model. Every field may be missing or hold any JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmActionRecommendation {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub target: Option<Value>,
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub impact: Option<Value>,
    #[serde(default)]
    pub channel: Option<Value>,
}

/// Display text for a field; `None` for null or blank values.
fn field_text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s,
        other => other.to_string(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl LlmActionRecommendation {
    pub fn into_recommendation(self) -> ActionRecommendation {
        let action = field_text(self.action);
        let title = field_text(self.title)
            .or_else(|| action.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        ActionRecommendation {
            action: action.unwrap_or_else(|| title.clone()),
            title,
            target: field_text(self.target).unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            impact: field_text(self.impact).unwrap_or_else(|| DEFAULT_IMPACT.to_string()),
            channel: field_text(self.channel).unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        }
    }
}
