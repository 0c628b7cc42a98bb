//! Types shared across the OpenAI-compatible Chat and Responses API surfaces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable function's JSON-schema declaration, as embedded in a [`Tool`] or
/// [`crate::responses::ResponseTool`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// A Chat Completions-style tool entry (`{"type": "function", "function": {...}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: Function,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_serializes_without_optional_fields() {
        let f = Function {
            name: "get_weather".to_string(),
            description: None,
            parameters: serde_json::json!({"type": "object"}),
            strict: None,
        };
        let v = serde_json::to_value(&f).unwrap();
        assert!(v.get("description").is_none());
        assert!(v.get("strict").is_none());
    }
}
