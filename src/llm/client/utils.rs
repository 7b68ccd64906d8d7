use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::llm::function::AnalysisError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
});

/// 从模型的文本回复中解析JSON
///
/// 依次尝试：整段文本、```json 代码块、第一个`{`到最后一个`}`之间的内容。
pub fn parse_json_response(text: &str) -> Result<Value, AnalysisError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(block) = FENCED_BLOCK.captures(trimmed).and_then(|caps| caps.get(1))
        && let Ok(value) = serde_json::from_str::<Value>(block.as_str())
    {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end])
    {
        return Ok(value);
    }

    let preview: String = trimmed.chars().take(120).collect();
    Err(AnalysisError::MalformedJson(preview))
}
