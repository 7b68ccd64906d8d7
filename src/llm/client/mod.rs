//! LLM客户端 - 基于rig的分析函数实现

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::LLMConfig;
use crate::llm::function::{AnalysisError, AnalysisFunction, AnalysisRequest};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::parse_json_response;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// 系统提示词后追加输出格式约束
    fn build_system_prompt(request: &AnalysisRequest) -> String {
        let schema = serde_json::to_string_pretty(&request.expected_shape).unwrap_or_default();
        format!(
            "{}\n\nRespond with a single JSON object only, no prose and no markdown. The object MUST conform to this JSON Schema:\n{}",
            request.system_prompt, schema
        )
    }

    /// 用户提示词：任务说明 + 结构化上下文
    fn build_user_prompt(request: &AnalysisRequest) -> String {
        let context = serde_json::to_string_pretty(&request.context).unwrap_or_default();
        format!(
            "{}\n\n## Context\n```json\n{}\n```",
            request.instructions, context
        )
    }
}

#[async_trait]
impl AnalysisFunction for LLMClient {
    async fn invoke(&self, request: AnalysisRequest) -> Result<Value, AnalysisError> {
        let system_prompt = Self::build_system_prompt(&request);
        let user_prompt = Self::build_user_prompt(&request);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        let agent = self
            .client
            .create_agent(&self.config.model, &system_prompt, temperature, &self.config)
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        tracing::debug!("🤖 [{}] 调用模型 {}", request.task, self.config.model);
        let response = agent
            .prompt(&user_prompt)
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        parse_json_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            task: "ProductManager".to_string(),
            system_prompt: "You are an expert Product Manager.".to_string(),
            instructions: "Formulate a Day-1 MVP roadmap.".to_string(),
            context: json!({"idea": "A social network for dogs"}),
            expected_shape: json!({"type": "object", "required": ["mvp_roadmap"]}),
            temperature: Some(0.4),
        }
    }

    #[test]
    fn test_system_prompt_embeds_schema() {
        let prompt = LLMClient::build_system_prompt(&request());
        assert!(prompt.starts_with("You are an expert Product Manager."));
        assert!(prompt.contains("\"mvp_roadmap\""));
        assert!(prompt.contains("JSON Schema"));
    }

    #[test]
    fn test_user_prompt_embeds_context() {
        let prompt = LLMClient::build_user_prompt(&request());
        assert!(prompt.starts_with("Formulate a Day-1 MVP roadmap."));
        assert!(prompt.contains("A social network for dogs"));
    }
}
