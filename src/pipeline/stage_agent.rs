use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

use crate::llm::{AnalysisError, AnalysisRequest};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::monitor::CallKind;
use crate::pipeline::run::RunArtifacts;
use crate::pipeline::shape::ContractViolation;
use crate::types::Idea;

/// 分析阶段对分析函数的最大调用次数（首次 + 一次重试）
pub const ANALYSIS_ATTEMPTS: usize = 2;

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
    /// 采样温度
    pub temperature: f64,
}

/// 阶段失败，任何一种都会让整次运行失败
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage} returned an invalid result: {reason}")]
    ContractViolation { stage: &'static str, reason: String },
    #[error("{stage} analysis failed: {source}")]
    Analysis {
        stage: &'static str,
        source: AnalysisError,
    },
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
    #[error("{stage} cannot run without {artifact}")]
    MissingArtifact {
        stage: &'static str,
        artifact: &'static str,
    },
    #[error("{stage} exceeded its stage deadline of {}s", .after.as_secs())]
    DeadlineExceeded {
        stage: &'static str,
        after: Duration,
    },
}

/// 由类型生成期望的输出结构（JSON Schema）
pub fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| json!({}))
}

/// 流水线中的分析阶段
///
/// 每个阶段只向分析函数发出一次请求，返回值必须通过`validate`校验；
/// 调用失败、超时或返回结构不合法时用同样的上下文重试一次，第二次失败即阶段失败。
#[async_trait]
pub trait StageAgent: Send + Sync {
    /// 阶段产物
    type Output: Send;

    /// Agent类型标识
    fn agent_type(&self) -> &'static str;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 期望的输出结构
    fn expected_shape(&self, artifacts: &RunArtifacts, context: &PipelineContext) -> Value;

    /// 构造阶段上下文，缺少前序产物时报错
    fn build_context(
        &self,
        idea: &Idea,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Value, StageError>;

    /// 校验并修复分析函数的原始返回
    fn validate(
        &self,
        raw: &Value,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Self::Output, ContractViolation>;

    /// 默认实现的execute方法：构造请求、调用、校验、必要时重试一次
    async fn execute(
        &self,
        idea: &Idea,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Self::Output, StageError> {
        let stage = self.agent_type();
        let template = self.prompt_template();
        let request = AnalysisRequest {
            task: stage.to_string(),
            system_prompt: template.system_prompt,
            instructions: format!(
                "{}\n\n{}",
                template.opening_instruction, template.closing_instruction
            ),
            context: self.build_context(idea, artifacts, context)?,
            expected_shape: self.expected_shape(artifacts, context),
            temperature: Some(template.temperature),
        };
        let limit = context.config.llm.call_timeout();

        let mut attempt = 1;
        loop {
            let outcome = context
                .monitor
                .observe(
                    CallKind::Analysis,
                    limit,
                    context.analysis.invoke(request.clone()),
                )
                .await;

            let error = match outcome {
                Ok(Ok(raw)) => match self.validate(&raw, artifacts, context) {
                    Ok(output) => {
                        tracing::info!("✅ Sub-Agent [{}]执行完成", stage);
                        return Ok(output);
                    }
                    Err(violation) => StageError::ContractViolation {
                        stage,
                        reason: violation.0,
                    },
                },
                Ok(Err(source)) => StageError::Analysis { stage, source },
                Err(_) => StageError::Timeout {
                    stage,
                    after: limit,
                },
            };

            if attempt >= ANALYSIS_ATTEMPTS {
                tracing::error!("❌ Sub-Agent [{}]执行失败: {}", stage, error);
                return Err(error);
            }
            tracing::warn!(
                "🔄 Sub-Agent [{}]第{}次调用失败，重试: {}",
                stage,
                attempt,
                error
            );
            attempt += 1;
        }
    }
}
