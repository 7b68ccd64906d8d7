//! 分析函数接口 - 流水线与大模型之间的唯一边界

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 一次分析调用的完整请求
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// 调用方标识，用于日志
    pub task: String,
    /// 系统提示词
    pub system_prompt: String,
    /// 任务说明（开头指令 + 结尾要求）
    pub instructions: String,
    /// 结构化上下文
    pub context: Value,
    /// 期望的输出结构（JSON Schema）
    pub expected_shape: Value,
    /// 覆盖默认温度
    pub temperature: Option<f64>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis provider error: {0}")]
    Provider(String),
    #[error("analysis response is not valid JSON: {0}")]
    MalformedJson(String),
}

/// 外部分析函数：接收结构化上下文，返回结构化JSON
#[async_trait]
pub trait AnalysisFunction: Send + Sync {
    async fn invoke(&self, request: AnalysisRequest) -> Result<Value, AnalysisError>;
}
