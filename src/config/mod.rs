use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::stage_agent::ANALYSIS_ATTEMPTS;
use crate::types::{Category, WeightTable, default_weight_table};

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP服务配置
    pub server: ServerConfig,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 竞品发现配置
    pub discovery: DiscoveryConfig,

    /// 流水线配置
    pub pipeline: PipelineConfig,

    /// 评分权重配置
    pub scoring: ScoringConfig,

    /// 历史记录配置
    pub history: HistoryConfig,

    /// 语音转写配置
    pub transcription: TranscriptionConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// HTTP服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind: String,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 分析所用模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 默认温度，各Agent可以覆盖
    pub temperature: f64,

    /// 单次调用超时时间（秒）
    pub call_timeout_seconds: u64,
}

/// 竞品发现配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// 最终保留的竞品数量上限
    pub max_listings: usize,

    /// 每个平台检索的竞品数量
    pub listings_per_platform: usize,

    /// 每个竞品保留的评论条数上限
    pub max_reviews_per_listing: usize,

    /// 并发抓取的worker上限
    pub max_concurrency: usize,

    /// 单次抓取超时时间（秒）
    pub fetch_timeout_seconds: u64,

    /// 整个发现阶段的截止时间（秒）
    pub stage_deadline_seconds: u64,

    /// 应用商店国家/地区代码
    pub country: String,
}

/// 流水线配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// 分析阶段的截止时间（秒），超时视为阶段失败
    pub stage_deadline_seconds: u64,

    /// 研究阶段最多采样的评论条数
    pub max_review_samples: usize,

    /// 进度事件通道容量
    pub event_buffer: usize,
}

/// 评分权重配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: WeightTable,
}

/// 历史记录配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    /// 是否写入历史文件；关闭时仅记录日志
    pub enabled: bool,

    /// JSON Lines 历史文件路径
    pub path: PathBuf,
}

/// 语音转写配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub enabled: bool,

    /// OpenAI兼容的API基地址
    pub api_base_url: String,

    pub api_key: String,

    pub model: String,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 启动时校验配置，非法配置直接终止启动
    pub fn validate(&self) -> Result<()> {
        if self.discovery.max_concurrency == 0 {
            bail!("discovery.max_concurrency must be at least 1");
        }
        if self.discovery.fetch_timeout_seconds == 0 || self.discovery.stage_deadline_seconds == 0
        {
            bail!("discovery timeouts must be greater than zero");
        }
        if self.llm.call_timeout_seconds == 0 || self.pipeline.stage_deadline_seconds == 0 {
            bail!("llm.call_timeout_seconds and pipeline.stage_deadline_seconds must be greater than zero");
        }
        // 阶段截止时间必须容纳首次调用与一次重试
        let required = self.llm.call_timeout_seconds * ANALYSIS_ATTEMPTS as u64;
        if self.pipeline.stage_deadline_seconds < required {
            bail!(
                "pipeline.stage_deadline_seconds ({}) must be at least {} ({} attempts x llm.call_timeout_seconds)",
                self.pipeline.stage_deadline_seconds,
                required,
                ANALYSIS_ATTEMPTS
            );
        }
        if self.pipeline.event_buffer == 0 {
            bail!("pipeline.event_buffer must be at least 1");
        }
        for category in Category::ALL {
            if !self.scoring.weights.contains_key(&category) {
                bail!("scoring.weights is missing category `{}`", category);
            }
        }
        Ok(())
    }
}

impl LLMConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

impl DiscoveryConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn stage_deadline(&self) -> Duration {
        Duration::from_secs(self.stage_deadline_seconds)
    }
}

impl PipelineConfig {
    pub fn stage_deadline(&self) -> Duration {
        Duration::from_secs(self.stage_deadline_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:8080"),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("IDEA_VALIDATOR_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://generativelanguage.googleapis.com/v1beta"),
            model: String::from("gemini-2.5-flash"),
            max_tokens: 8192,
            temperature: 0.2,
            call_timeout_seconds: 90,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_listings: 6,
            listings_per_platform: 3,
            max_reviews_per_listing: 100,
            max_concurrency: 4,
            fetch_timeout_seconds: 10,
            stage_deadline_seconds: 30,
            country: String::from("us"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_deadline_seconds: 200,
            max_review_samples: 200,
            event_buffer: 16,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: default_weight_table(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".idea-validator/history.jsonl"),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: String::from("https://api.openai.com/v1"),
            api_key: std::env::var("IDEA_VALIDATOR_TRANSCRIPTION_API_KEY").unwrap_or_default(),
            model: String::from("whisper-1"),
        }
    }
}
