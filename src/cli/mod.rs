use crate::config::{Config, LLMProvider};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名，位于当前工作目录
const DEFAULT_CONFIG_FILE: &str = "validator.toml";

/// Idea Validator - 由多智能体驱动的产品想法验证服务
#[derive(Parser, Debug)]
#[command(name = "idea-validator")]
#[command(
    about = "Validates product ideas with a multi-agent pipeline: classifies the idea, discovers competitors, mines their reviews, drafts an MVP roadmap and scores the opportunity, streaming progress over SSE."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP服务监听地址
    #[arg(short, long)]
    pub bind: Option<String>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 模型名称
    #[arg(long)]
    pub model: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 单次模型调用超时（秒）
    #[arg(long)]
    pub llm_timeout: Option<u64>,

    /// 竞品发现的最大并发抓取数
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// 最多保留的竞品数
    #[arg(long)]
    pub max_listings: Option<usize>,

    /// 每个竞品最多抓取的评论数
    #[arg(long)]
    pub max_reviews: Option<usize>,

    /// 应用商店的国家/地区代码
    #[arg(long)]
    pub country: Option<String>,

    /// 历史记录文件路径
    #[arg(long)]
    pub history_path: Option<PathBuf>,

    /// 禁用历史记录持久化
    #[arg(long)]
    pub no_history: bool,

    /// 启用语音转写接口
    #[arg(long)]
    pub enable_transcription: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            // 显式指定的配置文件必须可读
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path).with_context(|| {
                        format!("无法读取默认配置文件 {:?}", default_config_path)
                    })?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(llm_timeout) = self.llm_timeout {
            config.llm.call_timeout_seconds = llm_timeout;
        }

        // 覆盖竞品发现配置
        if let Some(max_concurrency) = self.max_concurrency {
            config.discovery.max_concurrency = max_concurrency;
        }
        if let Some(max_listings) = self.max_listings {
            config.discovery.max_listings = max_listings;
        }
        if let Some(max_reviews) = self.max_reviews {
            config.discovery.max_reviews_per_listing = max_reviews;
        }
        if let Some(country) = self.country {
            config.discovery.country = country.to_lowercase();
        }

        if let Some(history_path) = self.history_path {
            config.history.path = history_path;
        }
        if self.no_history {
            config.history.enabled = false;
        }
        if self.enable_transcription {
            config.transcription.enabled = true;
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
