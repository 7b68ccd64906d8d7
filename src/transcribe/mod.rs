//! 语音转写 - 在进入流水线之前把语音备忘录转成想法文本

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::TranscriptionConfig;

/// 转写服务接口；没有可识别的语音内容时返回`None`
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<Option<String>>;
}

/// 兼容OpenAI `/audio/transcriptions` 接口的转写服务
pub struct WhisperTranscriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build transcription HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/audio/transcriptions",
                config.api_base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<Option<String>> {
        let size = audio.len();
        let file = Part::bytes(audio)
            .file_name("memo.m4a")
            .mime_str("audio/mp4")?;
        let form = Form::new()
            .text("model", self.model.clone())
            .part("file", file);

        tracing::info!("🎙️ 上传 {} 字节音频进行转写", size);
        let response: TranscriptionResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?
            .error_for_status()
            .context("Transcription service returned an error")?
            .json()
            .await
            .context("Transcription response is not valid JSON")?;

        Ok(normalize_transcript(&response.text))
    }
}

/// 去掉首尾空白，空文本视为没有转写结果
fn normalize_transcript(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// 根据配置创建转写服务，未启用时返回`None`
pub fn from_config(config: &TranscriptionConfig) -> Result<Option<Arc<dyn Transcriber>>> {
    if !config.enabled {
        return Ok(None);
    }
    let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(config)?);
    Ok(Some(transcriber))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_transcript() {
        assert_eq!(
            normalize_transcript("  An app that matches dog owners for walks \n"),
            Some("An app that matches dog owners for walks".to_string())
        );
        assert_eq!(normalize_transcript("   "), None);
    }

    #[test]
    fn test_endpoint_is_derived_from_base_url() {
        let config = TranscriptionConfig {
            enabled: true,
            api_base_url: "https://api.openai.com/v1/".to_string(),
            ..TranscriptionConfig::default()
        };
        let transcriber = WhisperTranscriber::new(&config).unwrap();
        assert_eq!(
            transcriber.endpoint,
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        let config = TranscriptionConfig::default();
        assert!(from_config(&config).unwrap().is_none());
    }
}
