//! 竞品数据源 - 检索竞品条目并抓取其评论

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::DiscoveryConfig;
use crate::types::{CompetitorListing, Platform, Review};

pub mod app_store;
pub mod hacker_news;
pub mod reddit;

use app_store::AppStoreSource;
use hacker_news::HackerNewsSource;
use reddit::RedditSource;

const USER_AGENT: &str = concat!("idea-validator/", env!("CARGO_PKG_VERSION"));

/// 单条评论保留的最大字符数
pub const REVIEW_MAX_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("platform `{0}` is not supported by this source")]
    Unsupported(Platform),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// 外部竞品数据源
#[async_trait]
pub trait CompetitorSource: Send + Sync {
    /// 是否支持该平台；不支持的平台在发现阶段直接跳过
    fn supports(&self, _platform: Platform) -> bool {
        true
    }

    /// 检索平台上的竞品条目（不含评论）
    async fn search(
        &self,
        platform: Platform,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompetitorListing>, SourceError>;

    /// 抓取某个竞品条目的评论
    async fn fetch_reviews(
        &self,
        platform: Platform,
        listing_id: &str,
        max_count: usize,
    ) -> Result<Vec<Review>, SourceError>;
}

/// 基于公开HTTP接口的数据源：App Store、Reddit 与 Hacker News
pub struct HttpCompetitorSource {
    app_store: AppStoreSource,
    reddit: RedditSource,
    hacker_news: HackerNewsSource,
}

impl HttpCompetitorSource {
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.fetch_timeout())
            .build()?;

        Ok(Self {
            app_store: AppStoreSource::new(client.clone(), &config.country),
            reddit: RedditSource::new(client.clone()),
            hacker_news: HackerNewsSource::new(client),
        })
    }
}

#[async_trait]
impl CompetitorSource for HttpCompetitorSource {
    async fn search(
        &self,
        platform: Platform,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompetitorListing>, SourceError> {
        match platform {
            Platform::Ios => self.app_store.search(query, limit).await,
            Platform::Reddit => self.reddit.search(query, limit).await,
            Platform::HackerNews => self.hacker_news.search(query, limit).await,
        }
    }

    async fn fetch_reviews(
        &self,
        platform: Platform,
        listing_id: &str,
        max_count: usize,
    ) -> Result<Vec<Review>, SourceError> {
        match platform {
            Platform::Ios => self.app_store.fetch_reviews(listing_id, max_count).await,
            Platform::Reddit => self.reddit.fetch_reviews(listing_id, max_count).await,
            Platform::HackerNews => self.hacker_news.fetch_reviews(listing_id, max_count).await,
        }
    }
}

/// 截断过长的评论文本
pub(crate) fn truncate_review(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > REVIEW_MAX_CHARS {
        let truncated: String = text.chars().take(REVIEW_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_truncate_review() {
        assert_eq!(truncate_review("  great app  "), "great app");
        let long = "a".repeat(REVIEW_MAX_CHARS + 20);
        assert_eq!(truncate_review(&long).chars().count(), REVIEW_MAX_CHARS + 3);
    }

    #[test]
    fn test_http_source_serves_every_target_platform() {
        let source = HttpCompetitorSource::new(&DiscoveryConfig::default()).unwrap();
        for category in Category::ALL {
            for platform in category.target_platforms() {
                assert!(source.supports(*platform), "{} is not served", platform);
            }
        }
    }
}
