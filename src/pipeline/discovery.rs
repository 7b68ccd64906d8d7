//! 竞品发现 - 有界并发的检索与评论抓取
//!
//! 所有平台的检索同时发出，每个检索结果再派生评论抓取；在阶段截止时间前完成的条目被保留，
//! 失败或超时的条目被丢弃并记录日志，阶段本身永远不会因为抓取失败而失败。

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::pipeline::context::PipelineContext;
use crate::pipeline::monitor::CallKind;
use crate::sources::SourceError;
use crate::types::{Category, CompetitorListing, Idea, Platform, Review};

/// 单次抓取的最大尝试次数（首次 + 一次立即重试）
const FETCH_ATTEMPTS: usize = 2;
const MAX_QUERY_TERMS: usize = 5;
const QUERY_FALLBACK_CHARS: usize = 30;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("word pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "app", "application", "are", "based", "be", "best", "by", "can", "for",
    "from", "help", "helps", "how", "i", "idea", "in", "into", "is", "it", "its", "let", "lets",
    "like", "make", "me", "my", "new", "of", "on", "or", "our", "platform", "that", "the",
    "their", "them", "this", "to", "tool", "using", "want", "way", "we", "where", "which", "who",
    "will", "with", "you", "your",
];

/// 由想法文本确定性地生成检索词
///
/// 小写化后去掉停用词与过短的词，按出现顺序去重，最多保留5个；没有可用关键词时取原文前30个字符。
pub fn search_query(idea_text: &str) -> String {
    let lowered = idea_text.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();
    for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
        if word.len() < 3 || STOP_WORDS.contains(&word) || terms.contains(&word) {
            continue;
        }
        terms.push(word);
        if terms.len() == MAX_QUERY_TERMS {
            break;
        }
    }

    if terms.is_empty() {
        idea_text
            .trim()
            .chars()
            .take(QUERY_FALLBACK_CHARS)
            .collect::<String>()
            .trim()
            .to_string()
    } else {
        terms.join(" ")
    }
}

/// 并发任务的完成结果
enum Step {
    Searched {
        platform_idx: usize,
        platform: Platform,
        result: Result<Vec<CompetitorListing>, String>,
    },
    Reviewed {
        platform_idx: usize,
        rank: usize,
        listing: CompetitorListing,
        result: Result<Vec<Review>, String>,
    },
}

pub struct CompetitorDiscovery;

impl CompetitorDiscovery {
    pub async fn discover(
        &self,
        idea: &Idea,
        category: Category,
        context: &PipelineContext,
    ) -> Vec<CompetitorListing> {
        let config = &context.config.discovery;
        let started = Instant::now();
        let deadline = started + config.stage_deadline();
        let query = search_query(idea.text());

        let platforms: Vec<Platform> = category
            .target_platforms()
            .iter()
            .copied()
            .filter(|platform| {
                let supported = context.source.supports(*platform);
                if !supported {
                    tracing::debug!("⏭️ 数据源不支持平台 {}，跳过", platform);
                }
                supported
            })
            .collect();

        tracing::info!(
            "🔍 检索竞品: \"{}\"，平台 {:?}",
            query,
            platforms.iter().map(Platform::as_str).collect::<Vec<_>>()
        );

        let semaphore = Semaphore::new(config.max_concurrency.max(1));
        let mut pending: FuturesUnordered<BoxFuture<'_, Step>> = FuturesUnordered::new();
        for (platform_idx, platform) in platforms.iter().copied().enumerate() {
            pending.push(Box::pin(Self::search_step(
                context,
                &semaphore,
                platform_idx,
                platform,
                &query,
            )));
        }

        let mut completed: Vec<(usize, usize, CompetitorListing)> = Vec::new();
        loop {
            let next = tokio::time::timeout_at(deadline, pending.next()).await;
            match next {
                Ok(Some(Step::Searched {
                    platform_idx,
                    platform,
                    result,
                })) => match result {
                    Ok(listings) => {
                        tracing::debug!("📦 {} 返回 {} 个竞品", platform, listings.len());
                        for (rank, listing) in listings
                            .into_iter()
                            .take(config.listings_per_platform)
                            .enumerate()
                        {
                            pending.push(Box::pin(Self::review_step(
                                context,
                                &semaphore,
                                platform_idx,
                                rank,
                                listing,
                            )));
                        }
                    }
                    Err(e) => tracing::warn!("⚠️ {} 检索失败，跳过该平台: {}", platform, e),
                },
                Ok(Some(Step::Reviewed {
                    platform_idx,
                    rank,
                    mut listing,
                    result,
                })) => match result {
                    Ok(mut reviews) => {
                        reviews.truncate(config.max_reviews_per_listing);
                        listing.reviews = reviews;
                        completed.push((platform_idx, rank, listing));
                    }
                    Err(e) => tracing::warn!(
                        "⚠️ 丢弃竞品 {} ({}): 评论抓取失败: {}",
                        listing.title,
                        listing.platform,
                        e
                    ),
                },
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "⚠️ 竞品发现达到截止时间，放弃 {} 个未完成的抓取",
                        pending.len()
                    );
                    break;
                }
            }
        }

        // 结果顺序与完成顺序无关：按平台顺序、平台内排名排序
        completed.sort_by_key(|(platform_idx, rank, _)| (*platform_idx, *rank));
        let listings: Vec<CompetitorListing> = completed
            .into_iter()
            .map(|(_, _, listing)| listing)
            .take(config.max_listings)
            .collect();

        tracing::info!(
            "✅ 竞品发现完成: {} 个竞品，耗时 {:.2}s",
            listings.len(),
            started.elapsed().as_secs_f64()
        );
        listings
    }

    async fn search_step(
        context: &PipelineContext,
        semaphore: &Semaphore,
        platform_idx: usize,
        platform: Platform,
        query: &str,
    ) -> Step {
        let limit = context.config.discovery.listings_per_platform;
        let result = Self::call_with_retry(context, semaphore, move || {
            context.source.search(platform, query, limit)
        })
        .await;

        Step::Searched {
            platform_idx,
            platform,
            result,
        }
    }

    async fn review_step(
        context: &PipelineContext,
        semaphore: &Semaphore,
        platform_idx: usize,
        rank: usize,
        listing: CompetitorListing,
    ) -> Step {
        let max_count = context.config.discovery.max_reviews_per_listing;
        let platform = listing.platform;
        let listing_id = listing.listing_id.as_str();
        let result = Self::call_with_retry(context, semaphore, move || {
            context.source.fetch_reviews(platform, listing_id, max_count)
        })
        .await;

        Step::Reviewed {
            platform_idx,
            rank,
            listing,
            result,
        }
    }

    /// 在并发上限内执行一次抓取，失败或超时后立即重试一次
    async fn call_with_retry<T, F, Fut>(
        context: &PipelineContext,
        semaphore: &Semaphore,
        mut call: F,
    ) -> Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let limit = context.config.discovery.fetch_timeout();
        let mut last_error = String::new();

        for attempt in 1..=FETCH_ATTEMPTS {
            let _permit = semaphore.acquire().await.map_err(|e| e.to_string())?;
            match context
                .monitor
                .observe(CallKind::Source, limit, call())
                .await
            {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(SourceError::Unsupported(platform))) => {
                    return Err(format!("platform `{}` is not supported", platform));
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {}s", limit.as_secs()),
            }

            if attempt < FETCH_ATTEMPTS {
                tracing::debug!("🔄 抓取失败，立即重试: {}", last_error);
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_drops_stop_words() {
        assert_eq!(search_query("A social network for dogs"), "social network dogs");
    }

    #[test]
    fn test_search_query_limits_terms_and_dedupes() {
        let query = search_query(
            "Budget budget tracker for students with receipts scanning, savings goals and alerts",
        );
        assert_eq!(query, "budget tracker students receipts scanning");
    }

    #[test]
    fn test_search_query_falls_back_to_prefix() {
        assert_eq!(search_query("An app for me"), "An app for me");
    }

    #[test]
    fn test_search_query_fallback_is_bounded() {
        let idea = "我想做一个帮助宠物主人社交的应用，可以分享照片和组织线下活动的小程序";
        assert_eq!(search_query(idea).chars().count(), QUERY_FALLBACK_CHARS);
    }
}
