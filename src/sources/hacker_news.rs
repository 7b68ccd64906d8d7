//! Hacker News：通过 Algolia 搜索接口检索相关帖子，帖子下的评论作为用户反馈

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::sources::{SourceError, truncate_review};
use crate::types::{CompetitorListing, Platform, Review};

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html tag pattern is valid"));

pub struct HackerNewsSource {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    #[serde(rename = "comment_text")]
    comment_text: Option<String>,
}

impl HackerNewsSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompetitorListing>, SourceError> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .hits
            .into_iter()
            .filter_map(Self::into_listing)
            .collect())
    }

    fn into_listing(hit: Hit) -> Option<CompetitorListing> {
        let title = hit.title.filter(|t| !t.trim().is_empty())?;
        let mut listing = CompetitorListing::new(Platform::HackerNews, hit.object_id, title);
        listing.url = hit.url;
        // HN没有星级评分，按points折算到5分制，50分以上视为满分
        listing.rating = hit
            .points
            .map(|points| (points.max(0) as f64 / 10.0).min(5.0));
        Some(listing)
    }

    pub async fn fetch_reviews(
        &self,
        listing_id: &str,
        max_count: usize,
    ) -> Result<Vec<Review>, SourceError> {
        let tags = format!("comment,story_{}", listing_id);
        let limit = max_count.to_string();
        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[("tags", tags.as_str()), ("hitsPerPage", limit.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Self::parse_comments(response, max_count))
    }

    fn parse_comments(response: SearchResponse, max_count: usize) -> Vec<Review> {
        response
            .hits
            .into_iter()
            .filter_map(|hit| hit.comment_text)
            .map(|html| strip_html(&html))
            .filter(|text| !text.is_empty())
            .take(max_count)
            .map(|text| Review {
                content: truncate_review(&text),
                rating: None,
            })
            .collect()
    }
}

/// 去掉评论里的HTML标签并解码HTML实体
pub(crate) fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>I &quot;love&quot; it</p><p>but it&#x27;s slow &amp; buggy</p>"),
            "I \"love\" it but it's slow & buggy"
        );
    }

    #[test]
    fn test_strip_html_decodes_named_and_numeric_entities() {
        assert_eq!(
            strip_html("<p>it&#39;s fast and cheap &#8212; 5 &#62; 3</p>"),
            "it's fast and cheap \u{2014} 5 > 3"
        );
        // 不间断空格与普通空白一起被规整
        assert_eq!(strip_html("fast&nbsp;and   cheap"), "fast and cheap");
    }

    #[test]
    fn test_parse_story_hits() {
        let raw = r#"{"hits": [
            {"objectID": "101", "title": "Show HN: Pawpals, a social app for dogs", "url": "https://pawpals.dev", "points": 87},
            {"objectID": "102", "title": "", "points": 3},
            {"objectID": "103", "title": "Dog walkers marketplace", "points": 12}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let listings: Vec<_> = response
            .hits
            .into_iter()
            .filter_map(HackerNewsSource::into_listing)
            .collect();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].listing_id, "101");
        assert_eq!(listings[0].rating, Some(5.0));
        assert_eq!(listings[1].rating, Some(1.2));
        assert_eq!(listings[1].url, None);
    }

    #[test]
    fn test_parse_comments_skips_empty() {
        let raw = r#"{"hits": [
            {"objectID": "1", "comment_text": "<p>Needs offline mode</p>"},
            {"objectID": "2", "comment_text": "<p> </p>"},
            {"objectID": "3"},
            {"objectID": "4", "comment_text": "Pricing is too high"}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let reviews = HackerNewsSource::parse_comments(response, 10);

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].content, "Needs offline mode");
        assert_eq!(reviews[1].rating, None);
    }
}
