//! Reddit：通过公开JSON接口检索相关讨论帖，帖子下的评论作为用户反馈

use serde::Deserialize;

use crate::sources::{SourceError, truncate_review};
use crate::types::{CompetitorListing, Platform, Review};

const SEARCH_URL: &str = "https://www.reddit.com/search.json";
const COMMENTS_URL: &str = "https://www.reddit.com/comments";
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// 过短的评论（如"+1"、"this"）不算有效反馈
const MIN_COMMENT_CHARS: usize = 20;

pub struct RedditSource {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}

#[derive(Debug, Deserialize)]
struct ThingData {
    id: Option<String>,
    title: Option<String>,
    permalink: Option<String>,
    score: Option<i64>,
    body: Option<String>,
}

impl RedditSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompetitorListing>, SourceError> {
        let limit = limit.to_string();
        let response: Listing = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("sort", "relevance"),
                ("type", "link"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Self::parse_posts(response))
    }

    fn parse_posts(response: Listing) -> Vec<CompetitorListing> {
        response
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .filter_map(|thing| Self::into_listing(thing.data))
            .collect()
    }

    fn into_listing(post: ThingData) -> Option<CompetitorListing> {
        let id = post.id?;
        let title = post.title.filter(|t| !t.trim().is_empty())?;
        let mut listing =
            CompetitorListing::new(Platform::Reddit, id, html_escape::decode_html_entities(&title));
        listing.url = post
            .permalink
            .map(|permalink| format!("{}{}", PERMALINK_BASE, permalink));
        // 与HN相同，按得分折算到5分制
        listing.rating = post
            .score
            .map(|score| (score.max(0) as f64 / 10.0).min(5.0));
        Some(listing)
    }

    pub async fn fetch_reviews(
        &self,
        listing_id: &str,
        max_count: usize,
    ) -> Result<Vec<Review>, SourceError> {
        let url = format!("{}/{}.json", COMMENTS_URL, listing_id);
        let limit = max_count.to_string();
        let response: Vec<Listing> = self
            .client
            .get(&url)
            .query(&[("sort", "top"), ("limit", limit.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::parse_comments(response, max_count)
    }

    /// 评论接口返回两段：帖子本身与评论树，只取第二段的顶层评论
    fn parse_comments(response: Vec<Listing>, max_count: usize) -> Result<Vec<Review>, SourceError> {
        let Some(comments) = response.into_iter().nth(1) else {
            return Err(SourceError::Decode(
                "comment listing is missing from the response".to_string(),
            ));
        };

        Ok(comments
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t1")
            .filter_map(|thing| thing.data.body)
            .map(|body| html_escape::decode_html_entities(body.trim()).into_owned())
            .filter(|body| !matches!(body.as_str(), "[deleted]" | "[removed]"))
            .filter(|body| body.chars().count() > MIN_COMMENT_CHARS)
            .take(max_count)
            .map(|body| Review {
                content: truncate_review(&body),
                rating: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posts() {
        let raw = r#"{"kind": "Listing", "data": {"children": [
            {"kind": "t3", "data": {"id": "1abc", "title": "Anyone tried Pawpals &amp; similar apps?", "permalink": "/r/dogs/comments/1abc/anyone/", "score": 230}},
            {"kind": "t3", "data": {"id": "1abd", "title": "  ", "score": 4}},
            {"kind": "t5", "data": {"id": "sub", "title": "r/dogs"}},
            {"kind": "t3", "data": {"id": "1abe", "title": "Dog walking marketplaces", "score": 7}}
        ]}}"#;
        let response: Listing = serde_json::from_str(raw).unwrap();
        let listings = RedditSource::parse_posts(response);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].platform, Platform::Reddit);
        assert_eq!(listings[0].listing_id, "1abc");
        assert_eq!(listings[0].title, "Anyone tried Pawpals & similar apps?");
        assert_eq!(
            listings[0].url.as_deref(),
            Some("https://www.reddit.com/r/dogs/comments/1abc/anyone/")
        );
        assert_eq!(listings[0].rating, Some(5.0));
        assert_eq!(listings[1].rating, Some(0.7));
        assert_eq!(listings[1].url, None);
    }

    #[test]
    fn test_parse_comments_skips_short_and_deleted() {
        let raw = r#"[
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"id": "1abc", "title": "Anyone tried Pawpals?"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"body": "The app keeps logging me out &amp; loses my dog's profile"}},
                {"kind": "t1", "data": {"body": "this"}},
                {"kind": "t1", "data": {"body": "[deleted]"}},
                {"kind": "t1", "data": {"body": "Would pay for a version that works offline on hikes"}},
                {"kind": "more", "data": {"id": "more1"}}
            ]}}
        ]"#;
        let response: Vec<Listing> = serde_json::from_str(raw).unwrap();
        let reviews = RedditSource::parse_comments(response, 10).unwrap();

        assert_eq!(reviews.len(), 2);
        assert_eq!(
            reviews[0].content,
            "The app keeps logging me out & loses my dog's profile"
        );
        assert_eq!(reviews[1].rating, None);

        let response: Vec<Listing> = serde_json::from_str(raw).unwrap();
        assert_eq!(RedditSource::parse_comments(response, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_comments_requires_comment_listing() {
        let raw = r#"[{"kind": "Listing", "data": {"children": []}}]"#;
        let response: Vec<Listing> = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            RedditSource::parse_comments(response, 10),
            Err(SourceError::Decode(_))
        ));
    }
}
