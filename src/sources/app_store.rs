//! Apple App Store：iTunes Search API 检索 + 公开 customer reviews RSS 抓取评论

use serde::Deserialize;

use crate::sources::{SourceError, truncate_review};
use crate::types::{CompetitorListing, Platform, Review};

const SEARCH_URL: &str = "https://itunes.apple.com/search";

pub struct AppStoreSource {
    client: reqwest::Client,
    country: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    track_id: Option<u64>,
    bundle_id: Option<String>,
    track_name: Option<String>,
    average_user_rating: Option<f64>,
    artwork_url512: Option<String>,
    track_view_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewFeedResponse {
    feed: ReviewFeed,
}

#[derive(Debug, Deserialize)]
struct ReviewFeed {
    #[serde(default)]
    entry: Option<OneOrMany<FeedEntry>>,
}

/// RSS转JSON时，只有一条记录会退化为对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    author: Option<serde_json::Value>,
    content: Option<Label>,
    #[serde(rename = "im:rating")]
    rating: Option<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    label: String,
}

impl AppStoreSource {
    pub fn new(client: reqwest::Client, country: &str) -> Self {
        Self {
            client,
            country: country.to_string(),
        }
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
                ("term", query),
                ("entity", "software"),
                ("limit", limit.as_str()),
                ("country", self.country.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(Self::into_listing)
            .collect())
    }

    fn into_listing(result: SearchResult) -> Option<CompetitorListing> {
        // 没有trackId/bundleId的结果无法抓取评论
        let track_id = result.track_id?;
        result.bundle_id.as_ref()?;

        let mut listing = CompetitorListing::new(
            Platform::Ios,
            track_id.to_string(),
            result.track_name.unwrap_or_else(|| "Unknown App".to_string()),
        )
        .with_rating(result.average_user_rating);
        listing.icon_url = result.artwork_url512;
        listing.url = result.track_view_url;
        Some(listing)
    }

    pub async fn fetch_reviews(
        &self,
        listing_id: &str,
        max_count: usize,
    ) -> Result<Vec<Review>, SourceError> {
        if listing_id.is_empty() || !listing_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(SourceError::Decode(format!(
                "invalid App Store id `{}`",
                listing_id
            )));
        }

        let url = format!(
            "https://itunes.apple.com/{}/rss/customerreviews/page=1/id={}/sortby=mostrecent/json",
            self.country, listing_id
        );
        let response: ReviewFeedResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Self::parse_entries(response, max_count))
    }

    fn parse_entries(response: ReviewFeedResponse, max_count: usize) -> Vec<Review> {
        response
            .feed
            .entry
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            // 第一条通常是应用本身的描述，没有author字段
            .filter(|entry| entry.author.is_some())
            .filter_map(|entry| {
                let content = entry.content?.label;
                if content.trim().is_empty() {
                    return None;
                }
                Some(Review {
                    content: truncate_review(&content),
                    rating: entry.rating.and_then(|r| r.label.trim().parse::<f32>().ok()),
                })
            })
            .take(max_count)
            .collect()
    }
}
