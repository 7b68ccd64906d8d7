use serde::{Deserialize, Serialize};

/// 竞品所在的平台（闭集）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    Reddit,
    #[serde(rename = "hackernews")]
    HackerNews,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Reddit => "reddit",
            Platform::HackerNews => "hackernews",
        }
    }

    /// 平台数据的来源类型
    pub fn origin(&self) -> SourceOrigin {
        match self {
            Platform::Ios => SourceOrigin::Store,
            Platform::Reddit | Platform::HackerNews => SourceOrigin::SearchEngine,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 竞品数据来源：应用商店或搜索引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    Store,
    SearchEngine,
}

/// 单条用户评论摘录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub content: String,
    /// 评分（1-5），部分来源没有评分
    pub rating: Option<f32>,
}

/// 竞品条目：平台上的一次出现及其抓取到的评论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorListing {
    pub platform: Platform,
    pub source: SourceOrigin,
    pub listing_id: String,
    pub title: String,
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl CompetitorListing {
    pub fn new(platform: Platform, listing_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            platform,
            source: platform.origin(),
            listing_id: listing_id.into(),
            title: title.into(),
            rating: None,
            url: None,
            icon_url: None,
            reviews: Vec::new(),
        }
    }

    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }
}
