use serde::{Deserialize, Serialize};

use crate::types::competitor::Platform;

/// 产品想法所属的类别，决定评分维度集合与竞品检索平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MobileApp,
    SaasWeb,
    Hardware,
    Fintech,
}

impl Category {
    /// 所有合法类别（闭集）
    pub const ALL: [Category; 4] = [
        Category::MobileApp,
        Category::SaasWeb,
        Category::Hardware,
        Category::Fintech,
    ];

    /// 分类失败或结果越界时使用的兜底类别
    pub const FALLBACK: Category = Category::SaasWeb;

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MobileApp => "mobile_app",
            Category::SaasWeb => "saas_web",
            Category::Hardware => "hardware",
            Category::Fintech => "fintech",
        }
    }

    /// 提供给分类Agent的类别说明
    pub fn description(&self) -> &'static str {
        match self {
            Category::MobileApp => "Consumer or prosumer apps delivered primarily on smartphones",
            Category::SaasWeb => "Browser-based software, SaaS products, developer tools and web platforms",
            Category::Hardware => "Physical devices, gadgets, wearables and IoT products",
            Category::Fintech => "Payments, banking, investing, lending, insurance and personal finance",
        }
    }

    /// 该类别下竞品发现需要检索的平台，按优先级排序
    pub fn target_platforms(&self) -> &'static [Platform] {
        match self {
            Category::MobileApp => &[Platform::Ios, Platform::Reddit],
            Category::SaasWeb => &[Platform::Reddit, Platform::HackerNews],
            Category::Hardware => &[Platform::HackerNews, Platform::Reddit],
            Category::Fintech => &[Platform::Ios, Platform::Reddit, Platform::HackerNews],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// 宽松解析：忽略大小写，并接受空格与连字符分隔的写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "mobile_app" => Ok(Category::MobileApp),
            "saas_web" => Ok(Category::SaasWeb),
            "hardware" => Ok(Category::Hardware),
            "fintech" => Ok(Category::Fintech),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}
