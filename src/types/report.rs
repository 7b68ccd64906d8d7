use serde::{Deserialize, Serialize};

use crate::types::category::Category;
use crate::types::competitor::CompetitorListing;
use crate::types::dimension::DimensionKey;

/// 单个维度的评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: DimensionKey,
    /// 截断到[0,100]之后的取值
    pub value: f64,
    /// 该维度在当前类别下的权重（0-1）
    pub weight: f64,
}

/// 评分明细，由ScoringEngine生成：类别维度集合中的每个维度恰好出现一次
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBreakdown {
    entries: Vec<DimensionScore>,
}

impl ScoreBreakdown {
    pub(crate) fn from_entries(entries: Vec<DimensionScore>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DimensionScore] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, dimension: DimensionKey) -> Option<&DimensionScore> {
        self.entries.iter().find(|entry| entry.dimension == dimension)
    }

    /// 权重之和，合法明细恒为1.0
    pub fn weight_sum(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }
}

/// 最终的验证报告，生成后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub opportunity_score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub what_users_love: Vec<String>,
    pub what_users_hate: Vec<String>,
    pub mvp_roadmap: Vec<String>,
    pub pricing_suggestion: String,
    pub target_platform_recommendation: String,
    pub market_breakdown: String,
    pub tam: String,
    pub sam: String,
    pub som: String,
    pub revenue_model_options: Vec<String>,
    pub competitors_analyzed: Vec<CompetitorListing>,
    pub category: Category,
    pub subcategory: Option<String>,
}
