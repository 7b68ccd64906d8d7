use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::category::Category;

/// 机会评分的维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKey {
    PainSeverity,
    MarketGap,
    MvpFeasibility,
    CompetitionDensity,
    MonetizationPotential,
    CommunityDemand,
    StartupSaturation,
}

impl DimensionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKey::PainSeverity => "pain_severity",
            DimensionKey::MarketGap => "market_gap",
            DimensionKey::MvpFeasibility => "mvp_feasibility",
            DimensionKey::CompetitionDensity => "competition_density",
            DimensionKey::MonetizationPotential => "monetization_potential",
            DimensionKey::CommunityDemand => "community_demand",
            DimensionKey::StartupSaturation => "startup_saturation",
        }
    }

    /// 评分口径说明，随上下文一起交给分析Agent
    pub fn rubric(&self) -> &'static str {
        match self {
            DimensionKey::PainSeverity => {
                "How severe and frequent are the unmet pain points? (100 = users are desperate, 0 = minor annoyances)"
            }
            DimensionKey::MarketGap => {
                "How large is the gap between user needs and what competitors deliver? (100 = massive unserved need, 0 = competitors already solve everything)"
            }
            DimensionKey::MvpFeasibility => {
                "How realistic is the proposed MVP to build and ship within 3 months for a small team? (100 = trivially buildable, 0 = requires years of R&D)"
            }
            DimensionKey::CompetitionDensity => {
                "How crowded is the market? (100 = wide open / few weak competitors, 0 = saturated with well-funded strong players)"
            }
            DimensionKey::MonetizationPotential => {
                "How willing are target users to pay, based on category norms and competitor pricing? (100 = proven paid market, 0 = users expect everything free)"
            }
            DimensionKey::CommunityDemand => {
                "How much active community desire exists for this product on forums and social sites? (100 = loud vocal demand, 0 = nobody is talking about this need)"
            }
            DimensionKey::StartupSaturation => {
                "Are well-funded startups already competing in this space? (100 = no VC-backed players, 0 = multiple well-funded startups exist)"
            }
        }
    }
}

impl std::fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DimensionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pain_severity" => Ok(DimensionKey::PainSeverity),
            "market_gap" => Ok(DimensionKey::MarketGap),
            "mvp_feasibility" => Ok(DimensionKey::MvpFeasibility),
            "competition_density" => Ok(DimensionKey::CompetitionDensity),
            "monetization_potential" => Ok(DimensionKey::MonetizationPotential),
            "community_demand" => Ok(DimensionKey::CommunityDemand),
            "startup_saturation" => Ok(DimensionKey::StartupSaturation),
            _ => Err(format!("Unknown dimension: {}", s)),
        }
    }
}

/// 单个维度的权重（整数百分比，同一类别下合计必须为100）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionWeight {
    pub dimension: DimensionKey,
    pub weight: u32,
}

impl DimensionWeight {
    pub const fn new(dimension: DimensionKey, weight: u32) -> Self {
        Self { dimension, weight }
    }
}

/// 类别 -> 有序维度权重表
pub type WeightTable = BTreeMap<Category, Vec<DimensionWeight>>;

/// 内置权重表
///
/// 富维度类别（saas_web、fintech）使用7个维度，其余类别使用5个维度。
pub fn default_weight_table() -> WeightTable {
    use DimensionKey::*;

    let mut table = WeightTable::new();
    table.insert(
        Category::MobileApp,
        vec![
            DimensionWeight::new(PainSeverity, 30),
            DimensionWeight::new(MarketGap, 25),
            DimensionWeight::new(MvpFeasibility, 15),
            DimensionWeight::new(CompetitionDensity, 15),
            DimensionWeight::new(MonetizationPotential, 15),
        ],
    );
    table.insert(
        Category::Hardware,
        vec![
            DimensionWeight::new(PainSeverity, 25),
            DimensionWeight::new(MarketGap, 25),
            DimensionWeight::new(MvpFeasibility, 25),
            DimensionWeight::new(CompetitionDensity, 10),
            DimensionWeight::new(MonetizationPotential, 15),
        ],
    );
    table.insert(
        Category::SaasWeb,
        vec![
            DimensionWeight::new(PainSeverity, 25),
            DimensionWeight::new(MarketGap, 20),
            DimensionWeight::new(MvpFeasibility, 15),
            DimensionWeight::new(CompetitionDensity, 15),
            DimensionWeight::new(MonetizationPotential, 10),
            DimensionWeight::new(CommunityDemand, 10),
            DimensionWeight::new(StartupSaturation, 5),
        ],
    );
    table.insert(
        Category::Fintech,
        vec![
            DimensionWeight::new(PainSeverity, 25),
            DimensionWeight::new(MarketGap, 15),
            DimensionWeight::new(MvpFeasibility, 10),
            DimensionWeight::new(CompetitionDensity, 15),
            DimensionWeight::new(MonetizationPotential, 15),
            DimensionWeight::new(CommunityDemand, 10),
            DimensionWeight::new(StartupSaturation, 10),
        ],
    );
    table
}
