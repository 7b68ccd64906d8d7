//! 机会评分引擎 - 纯函数，无I/O
//!
//! 分析Agent只提供各维度的原始估值，权重与综合分的计算以本模块为准。

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::types::{
    Category, DimensionKey, DimensionScore, DimensionWeight, ScoreBreakdown, WeightTable,
};

const FULL_WEIGHT: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("category `{0}` has no dimension weights configured")]
    MissingCategory(Category),
    #[error("dimension weights for `{category}` sum to {sum}%, expected exactly 100%")]
    InvalidWeightSum { category: Category, sum: u32 },
    #[error("dimension `{dimension}` is listed more than once for `{category}`")]
    DuplicateDimension {
        category: Category,
        dimension: DimensionKey,
    },
    #[error("raw value for dimension `{0}` is missing")]
    MissingDimension(DimensionKey),
    #[error("raw value for dimension `{0}` is not a finite number")]
    NonFiniteValue(DimensionKey),
}

/// 评分引擎，构造时校验权重表
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    table: WeightTable,
}

impl ScoringEngine {
    /// 创建评分引擎；每个类别都必须有权重表，且权重合计恰好为100%
    pub fn new(table: WeightTable) -> Result<Self, ScoringError> {
        for category in Category::ALL {
            let weights = table
                .get(&category)
                .ok_or(ScoringError::MissingCategory(category))?;

            let mut seen = HashSet::new();
            for weight in weights {
                if !seen.insert(weight.dimension) {
                    return Err(ScoringError::DuplicateDimension {
                        category,
                        dimension: weight.dimension,
                    });
                }
            }

            let sum: u32 = weights.iter().map(|w| w.weight).sum();
            if sum != FULL_WEIGHT {
                return Err(ScoringError::InvalidWeightSum { category, sum });
            }
        }

        Ok(Self { table })
    }

    /// 类别对应的有序维度集合
    pub fn dimensions(&self, category: Category) -> &[DimensionWeight] {
        self.table
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 计算综合分与评分明细
    ///
    /// 缺失维度直接报错而不是按0处理；原始值先截断到[0,100]再加权。
    /// 不在维度集合中的多余原始值会被忽略。
    pub fn score(
        &self,
        category: Category,
        raw_values: &BTreeMap<DimensionKey, f64>,
    ) -> Result<(u8, ScoreBreakdown), ScoringError> {
        let weights = self
            .table
            .get(&category)
            .ok_or(ScoringError::MissingCategory(category))?;

        let mut entries = Vec::with_capacity(weights.len());
        let mut weighted_total = 0.0;

        for weight in weights {
            let raw = *raw_values
                .get(&weight.dimension)
                .ok_or(ScoringError::MissingDimension(weight.dimension))?;
            if !raw.is_finite() {
                return Err(ScoringError::NonFiniteValue(weight.dimension));
            }

            let value = raw.clamp(0.0, 100.0);
            weighted_total += f64::from(weight.weight) * value;
            entries.push(DimensionScore {
                dimension: weight.dimension,
                value,
                weight: f64::from(weight.weight) / f64::from(FULL_WEIGHT),
            });
        }

        let composite = (weighted_total / f64::from(FULL_WEIGHT))
            .round()
            .clamp(0.0, 100.0) as u8;

        Ok((composite, ScoreBreakdown::from_entries(entries)))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::default_weight_table;
    use proptest::prelude::*;

    const DIMENSIONS: [DimensionKey; 7] = [
        DimensionKey::PainSeverity,
        DimensionKey::MarketGap,
        DimensionKey::MvpFeasibility,
        DimensionKey::CompetitionDensity,
        DimensionKey::MonetizationPotential,
        DimensionKey::CommunityDemand,
        DimensionKey::StartupSaturation,
    ];

    fn category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::MobileApp),
            Just(Category::SaasWeb),
            Just(Category::Hardware),
            Just(Category::Fintech),
        ]
    }

    /// 覆盖所有维度的原始值，包含大量越界值
    fn raw_values() -> impl Strategy<Value = BTreeMap<DimensionKey, f64>> {
        proptest::collection::vec(-500.0f64..500.0, DIMENSIONS.len())
            .prop_map(|values| DIMENSIONS.into_iter().zip(values).collect())
    }

    proptest! {
        #[test]
        fn test_score_is_deterministic_for_any_input(category in category(), values in raw_values()) {
            let engine = ScoringEngine::new(default_weight_table()).unwrap();
            let first = engine.score(category, &values).unwrap();
            prop_assert_eq!(engine.score(category, &values).unwrap(), first);
        }

        #[test]
        fn test_values_are_clamped_and_composite_is_bounded(category in category(), values in raw_values()) {
            let engine = ScoringEngine::new(default_weight_table()).unwrap();
            let (composite, breakdown) = engine.score(category, &values).unwrap();
            prop_assert!(composite <= 100);

            let mut lowest = f64::MAX;
            let mut highest = f64::MIN;
            for entry in breakdown.entries() {
                prop_assert_eq!(entry.value, values[&entry.dimension].clamp(0.0, 100.0));
                lowest = lowest.min(entry.value);
                highest = highest.max(entry.value);
            }
            // 加权平均落在截断后的最小值与最大值之间
            let composite = f64::from(composite);
            prop_assert!(composite >= lowest.floor() && composite <= highest.ceil());
        }
    }
}
