// 三个分析阶段依次执行，每个阶段的上下文包含之前全部阶段的产物：
// MarketResearcher：竞品评论 -> 用户喜欢/痛恨的点
// ProductManager：调研结论 -> Day-1 MVP路线图
// BusinessAnalyst：调研结论 + 路线图 -> 各维度原始评分 + 商业化建议，综合分由评分引擎计算

pub mod business_analyst;
pub mod product_manager;
pub mod researcher;

pub use business_analyst::{AnalystAssessment, BusinessAnalyst};
pub use product_manager::{ProductManager, Roadmap};
pub use researcher::{MarketResearcher, ResearchFindings};

#[cfg(test)]
mod tests;
