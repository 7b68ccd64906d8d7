use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::history::{self, HistoryStore};
use crate::llm::{AnalysisFunction, LLMClient};
use crate::pipeline::monitor::CallMonitor;
use crate::pipeline::scoring::{ScoringEngine, ScoringError};
use crate::sources::{CompetitorSource, HttpCompetitorSource};

/// 流水线共享上下文，所有运行共用，运行之间不共享可变状态
#[derive(Clone)]
pub struct PipelineContext {
    /// 配置
    pub config: Config,
    /// 外部分析函数
    pub analysis: Arc<dyn AnalysisFunction>,
    /// 竞品数据源
    pub source: Arc<dyn CompetitorSource>,
    /// 历史存储
    pub history: Arc<dyn HistoryStore>,
    /// 评分引擎
    pub scoring: Arc<ScoringEngine>,
    /// 外部调用统计
    pub monitor: CallMonitor,
}

impl PipelineContext {
    /// 按配置创建生产环境的上下文
    pub fn new(config: Config) -> Result<Self> {
        let analysis = Arc::new(LLMClient::new(config.llm.clone())?);
        let source = Arc::new(HttpCompetitorSource::new(&config.discovery)?);
        let history = history::from_config(&config.history);

        Ok(Self::with_collaborators(config, analysis, source, history)?)
    }

    /// 使用给定的外部协作方创建上下文
    pub fn with_collaborators(
        config: Config,
        analysis: Arc<dyn AnalysisFunction>,
        source: Arc<dyn CompetitorSource>,
        history: Arc<dyn HistoryStore>,
    ) -> Result<Self, ScoringError> {
        let scoring = Arc::new(ScoringEngine::new(config.scoring.weights.clone())?);

        Ok(Self {
            config,
            analysis,
            source,
            history,
            scoring,
            monitor: CallMonitor::new(),
        })
    }
}
