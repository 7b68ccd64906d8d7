use std::collections::BTreeMap;
use uuid::Uuid;

use crate::pipeline::agents::{AnalystAssessment, ResearchFindings, Roadmap};
use crate::pipeline::classifier::Classification;
use crate::pipeline::state::{RunEvent, RunState, StageStatus, TransitionError};
use crate::types::{CompetitorListing, Idea, ValidationReport};

/// 运行过程中逐步累积的阶段产物
#[derive(Debug, Clone, Default)]
pub struct RunArtifacts {
    pub classification: Option<Classification>,
    pub competitors: Option<Vec<CompetitorListing>>,
    pub research: Option<ResearchFindings>,
    pub roadmap: Option<Roadmap>,
    pub assessment: Option<AnalystAssessment>,
}

/// 单次验证请求的工作单元，由编排器独占
#[derive(Debug)]
pub struct PipelineRun {
    pub id: Uuid,
    pub idea: Idea,
    state: RunState,
    statuses: BTreeMap<u8, StageStatus>,
    pub artifacts: RunArtifacts,
}

impl PipelineRun {
    pub fn new(idea: Idea) -> Self {
        let statuses = (1..=crate::pipeline::state::TOTAL_STAGES)
            .map(|step| (step, StageStatus::Pending))
            .collect();

        Self {
            id: Uuid::new_v4(),
            idea,
            state: RunState::Created,
            statuses,
            artifacts: RunArtifacts::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stage_status(&self, step: u8) -> Option<StageStatus> {
        self.statuses.get(&step).copied()
    }

    /// 推进状态机并同步阶段展示状态
    pub fn advance(&mut self, event: RunEvent) -> Result<RunState, TransitionError> {
        let previous = self.state;
        let next = previous.transition(event)?;

        if let Some(step) = previous.progress_step() {
            let status = match event {
                RunEvent::StageFailed => StageStatus::Failed,
                _ => StageStatus::Done,
            };
            self.statuses.insert(step, status);
        }
        if let Some(step) = next.progress_step() {
            self.statuses.insert(step, StageStatus::Active);
        }

        self.state = next;
        Ok(next)
    }

    /// 由全部阶段产物组装最终报告；任一必需产物缺失时返回缺失项名称
    pub fn assemble_report(&self) -> Result<ValidationReport, &'static str> {
        let classification = self
            .artifacts
            .classification
            .as_ref()
            .ok_or("classification")?;
        let competitors = self.artifacts.competitors.as_ref().ok_or("competitors")?;
        let research = self.artifacts.research.as_ref().ok_or("research findings")?;
        let roadmap = self.artifacts.roadmap.as_ref().ok_or("roadmap")?;
        let assessment = self.artifacts.assessment.as_ref().ok_or("analyst assessment")?;

        Ok(ValidationReport {
            opportunity_score: assessment.opportunity_score,
            score_breakdown: assessment.score_breakdown.clone(),
            what_users_love: research.what_users_love.clone(),
            what_users_hate: research.what_users_hate.clone(),
            mvp_roadmap: roadmap.mvp_roadmap.clone(),
            pricing_suggestion: assessment.pricing_suggestion.clone(),
            target_platform_recommendation: assessment.target_platform_recommendation.clone(),
            market_breakdown: assessment.market_breakdown.clone(),
            tam: assessment.tam.clone(),
            sam: assessment.sam.clone(),
            som: assessment.som.clone(),
            revenue_model_options: assessment.revenue_model_options.clone(),
            competitors_analyzed: competitors.clone(),
            category: classification.category,
            subcategory: classification.subcategory.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_follow_state_machine() {
        let mut run = PipelineRun::new(Idea::new("Smart dog collar", None).unwrap());
        assert_eq!(run.stage_status(1), Some(StageStatus::Pending));

        run.advance(RunEvent::Start).unwrap();
        run.advance(RunEvent::StageSucceeded).unwrap();
        assert_eq!(run.state(), RunState::Discovering);
        assert_eq!(run.stage_status(1), Some(StageStatus::Active));

        run.advance(RunEvent::StageSucceeded).unwrap();
        assert_eq!(run.stage_status(1), Some(StageStatus::Done));
        assert_eq!(run.stage_status(2), Some(StageStatus::Active));

        run.advance(RunEvent::StageFailed).unwrap();
        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(run.stage_status(2), Some(StageStatus::Failed));
        assert_eq!(run.stage_status(3), Some(StageStatus::Pending));
        assert!(run.advance(RunEvent::StageSucceeded).is_err());
    }

    #[test]
    fn test_assemble_report_requires_all_artifacts() {
        let run = PipelineRun::new(Idea::new("Smart dog collar", None).unwrap());
        assert_eq!(run.assemble_report().unwrap_err(), "classification");
    }
}
