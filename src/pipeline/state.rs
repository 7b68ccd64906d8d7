//! 单次验证运行的状态机
//!
//! 状态只能沿固定顺序前进：Created → Classifying → Discovering → Researching
//! → RoadmapBuilding → Analyzing → Completed；任何非终止状态都可以转入Failed。
//! 终止状态不再接受任何事件。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 对外报告进度的阶段总数（分类阶段不单独报告进度）
pub const TOTAL_STAGES: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Classifying,
    Discovering,
    Researching,
    RoadmapBuilding,
    Analyzing,
    Completed,
    Failed,
}

/// 驱动状态转换的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Start,
    StageSucceeded,
    StageFailed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal transition from `{from:?}` on `{event:?}`")]
pub struct TransitionError {
    pub from: RunState,
    pub event: RunEvent,
}

/// 每个阶段的展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Active,
    Done,
    Failed,
}

impl RunState {
    /// 纯函数的状态转换
    pub fn transition(self, event: RunEvent) -> Result<RunState, TransitionError> {
        use RunState::*;

        let next = match (self, event) {
            (Created, RunEvent::Start) => Classifying,
            (Classifying, RunEvent::StageSucceeded) => Discovering,
            (Discovering, RunEvent::StageSucceeded) => Researching,
            (Researching, RunEvent::StageSucceeded) => RoadmapBuilding,
            (RoadmapBuilding, RunEvent::StageSucceeded) => Analyzing,
            (Analyzing, RunEvent::StageSucceeded) => Completed,
            (state, RunEvent::StageFailed) if !state.is_terminal() => Failed,
            (from, event) => return Err(TransitionError { from, event }),
        };
        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// 进度序号（1..=4），只有对外报告进度的阶段才有
    pub fn progress_step(&self) -> Option<u8> {
        match self {
            RunState::Discovering => Some(1),
            RunState::Researching => Some(2),
            RunState::RoadmapBuilding => Some(3),
            RunState::Analyzing => Some(4),
            _ => None,
        }
    }

    /// 负责该阶段的Agent名称
    pub fn agent_name(&self) -> Option<&'static str> {
        match self {
            RunState::Discovering => Some("Discovery Agent"),
            RunState::Researching => Some("Market Researcher"),
            RunState::RoadmapBuilding => Some("Product Manager"),
            RunState::Analyzing => Some("Business Analyst"),
            _ => None,
        }
    }

    pub fn status_message(&self) -> Option<&'static str> {
        match self {
            RunState::Discovering => Some("Searching app stores and the web for competitors..."),
            RunState::Researching => Some("Reading user reviews to find what people love and hate..."),
            RunState::RoadmapBuilding => Some("Drafting a Day-1 MVP roadmap..."),
            RunState::Analyzing => Some("Scoring the opportunity and sizing the market..."),
            _ => None,
        }
    }

    /// 阶段名，用于日志与错误信息
    pub fn stage_name(&self) -> &'static str {
        match self {
            RunState::Created => "created",
            RunState::Classifying => "classifier",
            RunState::Discovering => "discovery",
            RunState::Researching => "researcher",
            RunState::RoadmapBuilding => "product_manager",
            RunState::Analyzing => "business_analyst",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [RunState; 7] = [
        RunState::Created,
        RunState::Classifying,
        RunState::Discovering,
        RunState::Researching,
        RunState::RoadmapBuilding,
        RunState::Analyzing,
        RunState::Completed,
    ];

    #[test]
    fn test_happy_path_transitions() {
        let mut state = RunState::Created.transition(RunEvent::Start).unwrap();
        for expected in &HAPPY_PATH[2..] {
            state = state.transition(RunEvent::StageSucceeded).unwrap();
            assert_eq!(state, *expected);
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn test_any_active_state_can_fail() {
        for state in &HAPPY_PATH[..6] {
            assert_eq!(state.transition(RunEvent::StageFailed), Ok(RunState::Failed));
        }
    }

    #[test]
    fn test_terminal_states_reject_events() {
        for state in [RunState::Completed, RunState::Failed] {
            for event in [RunEvent::Start, RunEvent::StageSucceeded, RunEvent::StageFailed] {
                assert!(state.transition(event).is_err());
            }
        }
    }

    #[test]
    fn test_no_skipping_or_restarting() {
        assert!(RunState::Created.transition(RunEvent::StageSucceeded).is_err());
        assert!(RunState::Discovering.transition(RunEvent::Start).is_err());
    }

    #[test]
    fn test_progress_steps_cover_reported_stages() {
        let steps: Vec<u8> = HAPPY_PATH.iter().filter_map(|s| s.progress_step()).collect();
        assert_eq!(steps, vec![1, 2, 3, 4]);
        assert_eq!(steps.len(), TOTAL_STAGES as usize);

        for state in HAPPY_PATH {
            assert_eq!(state.progress_step().is_some(), state.agent_name().is_some());
            assert_eq!(state.agent_name().is_some(), state.status_message().is_some());
        }
    }
}
