//! 想法验证流水线
//!
//! 分类 -> 竞品发现 -> 市场调研 -> MVP路线图 -> 商业分析，逐阶段推进并以事件流报告进度。

pub mod agents;
pub mod classifier;
pub mod context;
pub mod discovery;
pub mod events;
pub mod monitor;
pub mod orchestrator;
pub mod run;
pub mod scoring;
pub mod shape;
pub mod stage_agent;
pub mod state;

pub use context::PipelineContext;
pub use events::ProgressEvent;
pub use monitor::{CallMonitor, CallMonitorReport};
pub use orchestrator::{PipelineOrchestrator, RunHandle};
pub use scoring::{ScoringEngine, ScoringError};
pub use state::{RunEvent, RunState};
