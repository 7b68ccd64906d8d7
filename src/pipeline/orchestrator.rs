use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::pipeline::agents::{BusinessAnalyst, MarketResearcher, ProductManager};
use crate::pipeline::classifier::CategoryClassifier;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::discovery::CompetitorDiscovery;
use crate::pipeline::events::ProgressEvent;
use crate::pipeline::run::PipelineRun;
use crate::pipeline::stage_agent::{StageAgent, StageError};
use crate::pipeline::state::{RunEvent, RunState, TOTAL_STAGES};
use crate::types::{Idea, InputError, ValidationReport};

/// 竞品发现自身有截止时间，编排器在此基础上留出收尾的余量
const DISCOVERY_GRACE: Duration = Duration::from_secs(5);

/// 一次已启动的运行：调用方通过`events`按顺序接收进度事件
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub events: mpsc::Receiver<ProgressEvent>,
}

/// 流水线编排器，本身无状态，可同时驱动任意多次运行
#[derive(Clone)]
pub struct PipelineOrchestrator {
    context: PipelineContext,
}

/// 事件出口，调用方断开后不再发送任何事件
struct EventSink {
    tx: mpsc::Sender<ProgressEvent>,
    closed: bool,
}

impl EventSink {
    fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx, closed: false }
    }

    /// 发送事件，返回调用方是否仍在接收
    async fn emit(&mut self, event: ProgressEvent) -> bool {
        if self.closed {
            return false;
        }
        if self.tx.send(event).await.is_err() {
            tracing::debug!("调用方已断开，丢弃后续事件");
            self.closed = true;
        }
        !self.closed
    }

    fn is_cancelled(&self) -> bool {
        self.closed || self.tx.is_closed()
    }
}

impl PipelineOrchestrator {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// 校验输入并在后台启动一次运行
    ///
    /// 空想法在任何阶段开始前同步拒绝，此时不会产生事件流。
    pub fn start(
        &self,
        idea_text: &str,
        category_hint: Option<&str>,
    ) -> Result<RunHandle, InputError> {
        let idea = Idea::new(idea_text, category_hint)?;
        let run = PipelineRun::new(idea);
        let run_id = run.id;

        let (tx, rx) = mpsc::channel(self.context.config.pipeline.event_buffer.max(1));
        let context = self.context.clone();
        let span = tracing::info_span!("run", id = %run_id);
        tokio::spawn(Self::drive(context, run, EventSink::new(tx)).instrument(span));

        Ok(RunHandle {
            run_id,
            events: rx,
        })
    }

    /// 驱动单次运行直到终止状态或调用方断开
    async fn drive(context: PipelineContext, mut run: PipelineRun, mut sink: EventSink) {
        let started = Instant::now();
        tracing::info!("🚀 开始验证想法: {}", run.idea.preview());

        if let Err(e) = run.advance(RunEvent::Start) {
            tracing::error!("❌ {}", e);
            return;
        }

        let classification = CategoryClassifier.classify(&run.idea, &context).await;
        let event = ProgressEvent::Category {
            label: classification.category,
            confidence: classification.confidence,
        };
        run.artifacts.classification = Some(classification);
        if let Err(e) = run.advance(RunEvent::StageSucceeded) {
            tracing::error!("❌ {}", e);
            return;
        }
        if !sink.emit(event).await {
            return;
        }

        for _ in 0..TOTAL_STAGES {
            let state = run.state();
            if sink.is_cancelled() {
                tracing::info!("⏹️ 调用方已断开，停止于 {} 阶段之前", state.stage_name());
                return;
            }

            let agent_name = state.agent_name().unwrap_or(state.stage_name());
            let status = ProgressEvent::Status {
                step: state.progress_step().unwrap_or_default(),
                total: TOTAL_STAGES,
                agent_name: agent_name.to_string(),
                message: state.status_message().unwrap_or_default().to_string(),
            };
            if !sink.emit(status).await {
                return;
            }

            tracing::info!("🤖 执行 {} ...", agent_name);
            let stage_started = Instant::now();
            let deadline = Self::stage_deadline(&context, state);
            let outcome =
                match tokio::time::timeout(deadline, Self::execute_stage(state, &mut run, &context))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(StageError::DeadlineExceeded {
                        stage: state.stage_name(),
                        after: deadline,
                    }),
                };

            if let Err(e) = outcome {
                Self::fail(&mut run, &mut sink, format!("{} failed: {}", agent_name, e)).await;
                return;
            }
            tracing::info!(
                "✓ {} 完成，耗时 {:.2}s",
                agent_name,
                stage_started.elapsed().as_secs_f64()
            );

            if state == RunState::Analyzing {
                break;
            }
            if let Err(e) = run.advance(RunEvent::StageSucceeded) {
                tracing::error!("❌ {}", e);
                return;
            }
        }

        let report = match run.assemble_report() {
            Ok(report) => report,
            Err(artifact) => {
                Self::fail(
                    &mut run,
                    &mut sink,
                    format!("Report assembly failed: missing {}", artifact),
                )
                .await;
                return;
            }
        };
        if let Err(e) = run.advance(RunEvent::StageSucceeded) {
            tracing::error!("❌ {}", e);
            return;
        }

        tracing::info!(
            "✅ 验证完成: 机会评分 {}，总耗时 {:.2}s",
            report.opportunity_score,
            started.elapsed().as_secs_f64()
        );
        Self::save_history(&context, &run, &report);
        sink.emit(ProgressEvent::Result(Box::new(report))).await;
    }

    fn stage_deadline(context: &PipelineContext, state: RunState) -> Duration {
        match state {
            RunState::Discovering => context.config.discovery.stage_deadline() + DISCOVERY_GRACE,
            _ => context.config.pipeline.stage_deadline(),
        }
    }

    /// 执行一个阶段并把产物写入运行记录
    async fn execute_stage(
        state: RunState,
        run: &mut PipelineRun,
        context: &PipelineContext,
    ) -> Result<(), StageError> {
        match state {
            RunState::Discovering => {
                let category = run
                    .artifacts
                    .classification
                    .as_ref()
                    .map(|classification| classification.category)
                    .ok_or(StageError::MissingArtifact {
                        stage: state.stage_name(),
                        artifact: "classification",
                    })?;
                let competitors = CompetitorDiscovery
                    .discover(&run.idea, category, context)
                    .await;
                run.artifacts.competitors = Some(competitors);
            }
            RunState::Researching => {
                let findings = MarketResearcher
                    .execute(&run.idea, &run.artifacts, context)
                    .await?;
                run.artifacts.research = Some(findings);
            }
            RunState::RoadmapBuilding => {
                let roadmap = ProductManager
                    .execute(&run.idea, &run.artifacts, context)
                    .await?;
                run.artifacts.roadmap = Some(roadmap);
            }
            RunState::Analyzing => {
                let assessment = BusinessAnalyst
                    .execute(&run.idea, &run.artifacts, context)
                    .await?;
                run.artifacts.assessment = Some(assessment);
            }
            other => {
                return Err(StageError::MissingArtifact {
                    stage: other.stage_name(),
                    artifact: "an executable stage",
                });
            }
        }
        Ok(())
    }

    async fn fail(run: &mut PipelineRun, sink: &mut EventSink, message: String) {
        if let Err(e) = run.advance(RunEvent::StageFailed) {
            tracing::error!("❌ {}", e);
        }
        tracing::error!("❌ 验证失败: {}", message);
        sink.emit(ProgressEvent::error(message)).await;
    }

    /// 保存历史不阻塞、也不影响本次运行的结果
    fn save_history(context: &PipelineContext, run: &PipelineRun, report: &ValidationReport) {
        let history = context.history.clone();
        let run_id = run.id;
        let idea = run.idea.clone();
        let report = report.clone();
        tokio::spawn(
            async move {
                if let Err(e) = history.save(run_id, &idea, &report).await {
                    tracing::warn!("⚠️ 保存验证历史失败: {}", e);
                }
            }
            .in_current_span(),
        );
    }
}
