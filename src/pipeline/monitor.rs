use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::error::Elapsed;

/// 外部调用监控器
///
/// 统计分析函数与竞品数据源的调用情况，所有运行共享同一份计数。
#[derive(Clone, Default)]
pub struct CallMonitor {
    metrics: Arc<CallMetrics>,
}

/// 外部调用的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// 分析函数（大模型）
    Analysis,
    /// 竞品数据源
    Source,
}

#[derive(Default)]
struct CallMetrics {
    analysis: KindMetrics,
    source: KindMetrics,
}

#[derive(Default)]
struct KindMetrics {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    in_flight: AtomicUsize,
}

/// 单类调用的统计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub in_flight: usize,
}

/// 调用统计报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMonitorReport {
    pub analysis: CallStats,
    pub source: CallStats,
}

/// 在途计数守卫，future被取消时同样会归还计数
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl CallMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn kind(&self, kind: CallKind) -> &KindMetrics {
        match kind {
            CallKind::Analysis => &self.metrics.analysis,
            CallKind::Source => &self.metrics.source,
        }
    }

    /// 带超时地执行一次外部调用并记录结果
    pub async fn observe<T, E, F>(
        &self,
        kind: CallKind,
        limit: Duration,
        call: F,
    ) -> Result<Result<T, E>, Elapsed>
    where
        F: Future<Output = Result<T, E>>,
    {
        let metrics = self.kind(kind);
        metrics.started.fetch_add(1, Ordering::Relaxed);
        metrics.in_flight.fetch_add(1, Ordering::Relaxed);
        let _guard = InFlightGuard(&metrics.in_flight);

        let outcome = tokio::time::timeout(limit, call).await;
        let counter = match &outcome {
            Ok(Ok(_)) => &metrics.succeeded,
            Ok(Err(_)) => &metrics.failed,
            Err(_) => &metrics.timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    pub fn snapshot(&self) -> CallMonitorReport {
        CallMonitorReport {
            analysis: Self::stats(&self.metrics.analysis),
            source: Self::stats(&self.metrics.source),
        }
    }

    fn stats(metrics: &KindMetrics) -> CallStats {
        CallStats {
            started: metrics.started.load(Ordering::Relaxed),
            succeeded: metrics.succeeded.load(Ordering::Relaxed),
            failed: metrics.failed.load(Ordering::Relaxed),
            timed_out: metrics.timed_out.load(Ordering::Relaxed),
            in_flight: metrics.in_flight.load(Ordering::Relaxed),
        }
    }
}
