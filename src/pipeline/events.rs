//! 进度事件 - 流式协议中的最小单元

use serde::Serialize;
use serde_json::{Value, json};

use crate::types::{Category, ValidationReport};

/// 单次运行向调用方推送的事件
///
/// 一次运行以恰好一个`Result`或`Error`结束，之前可以有任意多个`Category`/`Status`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ProgressEvent {
    Category {
        label: Category,
        confidence: f64,
    },
    Status {
        step: u8,
        total: u8,
        agent_name: String,
        message: String,
    },
    Result(Box<ValidationReport>),
    Error {
        message: String,
    },
}

impl ProgressEvent {
    /// 流式协议中的事件名
    pub fn event_name(&self) -> &'static str {
        match self {
            ProgressEvent::Category { .. } => "category",
            ProgressEvent::Status { .. } => "status",
            ProgressEvent::Result(_) => "result",
            ProgressEvent::Error { .. } => "error",
        }
    }

    /// 是否为终止事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Result(_) | ProgressEvent::Error { .. })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    /// 事件负载，不含事件名
    pub fn payload(&self) -> Value {
        match self {
            ProgressEvent::Category { label, confidence } => {
                json!({ "label": label, "confidence": confidence })
            }
            ProgressEvent::Status {
                step,
                total,
                agent_name,
                message,
            } => json!({
                "step": step,
                "total": total,
                "agent_name": agent_name,
                "message": message,
            }),
            ProgressEvent::Result(report) => {
                serde_json::to_value(report.as_ref()).unwrap_or(Value::Null)
            }
            ProgressEvent::Error { message } => json!({ "message": message }),
        }
    }

    pub fn payload_json(&self) -> String {
        self.payload().to_string()
    }
}
