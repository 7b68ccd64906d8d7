//! 验证历史 - 每次成功的运行追加一条记录

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::HistoryConfig;
use crate::types::{Idea, ValidationReport};

/// 历史存储接口，保存失败只记录日志，不影响运行结果
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, run_id: Uuid, idea: &Idea, report: &ValidationReport) -> Result<()>;
}

/// 一条历史记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub idea: String,
    pub report: ValidationReport,
}

/// 以JSON Lines格式追加写入本地文件
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// 读取全部历史记录，损坏的行会被跳过
    #[cfg(test)]
    pub(crate) async fn load(&self) -> Result<Vec<HistoryRecord>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let records = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<HistoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("⚠️ 跳过无法解析的历史记录: {}", e);
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn save(&self, run_id: Uuid, idea: &Idea, report: &ValidationReport) -> Result<()> {
        let record = HistoryRecord {
            id: run_id,
            saved_at: Utc::now(),
            idea: idea.text().to_string(),
            report: report.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("💾 验证结果已写入历史: {}", self.path.display());
        Ok(())
    }
}

/// 关闭历史持久化时使用，只输出日志
pub struct LogHistoryStore;

#[async_trait]
impl HistoryStore for LogHistoryStore {
    async fn save(&self, run_id: Uuid, idea: &Idea, report: &ValidationReport) -> Result<()> {
        tracing::info!(
            "📝 [{}] {} -> {} 分",
            run_id,
            idea.preview(),
            report.opportunity_score
        );
        Ok(())
    }
}

/// 根据配置创建历史存储
pub fn from_config(config: &HistoryConfig) -> Arc<dyn HistoryStore> {
    if config.enabled {
        Arc::new(JsonlHistoryStore::new(config.path.clone()))
    } else {
        Arc::new(LogHistoryStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ScoreBreakdown};
    use tempfile::TempDir;

    fn report(score: u8) -> ValidationReport {
        ValidationReport {
            opportunity_score: score,
            score_breakdown: ScoreBreakdown::default(),
            what_users_love: vec!["Simple onboarding".to_string()],
            what_users_hate: vec!["Too many ads".to_string()],
            mvp_roadmap: vec!["Dog profiles".to_string()],
            pricing_suggestion: "Freemium".to_string(),
            target_platform_recommendation: "iOS first".to_string(),
            market_breakdown: "Pet owners aged 25-40".to_string(),
            tam: "$10B".to_string(),
            sam: "$1B".to_string(),
            som: "$10M".to_string(),
            revenue_model_options: vec!["Subscription".to_string()],
            competitors_analyzed: Vec::new(),
            category: Category::MobileApp,
            subcategory: None,
        }
    }

    #[tokio::test]
    async fn test_jsonl_store_appends_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("history.jsonl");
        let store = JsonlHistoryStore::new(path.clone());
        let idea = Idea::new("A social network for dogs", None).unwrap();

        store.save(Uuid::new_v4(), &idea, &report(72)).await.unwrap();
        store.save(Uuid::new_v4(), &idea, &report(40)).await.unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].idea, "A social network for dogs");
        assert_eq!(records[0].report.opportunity_score, 72);
        assert_eq!(records[1].report.opportunity_score, 40);
    }

    #[tokio::test]
    async fn test_load_skips_corrupted_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.jsonl");
        let store = JsonlHistoryStore::new(path.clone());
        let idea = Idea::new("Budget tracker", None).unwrap();
        store.save(Uuid::new_v4(), &idea, &report(55)).await.unwrap();

        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&path, content).unwrap();

        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonlHistoryStore::new(temp_dir.path().join("none.jsonl"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_store_never_fails() {
        let idea = Idea::new("Smart collar", None).unwrap();
        assert!(LogHistoryStore.save(Uuid::new_v4(), &idea, &report(61)).await.is_ok());
    }
}
