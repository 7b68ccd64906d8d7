//! 类别分类 - 决定后续使用哪套评分维度与权重
//!
//! 分类失败永远不会中断运行：任何调用错误、超时或越界答案都回退到默认类别。

use serde_json::{Value, json};

use crate::llm::{AnalysisError, AnalysisRequest};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::monitor::CallKind;
use crate::pipeline::shape::{ContractViolation, ShapeReader};
use crate::types::{Category, Idea};

/// 分类结果的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// 调用方提供的类别提示
    Hint,
    /// 分析函数给出的答案
    Model,
    /// 回退到默认类别
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    /// 置信度，范围[0,1]
    pub confidence: f64,
    pub subcategory: Option<String>,
    pub source: ClassificationSource,
}

impl Classification {
    fn fallback() -> Self {
        Self {
            category: Category::FALLBACK,
            confidence: 0.0,
            subcategory: None,
            source: ClassificationSource::Fallback,
        }
    }
}

pub struct CategoryClassifier;

impl CategoryClassifier {
    const TASK: &'static str = "CategoryClassifier";

    pub async fn classify(&self, idea: &Idea, context: &PipelineContext) -> Classification {
        if let Some(category) = idea.category_hint() {
            tracing::info!("🏷️ 使用调用方提供的类别: {}", category);
            return Classification {
                category,
                confidence: 1.0,
                subcategory: None,
                source: ClassificationSource::Hint,
            };
        }

        let request = Self::build_request(idea);
        let limit = context.config.llm.call_timeout();
        let outcome = context
            .monitor
            .observe(CallKind::Analysis, limit, context.analysis.invoke(request))
            .await;

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Self::fall_back(&e),
            Err(_) => {
                return Self::fall_back(&AnalysisError::Provider(format!(
                    "classification timed out after {}s",
                    limit.as_secs()
                )));
            }
        };

        match Self::interpret(&raw) {
            Ok(classification) => {
                tracing::info!(
                    "🏷️ 类别识别为 {} (置信度 {:.2})",
                    classification.category,
                    classification.confidence
                );
                classification
            }
            Err(violation) => Self::fall_back(&violation),
        }
    }

    fn fall_back(cause: &dyn std::fmt::Display) -> Classification {
        tracing::warn!(
            "⚠️ 类别识别失败，回退到 {}: {}",
            Category::FALLBACK,
            cause
        );
        Classification::fallback()
    }

    fn build_request(idea: &Idea) -> AnalysisRequest {
        let categories: Vec<Value> = Category::ALL
            .iter()
            .map(|category| json!({"label": category, "description": category.description()}))
            .collect();

        AnalysisRequest {
            task: Self::TASK.to_string(),
            system_prompt: "You are an expert startup analyst who classifies product ideas into market categories.".to_string(),
            instructions: "Classify the product idea into exactly one of the listed categories. Pick the category whose market and distribution channel fits best, estimate your confidence between 0 and 1, and name a short free-text subcategory (e.g. \"pet social network\").".to_string(),
            context: json!({
                "idea": idea.text(),
                "categories": categories,
            }),
            expected_shape: Self::expected_shape(),
            temperature: Some(0.0),
        }
    }

    fn expected_shape() -> Value {
        let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "enum": labels},
                "confidence": {"type": "number", "minimum": 0, "maximum": 1},
                "subcategory": {"type": "string"}
            },
            "required": ["category", "confidence"]
        })
    }

    /// 将分析函数的答案映射到封闭的类别枚举
    fn interpret(raw: &Value) -> Result<Classification, ContractViolation> {
        let reader = ShapeReader::new(raw)?;
        let label = reader.string("category")?;
        let category = label
            .parse::<Category>()
            .map_err(|_| ContractViolation::new(format!("`{}` is not a known category", label)))?;
        let confidence = reader.number("confidence").unwrap_or(0.5).clamp(0.0, 1.0);

        Ok(Classification {
            category,
            confidence,
            subcategory: reader.optional_string("subcategory"),
            source: ClassificationSource::Model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_valid_answer() {
        let raw = json!({"category": "mobile_app", "confidence": 0.87, "subcategory": "pet social"});
        let classification = CategoryClassifier::interpret(&raw).unwrap();
        assert_eq!(classification.category, Category::MobileApp);
        assert_eq!(classification.confidence, 0.87);
        assert_eq!(classification.subcategory.as_deref(), Some("pet social"));
        assert_eq!(classification.source, ClassificationSource::Model);
    }

    #[test]
    fn test_interpret_clamps_confidence() {
        let raw = json!({"category": "Fintech", "confidence": 3});
        assert_eq!(CategoryClassifier::interpret(&raw).unwrap().confidence, 1.0);

        let raw = json!({"category": "hardware", "confidence": -1});
        assert_eq!(CategoryClassifier::interpret(&raw).unwrap().confidence, 0.0);
    }

    #[test]
    fn test_interpret_rejects_unknown_category() {
        let raw = json!({"category": "social_network", "confidence": 0.9});
        assert!(CategoryClassifier::interpret(&raw).is_err());
        assert!(CategoryClassifier::interpret(&json!(["mobile_app"])).is_err());
    }

    #[test]
    fn test_expected_shape_lists_all_categories() {
        let shape = CategoryClassifier::expected_shape();
        let labels = shape["properties"]["category"]["enum"].as_array().unwrap();
        assert_eq!(labels.len(), Category::ALL.len());
    }
}
