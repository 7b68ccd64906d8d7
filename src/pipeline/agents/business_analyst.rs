use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::pipeline::context::PipelineContext;
use crate::pipeline::run::RunArtifacts;
use crate::pipeline::shape::{ContractViolation, ShapeReader};
use crate::pipeline::stage_agent::{PromptTemplate, StageAgent, StageError};
use crate::types::{Category, DimensionKey, Idea, ScoreBreakdown};

const MAX_REVENUE_MODELS: usize = 5;

/// 商业分析结论，综合分由评分引擎计算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystAssessment {
    pub opportunity_score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub pricing_suggestion: String,
    pub target_platform_recommendation: String,
    pub market_breakdown: String,
    pub tam: String,
    pub sam: String,
    pub som: String,
    pub revenue_model_options: Vec<String>,
}

/// 商业分析师 - 给出各维度原始评分与商业化建议
///
/// 分析函数只负责各维度的原始估值，权重与综合分一律以评分引擎为准；
/// 缺少任何一个维度都视为返回结构不合法，会触发重试。
#[derive(Default)]
pub struct BusinessAnalyst;

impl BusinessAnalyst {
    fn category(&self, artifacts: &RunArtifacts) -> Result<Category, StageError> {
        artifacts
            .classification
            .as_ref()
            .map(|classification| classification.category)
            .ok_or(StageError::MissingArtifact {
                stage: self.agent_type(),
                artifact: "classification",
            })
    }
}

impl StageAgent for BusinessAnalyst {
    type Output = AnalystAssessment;

    fn agent_type(&self) -> &'static str {
        "BusinessAnalyst"
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an expert Business Analyst & Strategist. You are critical and evidence-based, never optimistic by default.".to_string(),
            opening_instruction: "Using the research findings and the MVP roadmap below, score the opportunity on every listed dimension (each 0-100, following its rubric), then give a concise pricing suggestion, a definite recommendation of which platform to launch on first and why, a short market breakdown of user behaviour across platforms, TAM/SAM/SOM estimates, and the viable revenue models.".to_string(),
            closing_instruction: r#"## Requirements:
- `score_breakdown` must contain every listed dimension and nothing else
- Scores are integers between 0 and 100
- TAM, SAM and SOM are short estimates with a currency figure and a one-line rationale
- Do not compute an overall score yourself"#
                .to_string(),
            temperature: 0.2,
        }
    }

    fn expected_shape(&self, artifacts: &RunArtifacts, context: &PipelineContext) -> Value {
        let category = artifacts
            .classification
            .as_ref()
            .map(|classification| classification.category)
            .unwrap_or(Category::FALLBACK);

        let dimensions = context.scoring.dimensions(category);
        let mut properties = Map::new();
        for weight in dimensions {
            properties.insert(
                weight.dimension.as_str().to_string(),
                json!({
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 100,
                    "description": weight.dimension.rubric(),
                }),
            );
        }
        let required: Vec<&str> = dimensions.iter().map(|w| w.dimension.as_str()).collect();

        json!({
            "type": "object",
            "properties": {
                "score_breakdown": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
                "pricing_suggestion": {"type": "string", "description": "Monetization strategy, e.g. Freemium, One-Time $4.99, Subscription $X/mo"},
                "target_platform_recommendation": {"type": "string", "description": "Which platform to target first for the MVP launch and why"},
                "market_breakdown": {"type": "string", "description": "Market split and user behaviour across platforms for this idea"},
                "tam": {"type": "string", "description": "Total addressable market"},
                "sam": {"type": "string", "description": "Serviceable addressable market"},
                "som": {"type": "string", "description": "Serviceable obtainable market"},
                "revenue_model_options": {"type": "array", "items": {"type": "string"}, "maxItems": MAX_REVENUE_MODELS},
            },
            "required": [
                "score_breakdown", "pricing_suggestion", "target_platform_recommendation",
                "market_breakdown", "tam", "sam", "som", "revenue_model_options"
            ],
        })
    }

    fn build_context(
        &self,
        idea: &Idea,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Value, StageError> {
        let stage = self.agent_type();
        let category = self.category(artifacts)?;
        let research = artifacts
            .research
            .as_ref()
            .ok_or(StageError::MissingArtifact {
                stage,
                artifact: "research findings",
            })?;
        let roadmap = artifacts
            .roadmap
            .as_ref()
            .ok_or(StageError::MissingArtifact {
                stage,
                artifact: "roadmap",
            })?;
        let competitors: Vec<Value> = artifacts
            .competitors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|listing| {
                json!({
                    "title": listing.title,
                    "platform": listing.platform,
                    "rating": listing.rating,
                    "review_count": listing.reviews.len(),
                })
            })
            .collect();
        let dimensions: Vec<Value> = context
            .scoring
            .dimensions(category)
            .iter()
            .map(|weight| json!({"dimension": weight.dimension, "rubric": weight.dimension.rubric()}))
            .collect();

        Ok(json!({
            "idea": idea.text(),
            "category": category,
            "subcategory": artifacts.classification.as_ref().and_then(|c| c.subcategory.clone()),
            "competitors": competitors,
            "what_users_love": research.what_users_love,
            "what_users_hate": research.what_users_hate,
            "mvp_roadmap": roadmap.mvp_roadmap,
            "dimensions": dimensions,
        }))
    }

    fn validate(
        &self,
        raw: &Value,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Self::Output, ContractViolation> {
        let category = self
            .category(artifacts)
            .map_err(|e| ContractViolation::new(e.to_string()))?;
        let reader = ShapeReader::new(raw)?;

        // 未知维度直接忽略，缺失维度由评分引擎报告
        let raw_values: BTreeMap<DimensionKey, f64> = reader
            .number_map("score_breakdown")?
            .into_iter()
            .filter_map(|(name, value)| {
                name.parse::<DimensionKey>()
                    .ok()
                    .map(|dimension| (dimension, value))
            })
            .collect();
        let (opportunity_score, score_breakdown) = context
            .scoring
            .score(category, &raw_values)
            .map_err(|e| ContractViolation::new(e.to_string()))?;

        Ok(AnalystAssessment {
            opportunity_score,
            score_breakdown,
            pricing_suggestion: reader.string("pricing_suggestion")?,
            target_platform_recommendation: reader.string("target_platform_recommendation")?,
            market_breakdown: reader.string("market_breakdown")?,
            tam: reader.string("tam")?,
            sam: reader.string("sam")?,
            som: reader.string("som")?,
            revenue_model_options: reader.string_list(
                "revenue_model_options",
                1,
                MAX_REVENUE_MODELS,
            )?,
        })
    }
}
