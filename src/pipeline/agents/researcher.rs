use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::pipeline::context::PipelineContext;
use crate::pipeline::run::RunArtifacts;
use crate::pipeline::shape::{ContractViolation, ShapeReader};
use crate::pipeline::stage_agent::{PromptTemplate, StageAgent, StageError, schema_of};
use crate::types::{CompetitorListing, Idea};

const MAX_FINDINGS: usize = 5;

/// 市场调研结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchFindings {
    /// Top aspects users love across these competitors (1-5 items).
    pub what_users_love: Vec<String>,
    /// Top pain points and complaints users have with these competitors (1-5 items).
    pub what_users_hate: Vec<String>,
}

/// 市场调研员 - 从竞品评论中提炼用户喜欢与痛恨的点
#[derive(Default)]
pub struct MarketResearcher;

impl MarketResearcher {
    /// 跨竞品轮流抽取评论，避免评论最多的竞品占满样本
    fn sample_reviews(competitors: &[CompetitorListing], max_samples: usize) -> Vec<Value> {
        let mut samples = Vec::new();
        let deepest = competitors
            .iter()
            .map(|listing| listing.reviews.len())
            .max()
            .unwrap_or(0);

        'outer: for index in 0..deepest {
            for listing in competitors {
                if samples.len() >= max_samples {
                    break 'outer;
                }
                if let Some(review) = listing.reviews.get(index) {
                    samples.push(json!({
                        "platform": listing.platform,
                        "competitor": listing.title,
                        "rating": review.rating,
                        "review": review.content,
                    }));
                }
            }
        }
        samples
    }
}

impl StageAgent for MarketResearcher {
    type Output = ResearchFindings;

    fn agent_type(&self) -> &'static str {
        "MarketResearcher"
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an expert App Market Researcher. You study what real users say about competing products and distill it into sharp, evidence-based insights.".to_string(),
            opening_instruction: "Analyze the scraped user reviews of competitor products below for the user's product idea. Strictly extract what users love and what users absolutely hate (the pain points) across all sources.".to_string(),
            closing_instruction: r#"## Requirements:
- Return at most 5 items for each list, most important first
- Each item is one short, concrete sentence grounded in the reviews
- If the review corpus is empty, reason from typical products in this category and say so in the items"#
                .to_string(),
            temperature: 0.2,
        }
    }

    fn expected_shape(&self, _artifacts: &RunArtifacts, _context: &PipelineContext) -> Value {
        schema_of::<ResearchFindings>()
    }

    fn build_context(
        &self,
        idea: &Idea,
        artifacts: &RunArtifacts,
        context: &PipelineContext,
    ) -> Result<Value, StageError> {
        let stage = self.agent_type();
        let classification =
            artifacts
                .classification
                .as_ref()
                .ok_or(StageError::MissingArtifact {
                    stage,
                    artifact: "classification",
                })?;
        let competitors = artifacts
            .competitors
            .as_ref()
            .ok_or(StageError::MissingArtifact {
                stage,
                artifact: "competitor corpus",
            })?;

        let reviews = Self::sample_reviews(competitors, context.config.pipeline.max_review_samples);
        let corpus_is_empty = reviews.is_empty();
        let mut value = json!({
            "idea": idea.text(),
            "category": classification.category,
            "competitors": competitors
                .iter()
                .map(|listing| json!({
                    "title": listing.title,
                    "platform": listing.platform,
                    "rating": listing.rating,
                }))
                .collect::<Vec<_>>(),
            "reviews": reviews,
        });
        if corpus_is_empty {
            value["note"] = json!(
                "No competitor reviews could be collected for this idea. Base the findings on what users typically love and hate in this category."
            );
        }
        Ok(value)
    }

    fn validate(
        &self,
        raw: &Value,
        _artifacts: &RunArtifacts,
        _context: &PipelineContext,
    ) -> Result<Self::Output, ContractViolation> {
        let reader = ShapeReader::new(raw)?;
        Ok(ResearchFindings {
            what_users_love: reader.string_list("what_users_love", 1, MAX_FINDINGS)?,
            what_users_hate: reader.string_list("what_users_hate", 1, MAX_FINDINGS)?,
        })
    }
}
