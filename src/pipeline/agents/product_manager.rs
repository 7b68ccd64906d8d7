use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::pipeline::context::PipelineContext;
use crate::pipeline::run::RunArtifacts;
use crate::pipeline::shape::{ContractViolation, ShapeReader};
use crate::pipeline::stage_agent::{PromptTemplate, StageAgent, StageError, schema_of};
use crate::types::Idea;

const MAX_ROADMAP_ITEMS: usize = 10;

/// Day-1 MVP路线图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Roadmap {
    /// Day-1 MVP feature roadmap designed to solve the pain points identified by the researcher (1-10 items, in build order).
    pub mvp_roadmap: Vec<String>,
}

/// 产品经理 - 针对痛点制定最小可行产品的功能路线
#[derive(Default)]
pub struct ProductManager;

impl StageAgent for ProductManager {
    type Output = Roadmap;

    fn agent_type(&self) -> &'static str {
        "ProductManager"
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an expert Product Manager who turns market research into focused, shippable product plans.".to_string(),
            opening_instruction: "The Market Researcher has provided what users love and hate about competing products. Formulate a strict, actionable Day-1 MVP feature roadmap that directly addresses the pain points while covering the table stakes users love.".to_string(),
            closing_instruction: r#"## Requirements:
- At most 10 items, ordered by build priority
- Each item is a concrete feature, not a goal or a marketing activity
- Do not include fluff"#
                .to_string(),
            temperature: 0.4,
        }
    }

    fn expected_shape(&self, _artifacts: &RunArtifacts, _context: &PipelineContext) -> Value {
        schema_of::<Roadmap>()
    }

    fn build_context(
        &self,
        idea: &Idea,
        artifacts: &RunArtifacts,
        _context: &PipelineContext,
    ) -> Result<Value, StageError> {
        let research = artifacts
            .research
            .as_ref()
            .ok_or(StageError::MissingArtifact {
                stage: self.agent_type(),
                artifact: "research findings",
            })?;
        let category = artifacts
            .classification
            .as_ref()
            .map(|classification| classification.category);

        Ok(json!({
            "idea": idea.text(),
            "category": category,
            "what_users_love": research.what_users_love,
            "what_users_hate": research.what_users_hate,
        }))
    }

    fn validate(
        &self,
        raw: &Value,
        _artifacts: &RunArtifacts,
        _context: &PipelineContext,
    ) -> Result<Self::Output, ContractViolation> {
        let reader = ShapeReader::new(raw)?;
        Ok(Roadmap {
            mvp_roadmap: reader.string_list("mvp_roadmap", 1, MAX_ROADMAP_ITEMS)?,
        })
    }
}
