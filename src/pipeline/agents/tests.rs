#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::config::Config;
    use crate::history::LogHistoryStore;
    use crate::llm::{AnalysisError, AnalysisFunction, AnalysisRequest};
    use crate::pipeline::agents::*;
    use crate::pipeline::classifier::{Classification, ClassificationSource};
    use crate::pipeline::context::PipelineContext;
    use crate::pipeline::run::RunArtifacts;
    use crate::pipeline::stage_agent::{StageAgent, StageError};
    use crate::sources::{CompetitorSource, SourceError};
    use crate::types::{Category, CompetitorListing, DimensionKey, Idea, Platform, Review};

    /// 按顺序返回预设结果的分析函数
    struct QueuedAnalysis {
        responses: Mutex<VecDeque<Result<Value, AnalysisError>>>,
    }

    impl QueuedAnalysis {
        fn new(responses: Vec<Result<Value, AnalysisError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl AnalysisFunction for QueuedAnalysis {
        async fn invoke(&self, _request: AnalysisRequest) -> Result<Value, AnalysisError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AnalysisError::Provider("no scripted response".into())))
        }
    }

    struct EmptySource;

    #[async_trait]
    impl CompetitorSource for EmptySource {
        async fn search(
            &self,
            _platform: Platform,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<CompetitorListing>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_reviews(
            &self,
            _platform: Platform,
            _listing_id: &str,
            _max_count: usize,
        ) -> Result<Vec<Review>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn context_with(responses: Vec<Result<Value, AnalysisError>>) -> PipelineContext {
        PipelineContext::with_collaborators(
            Config::default(),
            Arc::new(QueuedAnalysis::new(responses)),
            Arc::new(EmptySource),
            Arc::new(LogHistoryStore),
        )
        .unwrap()
    }

    fn artifacts(category: Category) -> RunArtifacts {
        RunArtifacts {
            classification: Some(Classification {
                category,
                confidence: 0.9,
                subcategory: Some("pet social".to_string()),
                source: ClassificationSource::Model,
            }),
            competitors: Some(Vec::new()),
            research: Some(ResearchFindings {
                what_users_love: vec!["Cute profiles".to_string()],
                what_users_hate: vec!["Spam".to_string()],
            }),
            roadmap: Some(Roadmap {
                mvp_roadmap: vec!["Dog profiles".to_string(), "Playdate matching".to_string()],
            }),
            assessment: None,
        }
    }

    fn analyst_answer(scores: Value) -> Value {
        json!({
            "score_breakdown": scores,
            "pricing_suggestion": "Freemium with $4.99/mo premium",
            "target_platform_recommendation": "iOS first",
            "market_breakdown": "iOS owners spend more on pet apps",
            "tam": "$8B",
            "sam": "$900M",
            "som": "$12M",
            "revenue_model_options": ["Subscription", "Marketplace fees"],
        })
    }

    fn mobile_scores() -> Value {
        json!({
            "pain_severity": 80,
            "market_gap": 70,
            "mvp_feasibility": 60,
            "competition_density": 50,
            "monetization_potential": 40,
        })
    }

    #[test]
    fn test_analyst_validate_uses_scoring_engine() {
        let context = context_with(Vec::new());
        let artifacts = artifacts(Category::MobileApp);

        let mut scores = mobile_scores();
        scores["unknown_axis"] = json!(99);
        let assessment = BusinessAnalyst
            .validate(&analyst_answer(scores), &artifacts, &context)
            .unwrap();

        assert_eq!(assessment.opportunity_score, 64);
        assert_eq!(assessment.score_breakdown.len(), 5);
        assert!((assessment.score_breakdown.weight_sum() - 1.0).abs() < 1e-9);
        assert_eq!(assessment.revenue_model_options.len(), 2);
    }

    #[test]
    fn test_analyst_validate_rejects_missing_dimension() {
        let context = context_with(Vec::new());
        let artifacts = artifacts(Category::MobileApp);

        let mut scores = mobile_scores();
        scores.as_object_mut().unwrap().remove("market_gap");
        let violation = BusinessAnalyst
            .validate(&analyst_answer(scores), &artifacts, &context)
            .unwrap_err();
        assert!(violation.0.contains("market_gap"));
    }

    #[test]
    fn test_analyst_expected_shape_follows_category() {
        let context = context_with(Vec::new());

        let shape = BusinessAnalyst.expected_shape(&artifacts(Category::SaasWeb), &context);
        let required = shape["properties"]["score_breakdown"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 7);
        assert!(required.contains(&json!(DimensionKey::StartupSaturation.as_str())));

        let shape = BusinessAnalyst.expected_shape(&artifacts(Category::Hardware), &context);
        let required = shape["properties"]["score_breakdown"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 5);
    }

    #[test]
    fn test_researcher_requires_competitor_corpus() {
        let context = context_with(Vec::new());
        let idea = Idea::new("A social network for dogs", None).unwrap();
        let mut artifacts = artifacts(Category::MobileApp);
        artifacts.competitors = None;

        let result = MarketResearcher.build_context(&idea, &artifacts, &context);
        assert!(matches!(
            result,
            Err(StageError::MissingArtifact { artifact: "competitor corpus", .. })
        ));
    }

    #[test]
    fn test_researcher_notes_empty_corpus() {
        let context = context_with(Vec::new());
        let idea = Idea::new("A social network for dogs", None).unwrap();

        let value = MarketResearcher
            .build_context(&idea, &artifacts(Category::MobileApp), &context)
            .unwrap();
        assert_eq!(value["reviews"], json!([]));
        assert!(value["note"].is_string());
    }

    #[test]
    fn test_product_manager_truncates_roadmap() {
        let context = context_with(Vec::new());
        let items: Vec<String> = (1..=14).map(|i| format!("Feature {}", i)).collect();

        let roadmap = ProductManager
            .validate(
                &json!({"mvp_roadmap": items}),
                &artifacts(Category::MobileApp),
                &context,
            )
            .unwrap();
        assert_eq!(roadmap.mvp_roadmap.len(), 10);
        assert_eq!(roadmap.mvp_roadmap[0], "Feature 1");
    }

    #[tokio::test]
    async fn test_execute_retries_once_after_malformed_answer() {
        let context = context_with(vec![
            Ok(json!({"mvp_roadmap": []})),
            Ok(json!({"mvp_roadmap": ["Dog profiles"]})),
        ]);
        let idea = Idea::new("A social network for dogs", None).unwrap();

        let roadmap = ProductManager
            .execute(&idea, &artifacts(Category::MobileApp), &context)
            .await
            .unwrap();
        assert_eq!(roadmap.mvp_roadmap, vec!["Dog profiles"]);

        let calls = context.monitor.snapshot().analysis;
        assert_eq!(calls.started, 2);
        assert_eq!(calls.succeeded, 2);
    }

    #[tokio::test]
    async fn test_execute_fails_after_two_failures() {
        let context = context_with(vec![
            Err(AnalysisError::Provider("rate limited".into())),
            Err(AnalysisError::MalformedJson("oops".into())),
            Ok(analyst_answer(mobile_scores())),
        ]);
        let idea = Idea::new("A social network for dogs", None).unwrap();

        let result = BusinessAnalyst
            .execute(&idea, &artifacts(Category::MobileApp), &context)
            .await;
        assert!(matches!(
            result,
            Err(StageError::Analysis {
                stage: "BusinessAnalyst",
                source: AnalysisError::MalformedJson(_)
            })
        ));
        assert_eq!(context.monitor.snapshot().analysis.started, 2);
    }
}
