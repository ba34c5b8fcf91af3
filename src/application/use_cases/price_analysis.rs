use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::use_cases::request_builder::{
    batch_request, build_generation_request, single_request, PROMPT_VERSION,
};
use crate::application::use_cases::row_normalizer::normalize_rows;
use crate::domain::analysis::{
    AnalysisOutcome, AnalysisReport, AnalysisRequest, BatchAnalysis, GroundingSource,
    PricingAnalysis, SingleAnalysisInput,
};
use crate::domain::csv::FieldMapping;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::llm_clients::{GenerationOutput, LLMClient};
use crate::infrastructure::response::{clean_llm_response, extract_json_payload};

pub struct PriceAnalysisUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    in_flight: Mutex<()>,
}

impl PriceAnalysisUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>, config: LLMConfig) -> Self {
        Self {
            llm_client,
            config,
            in_flight: Mutex::new(()),
        }
    }

    /// URL-only analysis of one product against its competitors
    pub async fn analyze_single(&self, input: SingleAnalysisInput) -> Result<AnalysisReport> {
        let request = single_request(input)?;
        self.execute(request).await
    }

    /// Parse, map and normalize an uploaded CSV, then analyze the valid rows.
    /// Skipped rows are reported as a warning on the returned report.
    pub async fn analyze_csv(&self, content: &str, mapping: &FieldMapping) -> Result<AnalysisReport> {
        mapping.require_ready()?;
        let table = CsvParser::new().parse_content(content)?;
        let batch = normalize_rows(&table, mapping)?;

        let warning = batch.warning();
        if let Some(warning) = &warning {
            warn!(skipped = batch.row_errors.len(), "{}", warning);
        }

        let report = self.execute(batch_request(&batch)).await?;
        Ok(report.with_warning(warning))
    }

    /// Send one request to the model. Only one request may be outstanding.
    pub async fn execute(&self, request: AnalysisRequest) -> Result<AnalysisReport> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            AppError::Busy("An analysis is already in progress. Please wait for it to finish.".to_string())
        })?;

        let id = Uuid::new_v4();
        let generation = build_generation_request(&request);

        info!(
            request_id = %id,
            mode = request.mode(),
            provider = ?self.config.provider,
            model = %self.config.model,
            prompt_version = PROMPT_VERSION,
            "Dispatching price analysis"
        );

        let output = self
            .llm_client
            .generate(&self.config, &generation)
            .await
            .map_err(|err| {
                error!(request_id = %id, error = %err, "Price analysis request failed");
                err
            })?;

        let outcome = parse_outcome(&request, output).map_err(|err| {
            error!(request_id = %id, error = %err, "Price analysis response rejected");
            err
        })?;

        info!(request_id = %id, "Price analysis completed");
        Ok(AnalysisReport::new(id, outcome))
    }
}

/// Turn the raw model answer into the structured outcome for `request`'s mode
fn parse_outcome(request: &AnalysisRequest, output: GenerationOutput) -> Result<AnalysisOutcome> {
    let cleaned = clean_llm_response(&output.text);
    if cleaned.is_empty() {
        return Err(AppError::ExternalServiceError(
            "The model returned an empty response.".to_string(),
        ));
    }

    let payload = extract_json_payload(&cleaned).ok_or_else(|| {
        AppError::ExternalServiceError(
            "The model response did not contain a JSON object.".to_string(),
        )
    })?;

    let value: serde_json::Value = serde_json::from_str(&payload).map_err(|e| {
        AppError::ExternalServiceError(format!("The model response is not valid JSON: {}", e))
    })?;

    match request {
        AnalysisRequest::Single { .. } => {
            let analysis: PricingAnalysis = serde_json::from_value(value).map_err(|e| {
                AppError::ExternalServiceError(format!("Unexpected analysis format: {}", e))
            })?;
            Ok(AnalysisOutcome::Single(analysis))
        }
        AnalysisRequest::Batch { .. } => {
            if value.get("results").is_none() {
                return Err(AppError::ExternalServiceError(
                    "The model response is missing the \"results\" field.".to_string(),
                ));
            }

            let mut analysis: BatchAnalysis = serde_json::from_value(value).map_err(|e| {
                AppError::ExternalServiceError(format!("Unexpected batch analysis format: {}", e))
            })?;
            merge_sources(&mut analysis.sources, output.sources);
            Ok(AnalysisOutcome::Batch(analysis))
        }
    }
}

/// Append grounding citations that the answer body does not already list
fn merge_sources(sources: &mut Vec<GroundingSource>, grounding: Vec<GroundingSource>) {
    for source in grounding {
        if !sources.iter().any(|s| s.web.uri == source.web.uri) {
            sources.push(source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::testing::{analysis_json, ScriptedClient};
    use crate::domain::analysis::WebSource;

    fn use_case(client: ScriptedClient) -> (PriceAnalysisUseCase, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        let use_case = PriceAnalysisUseCase::new(client.clone(), LLMConfig::default());
        (use_case, client)
    }

    const HEADER: &str = "productName,currentPrice,userProductUrl,competitorUrl_1";

    fn mapping() -> FieldMapping {
        let mut mapping = FieldMapping::new();
        mapping.set_product_name_column("productName");
        mapping.set_price_column("currentPrice");
        mapping.set_user_url_column("userProductUrl");
        mapping.toggle_competitor_column("competitorUrl_1");
        mapping
    }

    #[tokio::test]
    async fn test_single_analysis_parses_structured_answer() {
        let (use_case, client) = use_case(ScriptedClient::replying(analysis_json("Widget")));

        let report = use_case
            .analyze_single(SingleAnalysisInput {
                user_product_url: "https://me.example/widget".to_string(),
                competitor_urls: vec!["https://a.example/widget".to_string()],
            })
            .await
            .unwrap();

        match report.outcome {
            AnalysisOutcome::Single(analysis) => {
                assert_eq!(analysis.user_product.product_name, "Widget");
                assert_eq!(analysis.suggested_price, 18.49);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(report.warning.is_none());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_answer_wrapped_in_prose_and_fence() {
        let reply = format!(
            "Here is what I found:\n```json\n{{\"results\": [{}]}}\n```\nThanks!",
            analysis_json("Widget")
        );
        let client = ScriptedClient::replying(reply).with_sources(vec![GroundingSource {
            web: WebSource {
                uri: "https://a.example/widget".to_string(),
                title: "A".to_string(),
            },
        }]);
        let (use_case, _) = use_case(client);

        let csv = format!(
            "{}\nWidget,$19.99,https://me.example,https://a.example/widget\nBroken,N/A,,",
            HEADER
        );
        let report = use_case.analyze_csv(&csv, &mapping()).await.unwrap();

        match report.outcome {
            AnalysisOutcome::Batch(batch) => {
                assert_eq!(batch.results.len(), 1);
                assert_eq!(batch.sources.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            report.warning.as_deref(),
            Some("Skipped 1 row(s): Row 3: Price is missing.")
        );
    }

    #[tokio::test]
    async fn test_batch_payload_without_results_fails() {
        let (use_case, _) = use_case(ScriptedClient::replying("{\"items\": []}"));
        let csv = format!("{}\nWidget,1,,", HEADER);

        let err = use_case.analyze_csv(&csv, &mapping()).await.unwrap_err();
        match err {
            AppError::ExternalServiceError(msg) => assert!(msg.contains("results")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_answer_fails() {
        let (use_case, _) = use_case(ScriptedClient::replying("  <think>hmm</think> "));
        let err = use_case
            .execute(AnalysisRequest::Single {
                user_product_url: "https://me.example".to_string(),
                competitor_urls: vec!["https://a.example".to_string()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn test_provider_error_is_relayed() {
        let (use_case, _) = use_case(ScriptedClient::failing("API error (429): quota"));
        let err = use_case
            .execute(AnalysisRequest::Single {
                user_product_url: "https://me.example".to_string(),
                competitor_urls: vec!["https://a.example".to_string()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Analysis Failed: API error (429): quota");
    }

    #[tokio::test]
    async fn test_normalization_errors_skip_the_model() {
        let (use_case, client) = use_case(ScriptedClient::replying("{}"));

        let err = use_case
            .analyze_csv(&format!("{}\nWidget,N/A,,", HEADER), &mapping())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoValidRows { .. }));

        let err = use_case
            .analyze_csv(&format!("{}\nWidget,1,,", HEADER), &FieldMapping::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MappingIncomplete(_)));

        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_request_while_busy_is_rejected() {
        let client = ScriptedClient::replying(analysis_json("Widget"))
            .with_delay(std::time::Duration::from_millis(50));
        let (use_case, client) = use_case(client);

        let request = AnalysisRequest::Single {
            user_product_url: "https://me.example".to_string(),
            competitor_urls: vec!["https://a.example".to_string()],
        };

        let (first, second) = tokio::join!(
            use_case.execute(request.clone()),
            use_case.execute(request.clone())
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::Busy(_))));
        assert_eq!(client.calls(), 1);

        // The gate is released once the first request completes.
        assert!(use_case.execute(request).await.is_ok());
    }

    #[test]
    fn test_merge_sources_deduplicates_by_uri() {
        let source = |uri: &str| GroundingSource {
            web: WebSource {
                uri: uri.to_string(),
                title: uri.to_string(),
            },
        };
        let mut sources = vec![source("https://a.example")];
        merge_sources(
            &mut sources,
            vec![source("https://a.example"), source("https://b.example")],
        );
        assert_eq!(sources.len(), 2);
    }
}
