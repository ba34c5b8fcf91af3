// ============================================================
// ANALYSIS REQUEST BUILDER
// ============================================================
// Map validated input to the prompt and schema sent to the model

use serde_json::{json, Value};
use validator::Validate;

use crate::domain::analysis::{AnalysisRequest, SingleAnalysisInput};
use crate::domain::csv::NormalizedBatch;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::llm_clients::GenerationRequest;

/// Bumped whenever the prompt wording or schema changes shape
pub const PROMPT_VERSION: &str = "v1";

const SYSTEM_PROMPT: &str = "You are an e-commerce pricing analyst. You research competitor product pages and recommend a competitive price. Prices are plain numbers without currency symbols. stockStatus is one of \"In Stock\", \"Low Stock\", \"Out of Stock\". priceTrend is one of \"up\", \"down\", \"stable\". Never invent competitors that were not provided.";

/// Single mode: trimmed user URL and the non-empty competitor URLs
pub fn single_request(input: SingleAnalysisInput) -> Result<AnalysisRequest> {
    let input = SingleAnalysisInput {
        user_product_url: input.user_product_url.trim().to_string(),
        competitor_urls: input
            .competitor_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
    };

    input.validate().map_err(|e| {
        AppError::ValidationError(
            e.field_errors()
                .values()
                .flat_map(|errors| errors.iter())
                .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| e.to_string()),
        )
    })?;

    if input.competitor_urls.is_empty() {
        return Err(AppError::ValidationError(
            "Add at least one competitor URL.".to_string(),
        ));
    }

    Ok(AnalysisRequest::Single {
        user_product_url: input.user_product_url,
        competitor_urls: input.competitor_urls,
    })
}

/// Batch mode: the validated products, unchanged
pub fn batch_request(batch: &NormalizedBatch) -> AnalysisRequest {
    AnalysisRequest::Batch {
        products: batch.products.clone(),
    }
}

/// JSON Schema of one product's analysis
pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "userProduct": {
                "type": "object",
                "properties": {
                    "productName": {"type": "string"},
                    "currentPrice": {"type": "number"}
                },
                "required": ["productName", "currentPrice"],
                "additionalProperties": false
            },
            "competitors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "url": {"type": "string"},
                        "productName": {"type": "string"},
                        "price": {"type": "number"},
                        "stockStatus": {
                            "type": "string",
                            "enum": ["In Stock", "Low Stock", "Out of Stock"]
                        },
                        "priceTrend": {
                            "type": "string",
                            "enum": ["up", "down", "stable"]
                        }
                    },
                    "required": ["url", "productName", "price", "stockStatus", "priceTrend"],
                    "additionalProperties": false
                }
            },
            "suggestedPrice": {"type": "number"},
            "reasoning": {"type": "string"},
            "marketSummary": {"type": "string"}
        },
        "required": ["userProduct", "competitors", "suggestedPrice", "reasoning", "marketSummary"],
        "additionalProperties": false
    })
}

/// JSON Schema of the batch answer
pub fn batch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": analysis_schema()
            }
        },
        "required": ["results"],
        "additionalProperties": false
    })
}

/// Build the provider-neutral prompt for an analysis request
pub fn build_generation_request(request: &AnalysisRequest) -> GenerationRequest {
    match request {
        AnalysisRequest::Single {
            user_product_url,
            competitor_urls,
        } => GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: single_prompt(user_product_url, competitor_urls),
            response_schema: Some(analysis_schema()),
            search_grounding: false,
        },
        AnalysisRequest::Batch { products } => {
            let products_json =
                serde_json::to_string_pretty(products).unwrap_or_else(|_| "[]".to_string());
            let schema_json =
                serde_json::to_string_pretty(&batch_schema()).unwrap_or_else(|_| "{}".to_string());

            GenerationRequest {
                system: SYSTEM_PROMPT.to_string(),
                user: format!(
                    "Analyze pricing for each of the following {} products. For every product, look up each competitor URL and report the competitor's product name, current price, stock status and recent price trend, then recommend a price for my product.\n\nProducts:\n{}\n\nRespond with one JSON object that matches this schema, with one entry in \"results\" per product in the same order:\n{}\n\nReturn only the JSON object.",
                    products.len(),
                    products_json,
                    schema_json
                ),
                response_schema: Some(batch_schema()),
                search_grounding: true,
            }
        }
    }
}

fn single_prompt(user_product_url: &str, competitor_urls: &[String]) -> String {
    let competitors = competitor_urls
        .iter()
        .enumerate()
        .map(|(idx, url)| format!("{}. {}", idx + 1, url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "My product page: {}\n\nCompetitor product pages:\n{}\n\nFor each competitor report the product name, current price, stock status and recent price trend. Then identify my product and its current price, suggest a competitive price, explain your reasoning and summarize the market.",
        user_product_url, competitors
    )
}
