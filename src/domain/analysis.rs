use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::csv::ValidatedProduct;

/// Payload handed to the generative model, built right before dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisRequest {
    #[serde(rename_all = "camelCase")]
    Single {
        user_product_url: String,
        competitor_urls: Vec<String>,
    },
    Batch { products: Vec<ValidatedProduct> },
}

impl AnalysisRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            AnalysisRequest::Single { .. } => "single",
            AnalysisRequest::Batch { .. } => "batch",
        }
    }
}

/// Form input for the URL-only analysis
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SingleAnalysisInput {
    #[validate(length(min = 1, max = 2048, message = "Your product URL is required."))]
    pub user_product_url: String,
    #[serde(default)]
    pub competitor_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProduct {
    pub product_name: String,
    pub current_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorListing {
    pub url: String,
    pub product_name: String,
    pub price: f64,
    pub stock_status: StockStatus,
    pub price_trend: PriceTrend,
}

/// Structured recommendation for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingAnalysis {
    pub user_product: UserProduct,
    #[serde(default)]
    pub competitors: Vec<CompetitorListing>,
    pub suggested_price: f64,
    pub reasoning: String,
    pub market_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Citation attached to grounded batch answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub web: WebSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    pub results: Vec<PricingAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Single(PricingAnalysis),
    Batch(BatchAnalysis),
}

/// Envelope returned to the dashboard for every completed analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub outcome: AnalysisOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl AnalysisReport {
    pub fn new(id: Uuid, outcome: AnalysisOutcome) -> Self {
        Self {
            id,
            generated_at: Utc::now(),
            outcome,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}
