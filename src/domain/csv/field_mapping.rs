// ============================================================
// FIELD MAPPING
// ============================================================
// User-selected assignment of semantic roles to CSV header columns

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::domain::error::{AppError, Result};

/// Semantic role a CSV column can play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    ProductName,
    Price,
    UserUrl,
    CompetitorUrl,
}

impl FieldRole {
    pub fn label(&self) -> &'static str {
        match self {
            FieldRole::ProductName => "Product Name",
            FieldRole::Price => "Price",
            FieldRole::UserUrl => "Your Product URL",
            FieldRole::CompetitorUrl => "Competitor URL",
        }
    }

    /// Guess the role of a header from its name
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if let Some(rest) = key.strip_prefix("competitor") {
            let is_url_column = rest.starts_with("url")
                || rest.starts_with("link")
                || rest.chars().all(|c| c.is_ascii_digit());
            return is_url_column.then_some(FieldRole::CompetitorUrl);
        }

        match key.as_str() {
            "productname" | "name" | "product" | "title" | "itemname" => {
                Some(FieldRole::ProductName)
            }
            "currentprice" | "price" | "ourprice" | "yourprice" => Some(FieldRole::Price),
            "userproducturl" | "producturl" | "url" | "link" | "yoururl" => {
                Some(FieldRole::UserUrl)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    #[serde(deserialize_with = "deserialize_column")]
    pub product_name_column: Option<String>,
    #[serde(deserialize_with = "deserialize_column")]
    pub price_column: Option<String>,
    #[serde(deserialize_with = "deserialize_column")]
    pub user_url_column: Option<String>,
    /// Selection is a set; extraction order follows the table's headers
    #[serde(deserialize_with = "deserialize_columns")]
    pub competitor_url_columns: BTreeSet<String>,
}

// Client-supplied names go through the same trimming as the setters
fn deserialize_column<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let column = Option::<String>::deserialize(deserializer)?;
    Ok(column.as_deref().and_then(selection))
}

fn deserialize_columns<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let columns = Vec::<String>::deserialize(deserializer)?;
    Ok(columns.iter().filter_map(|column| selection(column)).collect())
}

fn selection(header: &str) -> Option<String> {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn assigned(column: &Option<String>) -> bool {
    column.as_deref().map_or(false, |c| !c.trim().is_empty())
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-select columns whose header names match a known role.
    /// The first matching header wins for the single-valued roles.
    pub fn suggest(headers: &[String]) -> Self {
        let mut mapping = Self::new();

        for header in headers {
            match FieldRole::from_header(header) {
                Some(FieldRole::ProductName) if mapping.product_name_column.is_none() => {
                    mapping.set_product_name_column(header);
                }
                Some(FieldRole::Price) if mapping.price_column.is_none() => {
                    mapping.set_price_column(header);
                }
                Some(FieldRole::UserUrl) if mapping.user_url_column.is_none() => {
                    mapping.set_user_url_column(header);
                }
                Some(FieldRole::CompetitorUrl) => {
                    mapping.competitor_url_columns.insert(header.clone());
                }
                _ => {}
            }
        }

        mapping
    }

    pub fn set_product_name_column(&mut self, header: &str) {
        self.product_name_column = selection(header);
    }

    pub fn set_price_column(&mut self, header: &str) {
        self.price_column = selection(header);
    }

    pub fn set_user_url_column(&mut self, header: &str) {
        self.user_url_column = selection(header);
    }

    /// Add the header to the competitor set if absent, remove it if present
    pub fn toggle_competitor_column(&mut self, header: &str) {
        if !self.competitor_url_columns.remove(header) {
            self.competitor_url_columns.insert(header.to_string());
        }
    }

    pub fn is_ready(&self) -> bool {
        self.missing_roles().is_empty()
    }

    pub fn missing_roles(&self) -> Vec<FieldRole> {
        let mut missing = Vec::new();
        if !assigned(&self.product_name_column) {
            missing.push(FieldRole::ProductName);
        }
        if !assigned(&self.price_column) {
            missing.push(FieldRole::Price);
        }
        missing
    }

    /// Fails with `MappingIncomplete` naming every unassigned required role
    pub fn require_ready(&self) -> Result<()> {
        let missing = self.missing_roles();
        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::MappingIncomplete(
            missing.iter().map(|role| role.label().to_string()).collect(),
        ))
    }

    /// Competitor columns in the order they appear in `headers`
    pub fn competitor_columns_in<'a>(&'a self, headers: &'a [String]) -> Vec<&'a str> {
        headers
            .iter()
            .filter(|header| self.competitor_url_columns.contains(header.as_str()))
            .map(String::as_str)
            .collect()
    }
}
