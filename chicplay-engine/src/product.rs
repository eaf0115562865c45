//! Catalog product snapshot carried by reward actions.
use serde::{Deserialize, Serialize};

/// The subset of a catalog product the reward layer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Price in cents to avoid floating-point issues
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Text used to match the product against bingo squares: category first,
    /// then the product name.
    #[must_use]
    pub fn trigger_text(&self) -> String {
        match &self.category {
            Some(category) => format!("{category} {}", self.name),
            None => self.name.clone(),
        }
    }
}
