//! Reward state aggregate persisted between sessions.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::bingo::BingoCard;
use super::config::RewardConfig;
use crate::product::Product;

pub const SKILL_MAX: u8 = 100;

/// Level implied by an experience total: one level per `span` XP, starting at 1.
#[must_use]
pub fn level_for_experience(experience: u64, span: u64) -> u32 {
    let level = experience / span.max(1) + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub date: NaiveDate,
}

/// Style answers captured by the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleArchetype {
    pub name: String,
    #[serde(default)]
    pub profile: StyleProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardState {
    pub points: u64,
    pub experience: u64,
    pub level: u32,
    pub streak: u32,
    #[serde(default)]
    pub last_login_date: Option<NaiveDate>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub wishlist: Vec<Product>,
    pub bingo_card: BingoCard,
    pub spins_remaining: u32,
    #[serde(default)]
    pub last_spin_date: Option<NaiveDate>,
    #[serde(default)]
    pub skills: BTreeMap<String, u8>,
    #[serde(default)]
    pub archetype: Option<StyleArchetype>,
    /// Product ids that already earned the wishlist credit.
    #[serde(default)]
    pub wishlist_credited: BTreeSet<String>,
}

impl RewardState {
    /// Initial state for a first visit on `today`.
    #[must_use]
    pub fn new(today: NaiveDate, config: &RewardConfig) -> Self {
        Self {
            points: 0,
            experience: 0,
            level: 1,
            streak: 0,
            last_login_date: None,
            achievements: Vec::new(),
            wishlist: Vec::new(),
            bingo_card: BingoCard::new(config.default_theme.clone(), today),
            spins_remaining: 0,
            last_spin_date: None,
            skills: BTreeMap::new(),
            archetype: None,
            wishlist_credited: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    #[must_use]
    pub fn in_wishlist(&self, product_id: &str) -> bool {
        self.wishlist.iter().any(|p| p.id == product_id)
    }

    #[must_use]
    pub fn skill(&self, name: &str) -> u8 {
        self.skills.get(name).copied().unwrap_or(0)
    }

    /// True when the stored level agrees with the experience total.
    #[must_use]
    pub fn level_consistent(&self, span: u64) -> bool {
        self.level == level_for_experience(self.experience, span)
    }

    /// Load state from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a reward state.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
