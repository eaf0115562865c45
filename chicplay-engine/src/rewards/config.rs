//! Tunable point values for the reward engine.
use serde::{Deserialize, Serialize};

use super::action::ActionType;
use super::bingo::Pattern;

/// Base points for marking a square, per action type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPoints {
    pub view: u64,
    pub wishlist: u64,
    pub try_on: u64,
    pub purchase: u64,
    pub system: u64,
}

impl Default for ActionPoints {
    fn default() -> Self {
        Self {
            view: 5,
            wishlist: 15,
            try_on: 25,
            purchase: 100,
            system: 5,
        }
    }
}

impl ActionPoints {
    #[must_use]
    pub const fn for_action(&self, action: ActionType) -> u64 {
        match action {
            ActionType::View => self.view,
            ActionType::Wishlist => self.wishlist,
            ActionType::TryOn => self.try_on,
            ActionType::Purchase => self.purchase,
            ActionType::System => self.system,
        }
    }
}

/// Bonuses for completing bingo patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternBonuses {
    pub row: u64,
    pub column: u64,
    pub diagonal: u64,
    pub four_corners: u64,
    pub full_house: u64,
}

impl Default for PatternBonuses {
    fn default() -> Self {
        Self {
            row: 100,
            column: 100,
            diagonal: 150,
            four_corners: 200,
            full_house: 500,
        }
    }
}

impl PatternBonuses {
    #[must_use]
    pub const fn for_pattern(&self, pattern: Pattern) -> u64 {
        match pattern {
            Pattern::Row(_) => self.row,
            Pattern::Column(_) => self.column,
            Pattern::Diagonal(_) => self.diagonal,
            Pattern::FourCorners => self.four_corners,
            Pattern::FullHouse => self.full_house,
        }
    }
}

/// What a wheel segment pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "amount")]
pub enum Prize {
    Points(u64),
    ExtraSpin,
}

/// One weighted segment of the daily wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelPrize {
    pub label: String,
    pub weight: u32,
    pub prize: Prize,
}

impl WheelPrize {
    fn points(label: &str, weight: u32, amount: u64) -> Self {
        Self {
            label: label.to_string(),
            weight,
            prize: Prize::Points(amount),
        }
    }
}

fn default_wheel() -> Vec<WheelPrize> {
    vec![
        WheelPrize::points("10 points", 30, 10),
        WheelPrize::points("25 points", 25, 25),
        WheelPrize::points("50 points", 20, 50),
        WheelPrize::points("100 points", 10, 100),
        WheelPrize::points("250 points", 4, 250),
        WheelPrize {
            label: "Spin again".to_string(),
            weight: 11,
            prize: Prize::ExtraSpin,
        },
    ]
}

/// Complete reward tuning. Every field falls back to its default when the
/// JSON omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardConfig {
    pub action_points: ActionPoints,
    pub target_bonus: u64,
    pub target_purchase_bonus: u64,
    pub pattern_bonuses: PatternBonuses,
    /// Experience needed per level.
    pub level_span: u64,
    pub wishlist_credit: u64,
    pub style_quiz_xp: u64,
    pub streak_points_per_day: u64,
    pub streak_cap_days: u32,
    pub daily_spins: u32,
    pub wheel: Vec<WheelPrize>,
    pub default_theme: String,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            action_points: ActionPoints::default(),
            target_bonus: 50,
            target_purchase_bonus: 200,
            pattern_bonuses: PatternBonuses::default(),
            level_span: 1_000,
            wishlist_credit: 15,
            style_quiz_xp: 100,
            streak_points_per_day: 10,
            streak_cap_days: 7,
            daily_spins: 1,
            wheel: default_wheel(),
            default_theme: "Everyday Chic".to_string(),
        }
    }
}

impl RewardConfig {
    /// Load reward tuning from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a reward config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Bonus for landing on a `Target` square.
    #[must_use]
    pub const fn target_bonus_for(&self, action: ActionType) -> u64 {
        if matches!(action, ActionType::Purchase) {
            self.target_purchase_bonus
        } else {
            self.target_bonus
        }
    }

    /// Sum of all wheel weights.
    #[must_use]
    pub fn wheel_weight(&self) -> u32 {
        self.wheel.iter().map(|segment| segment.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RewardConfig::from_json(r#"{"targetBonus": 75, "levelSpan": 500}"#).unwrap();
        assert_eq!(cfg.target_bonus, 75);
        assert_eq!(cfg.level_span, 500);
        assert_eq!(cfg.action_points.purchase, 100);
        assert_eq!(cfg.pattern_bonuses.full_house, 500);
    }

    #[test]
    fn purchase_on_target_pays_more() {
        let cfg = RewardConfig::default();
        assert_eq!(cfg.target_bonus_for(ActionType::View), 50);
        assert_eq!(cfg.target_bonus_for(ActionType::Purchase), 200);
    }

    #[test]
    fn default_wheel_has_weight() {
        let cfg = RewardConfig::default();
        assert_eq!(cfg.wheel_weight(), 100);
        let json = serde_json::to_string(&cfg.wheel[5]).unwrap();
        assert!(json.contains("extraSpin"));
    }
}
