//! Reward state machine: points, levels, streaks, the bingo card and the
//! daily wheel.
pub mod action;
pub mod bingo;
pub mod config;
pub mod engine;
pub mod state;

pub use action::{ActionContext, ActionType, RewardAction, RewardEvent, RewardOutcome};
pub use bingo::{BingoCard, FREE_SQUARE_ID, Pattern, SQUARE_COUNT, Square, SquareDetails};
pub use config::{ActionPoints, PatternBonuses, Prize, RewardConfig, WheelPrize};
pub use engine::{REWARD_STATE_KEY, RewardEngine};
pub use state::{Achievement, RewardState, StyleArchetype, StyleProfile, level_for_experience};
