use chicplay_engine::rewards::FREE_SQUARE_ID;
use chicplay_engine::{Pattern, RewardEvent, RewardOutcome, RewardState};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("points decreased from {before} to {after}")]
    PointsDecreased { before: u64, after: u64 },
    #[error("experience decreased from {before} to {after}")]
    ExperienceDecreased { before: u64, after: u64 },
    #[error("level {level} does not match experience {experience}")]
    LevelMismatch { level: u32, experience: u64 },
    #[error("pattern {0} credited twice")]
    DuplicatePattern(Pattern),
    #[error("free square is not marked")]
    FreeSquareUnmarked,
}

/// Tracks what the state looked like after the previous step and verifies
/// each new step against it.
#[derive(Debug, Clone)]
pub struct InvariantChecker {
    level_span: u64,
    points: u64,
    experience: u64,
    credited: BTreeSet<Pattern>,
}

impl InvariantChecker {
    pub fn new(state: &RewardState, level_span: u64) -> Self {
        Self {
            level_span,
            points: state.points,
            experience: state.experience,
            credited: state.bingo_card.completed_patterns.clone(),
        }
    }

    pub fn check(
        &mut self,
        outcome: &RewardOutcome,
        state: &RewardState,
    ) -> Result<(), InvariantViolation> {
        let mut baseline_reset = false;
        for event in &outcome.events {
            match event {
                RewardEvent::StoreReset => {
                    baseline_reset = true;
                    self.credited.clear();
                }
                RewardEvent::CardReset { .. } => self.credited.clear(),
                RewardEvent::PatternCompleted { pattern, .. } => {
                    if !self.credited.insert(*pattern) {
                        return Err(InvariantViolation::DuplicatePattern(*pattern));
                    }
                }
                _ => {}
            }
        }

        if !baseline_reset {
            if state.points < self.points {
                return Err(InvariantViolation::PointsDecreased {
                    before: self.points,
                    after: state.points,
                });
            }
            if state.experience < self.experience {
                return Err(InvariantViolation::ExperienceDecreased {
                    before: self.experience,
                    after: state.experience,
                });
            }
        }
        if !state.level_consistent(self.level_span) {
            return Err(InvariantViolation::LevelMismatch {
                level: state.level,
                experience: state.experience,
            });
        }
        if !state.bingo_card.is_marked(FREE_SQUARE_ID) {
            return Err(InvariantViolation::FreeSquareUnmarked);
        }

        self.points = state.points;
        self.experience = state.experience;
        Ok(())
    }
}
