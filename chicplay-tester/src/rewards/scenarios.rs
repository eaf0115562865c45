use chicplay_engine::{
    ActionType, MemoryStore, Pattern, Product, RewardAction, RewardConfig, RewardEngine,
    RewardOutcome, RewardState, StyleArchetype, StyleProfile,
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::checks::{InvariantChecker, InvariantViolation};

/// 2024-01-01T12:00:00Z; scenarios run on a simulated calendar from here.
const START_TIMESTAMP: i64 = 1_704_110_400;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("step {step}: {source}")]
    Invariant {
        step: usize,
        source: InvariantViolation,
    },
    #[error("expectation failed: {0}")]
    Expectation(String),
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Expectation(message()))
    }
}

/// One simulated shopper: an engine on a memory store, a calendar and an RNG
/// for choosing actions. Every dispatch is verified by the invariant checker.
pub struct Session {
    engine: RewardEngine<MemoryStore>,
    checker: InvariantChecker,
    rng: ChaCha20Rng,
    start: DateTime<Utc>,
    day: i64,
    steps: usize,
}

impl Session {
    pub fn new(seed: u64, config: RewardConfig) -> Self {
        let start = DateTime::from_timestamp(START_TIMESTAMP, 0).unwrap_or_default();
        let level_span = config.level_span;
        let engine = RewardEngine::load_at(MemoryStore::new(), config, seed, start.date_naive());
        let checker = InvariantChecker::new(engine.state(), level_span);
        Self {
            engine,
            checker,
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED),
            start,
            day: 0,
            steps: 0,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.start + Duration::days(self.day)
    }

    pub fn dispatch(&mut self, action: RewardAction) -> Result<RewardOutcome, ScenarioError> {
        let now = self.now();
        let outcome = self.engine.dispatch_at(action, now);
        self.steps += 1;
        self.checker
            .check(&outcome, self.engine.state())
            .map_err(|source| ScenarioError::Invariant {
                step: self.steps,
                source,
            })?;
        Ok(outcome)
    }

    pub fn mark(&mut self, trigger: &str, action: ActionType) -> Result<RewardOutcome, ScenarioError> {
        self.dispatch(RewardAction::MarkSquare {
            trigger: trigger.to_string(),
            action,
            product: None,
        })
    }

    pub fn next_day(&mut self) {
        self.day += 1;
    }

    pub fn state(&self) -> &RewardState {
        self.engine.state()
    }

    pub fn config(&self) -> &RewardConfig {
        self.engine.config()
    }

    pub const fn steps(&self) -> usize {
        self.steps
    }
}

pub type ScenarioFn = fn(&mut Session) -> Result<(), ScenarioError>;

pub struct RewardScenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[RewardScenario] = &[
    RewardScenario {
        key: "smoke",
        description: "Browse, wishlist, check in and spin once",
        run: smoke,
    },
    RewardScenario {
        key: "full-house",
        description: "Mark every square and verify each pattern pays once",
        run: full_house,
    },
    RewardScenario {
        key: "wishlist",
        description: "Toggle one product repeatedly; credit is paid once",
        run: wishlist,
    },
    RewardScenario {
        key: "streak",
        description: "Nine consecutive daily check-ins, then a missed day",
        run: streak,
    },
    RewardScenario {
        key: "quiz",
        description: "Complete the style quiz twice; XP is granted once",
        run: quiz,
    },
    RewardScenario {
        key: "random",
        description: "Seeded random shopper over thirty days",
        run: random_walk,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.key, s.description))
}

pub fn get_scenario(key: &str) -> Option<&'static RewardScenario> {
    CATALOG.iter().find(|s| s.key == key)
}

pub fn all_keys() -> Vec<String> {
    CATALOG.iter().map(|s| s.key.to_string()).collect()
}

fn smoke(session: &mut Session) -> Result<(), ScenarioError> {
    session.dispatch(RewardAction::CheckIn)?;
    let viewed = session.mark("Midi Dress", ActionType::View)?;
    ensure(viewed.marked_square() == Some(0), || {
        format!("midi dress marked {:?}", viewed.marked_square())
    })?;
    session.mark("virtual try-on", ActionType::TryOn)?;
    session.dispatch(RewardAction::ToggleWishlist {
        product: Product::new("smoke-1", "Linen Shirt").with_category("Top"),
    })?;
    session.dispatch(RewardAction::Spin)?;
    let blank = session.mark("   ", ActionType::View)?;
    ensure(!blank.changed(), || "blank trigger changed state".to_string())?;
    ensure(session.state().points > 0, || "no points earned".to_string())
}

fn full_house(session: &mut Session) -> Result<(), ScenarioError> {
    let mut full_house_credits = 0;
    loop {
        let Some(trigger) = session
            .state()
            .bingo_card
            .squares
            .iter()
            .find(|square| !square.marked)
            .and_then(|square| square.keywords.first().cloned())
        else {
            break;
        };
        let outcome = session.mark(&trigger, ActionType::View)?;
        ensure(outcome.marked_square().is_some(), || {
            format!("keyword {trigger:?} did not mark a square")
        })?;
        full_house_credits += outcome
            .patterns()
            .iter()
            .filter(|pattern| **pattern == Pattern::FullHouse)
            .count();
    }
    let state = session.state();
    ensure(full_house_credits == 1, || {
        format!("full house credited {full_house_credits} times")
    })?;
    ensure(
        state.bingo_card.completed_patterns.len() == Pattern::all().len(),
        || {
            format!(
                "{} of {} patterns completed",
                state.bingo_card.completed_patterns.len(),
                Pattern::all().len()
            )
        },
    )?;
    let again = session.mark("dress", ActionType::Purchase)?;
    ensure(!again.changed(), || "full card accepted another mark".to_string())
}

fn wishlist(session: &mut Session) -> Result<(), ScenarioError> {
    let product = Product::new("wish-1", "Satin Slip Dress");
    let credit = session.config().wishlist_credit;
    for _ in 0..3 {
        session.dispatch(RewardAction::ToggleWishlist {
            product: product.clone(),
        })?;
    }
    let state = session.state();
    ensure(state.in_wishlist("wish-1"), || "product not in wishlist".to_string())?;
    ensure(state.points == credit, || {
        format!("expected {credit} points, found {}", state.points)
    })
}

fn streak(session: &mut Session) -> Result<(), ScenarioError> {
    for _ in 0..9 {
        session.dispatch(RewardAction::CheckIn)?;
        session.next_day();
    }
    ensure(session.state().streak == 9, || {
        format!("streak is {}", session.state().streak)
    })?;
    ensure(session.state().has_achievement("streak-7"), || {
        "week streak achievement missing".to_string()
    })?;
    session.next_day();
    session.dispatch(RewardAction::CheckIn)?;
    ensure(session.state().streak == 1, || {
        "streak survived a missed day".to_string()
    })
}

fn quiz(session: &mut Session) -> Result<(), ScenarioError> {
    let archetype = StyleArchetype {
        name: "Minimalist".to_string(),
        profile: StyleProfile {
            traits: vec!["clean lines".to_string()],
            colors: vec!["black".to_string(), "white".to_string()],
            favorite_categories: vec!["Top".to_string()],
        },
    };
    let xp = session.config().style_quiz_xp;
    session.dispatch(RewardAction::CompleteStyleQuiz {
        archetype: archetype.clone(),
    })?;
    session.dispatch(RewardAction::CompleteStyleQuiz { archetype })?;
    let state = session.state();
    ensure(state.experience == xp, || {
        format!("expected {xp} XP, found {}", state.experience)
    })?;
    ensure(state.archetype.is_some(), || "archetype not stored".to_string())
}

const RANDOM_TRIGGERS: &[&str] = &[
    "maxi dress",
    "cotton tee",
    "sneaker",
    "clutch",
    "featured",
    "blazer",
    "pleated",
    "earring",
    "new arrival",
    "denim",
    "swim",
    "sweater",
    "slacks",
    "eyewear",
    "fitting",
    "legging",
    "fedora",
    "favorite",
    "shawl",
    "bestseller",
    "waist",
    "limited",
    "playsuit",
    "wristwatch",
    "gift card",
];

fn random_walk(session: &mut Session) -> Result<(), ScenarioError> {
    let kinds = [
        ActionType::View,
        ActionType::Wishlist,
        ActionType::Purchase,
        ActionType::TryOn,
    ];
    for _ in 0..30 {
        session.dispatch(RewardAction::CheckIn)?;
        let actions = session.rng.gen_range(3..12);
        for _ in 0..actions {
            let action = match session.rng.gen_range(0..10) {
                0 => RewardAction::Spin,
                1 | 2 => {
                    let id = session.rng.gen_range(0..6);
                    RewardAction::ToggleWishlist {
                        product: Product::new(format!("rnd-{id}"), format!("Random {id}")),
                    }
                }
                3 => RewardAction::AdjustSkill {
                    skill: "styling".to_string(),
                    delta: session.rng.gen_range(-20..=20),
                },
                _ => RewardAction::MarkSquare {
                    trigger: RANDOM_TRIGGERS[session.rng.gen_range(0..RANDOM_TRIGGERS.len())]
                        .to_string(),
                    action: kinds[session.rng.gen_range(0..kinds.len())],
                    product: None,
                },
            };
            session.dispatch(action)?;
        }
        session.next_day();
    }
    ensure(session.state().streak == 30, || {
        format!("streak is {} after 30 daily visits", session.state().streak)
    })
}
