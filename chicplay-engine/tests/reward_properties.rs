use chicplay_engine::rewards::{FREE_SQUARE_ID, SQUARE_COUNT};
use chicplay_engine::{
    ActionType, MemoryStore, Pattern, Product, RewardAction, RewardConfig, RewardEngine,
    RewardEvent, level_for_experience,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeSet;

const TRIGGERS: &[&str] = &[
    "Midi Dress",
    "silk blouse",
    "ankle boot",
    "leather tote",
    "featured",
    "wool coat",
    "pleated skirt",
    "gold necklace",
    "new arrival",
    "jeans",
    "bikini",
    "cardigan",
    "trousers",
    "shades",
    "virtual try",
    "yoga",
    "beret",
    "saved",
    "wrap",
    "trending",
    "buckle",
    "exclusive",
    "romper",
    "timepiece",
    "",
    "   ",
    "unrelated",
    "DRESS",
];

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn noon(offset_days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::days(offset_days)
}

fn engine(seed: u64) -> RewardEngine<MemoryStore> {
    RewardEngine::load_at(MemoryStore::new(), RewardConfig::default(), seed, day())
}

fn random_action(rng: &mut ChaCha20Rng) -> RewardAction {
    let actions = [
        ActionType::View,
        ActionType::Wishlist,
        ActionType::Purchase,
        ActionType::TryOn,
    ];
    match rng.gen_range(0..6) {
        0 => RewardAction::AddPoints {
            amount: rng.gen_range(0..200),
            reason: "bonus".to_string(),
        },
        1 => {
            let id = rng.gen_range(0..5);
            RewardAction::ToggleWishlist {
                product: Product::new(format!("p{id}"), format!("Product {id}")),
            }
        }
        2 => RewardAction::CheckIn,
        3 => RewardAction::Spin,
        _ => RewardAction::MarkSquare {
            trigger: TRIGGERS[rng.gen_range(0..TRIGGERS.len())].to_string(),
            action: actions[rng.gen_range(0..actions.len())],
            product: None,
        },
    }
}

/// Mark every square by repeatedly targeting the first unmarked one with its
/// own keyword.
fn fill_card(engine: &mut RewardEngine<MemoryStore>) -> Vec<RewardEvent> {
    let mut events = Vec::new();
    loop {
        let Some(trigger) = engine
            .state()
            .bingo_card
            .squares
            .iter()
            .find(|square| !square.marked)
            .map(|square| square.keywords[0].clone())
        else {
            break;
        };
        let outcome = engine.dispatch_at(
            RewardAction::MarkSquare {
                trigger,
                action: ActionType::View,
                product: None,
            },
            noon(0),
        );
        assert!(outcome.marked_square().is_some());
        events.extend(outcome.events);
    }
    events
}

#[test]
fn points_and_experience_never_decrease_and_level_tracks_experience() {
    let config = RewardConfig::default();
    for seed in [1_u64, 7, 1337, 2024] {
        let mut engine = engine(seed);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut previous = (engine.state().points, engine.state().experience);
        for step in 0..400 {
            let action = random_action(&mut rng);
            engine.dispatch_at(action, noon(step / 20));
            let state = engine.state();
            assert!(state.points >= previous.0, "seed {seed} step {step}");
            assert!(state.experience >= previous.1, "seed {seed} step {step}");
            assert_eq!(
                state.level,
                level_for_experience(state.experience, config.level_span)
            );
            assert!(state.bingo_card.is_marked(FREE_SQUARE_ID));
            previous = (state.points, state.experience);
        }
    }
}

#[test]
fn completed_patterns_never_repeat() {
    let mut engine = engine(99);
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let mut seen = BTreeSet::new();
    for step in 0..600 {
        let outcome = engine.dispatch_at(random_action(&mut rng), noon(step / 30));
        for pattern in outcome.patterns() {
            assert!(seen.insert(pattern), "{pattern} credited twice");
        }
    }
    assert_eq!(seen, engine.state().bingo_card.completed_patterns);
}

#[test]
fn full_card_credits_full_house_exactly_once() {
    let mut engine = engine(5);
    let events = fill_card(&mut engine);
    let full_house: Vec<_> = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                RewardEvent::PatternCompleted {
                    pattern: Pattern::FullHouse,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(full_house.len(), 1);
    assert!(matches!(
        full_house[0],
        RewardEvent::PatternCompleted { bonus: 500, .. }
    ));
    let state = engine.state();
    assert_eq!(state.bingo_card.marked_count(), SQUARE_COUNT);
    assert_eq!(state.bingo_card.completed_patterns.len(), Pattern::all().len());
    assert!(state.has_achievement("full-house"));

    // A full card has nothing left to match.
    let points = state.points;
    let outcome = engine.dispatch_at(
        RewardAction::MarkSquare {
            trigger: "dress".to_string(),
            action: ActionType::Purchase,
            product: None,
        },
        noon(0),
    );
    assert!(!outcome.changed());
    assert_eq!(engine.state().points, points);
}

#[test]
fn first_match_wins_in_id_order() {
    let mut engine = engine(3);
    // "dress" matches square 0 only; a second "dress" finds nothing unmarked.
    let first = engine.dispatch_at(
        RewardAction::MarkSquare {
            trigger: "Red Dress".to_string(),
            action: ActionType::View,
            product: None,
        },
        noon(0),
    );
    assert_eq!(first.marked_square(), Some(0));
    assert_eq!(first.points_awarded(), 5);
    let again = engine.dispatch_at(
        RewardAction::MarkSquare {
            trigger: "red dress".to_string(),
            action: ActionType::View,
            product: None,
        },
        noon(0),
    );
    assert_eq!(again.marked_square(), None);
}

#[test]
fn purchase_on_target_square_adds_purchase_bonus() {
    let mut engine = engine(4);
    let outcome = engine.dispatch_at(
        RewardAction::MarkSquare {
            trigger: "featured".to_string(),
            action: ActionType::Purchase,
            product: Some(Product::new("sku-1", "Featured Dress")),
        },
        noon(0),
    );
    assert_eq!(outcome.marked_square(), Some(4));
    assert_eq!(outcome.points_awarded(), 100 + 200);
    let details = engine.state().bingo_card.squares[4].details.clone().unwrap();
    assert_eq!(details.product_id.as_deref(), Some("sku-1"));
}
