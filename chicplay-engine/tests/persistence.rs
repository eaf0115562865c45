use chicplay_engine::rewards::REWARD_STATE_KEY;
use chicplay_engine::{
    ActionType, FileStore, KeyValueStore, MemoryStore, Product, RewardConfig, RewardEngine,
    RewardState, StyleArchetype, StyleProfile,
};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 14).unwrap()
}

fn temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("chicplay-{label}-{nanos}"))
}

fn archetype() -> StyleArchetype {
    StyleArchetype {
        name: "Romantic".to_string(),
        profile: StyleProfile {
            traits: vec!["soft".to_string()],
            colors: vec!["blush".to_string()],
            favorite_categories: vec!["Dress".to_string()],
        },
    }
}

#[test]
fn state_survives_a_reload_through_memory_store() {
    let store = MemoryStore::new();
    let mut engine = RewardEngine::load_at(store.clone(), RewardConfig::default(), 1, day());
    engine.mark_bingo_square("midi dress", ActionType::View, None);
    engine.toggle_wishlist(&Product::new("sku-9", "Wrap Dress"));
    engine.complete_style_quiz(archetype());
    let expected = engine.state().clone();
    assert!(store.get(REWARD_STATE_KEY).unwrap().is_some());

    let reloaded = RewardEngine::load_at(store, RewardConfig::default(), 1, day());
    assert_eq!(reloaded.state(), &expected);
    assert!(reloaded.state().in_wishlist("sku-9"));
    assert_eq!(
        reloaded.state().archetype.as_ref().map(|a| a.name.as_str()),
        Some("Romantic")
    );
}

#[test]
fn state_survives_a_reload_through_file_store() {
    let dir = temp_dir("rewards");
    let mut engine =
        RewardEngine::load_at(FileStore::new(&dir), RewardConfig::default(), 2, day());
    engine.add_points(120, "welcome");
    let points = engine.state().points;
    assert!(dir.join(format!("{REWARD_STATE_KEY}.json")).exists());

    let reloaded = RewardEngine::try_load(FileStore::new(&dir), RewardConfig::default(), 2)
        .expect("stored state parses");
    assert_eq!(reloaded.state().points, points);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_state_falls_back_to_fresh_or_errors_on_try_load() {
    let store = MemoryStore::new();
    store.set(REWARD_STATE_KEY, "{not json").unwrap();

    assert!(RewardEngine::try_load(store.clone(), RewardConfig::default(), 3).is_err());
    let engine = RewardEngine::load_at(store, RewardConfig::default(), 3, day());
    assert_eq!(engine.state(), &RewardState::new(day(), &RewardConfig::default()));
}

#[test]
fn reset_store_persists_the_fresh_state() {
    let store = MemoryStore::new();
    let mut engine = RewardEngine::load_at(store.clone(), RewardConfig::default(), 4, day());
    engine.add_points(300, "seed");
    engine.reset_store();
    assert_eq!(engine.state().points, 0);

    let json = store.get(REWARD_STATE_KEY).unwrap().unwrap();
    let stored = RewardState::from_json(&json).unwrap();
    assert_eq!(stored.points, 0);
    assert_eq!(stored.bingo_card.marked_count(), 1);
}
