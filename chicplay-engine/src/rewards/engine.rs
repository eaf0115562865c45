use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::action::{ActionContext, ActionType, RewardAction, RewardOutcome};
use super::config::RewardConfig;
use super::state::{RewardState, StyleArchetype};
use crate::product::Product;
use crate::storage::KeyValueStore;

/// Storage key for the serialized reward state.
pub const REWARD_STATE_KEY: &str = "chicplay.rewards";

/// Owns the reward state and its store. The application's composition root
/// creates one engine and hands it to whatever needs to dispatch actions.
pub struct RewardEngine<S>
where
    S: KeyValueStore,
{
    store: S,
    config: RewardConfig,
    state: RewardState,
    rng: ChaCha20Rng,
}

impl<S> RewardEngine<S>
where
    S: KeyValueStore,
{
    /// Load persisted state, falling back to a fresh state when nothing is
    /// stored or the stored blob is unreadable.
    pub fn load(store: S, config: RewardConfig, seed: u64) -> Self {
        Self::load_at(store, config, seed, Utc::now().date_naive())
    }

    /// [`RewardEngine::load`] with an explicit "today".
    pub fn load_at(store: S, config: RewardConfig, seed: u64, today: NaiveDate) -> Self {
        let state = match read_state(&store) {
            Ok(Some(state)) => state,
            Ok(None) => RewardState::new(today, &config),
            Err(err) => {
                log::warn!("discarding unreadable reward state: {err:#}");
                RewardState::new(today, &config)
            }
        };
        Self::with_state(store, config, seed, state)
    }

    /// Load persisted state, failing instead of falling back when the stored
    /// blob cannot be read or parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, the stored JSON is invalid or the
    /// stored bingo card is malformed.
    pub fn try_load(store: S, config: RewardConfig, seed: u64) -> anyhow::Result<Self> {
        let today = Utc::now().date_naive();
        let state = read_state(&store)?.unwrap_or_else(|| RewardState::new(today, &config));
        Ok(Self::with_state(store, config, seed, state))
    }

    fn with_state(store: S, config: RewardConfig, seed: u64, mut state: RewardState) -> Self {
        // Level is derived; never trust the stored value.
        state.level = super::state::level_for_experience(state.experience, config.level_span);
        Self {
            store,
            config,
            state,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &RewardState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &RewardConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Apply an action now and persist the result.
    pub fn dispatch(&mut self, action: RewardAction) -> RewardOutcome {
        self.dispatch_at(action, Utc::now())
    }

    /// Apply an action at an explicit instant and persist the result.
    pub fn dispatch_at(&mut self, action: RewardAction, now: DateTime<Utc>) -> RewardOutcome {
        let mut ctx = ActionContext {
            now,
            config: &self.config,
            rng: &mut self.rng,
        };
        let outcome = self.state.apply(action, &mut ctx);
        if outcome.changed() {
            self.persist();
        }
        outcome
    }

    pub fn add_points(&mut self, amount: u64, reason: &str) -> RewardOutcome {
        self.dispatch(RewardAction::AddPoints {
            amount,
            reason: reason.to_string(),
        })
    }

    pub fn mark_bingo_square(
        &mut self,
        trigger: &str,
        action: ActionType,
        product: Option<&Product>,
    ) -> RewardOutcome {
        self.dispatch(RewardAction::MarkSquare {
            trigger: trigger.to_string(),
            action,
            product: product.cloned(),
        })
    }

    pub fn toggle_wishlist(&mut self, product: &Product) -> RewardOutcome {
        self.dispatch(RewardAction::ToggleWishlist {
            product: product.clone(),
        })
    }

    pub fn complete_style_quiz(&mut self, archetype: StyleArchetype) -> RewardOutcome {
        self.dispatch(RewardAction::CompleteStyleQuiz { archetype })
    }

    pub fn reset_store(&mut self) -> RewardOutcome {
        self.dispatch(RewardAction::Reset)
    }

    /// Writes are fire-and-forget: a failing store is logged, never surfaced.
    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to serialize reward state: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(REWARD_STATE_KEY, &json) {
            log::warn!("failed to persist reward state: {err}");
        }
    }
}

fn read_state<S: KeyValueStore>(store: &S) -> anyhow::Result<Option<RewardState>> {
    let Some(json) = store
        .get(REWARD_STATE_KEY)
        .context("reading reward state")?
    else {
        return Ok(None);
    };
    let state = RewardState::from_json(&json).context("parsing reward state")?;
    anyhow::ensure!(
        state.bingo_card.is_well_formed(),
        "stored bingo card is malformed"
    );
    Ok(Some(state))
}
