//! ChicPlay Engine
//!
//! Platform-agnostic core for the ChicPlay storefront's engagement layer.
//! The crate owns the reward state machine (points, levels, streaks, bingo
//! card) and, behind the default `imaging` feature, the garment compositing
//! pipeline (background removal and dress blending). UI and storefront
//! plumbing live elsewhere and talk to this crate through the types
//! re-exported below.

#[cfg(feature = "imaging")]
pub mod cache;
pub mod config;
#[cfg(feature = "imaging")]
pub mod imaging;
pub mod numbers;
pub mod product;
pub mod rewards;
pub mod storage;

pub use config::ChicplayConfig;
pub use product::Product;
pub use rewards::{
    Achievement, ActionContext, ActionType, BingoCard, Pattern, Prize, RewardAction, RewardConfig,
    RewardEngine, RewardEvent, RewardOutcome, RewardState, Square, SquareDetails, StyleArchetype,
    StyleProfile, WheelPrize, level_for_experience,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

#[cfg(feature = "imaging")]
pub use cache::CoalescingCache;
#[cfg(feature = "imaging")]
pub use imaging::{
    BackgroundRemovalService, BlendMode, BlendOptions, BodyConfig, BodyType, DefaultImageSource,
    DressBlendResult, DressBlender, HttpSegmenter, ImageSource, ImagingConfig, ImagingError,
    ModelSize, NoModel, Positioning, ProgressSink, RemovalOptions, SegmentationModel, Shadows,
};
