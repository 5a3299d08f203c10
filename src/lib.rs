//! Damage pipeline: hit, damage and healing events for ability-driven combat.
//!
//! Producers (effect executions, traces, abilities) hand the [`DamagePipeline`]
//! a request or a context record; the pipeline resolves it against the
//! [`World`]'s attribute sets and fans the outcome out to every registered
//! listener, once per event, on separate *applied* and *received* channels.
//!
//! Nothing here is global. Build a [`World`] and a [`DamagePipeline`], keep them
//! together, and pass them by reference to whoever produces or consumes events.

pub mod attributes;
pub mod effects;
pub mod error;
pub mod pipeline;
pub mod settings;
pub mod world;

#[cfg(feature = "bevy")]
pub mod plugin;

pub use damage_pipeline_shared as shared;
pub use damage_pipeline_shared::combat::HitResult;
pub use damage_pipeline_shared::tags::{self, GameplayTag, TagContainer};

pub use error::{PipelineError, SettingsError};
pub use pipeline::{
    Callback, DamageLog, DamageLogEntry, DamageModificationContext, DamagePipeline,
    DamagePipelineContext, DamagePipelineType, EffectOverTimeContext, EventCategory,
    EventDirection, HitContext, Listener, ListenerRef, ListenerRegistry, ListenerToken, Multicast,
    SubscriptionId, TargetData, TargetDataHandle, ThreadRoll,
};
pub use settings::{KillReward, PipelineSettings};
pub use world::{AbilitySystem, Actor, ActorId, ActorUid, GameplayEvent, World};
