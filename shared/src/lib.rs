//! Engine-agnostic combat math shared by the damage pipeline and its tools.
//!
//! Nothing in here knows about actors, listeners or time. The pipeline crate
//! feeds captured attribute values in and commits whatever comes out.

pub mod combat;
pub mod execution;
pub mod rng;
pub mod tags;

pub use execution::{
    DamageExecutionInput, HealingExecutionInput, ResolvedDamage, resolve_damage, resolve_healing,
};
pub use rng::Roll;
pub use tags::{GameplayTag, TagContainer};
