//! Context records handed to listeners, and the parameters callers use to
//! build modifications.

use crate::world::ActorId;
use damage_pipeline_shared::combat::HitResult;
use damage_pipeline_shared::tags::{GameplayTag, TagContainer};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamagePipelineType {
    Damage,
    Healing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Hit,
    Damage,
    Healing,
}

/// Applied events are the instigator's side of an interaction, received
/// events are the target's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventDirection {
    Applied,
    Received,
}

// ============================================================================
// HIT CONTEXT
// ============================================================================

/// A single physical or logical contact between two actors.
///
/// Actor handles are checked for liveness before any dispatch. Tag sets are
/// owned copies, so a context stays valid after the call that built it.
#[derive(Clone, Debug, PartialEq)]
pub struct HitContext {
    pub target: ActorId,
    pub instigator: ActorId,
    pub source_object: Option<ActorId>,
    pub target_tags: TagContainer,
    pub instigator_tags: TagContainer,
    pub context_tags: TagContainer,
    pub hit_result: HitResult,
    /// Seconds since world start.
    pub timestamp: f32,
}

impl HitContext {
    pub fn new(target: ActorId, instigator: ActorId) -> Self {
        Self {
            target,
            instigator,
            source_object: None,
            target_tags: TagContainer::default(),
            instigator_tags: TagContainer::default(),
            context_tags: TagContainer::default(),
            hit_result: HitResult::default(),
            timestamp: 0.0,
        }
    }

    pub fn with_hit_result(mut self, hit_result: HitResult) -> Self {
        self.hit_result = hit_result;
        self
    }

    pub fn with_context_tags(mut self, tags: TagContainer) -> Self {
        self.context_tags = tags;
        self
    }

    pub fn at(mut self, timestamp: f32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn hit_target_tags(&self) -> TagContainer {
        self.target_tags.clone()
    }

    pub fn hit_instigator_tags(&self) -> TagContainer {
        self.instigator_tags.clone()
    }

    pub fn hit_context_tags(&self) -> TagContainer {
        self.context_tags.clone()
    }

    /// The stored hit result, or an empty one if it was not a blocking hit.
    pub fn hit_result_copy(&self) -> HitResult {
        self.hit_result.blocking_or_default()
    }
}

// ============================================================================
// MODIFICATION CONTEXT
// ============================================================================

/// Outcome of one resolved damage or healing modification.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageModificationContext {
    pub hit: HitContext,
    pub pipeline_type: DamagePipelineType,
    pub damage_type: Option<GameplayTag>,
    /// Target health after the modification was committed.
    pub new_value: f32,
    /// Magnitude of the modification, never negative. Whether it took health
    /// away or gave it back is `pipeline_type`'s call.
    pub delta_value: f32,
    pub is_critical: bool,
    pub damage_resisted: bool,
    pub over_time: bool,
    pub killed_target: bool,
}

impl DamageModificationContext {
    pub fn new(hit: HitContext, pipeline_type: DamagePipelineType, delta_value: f32) -> Self {
        Self {
            hit,
            pipeline_type,
            damage_type: None,
            new_value: 0.0,
            delta_value: delta_value.max(0.0),
            is_critical: false,
            damage_resisted: false,
            over_time: false,
            killed_target: false,
        }
    }

    /// Change to target health: negative for damage, positive for healing.
    pub fn signed_delta(&self) -> f32 {
        match self.pipeline_type {
            DamagePipelineType::Damage => -self.delta_value,
            DamagePipelineType::Healing => self.delta_value,
        }
    }

    pub fn hit_context_copy(&self) -> HitContext {
        self.hit.clone()
    }

    pub fn hit_target_tags(&self) -> TagContainer {
        self.hit.hit_target_tags()
    }

    pub fn hit_instigator_tags(&self) -> TagContainer {
        self.hit.hit_instigator_tags()
    }

    pub fn hit_context_tags(&self) -> TagContainer {
        self.hit.hit_context_tags()
    }

    pub fn hit_result_copy(&self) -> HitResult {
        self.hit.hit_result_copy()
    }
}

// ============================================================================
// CONSTRUCTION PARAMETERS
// ============================================================================

/// Caller intent for a damage or healing application.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DamagePipelineContext {
    pub damage_type: Option<GameplayTag>,
    pub granted_tags: TagContainer,
    pub hit_result: Option<HitResult>,
    pub source_object: Option<ActorId>,
}

impl DamagePipelineContext {
    pub fn with_damage_type(mut self, damage_type: impl Into<GameplayTag>) -> Self {
        self.damage_type = Some(damage_type.into());
        self
    }

    pub fn with_granted_tag(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.granted_tags.add(tag.into());
        self
    }

    pub fn with_hit_result(mut self, hit_result: HitResult) -> Self {
        self.hit_result = Some(hit_result);
        self
    }

    pub fn with_source_object(mut self, source: ActorId) -> Self {
        self.source_object = Some(source);
        self
    }
}

/// Period and duration for over-time applications, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EffectOverTimeContext {
    pub period: f32,
    pub duration: f32,
}

impl EffectOverTimeContext {
    pub fn new(period: f32, duration: f32) -> Self {
        Self { period, duration }
    }
}

// ============================================================================
// TARGET DATA
// ============================================================================

/// One multi-target selection entry: the actors it addresses and, optionally,
/// the trace hit that produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetData {
    pub actors: Vec<ActorId>,
    pub hit_result: Option<HitResult>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetDataHandle {
    pub data: Vec<TargetData>,
}

impl TargetDataHandle {
    pub fn from_actors(actors: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            data: vec![TargetData {
                actors: actors.into_iter().collect(),
                hit_result: None,
            }],
        }
    }

    pub fn push(&mut self, data: TargetData) {
        self.data.push(data);
    }

    /// First hit result carried by any entry.
    pub fn first_hit_result(&self) -> Option<&HitResult> {
        self.data.iter().find_map(|d| d.hit_result.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|d| d.actors.is_empty())
    }
}
