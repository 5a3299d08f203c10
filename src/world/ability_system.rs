use super::ActorId;
use crate::attributes::HealthAttributeSet;
use crate::effects::{ActiveEffect, EffectHandle};
use damage_pipeline_shared::tags::{GameplayTag, TagContainer, names};
use smol_str::SmolStr;
use std::collections::HashMap;

/// A gameplay event sent to an ability system, for abilities and AI to react to.
#[derive(Debug, Clone, PartialEq)]
pub struct GameplayEvent {
    pub tag: GameplayTag,
    pub instigator: Option<ActorId>,
    pub target: Option<ActorId>,
    pub magnitude: f32,
}

/// Per-actor combat state: attributes, owned tags, resources and the effects
/// currently running on the actor.
#[derive(Debug, Default)]
pub struct AbilitySystem {
    pub health: HealthAttributeSet,
    pub owned_tags: TagContainer,
    resources: HashMap<SmolStr, f32>,
    pub(crate) active_effects: Vec<ActiveEffect>,
    events: Vec<GameplayEvent>,
    next_effect: u32,
}

impl AbilitySystem {
    pub fn with_health(health: f32) -> Self {
        Self {
            health: HealthAttributeSet::new(health),
            ..Default::default()
        }
    }

    pub fn is_dead(&self) -> bool {
        self.owned_tags.has_tag(&GameplayTag::new(names::STATUS_DEATH))
    }

    pub(crate) fn mark_dead(&mut self) {
        self.owned_tags.add(GameplayTag::new(names::STATUS_DEATH));
    }

    // ============================================================================
    // RESOURCES
    // ============================================================================

    pub fn resource(&self, name: &str) -> f32 {
        self.resources.get(name).copied().unwrap_or_default()
    }

    pub fn add_resource(&mut self, name: &str, amount: f32) {
        *self.resources.entry(SmolStr::new(name)).or_default() += amount;
    }

    // ============================================================================
    // GAMEPLAY EVENTS
    // ============================================================================

    pub fn send_gameplay_event(&mut self, event: GameplayEvent) {
        self.events.push(event);
    }

    pub fn gameplay_events(&self) -> &[GameplayEvent] {
        &self.events
    }

    /// Count of received events carrying exactly `tag`.
    pub fn count_events(&self, tag: &str) -> usize {
        self.events.iter().filter(|e| e.tag.as_str() == tag).count()
    }

    pub fn drain_gameplay_events(&mut self) -> Vec<GameplayEvent> {
        std::mem::take(&mut self.events)
    }

    // ============================================================================
    // EFFECTS
    // ============================================================================

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active_effects
    }

    pub fn active_effect(&self, handle: EffectHandle) -> Option<&ActiveEffect> {
        self.active_effects.iter().find(|e| e.handle == handle)
    }

    /// Cancel a running effect; it stops ticking immediately.
    pub fn remove_active_effect(&mut self, handle: EffectHandle) -> bool {
        let before = self.active_effects.len();
        self.active_effects.retain(|e| e.handle != handle);
        before != self.active_effects.len()
    }

    pub(crate) fn next_effect_handle(&mut self) -> EffectHandle {
        self.next_effect += 1;
        EffectHandle(self.next_effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources_accumulate() {
        let mut asc = AbilitySystem::with_health(50.0);
        assert_eq!(asc.resource("CardEnergy"), 0.0);
        asc.add_resource("CardEnergy", 1.0);
        asc.add_resource("CardEnergy", 2.0);
        assert_eq!(asc.resource("CardEnergy"), 3.0);
    }

    #[test]
    fn test_death_is_an_owned_tag() {
        let mut asc = AbilitySystem::with_health(50.0);
        assert!(!asc.is_dead());
        asc.mark_dead();
        asc.mark_dead();
        assert!(asc.is_dead());
        assert_eq!(asc.owned_tags.len(), 1);
    }

    #[test]
    fn test_events_are_counted_by_exact_tag() {
        let mut asc = AbilitySystem::default();
        asc.send_gameplay_event(GameplayEvent {
            tag: names::EVENT_ON_DEATH.into(),
            instigator: None,
            target: None,
            magnitude: 0.0,
        });
        assert_eq!(asc.count_events(names::EVENT_ON_DEATH), 1);
        assert_eq!(asc.count_events(names::EVENT_ON_DEATH_DEALT), 0);
        assert_eq!(asc.drain_gameplay_events().len(), 1);
        assert!(asc.gameplay_events().is_empty());
    }
}
