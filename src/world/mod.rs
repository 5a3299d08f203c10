//! Actors, world time and the next-tick timer queue.
//!
//! Actors live in a generational table: an [`ActorId`] stays valid only as
//! long as the slot it points at keeps the same generation, so a handle to a
//! destroyed actor can never resolve to whoever reuses the slot. Each actor
//! also gets an [`ActorUid`] that is never reused, used wherever a record has
//! to outlive the actor (the damage log).

mod ability_system;

pub use ability_system::{AbilitySystem, GameplayEvent};

use crate::pipeline::DamagePipeline;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{collections::VecDeque, fmt};
use tracing::debug;

/// Liveness-checked handle into the world's actor table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

/// Stable per-actor id. Survives the actor and is never handed out twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorUid(pub u32);

impl fmt::Display for ActorUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Actor {
    pub uid: ActorUid,
    pub name: SmolStr,
    pub ability_system: Option<AbilitySystem>,
}

struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

/// Work deferred to the next world tick.
pub type TimerCommand = Box<dyn FnOnce(&mut World, &mut DamagePipeline)>;

#[derive(Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_uid: u32,
    time: f32,
    next_tick: VecDeque<TimerCommand>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the world started.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn spawn(
        &mut self,
        name: impl Into<SmolStr>,
        ability_system: Option<AbilitySystem>,
    ) -> ActorId {
        self.next_uid += 1;
        let actor = Actor {
            uid: ActorUid(self.next_uid),
            name: name.into(),
            ability_system,
        };
        debug!("spawned actor '{}' {}", actor.name, actor.uid);

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            return ActorId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            actor: Some(actor),
        });
        ActorId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Convenience for the common case: an actor with a fresh ability system.
    pub fn spawn_combatant(&mut self, name: impl Into<SmolStr>, health: f32) -> ActorId {
        self.spawn(name, Some(AbilitySystem::with_health(health)))
    }

    /// Remove an actor. Every outstanding handle to it goes stale.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        let slot = self.slot_mut(id)?;
        let actor = slot.actor.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        debug!("despawned actor '{}' {}", actor.name, actor.uid);
        Some(actor)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.actor.as_ref()
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slot_mut(id)?.actor.as_mut()
    }

    pub fn uid(&self, id: ActorId) -> Option<ActorUid> {
        self.get(id).map(|a| a.uid)
    }

    pub fn ability_system(&self, id: ActorId) -> Option<&AbilitySystem> {
        self.get(id)?.ability_system.as_ref()
    }

    pub fn ability_system_mut(&mut self, id: ActorId) -> Option<&mut AbilitySystem> {
        self.get_mut(id)?.ability_system.as_mut()
    }

    pub fn find_by_uid(&self, uid: ActorUid) -> Option<ActorId> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let actor = slot.actor.as_ref()?;
            (actor.uid == uid).then_some(ActorId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// Handles of every live actor, in table order.
    pub fn actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.actor.as_ref().map(|_| ActorId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    // ============================================================================
    // TIMERS
    // ============================================================================

    /// Queue `command` for the next tick. Commands queued while a tick is
    /// running wait for the tick after.
    pub fn set_timer_for_next_tick(
        &mut self,
        command: impl FnOnce(&mut World, &mut DamagePipeline) + 'static,
    ) {
        self.next_tick.push_back(Box::new(command));
    }

    pub fn pending_timers(&self) -> usize {
        self.next_tick.len()
    }

    pub(crate) fn advance_time(&mut self, dt: f32) {
        self.time += dt.max(0.0);
    }

    pub(crate) fn take_next_tick(&mut self) -> VecDeque<TimerCommand> {
        std::mem::take(&mut self.next_tick)
    }

    fn slot_mut(&mut self, id: ActorId) -> Option<&mut Slot> {
        let slot = self.slots.get_mut(id.index as usize)?;
        (slot.generation == id.generation).then_some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_despawned_handle_goes_stale() {
        let mut world = World::new();
        let a = world.spawn_combatant("a", 100.0);
        assert!(world.is_alive(a));
        assert!(world.despawn(a).is_some());
        assert!(!world.is_alive(a));
        assert!(world.despawn(a).is_none());
    }

    #[test]
    fn test_reused_slot_does_not_revive_old_handle() {
        let mut world = World::new();
        let a = world.spawn_combatant("a", 100.0);
        world.despawn(a);
        let b = world.spawn_combatant("b", 100.0);
        assert!(!world.is_alive(a));
        assert!(world.is_alive(b));
        assert_ne!(world.uid(b), Some(ActorUid(1)));
    }

    #[test]
    fn test_uids_are_stable_and_searchable() {
        let mut world = World::new();
        let a = world.spawn("a", None);
        let b = world.spawn("b", None);
        assert_eq!(world.uid(a), Some(ActorUid(1)));
        assert_eq!(world.find_by_uid(ActorUid(2)), Some(b));
        assert_eq!(world.find_by_uid(ActorUid(9)), None);
        assert!(world.ability_system(a).is_none());
    }

    #[test]
    fn test_time_never_runs_backwards() {
        let mut world = World::new();
        world.advance_time(0.5);
        world.advance_time(-1.0);
        assert_eq!(world.time(), 0.5);
    }
}
