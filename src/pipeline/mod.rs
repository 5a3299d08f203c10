//! The damage pipeline: listener registries, dispatch, and the applicator
//! that turns damage and healing requests into attribute changes.

mod applicator;
mod dispatch;
mod log;
mod registry;
mod types;

pub use log::{DAMAGE_IDS, DamageIdGenerator, DamageLog, DamageLogEntry};
pub use registry::{
    Callback, Listener, ListenerRef, ListenerRegistry, ListenerToken, Multicast, SubscriptionId,
};
pub use types::{
    DamageModificationContext, DamagePipelineContext, DamagePipelineType, EffectOverTimeContext,
    EventCategory, EventDirection, HitContext, TargetData, TargetDataHandle,
};

use crate::settings::PipelineSettings;
use crate::world::World;
use damage_pipeline_shared::rng::Roll;
use rand::Rng;
use tracing::debug;

/// Critical rolls from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRoll;

impl Roll for ThreadRoll {
    fn roll(&mut self) -> f32 {
        rand::rng().random::<f32>()
    }
}

/// Event hub for hits, damage and healing in one world.
///
/// Owned by whoever owns the [`World`] and passed by reference to producers
/// and consumers. Callbacks are plain `FnMut` boxes and listener identities
/// are `Rc`-based, so the pipeline never leaves the simulation thread.
pub struct DamagePipeline {
    settings: PipelineSettings,
    hits: ListenerRegistry<HitContext>,
    damage: ListenerRegistry<DamageModificationContext>,
    healing: ListenerRegistry<DamageModificationContext>,
    log: DamageLog,
    roll: Box<dyn Roll>,
}

impl Default for DamagePipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

impl DamagePipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self::with_roller(settings, ThreadRoll)
    }

    /// Build a pipeline that takes critical rolls from `roll`.
    pub fn with_roller(settings: PipelineSettings, roll: impl Roll + 'static) -> Self {
        debug!("damage pipeline created with {settings:?}");
        Self {
            log: DamageLog::with_capacity(settings.damage_log_capacity),
            settings,
            hits: ListenerRegistry::default(),
            damage: ListenerRegistry::default(),
            healing: ListenerRegistry::default(),
            roll: Box::new(roll),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn set_roller(&mut self, roll: impl Roll + 'static) {
        self.roll = Box::new(roll);
    }

    pub fn hit_events(&mut self) -> &mut ListenerRegistry<HitContext> {
        &mut self.hits
    }

    pub fn damage_events(&mut self) -> &mut ListenerRegistry<DamageModificationContext> {
        &mut self.damage
    }

    pub fn healing_events(&mut self) -> &mut ListenerRegistry<DamageModificationContext> {
        &mut self.healing
    }

    /// Registrations held for `category`, both directions.
    pub fn listeners_in(&self, category: EventCategory) -> usize {
        match category {
            EventCategory::Hit => self.hits.len(),
            EventCategory::Damage => self.damage.len(),
            EventCategory::Healing => self.healing.len(),
        }
    }

    /// Registrations held across all categories.
    pub fn listener_count(&self) -> usize {
        [EventCategory::Hit, EventCategory::Damage, EventCategory::Healing]
            .into_iter()
            .map(|category| self.listeners_in(category))
            .sum()
    }

    /// Drop every registration `listener` holds, in every category and
    /// direction.
    pub fn unregister_all(&mut self, listener: impl Into<ListenerRef>) -> usize {
        let listener = listener.into();
        self.hits.unregister_all(&listener)
            + self.damage.unregister_all(&listener)
            + self.healing.unregister_all(&listener)
    }

    pub fn damage_log(&self) -> &DamageLog {
        &self.log
    }

    pub fn damage_log_mut(&mut self) -> &mut DamageLog {
        &mut self.log
    }

    /// Clear every registry and the damage log.
    pub fn teardown(&mut self) {
        self.hits.clear();
        self.damage.clear();
        self.healing.clear();
        self.log.clear();
        debug!("damage pipeline torn down");
    }

    /// Advance the world by `dt` seconds.
    ///
    /// Runs the commands queued for this tick, then every periodic execution
    /// that fell due, then drops expired effects. Commands queued while this
    /// runs wait for the next call.
    pub fn tick(&mut self, world: &mut World, dt: f32) {
        world.advance_time(dt);

        for command in world.take_next_tick() {
            command(world, self);
        }

        self.tick_active_effects(world, dt);
    }
}
