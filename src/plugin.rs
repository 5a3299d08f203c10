//! Bevy integration: keeps a world and its pipeline ticking from `Update`.
//!
//! The pipeline is single-threaded, so it lives in a non-send resource and
//! every system touching it runs on the main thread.

use crate::{DamagePipeline, PipelineSettings, World, settings::SETTINGS_PATH};
use bevy::prelude::*;

/// The combat world and the pipeline serving it.
#[derive(Default)]
pub struct CombatState {
    pub world: World,
    pub pipeline: DamagePipeline,
}

pub fn plugin(app: &mut App) {
    let settings = PipelineSettings::load_or_default(SETTINGS_PATH);
    app.insert_non_send_resource(CombatState {
        world: World::new(),
        pipeline: DamagePipeline::new(settings),
    });
    app.add_systems(Update, tick_combat);
}

fn tick_combat(mut state: NonSendMut<CombatState>, time: Res<Time>) {
    let CombatState { world, pipeline } = &mut *state;
    pipeline.tick(world, time.delta_secs());
}
