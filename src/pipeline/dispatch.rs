use super::{DamageModificationContext, DamagePipeline, EventDirection, HitContext};
use crate::error::PipelineError;
use crate::world::World;
use tracing::{error, trace};

impl DamagePipeline {
    /// Deliver a hit to both the applied and the received side.
    ///
    /// Refused outright if either actor is gone; nobody hears about a hit
    /// half of which no longer exists.
    pub fn on_hit_event(&mut self, world: &World, ctx: &HitContext) -> bool {
        if let Err(e) = validate_hit(world, ctx) {
            error!("hit event refused: {e}");
            return false;
        }
        self.hits.dispatch(EventDirection::Applied, ctx);
        self.hits.dispatch(EventDirection::Received, ctx);
        true
    }

    /// Entry point for trace collaborators; same as [`Self::on_hit_event`].
    pub fn send_hit_request(&mut self, world: &World, ctx: &HitContext) -> bool {
        self.on_hit_event(world, ctx)
    }

    pub fn broadcast_damage_applied(&mut self, ctx: &DamageModificationContext) {
        let delivered = self.damage.dispatch(EventDirection::Applied, ctx);
        trace!("damage applied delivered to {delivered} listeners");
    }

    pub fn broadcast_damage_received(&mut self, ctx: &DamageModificationContext) {
        let delivered = self.damage.dispatch(EventDirection::Received, ctx);
        trace!("damage received delivered to {delivered} listeners");
    }

    pub fn broadcast_healing_applied(&mut self, ctx: &DamageModificationContext) {
        let delivered = self.healing.dispatch(EventDirection::Applied, ctx);
        trace!("healing applied delivered to {delivered} listeners");
    }

    pub fn broadcast_healing_received(&mut self, ctx: &DamageModificationContext) {
        let delivered = self.healing.dispatch(EventDirection::Received, ctx);
        trace!("healing received delivered to {delivered} listeners");
    }
}

fn validate_hit(world: &World, ctx: &HitContext) -> Result<(), PipelineError> {
    if !world.is_alive(ctx.target) {
        return Err(PipelineError::InvalidActor {
            role: "target",
            id: ctx.target,
        });
    }
    if !world.is_alive(ctx.instigator) {
        return Err(PipelineError::InvalidActor {
            role: "instigator",
            id: ctx.instigator,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Listener;
    use crate::settings::PipelineSettings;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_hit_reaches_both_directions() {
        let mut world = World::new();
        let target = world.spawn("target", None);
        let instigator = world.spawn("instigator", None);
        let mut pipeline = DamagePipeline::new(PipelineSettings::default());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener = Listener::new("vfx");
        let s = seen.clone();
        pipeline.hit_events().register_dynamic(EventDirection::Applied, &listener, move |_| {
            s.borrow_mut().push(EventDirection::Applied)
        });
        let s = seen.clone();
        pipeline.hit_events().register_dynamic(EventDirection::Received, &listener, move |_| {
            s.borrow_mut().push(EventDirection::Received)
        });

        assert!(pipeline.on_hit_event(&world, &HitContext::new(target, instigator)));
        assert_eq!(
            *seen.borrow(),
            vec![EventDirection::Applied, EventDirection::Received]
        );
    }

    #[test]
    fn test_hit_with_dead_actor_is_refused() {
        let mut world = World::new();
        let target = world.spawn("target", None);
        let instigator = world.spawn("instigator", None);
        let mut pipeline = DamagePipeline::default();

        let seen = Rc::new(RefCell::new(0));
        let s = seen.clone();
        pipeline.hit_events().on_applied.subscribe(move |_| *s.borrow_mut() += 1);

        world.despawn(instigator);
        assert!(!pipeline.send_hit_request(&world, &HitContext::new(target, instigator)));
        assert_eq!(*seen.borrow(), 0);
    }
}
