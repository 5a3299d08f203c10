//! Turns damage and healing requests into attribute changes.
//!
//! Every public `apply_*` path builds a [`ModificationSpec`] and funnels into
//! one internal damage or heal primitive. Instant specs execute right away;
//! specs with a duration become an [`ActiveEffect`] on the target that
//! executes once now and then on every period boundary from [`DamagePipeline::tick`].

use super::{
    DAMAGE_IDS, DamageLogEntry, DamageModificationContext, DamagePipeline, DamagePipelineContext,
    DamagePipelineType, EffectOverTimeContext, HitContext, TargetDataHandle,
};
use crate::attributes::HealthAttribute;
use crate::effects::{ActiveEffect, DurationPolicy, EffectHandle, ModificationSpec};
use crate::error::PipelineError;
use crate::world::{AbilitySystem, ActorId, GameplayEvent, World};
use damage_pipeline_shared::combat::HitResult;
use damage_pipeline_shared::execution::{
    DamageExecutionInput, HealingExecutionInput, ResolvedDamage, resolve_damage, resolve_healing,
};
use damage_pipeline_shared::tags::{GameplayTag, names};
use std::collections::BTreeMap;
use tracing::{debug, warn};

impl DamagePipeline {
    // ============================================================================
    // DAMAGE
    // ============================================================================

    pub fn apply_damage_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        damage: f32,
        context: &DamagePipelineContext,
    ) -> bool {
        self.apply_internal(
            world,
            target,
            instigator,
            DamagePipelineType::Damage,
            damage,
            context,
            DurationPolicy::Instant,
        )
    }

    /// Damage every `over_time.period` seconds for `over_time.duration`
    /// seconds. The first tick's result, crit included, is reused by the rest.
    pub fn apply_damage_over_time_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        damage: f32,
        context: &DamagePipelineContext,
        over_time: &EffectOverTimeContext,
    ) -> bool {
        self.apply_internal(
            world,
            target,
            instigator,
            DamagePipelineType::Damage,
            damage,
            context,
            DurationPolicy::from_over_time(over_time),
        )
    }

    pub fn apply_damage_to_target_data_handle(
        &mut self,
        world: &mut World,
        handle: &TargetDataHandle,
        instigator: ActorId,
        damage: f32,
        context: &DamagePipelineContext,
    ) -> bool {
        self.apply_to_data_handle(
            world,
            handle,
            instigator,
            DamagePipelineType::Damage,
            damage,
            context,
        )
    }

    /// Stamp physical damage type and `hit_result` onto `context`, then apply.
    pub fn apply_physical_damage_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        damage: f32,
        hit_result: &HitResult,
        context: &mut DamagePipelineContext,
    ) -> bool {
        stamp_damage_type(context, names::DAMAGE_TYPE_PHYSICAL, hit_result);
        self.apply_damage_to_target(world, target, instigator, damage, context)
    }

    /// Stamp fire damage type and `hit_result` onto `context`, optionally
    /// granting a burn stack, then apply.
    pub fn apply_fire_damage_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        damage: f32,
        hit_result: &HitResult,
        context: &mut DamagePipelineContext,
        apply_burn_stack: bool,
    ) -> bool {
        stamp_damage_type(context, names::DAMAGE_TYPE_FIRE, hit_result);
        if apply_burn_stack {
            context
                .granted_tags
                .add(GameplayTag::new(names::STATUS_BURN_STACK));
        }
        self.apply_damage_to_target(world, target, instigator, damage, context)
    }

    // ============================================================================
    // HEALING
    // ============================================================================

    pub fn apply_heal_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        heal: f32,
        context: &DamagePipelineContext,
    ) -> bool {
        self.apply_internal(
            world,
            target,
            instigator,
            DamagePipelineType::Healing,
            heal,
            context,
            DurationPolicy::Instant,
        )
    }

    pub fn apply_heal_over_time_to_target(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        heal: f32,
        context: &DamagePipelineContext,
        over_time: &EffectOverTimeContext,
    ) -> bool {
        self.apply_internal(
            world,
            target,
            instigator,
            DamagePipelineType::Healing,
            heal,
            context,
            DurationPolicy::from_over_time(over_time),
        )
    }

    pub fn apply_heal_to_target_data_handle(
        &mut self,
        world: &mut World,
        handle: &TargetDataHandle,
        instigator: ActorId,
        heal: f32,
        context: &DamagePipelineContext,
    ) -> bool {
        self.apply_to_data_handle(
            world,
            handle,
            instigator,
            DamagePipelineType::Healing,
            heal,
            context,
        )
    }

    // ============================================================================
    // REPLAY
    // ============================================================================

    /// Re-run a logged modification against the same actors.
    ///
    /// Logged attributes are swapped in for the replay and restored
    /// afterwards: source-side ones on the instigator, resistance and healing
    /// coefficients on the target. The replayed context carries
    /// `Damage.Modifier.DebugSimulated`.
    pub fn simulate_damage_from_id(&mut self, world: &mut World, damage_id: u32) -> bool {
        match self.try_simulate(world, damage_id) {
            Ok(applied) => applied,
            Err(e) => {
                warn!("unable to simulate damage {damage_id}: {e}");
                false
            }
        }
    }

    fn try_simulate(&mut self, world: &mut World, damage_id: u32) -> Result<bool, PipelineError> {
        let entry = self
            .log
            .entry_by_id(damage_id)
            .cloned()
            .ok_or(PipelineError::UnknownDamageId(damage_id))?;
        let target = world
            .find_by_uid(entry.target_id)
            .ok_or(PipelineError::UnknownActorUid(entry.target_id.0))?;
        let instigator = world
            .find_by_uid(entry.instigator_id)
            .ok_or(PipelineError::UnknownActorUid(entry.instigator_id.0))?;

        let root = GameplayTag::new(names::DAMAGE_TYPE_ROOT);
        let mut context = DamagePipelineContext {
            damage_type: entry.context_tags.first_matching(&root).cloned(),
            granted_tags: entry.context_tags.clone(),
            ..Default::default()
        };
        context
            .granted_tags
            .add(GameplayTag::new(names::DAMAGE_DEBUG_SIMULATED));

        let (from_target, from_source): (BTreeMap<_, _>, BTreeMap<_, _>) = entry
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .partition(|(name, _)| {
                HealthAttribute::from_name(name).is_some_and(HealthAttribute::is_target_captured)
            });

        let source_backup = override_attributes(world, instigator, "instigator", &from_source)?;
        let target_backup = override_attributes(world, target, "target", &from_target)?;
        debug!("simulating damage {damage_id}");
        let applied = if entry.is_damage {
            self.apply_damage_to_target(world, target, instigator, entry.base_value, &context)
        } else {
            self.apply_heal_to_target(world, target, instigator, entry.base_value, &context)
        };
        override_attributes(world, target, "target", &target_backup)?;
        override_attributes(world, instigator, "instigator", &source_backup)?;
        Ok(applied)
    }

    // ============================================================================
    // INTERNAL
    // ============================================================================

    fn apply_to_data_handle(
        &mut self,
        world: &mut World,
        handle: &TargetDataHandle,
        instigator: ActorId,
        kind: DamagePipelineType,
        magnitude: f32,
        context: &DamagePipelineContext,
    ) -> bool {
        if let Err(e) = ability_system(world, instigator, "instigator") {
            warn!("{kind:?} not applied to target data: {e}");
            return false;
        }

        let first_hit = handle.first_hit_result().cloned();
        let mut any_applied = false;
        for data in &handle.data {
            let mut ctx = context.clone();
            if let Some(hit) = data.hit_result.clone().or_else(|| first_hit.clone()) {
                ctx.hit_result = Some(hit);
            }
            for &target in &data.actors {
                any_applied |= self.apply_internal(
                    world,
                    target,
                    instigator,
                    kind,
                    magnitude,
                    &ctx,
                    DurationPolicy::Instant,
                );
            }
        }
        any_applied
    }

    fn apply_internal(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        kind: DamagePipelineType,
        magnitude: f32,
        context: &DamagePipelineContext,
        policy: DurationPolicy,
    ) -> bool {
        match self.try_apply(world, target, instigator, kind, magnitude, context, policy) {
            Ok(applied) => applied,
            Err(e) => {
                warn!("{kind:?} not applied: {e}");
                false
            }
        }
    }

    fn try_apply(
        &mut self,
        world: &mut World,
        target: ActorId,
        instigator: ActorId,
        kind: DamagePipelineType,
        magnitude: f32,
        context: &DamagePipelineContext,
        policy: DurationPolicy,
    ) -> Result<bool, PipelineError> {
        ability_system(world, instigator, "instigator")?;
        ability_system(world, target, "target")?;
        if magnitude <= 0.0 {
            return Err(PipelineError::NonPositiveMagnitude(magnitude));
        }

        let spec = ModificationSpec::new(kind, instigator, magnitude, context, policy);
        if policy.is_instant() {
            return self.execute(world, target, &spec, &mut None);
        }

        let asc = ability_system_mut(world, target, "target")?;
        let handle = asc.next_effect_handle();
        asc.active_effects.push(ActiveEffect::new(handle, spec));
        debug!("{kind:?} effect {handle:?} applied with {policy:?}");
        self.execute_active_effect(world, target, handle);
        Ok(true)
    }

    fn execute(
        &mut self,
        world: &mut World,
        target: ActorId,
        spec: &ModificationSpec,
        cache: &mut Option<ResolvedDamage>,
    ) -> Result<bool, PipelineError> {
        match spec.kind {
            DamagePipelineType::Damage => self.execute_damage(world, target, spec, cache),
            DamagePipelineType::Healing => self.execute_healing(world, target, spec),
        }
    }

    /// Run one execution of a running effect and store its cache back.
    fn execute_active_effect(&mut self, world: &mut World, target: ActorId, handle: EffectHandle) {
        let Some(effect) = world
            .ability_system(target)
            .and_then(|asc| asc.active_effect(handle))
        else {
            return;
        };
        let spec = effect.spec.clone();
        let mut cache = effect.cached.clone();

        if let Err(e) = self.execute(world, target, &spec, &mut cache) {
            warn!("periodic {:?} effect {handle:?} skipped: {e}", spec.kind);
        }

        if let Some(effect) = world
            .ability_system_mut(target)
            .and_then(|asc| asc.active_effects.iter_mut().find(|e| e.handle == handle))
        {
            effect.cached = cache;
        }
    }

    pub(super) fn tick_active_effects(&mut self, world: &mut World, dt: f32) {
        let actors: Vec<ActorId> = world.actors().collect();

        let mut due = Vec::new();
        for &target in &actors {
            let Some(asc) = world.ability_system_mut(target) else {
                continue;
            };
            for effect in &mut asc.active_effects {
                let executions = effect.advance(dt);
                if executions > 0 {
                    due.push((target, effect.handle, executions));
                }
            }
        }

        for (target, handle, executions) in due {
            for _ in 0..executions {
                self.execute_active_effect(world, target, handle);
            }
        }

        for &target in &actors {
            let Some(asc) = world.ability_system_mut(target) else {
                continue;
            };
            asc.active_effects.retain(|effect| {
                let expired = effect.is_expired();
                if expired {
                    debug!("effect {:?} expired", effect.handle);
                }
                !expired
            });
        }
    }

    fn execute_damage(
        &mut self,
        world: &mut World,
        target: ActorId,
        spec: &ModificationSpec,
        cache: &mut Option<ResolvedDamage>,
    ) -> Result<bool, PipelineError> {
        let instigator = spec.instigator;
        let source = ability_system(world, instigator, "instigator")?;
        let mut input = DamageExecutionInput {
            base_damage: spec.magnitude,
            critical_chance: source.health.get(HealthAttribute::CriticalChance),
            critical_multiplier: source.health.get(HealthAttribute::CriticalDamageMultiplier),
            damage_multiplier: source.health.get(HealthAttribute::DamageMultiplier),
            ..Default::default()
        };
        let instigator_tags = source.owned_tags.clone();

        let victim = ability_system(world, target, "target")?;
        input.resistance = victim.health.get(HealthAttribute::DamageResistance);
        let target_tags = victim.owned_tags.clone();
        let was_alive = !victim.is_dead();

        let over_time = spec.is_damage_over_time();
        if over_time {
            input.cached = cache.clone();
        }
        let resolved = resolve_damage(&input, self.roll.as_mut());
        if !resolved.should_apply() {
            debug!("damage resolved to nothing, skipping");
            return Ok(false);
        }
        if over_time {
            *cache = Some(resolved.clone());
        }

        let dealt = GameplayEvent {
            tag: GameplayTag::new(names::EVENT_ON_DAMAGE_DEALT),
            instigator: Some(instigator),
            target: Some(target),
            magnitude: resolved.damage,
        };

        let victim = ability_system_mut(world, target, "target")?;
        if was_alive {
            victim.send_gameplay_event(dealt.clone());
        }
        victim
            .health
            .set(HealthAttribute::IncomingDamage, resolved.damage);
        let change = victim.health.post_execute(HealthAttribute::IncomingDamage);
        let killed = was_alive && change.after <= 0.0;
        if killed {
            victim.mark_dead();
            victim.send_gameplay_event(GameplayEvent {
                tag: GameplayTag::new(names::EVENT_ON_DEATH),
                ..dealt.clone()
            });
        }

        let source = ability_system_mut(world, instigator, "instigator")?;
        if was_alive {
            source.send_gameplay_event(dealt.clone());
        }
        if killed {
            source.send_gameplay_event(GameplayEvent {
                tag: GameplayTag::new(names::EVENT_ON_DEATH_DEALT),
                ..dealt
            });
            self.grant_kill_reward(source);
        }

        let mut context_tags = spec.dynamic_tags.clone();
        if resolved.is_crit {
            context_tags.add(GameplayTag::new(names::DAMAGE_CRITICAL));
        }
        let hit = HitContext {
            target,
            instigator,
            source_object: spec.context.source_object,
            target_tags,
            instigator_tags,
            context_tags,
            hit_result: spec.context.hit_result.clone().unwrap_or_default(),
            timestamp: world.time(),
        };
        let ctx = DamageModificationContext {
            damage_type: spec.damage_type(),
            new_value: change.after,
            is_critical: resolved.is_crit,
            damage_resisted: resolved.resisted,
            over_time: !spec.policy.is_instant(),
            killed_target: killed,
            ..DamageModificationContext::new(hit, DamagePipelineType::Damage, resolved.damage)
        };
        debug!(
            "damage {} -> {} on {target:?} (crit: {}, resisted: {}, killed: {killed})",
            resolved.base, resolved.damage, resolved.is_crit, resolved.resisted
        );

        self.broadcast_damage_applied(&ctx);
        self.broadcast_damage_received(&ctx);
        self.record(world, &ctx, resolved.base, &resolved.captured);

        if self.settings.lifesteal_echo && resolved.damage > 0.0 {
            schedule_lifesteal_echo(world, instigator, resolved.damage);
        }
        Ok(true)
    }

    fn execute_healing(
        &mut self,
        world: &mut World,
        target: ActorId,
        spec: &ModificationSpec,
    ) -> Result<bool, PipelineError> {
        let instigator = spec.instigator;
        let instigator_tags = ability_system(world, instigator, "instigator")?
            .owned_tags
            .clone();
        let patient = ability_system(world, target, "target")?;

        let mut type_tags = spec.dynamic_tags.clone();
        if let Some(damage_type) = &spec.context.damage_type {
            type_tags.add(damage_type.clone());
        }
        let input = HealingExecutionInput {
            base_healing: spec.magnitude,
            all_coefficient: patient
                .health
                .get(HealthAttribute::AllDamageHealingCoefficient),
            physical_coefficient: patient
                .health
                .get(HealthAttribute::PhysicalDamageHealingCoefficient),
            elemental_coefficient: patient
                .health
                .get(HealthAttribute::ElementalDamageHealingCoefficient),
            has_physical: type_tags.has_tag(&GameplayTag::new(names::DAMAGE_TYPE_PHYSICAL)),
            has_elemental: type_tags.has_tag(&GameplayTag::new(names::DAMAGE_TYPE_ELEMENTAL)),
            self_heal: target == instigator,
        };
        let target_tags = patient.owned_tags.clone();

        let Some(resolved) = resolve_healing(&input) else {
            debug!("healing resolved to nothing, skipping");
            return Ok(false);
        };

        let patient = ability_system_mut(world, target, "target")?;
        patient
            .health
            .set(HealthAttribute::IncomingHealing, resolved.healing);
        let change = patient.health.post_execute(HealthAttribute::IncomingHealing);
        if !change.applied {
            debug!("{target:?} already at full health");
            return Ok(true);
        }
        patient.send_gameplay_event(GameplayEvent {
            tag: GameplayTag::new(names::EVENT_ON_HEALING),
            instigator: Some(instigator),
            target: Some(target),
            magnitude: resolved.healing,
        });

        let hit = HitContext {
            target,
            instigator,
            source_object: spec.context.source_object,
            target_tags,
            instigator_tags,
            context_tags: spec.dynamic_tags.clone(),
            hit_result: spec.context.hit_result.clone().unwrap_or_default(),
            timestamp: world.time(),
        };
        let ctx = DamageModificationContext {
            damage_type: spec.damage_type(),
            new_value: change.after,
            over_time: !spec.policy.is_instant(),
            ..DamageModificationContext::new(hit, DamagePipelineType::Healing, resolved.healing)
        };
        debug!("healing {} -> {} on {target:?}", resolved.base, resolved.healing);

        self.broadcast_healing_applied(&ctx);
        self.broadcast_healing_received(&ctx);
        self.record(world, &ctx, resolved.base, &resolved.captured);
        Ok(true)
    }

    fn grant_kill_reward(&self, killer: &mut AbilitySystem) {
        match &self.settings.kill_reward {
            Some(reward) => killer.add_resource(&reward.resource, reward.amount),
            None => warn!("no kill reward configured, skipping resource on kill"),
        }
    }

    fn record(
        &mut self,
        world: &World,
        ctx: &DamageModificationContext,
        base_value: f32,
        captured: &[(&'static str, f32)],
    ) {
        if !self.settings.capture_damage_log {
            return;
        }
        let (Some(target), Some(instigator)) =
            (world.get(ctx.hit.target), world.get(ctx.hit.instigator))
        else {
            return;
        };

        self.log.push(DamageLogEntry {
            damage_id: DAMAGE_IDS.next_id(),
            target_id: target.uid,
            instigator_id: instigator.uid,
            source_object_id: ctx.hit.source_object.and_then(|id| world.uid(id)),
            target_name: target.name.clone(),
            instigator_name: instigator.name.clone(),
            timestamp: ctx.hit.timestamp,
            target_tags: ctx.hit.target_tags.clone(),
            instigator_tags: ctx.hit.instigator_tags.clone(),
            context_tags: ctx.hit.context_tags.clone(),
            attributes: captured
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            base_value,
            modified_value: ctx.delta_value,
            final_value: ctx.new_value,
            is_damage: ctx.pipeline_type == DamagePipelineType::Damage,
            is_critical: ctx.is_critical,
            damage_resisted: ctx.damage_resisted,
            over_time: ctx.over_time,
            killed_target: ctx.killed_target,
        });
    }
}

fn stamp_damage_type(
    context: &mut DamagePipelineContext,
    damage_type: &str,
    hit_result: &HitResult,
) {
    let tag = GameplayTag::new(damage_type);
    context.granted_tags.add(tag.clone());
    context.damage_type = Some(tag);
    context.hit_result = Some(hit_result.clone());
}

/// Heal the instigator by `amount` on the next tick, instigator to instigator.
/// Skipped if by then the instigator is gone or dead.
fn schedule_lifesteal_echo(world: &mut World, instigator: ActorId, amount: f32) {
    world.set_timer_for_next_tick(move |world, pipeline| {
        if world
            .ability_system(instigator)
            .is_none_or(AbilitySystem::is_dead)
        {
            debug!("lifesteal echo dropped, {instigator:?} is gone or dead");
            return;
        }
        pipeline.apply_heal_to_target(
            world,
            instigator,
            instigator,
            amount,
            &DamagePipelineContext::default(),
        );
    });
}

/// Write `values` into `actor`'s attributes by name and return what they
/// replaced. Unknown names are skipped.
fn override_attributes(
    world: &mut World,
    actor: ActorId,
    role: &'static str,
    values: &BTreeMap<String, f32>,
) -> Result<BTreeMap<String, f32>, PipelineError> {
    let asc = ability_system_mut(world, actor, role)?;
    let mut replaced = BTreeMap::new();
    for (name, value) in values {
        let Some(attribute) = HealthAttribute::from_name(name) else {
            continue;
        };
        replaced.insert(attribute.name().to_string(), asc.health.get(attribute));
        asc.health.set(attribute, *value);
    }
    Ok(replaced)
}

fn ability_system<'w>(
    world: &'w World,
    id: ActorId,
    role: &'static str,
) -> Result<&'w AbilitySystem, PipelineError> {
    let actor = world.get(id).ok_or(PipelineError::InvalidActor { role, id })?;
    actor
        .ability_system
        .as_ref()
        .ok_or(PipelineError::MissingAbilitySystem { role, id })
}

fn ability_system_mut<'w>(
    world: &'w mut World,
    id: ActorId,
    role: &'static str,
) -> Result<&'w mut AbilitySystem, PipelineError> {
    let actor = world
        .get_mut(id)
        .ok_or(PipelineError::InvalidActor { role, id })?;
    actor
        .ability_system
        .as_mut()
        .ok_or(PipelineError::MissingAbilitySystem { role, id })
}
