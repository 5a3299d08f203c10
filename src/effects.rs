//! Modification specs and the over-time effects built from them.

use crate::pipeline::{DamagePipelineContext, DamagePipelineType, EffectOverTimeContext};
use crate::world::ActorId;
use damage_pipeline_shared::execution::ResolvedDamage;
use damage_pipeline_shared::tags::{GameplayTag, TagContainer, names};

/// Slack for float accumulation when testing period boundaries.
const TIME_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationPolicy {
    Instant,
    HasDuration {
        duration: f32,
        /// `None` executes once on application and then just runs out.
        period: Option<f32>,
    },
}

impl DurationPolicy {
    /// Duration `<= 0` means instant, period `<= 0` means not periodic.
    pub fn from_over_time(over_time: &EffectOverTimeContext) -> Self {
        if over_time.duration <= 0.0 {
            return Self::Instant;
        }
        Self::HasDuration {
            duration: over_time.duration,
            period: (over_time.period > 0.0).then_some(over_time.period),
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Self::Instant)
    }
}

/// Everything the attribute system needs to run one damage or healing
/// modification, whether once or repeatedly.
#[derive(Clone, Debug)]
pub struct ModificationSpec {
    pub kind: DamagePipelineType,
    pub instigator: ActorId,
    /// Set-by-caller magnitude.
    pub magnitude: f32,
    pub policy: DurationPolicy,
    pub context: DamagePipelineContext,
    /// Granted tags plus any markers added while building the spec.
    pub dynamic_tags: TagContainer,
}

impl ModificationSpec {
    pub fn new(
        kind: DamagePipelineType,
        instigator: ActorId,
        magnitude: f32,
        context: &DamagePipelineContext,
        policy: DurationPolicy,
    ) -> Self {
        let mut dynamic_tags = context.granted_tags.clone();
        if kind == DamagePipelineType::Damage && !policy.is_instant() {
            dynamic_tags.add(GameplayTag::new(names::DATA_DAMAGE_OVER_TIME));
        }
        Self {
            kind,
            instigator,
            magnitude,
            policy,
            context: context.clone(),
            dynamic_tags,
        }
    }

    pub fn is_damage_over_time(&self) -> bool {
        self.dynamic_tags
            .has_tag_exact(&GameplayTag::new(names::DATA_DAMAGE_OVER_TIME))
    }

    /// Damage type from the context, or the first granted tag under `Damage.Type`.
    pub fn damage_type(&self) -> Option<GameplayTag> {
        self.context.damage_type.clone().or_else(|| {
            self.dynamic_tags
                .first_matching(&GameplayTag::new(names::DAMAGE_TYPE_ROOT))
                .cloned()
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub(crate) u32);

/// An effect with a duration, living on its target's ability system.
#[derive(Clone, Debug)]
pub struct ActiveEffect {
    pub handle: EffectHandle,
    pub spec: ModificationSpec,
    elapsed: f32,
    executions: u32,
    /// Result of the first damage execution, reused on every later tick.
    pub(crate) cached: Option<ResolvedDamage>,
}

impl ActiveEffect {
    /// A freshly applied effect counts its on-application execution as done.
    pub(crate) fn new(handle: EffectHandle, spec: ModificationSpec) -> Self {
        Self {
            handle,
            spec,
            elapsed: 0.0,
            executions: 1,
            cached: None,
        }
    }

    pub fn executions(&self) -> u32 {
        self.executions
    }

    pub fn cached_damage(&self) -> Option<&ResolvedDamage> {
        self.cached.as_ref()
    }

    /// Advance the effect clock; returns how many periodic executions fell due.
    pub(crate) fn advance(&mut self, dt: f32) -> u32 {
        self.elapsed += dt.max(0.0);
        let DurationPolicy::HasDuration {
            duration,
            period: Some(period),
        } = self.spec.policy
        else {
            return 0;
        };

        let horizon = self.elapsed.min(duration) + TIME_EPSILON;
        let total = (horizon / period).floor() as u32 + 1;
        let due = total.saturating_sub(self.executions);
        self.executions += due;
        due
    }

    pub fn is_expired(&self) -> bool {
        match self.spec.policy {
            DurationPolicy::Instant => true,
            DurationPolicy::HasDuration { duration, .. } => self.elapsed + TIME_EPSILON >= duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    fn spec(policy: DurationPolicy) -> ModificationSpec {
        let mut world = World::new();
        let instigator = world.spawn("instigator", None);
        ModificationSpec::new(
            DamagePipelineType::Damage,
            instigator,
            5.0,
            &DamagePipelineContext::default(),
            policy,
        )
    }

    #[test]
    fn test_sentinels_pick_the_policy() {
        assert!(DurationPolicy::from_over_time(&EffectOverTimeContext::new(1.0, 0.0)).is_instant());
        let negative = EffectOverTimeContext::new(1.0, -3.0);
        assert!(DurationPolicy::from_over_time(&negative).is_instant());
        assert_eq!(
            DurationPolicy::from_over_time(&EffectOverTimeContext::new(-1.0, 3.0)),
            DurationPolicy::HasDuration {
                duration: 3.0,
                period: None
            }
        );
        assert_eq!(
            DurationPolicy::from_over_time(&EffectOverTimeContext::new(0.5, 3.0)),
            DurationPolicy::HasDuration {
                duration: 3.0,
                period: Some(0.5)
            }
        );
    }

    #[test]
    fn test_over_time_damage_is_marked() {
        let periodic = spec(DurationPolicy::HasDuration {
            duration: 3.0,
            period: Some(1.0),
        });
        assert!(periodic.is_damage_over_time());
        assert!(!spec(DurationPolicy::Instant).is_damage_over_time());
    }

    #[test]
    fn test_periodic_effect_executes_on_each_boundary() {
        let mut effect = ActiveEffect::new(
            EffectHandle(1),
            spec(DurationPolicy::HasDuration {
                duration: 3.0,
                period: Some(1.0),
            }),
        );
        assert_eq!(effect.advance(0.5), 0);
        assert_eq!(effect.advance(0.5), 1);
        assert_eq!(effect.advance(2.5), 2);
        assert_eq!(effect.executions(), 4);
        assert!(effect.is_expired());
        assert_eq!(effect.advance(1.0), 0);
    }

    #[test]
    fn test_non_periodic_effect_only_expires() {
        let mut effect = ActiveEffect::new(
            EffectHandle(1),
            spec(DurationPolicy::HasDuration {
                duration: 2.0,
                period: None,
            }),
        );
        assert_eq!(effect.advance(1.0), 0);
        assert!(!effect.is_expired());
        assert_eq!(effect.advance(1.0), 0);
        assert!(effect.is_expired());
    }
}
