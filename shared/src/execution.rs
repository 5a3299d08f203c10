//! Damage and healing execution math.
//!
//! These are the calculation steps that run between "a modification spec was
//! submitted" and "the health attribute is committed". Callers capture the
//! relevant attributes, call a resolver, and commit the result.

use crate::rng::Roll;

/// Captured attribute names recorded for debug display.
pub mod captured {
    pub const CRITICAL_CHANCE: &str = "CriticalChance";
    pub const CRITICAL_DAMAGE_MULTIPLIER: &str = "CriticalDamageMultiplier";
    pub const DAMAGE_MULTIPLIER: &str = "DamageMultiplier";
    pub const DAMAGE_RESISTANCE: &str = "DamageResistance";
    pub const ALL_HEALING_COEFFICIENT: &str = "AllDamageHealingCoefficient";
    pub const PHYSICAL_HEALING_COEFFICIENT: &str = "PhysicalDamageHealingCoefficient";
    pub const ELEMENTAL_HEALING_COEFFICIENT: &str = "ElementalDamageHealingCoefficient";
}

// ============================================================================
// DAMAGE
// ============================================================================

/// Input to the damage resolver.
#[derive(Debug, Clone, Default)]
pub struct DamageExecutionInput {
    /// Caller-supplied magnitude. Negative values count as zero.
    pub base_damage: f32,
    /// Source attribute, `[0, 1]`.
    pub critical_chance: f32,
    /// Source attribute. A crit adds `floor(damage * multiplier)`.
    pub critical_multiplier: f32,
    /// Source attribute. Adds `damage * multiplier` before resistance.
    pub damage_multiplier: f32,
    /// Target attribute, `[0, 1]`.
    pub resistance: f32,
    /// Per-tick result cached on an over-time effect.
    pub cached: Option<ResolvedDamage>,
}

/// Output from the damage resolver; also the value cached on over-time effects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDamage {
    pub base: f32,
    pub damage: f32,
    pub is_crit: bool,
    pub resisted: bool,
    pub from_cache: bool,
    /// Attribute magnitudes that shaped the result, for the debug log.
    pub captured: Vec<(&'static str, f32)>,
}

impl ResolvedDamage {
    /// Zero damage is only worth committing when resistance swallowed it.
    pub fn should_apply(&self) -> bool {
        self.damage > 0.0 || (self.resisted && self.base > 0.0)
    }
}

/// Resolve one damage execution.
///
/// A cached result with positive damage short-circuits everything, so a
/// periodic effect keeps the crit it rolled on its first tick. The roll
/// source is only consulted when a crit is possible.
pub fn resolve_damage(input: &DamageExecutionInput, roll: &mut dyn Roll) -> ResolvedDamage {
    if let Some(cached) = &input.cached {
        if cached.damage > 0.0 {
            return ResolvedDamage {
                from_cache: true,
                ..cached.clone()
            };
        }
    }

    let base = input.base_damage.max(0.0);
    let mut damage = base;
    let mut attrs = Vec::new();

    let is_crit = input.critical_chance > 0.0 && roll.roll() <= input.critical_chance;
    if is_crit {
        damage += (damage * input.critical_multiplier).floor();
        attrs.push((captured::CRITICAL_CHANCE, input.critical_chance));
        attrs.push((captured::CRITICAL_DAMAGE_MULTIPLIER, input.critical_multiplier));
    }

    if input.damage_multiplier != 0.0 {
        damage += damage * input.damage_multiplier;
        attrs.push((captured::DAMAGE_MULTIPLIER, input.damage_multiplier));
    }

    let resisted = input.resistance > 0.0;
    if resisted {
        damage *= 1.0 - input.resistance;
        attrs.push((captured::DAMAGE_RESISTANCE, input.resistance));
    }

    ResolvedDamage {
        base,
        damage: damage.max(0.0),
        is_crit,
        resisted,
        from_cache: false,
        captured: attrs,
    }
}

// ============================================================================
// HEALING
// ============================================================================

/// Input to the healing resolver. Coefficients are captured from the target.
#[derive(Debug, Clone, Default)]
pub struct HealingExecutionInput {
    pub base_healing: f32,
    pub all_coefficient: f32,
    pub physical_coefficient: f32,
    pub elemental_coefficient: f32,
    pub has_physical: bool,
    pub has_elemental: bool,
    /// Coefficients only shape healing an actor applies to itself.
    pub self_heal: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedHealing {
    pub base: f32,
    pub healing: f32,
    pub captured: Vec<(&'static str, f32)>,
}

/// Resolve one healing execution. `None` means nothing should be applied.
pub fn resolve_healing(input: &HealingExecutionInput) -> Option<ResolvedHealing> {
    let base = input.base_healing.max(0.0);
    if base <= 0.0 {
        return None;
    }

    let mut attrs = vec![(captured::ALL_HEALING_COEFFICIENT, input.all_coefficient)];
    let specific = input.has_physical || input.has_elemental;

    let mut total = if specific {
        let mut sum = 0.0;
        if input.has_physical {
            sum += base * input.physical_coefficient;
            attrs.push((captured::PHYSICAL_HEALING_COEFFICIENT, input.physical_coefficient));
        }
        if input.has_elemental {
            sum += base * input.elemental_coefficient;
            attrs.push((captured::ELEMENTAL_HEALING_COEFFICIENT, input.elemental_coefficient));
        }
        sum + base * input.all_coefficient
    } else {
        base + base * input.all_coefficient
    };

    if total <= 0.0 {
        return None;
    }
    if !input.self_heal {
        total = base;
    }

    Some(ResolvedHealing {
        base,
        healing: total,
        captured: attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{FixedRoll, ScriptedRoll};

    fn input(base: f32) -> DamageExecutionInput {
        DamageExecutionInput {
            base_damage: base,
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_damage_passes_through() {
        let out = resolve_damage(&input(30.0), &mut FixedRoll(0.0));
        assert_eq!(out.damage, 30.0);
        assert!(!out.is_crit);
        assert!(!out.resisted);
        assert!(out.should_apply());
    }

    #[test]
    fn test_zero_crit_chance_never_crits_or_rolls() {
        let mut roll = ScriptedRoll::new(vec![0.0]);
        let out = resolve_damage(&input(10.0), &mut roll);
        assert!(!out.is_crit);
        assert_eq!(roll.consumed(), 0);
    }

    #[test]
    fn test_crit_adds_floored_bonus() {
        let mut i = input(15.0);
        i.critical_chance = 0.5;
        i.critical_multiplier = 0.5;
        // 15 * 0.5 = 7.5 -> floor 7
        let out = resolve_damage(&i, &mut FixedRoll(0.5));
        assert!(out.is_crit);
        assert_eq!(out.damage, 22.0);

        let miss = resolve_damage(&i, &mut FixedRoll(0.51));
        assert!(!miss.is_crit);
        assert_eq!(miss.damage, 15.0);
    }

    #[test]
    fn test_multiplier_applies_before_resistance() {
        let mut i = input(40.0);
        i.damage_multiplier = 0.5;
        i.resistance = 0.5;
        // (40 + 20) * 0.5
        let out = resolve_damage(&i, &mut FixedRoll(0.9));
        assert_eq!(out.damage, 30.0);
        assert!(out.resisted);
    }

    #[test]
    fn test_full_resistance_still_applies() {
        let mut i = input(40.0);
        i.resistance = 1.0;
        let out = resolve_damage(&i, &mut FixedRoll(0.9));
        assert_eq!(out.damage, 0.0);
        assert!(out.resisted);
        assert!(out.should_apply());
    }

    #[test]
    fn test_non_positive_base_is_not_applied() {
        let out = resolve_damage(&input(-5.0), &mut FixedRoll(0.9));
        assert_eq!(out.base, 0.0);
        assert!(!out.should_apply());
    }

    #[test]
    fn test_cached_result_skips_the_roll() {
        let mut i = input(10.0);
        i.critical_chance = 1.0;
        i.critical_multiplier = 1.0;
        i.cached = Some(ResolvedDamage {
            base: 10.0,
            damage: 20.0,
            is_crit: true,
            ..Default::default()
        });
        let mut roll = ScriptedRoll::new(vec![0.99]);
        let out = resolve_damage(&i, &mut roll);
        assert!(out.from_cache);
        assert!(out.is_crit);
        assert_eq!(out.damage, 20.0);
        assert_eq!(roll.consumed(), 0);
    }

    #[test]
    fn test_healing_coefficients_only_for_self_heal() {
        let mut heal = HealingExecutionInput {
            base_healing: 20.0,
            all_coefficient: 0.5,
            self_heal: true,
            ..Default::default()
        };
        assert_eq!(resolve_healing(&heal).map(|h| h.healing), Some(30.0));

        heal.self_heal = false;
        assert_eq!(resolve_healing(&heal).map(|h| h.healing), Some(20.0));
    }

    #[test]
    fn test_typed_healing_uses_type_coefficients() {
        let heal = HealingExecutionInput {
            base_healing: 10.0,
            physical_coefficient: 0.5,
            all_coefficient: 0.25,
            has_physical: true,
            self_heal: true,
            ..Default::default()
        };
        let out = resolve_healing(&heal).expect("healing should resolve");
        assert_eq!(out.healing, 7.5);
        assert_eq!(out.captured.len(), 2);

        let zeroed = HealingExecutionInput {
            base_healing: 10.0,
            has_elemental: true,
            ..Default::default()
        };
        assert!(resolve_healing(&zeroed).is_none());
    }

    #[test]
    fn test_non_positive_healing_is_rejected() {
        let heal = HealingExecutionInput {
            base_healing: 0.0,
            ..Default::default()
        };
        assert!(resolve_healing(&heal).is_none());
    }
}
