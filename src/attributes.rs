//! Health attribute set: the numbers damage and healing resolve against.
//!
//! Incoming damage and incoming healing are meta attributes. An execution
//! writes the resolved magnitude into one of them and [`HealthAttributeSet::post_execute`]
//! folds it into current health.

use damage_pipeline_shared::combat::{clamp_to, defaults, ranges};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthAttribute {
    Health,
    MaxHealth,
    IncomingDamage,
    IncomingHealing,
    CriticalChance,
    CriticalDamageMultiplier,
    DamageMultiplier,
    DamageResistance,
    AllDamageHealingCoefficient,
    PhysicalDamageHealingCoefficient,
    ElementalDamageHealingCoefficient,
    StatusDamageHealingCoefficient,
}

impl HealthAttribute {
    pub const ALL: [HealthAttribute; 12] = [
        Self::Health,
        Self::MaxHealth,
        Self::IncomingDamage,
        Self::IncomingHealing,
        Self::CriticalChance,
        Self::CriticalDamageMultiplier,
        Self::DamageMultiplier,
        Self::DamageResistance,
        Self::AllDamageHealingCoefficient,
        Self::PhysicalDamageHealingCoefficient,
        Self::ElementalDamageHealingCoefficient,
        Self::StatusDamageHealingCoefficient,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::MaxHealth => "MaxHealth",
            Self::IncomingDamage => "IncomingDamage",
            Self::IncomingHealing => "IncomingHealing",
            Self::CriticalChance => "CriticalChance",
            Self::CriticalDamageMultiplier => "CriticalDamageMultiplier",
            Self::DamageMultiplier => "DamageMultiplier",
            Self::DamageResistance => "DamageResistance",
            Self::AllDamageHealingCoefficient => "AllDamageHealingCoefficient",
            Self::PhysicalDamageHealingCoefficient => "PhysicalDamageHealingCoefficient",
            Self::ElementalDamageHealingCoefficient => "ElementalDamageHealingCoefficient",
            Self::StatusDamageHealingCoefficient => "StatusDamageHealingCoefficient",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Executions read these from the target rather than the instigator.
    pub fn is_target_captured(self) -> bool {
        matches!(
            self,
            Self::DamageResistance
                | Self::AllDamageHealingCoefficient
                | Self::PhysicalDamageHealingCoefficient
                | Self::ElementalDamageHealingCoefficient
                | Self::StatusDamageHealingCoefficient
        )
    }
}

/// What `post_execute` did to current health.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HealthChange {
    pub before: f32,
    pub after: f32,
    /// False when the modification was skipped (healing at full health).
    pub applied: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthAttributeSet {
    health: f32,
    max_health: f32,
    incoming_damage: f32,
    incoming_healing: f32,
    critical_chance: f32,
    critical_damage_multiplier: f32,
    damage_multiplier: f32,
    damage_resistance: f32,
    all_healing_coefficient: f32,
    physical_healing_coefficient: f32,
    elemental_healing_coefficient: f32,
    status_healing_coefficient: f32,
}

impl Default for HealthAttributeSet {
    fn default() -> Self {
        Self::new(defaults::HEALTH)
    }
}

impl HealthAttributeSet {
    pub fn new(health: f32) -> Self {
        let health = health.max(0.0);
        Self {
            health,
            max_health: health,
            incoming_damage: 0.0,
            incoming_healing: 0.0,
            critical_chance: defaults::CRIT_CHANCE,
            critical_damage_multiplier: defaults::CRIT_MULTIPLIER,
            damage_multiplier: defaults::DAMAGE_MULTIPLIER,
            damage_resistance: defaults::DAMAGE_RESISTANCE,
            all_healing_coefficient: defaults::HEALING_COEFFICIENT,
            physical_healing_coefficient: defaults::HEALING_COEFFICIENT,
            elemental_healing_coefficient: defaults::HEALING_COEFFICIENT,
            status_healing_coefficient: defaults::HEALING_COEFFICIENT,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn get(&self, attribute: HealthAttribute) -> f32 {
        use HealthAttribute::*;
        match attribute {
            Health => self.health,
            MaxHealth => self.max_health,
            IncomingDamage => self.incoming_damage,
            IncomingHealing => self.incoming_healing,
            CriticalChance => self.critical_chance,
            CriticalDamageMultiplier => self.critical_damage_multiplier,
            DamageMultiplier => self.damage_multiplier,
            DamageResistance => self.damage_resistance,
            AllDamageHealingCoefficient => self.all_healing_coefficient,
            PhysicalDamageHealingCoefficient => self.physical_healing_coefficient,
            ElementalDamageHealingCoefficient => self.elemental_healing_coefficient,
            StatusDamageHealingCoefficient => self.status_healing_coefficient,
        }
    }

    /// Set an attribute's base value, clamped to its range.
    pub fn set(&mut self, attribute: HealthAttribute, value: f32) {
        use HealthAttribute::*;
        let value = Self::pre_attribute_change(attribute, value);
        match attribute {
            Health => self.health = value.min(self.max_health),
            MaxHealth => {
                self.adjust_for_max_change(value);
                self.max_health = value;
            }
            IncomingDamage => self.incoming_damage = value,
            IncomingHealing => self.incoming_healing = value,
            CriticalChance => self.critical_chance = value,
            CriticalDamageMultiplier => self.critical_damage_multiplier = value,
            DamageMultiplier => self.damage_multiplier = value,
            DamageResistance => self.damage_resistance = value,
            AllDamageHealingCoefficient => self.all_healing_coefficient = value,
            PhysicalDamageHealingCoefficient => self.physical_healing_coefficient = value,
            ElementalDamageHealingCoefficient => self.elemental_healing_coefficient = value,
            StatusDamageHealingCoefficient => self.status_healing_coefficient = value,
        }
    }

    /// Clamp a proposed value before it is written.
    pub fn pre_attribute_change(attribute: HealthAttribute, value: f32) -> f32 {
        use HealthAttribute::*;
        match attribute {
            CriticalChance => clamp_to(value, ranges::CRIT_CHANCE),
            CriticalDamageMultiplier => clamp_to(value, ranges::CRIT_MULTIPLIER),
            DamageResistance => clamp_to(value, ranges::RESISTANCE),
            AllDamageHealingCoefficient
            | PhysicalDamageHealingCoefficient
            | ElementalDamageHealingCoefficient
            | StatusDamageHealingCoefficient => clamp_to(value, ranges::COEFFICIENT),
            Health | MaxHealth | IncomingDamage | IncomingHealing => value.max(0.0),
            DamageMultiplier => value,
        }
    }

    /// Fold the pending meta attribute into current health.
    ///
    /// Damage always lands. Healing only lands while health is below max.
    /// Health is clamped to `[0, max]` afterwards either way.
    pub fn post_execute(&mut self, evaluated: HealthAttribute) -> HealthChange {
        let before = self.health;
        let mut applied = false;

        match evaluated {
            HealthAttribute::IncomingDamage => {
                let damage = std::mem::take(&mut self.incoming_damage);
                self.health = before - damage;
                applied = true;
            }
            HealthAttribute::IncomingHealing => {
                let healing = std::mem::take(&mut self.incoming_healing);
                if self.health != self.max_health {
                    self.health = before + healing;
                    applied = true;
                }
            }
            _ => {}
        }

        self.health = self.health.clamp(0.0, self.max_health);
        HealthChange {
            before,
            after: self.health,
            applied,
        }
    }

    /// Keep current health at the same fraction of max when max changes.
    fn adjust_for_max_change(&mut self, new_max: f32) {
        if self.max_health > 0.0 {
            self.health = self.health * new_max / self.max_health;
        } else {
            self.health = new_max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HealthAttribute::*;

    #[test]
    fn test_ranged_attributes_are_clamped() {
        let mut set = HealthAttributeSet::new(100.0);
        set.set(CriticalChance, 1.5);
        set.set(CriticalDamageMultiplier, 42.0);
        set.set(DamageResistance, -0.2);
        set.set(PhysicalDamageHealingCoefficient, 2.0);
        assert_eq!(set.get(CriticalChance), 1.0);
        assert_eq!(set.get(CriticalDamageMultiplier), 10.0);
        assert_eq!(set.get(DamageResistance), 0.0);
        assert_eq!(set.get(PhysicalDamageHealingCoefficient), 1.0);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut set = HealthAttributeSet::new(20.0);
        set.set(IncomingDamage, 50.0);
        let change = set.post_execute(IncomingDamage);
        assert!(change.applied);
        assert_eq!(change.before, 20.0);
        assert_eq!(change.after, 0.0);
        assert_eq!(set.get(IncomingDamage), 0.0);
    }

    #[test]
    fn test_healing_clamps_at_max_and_skips_when_full() {
        let mut set = HealthAttributeSet::new(100.0);
        set.set(IncomingHealing, 10.0);
        assert!(!set.post_execute(IncomingHealing).applied);

        set.set(Health, 95.0);
        set.set(IncomingHealing, 10.0);
        let change = set.post_execute(IncomingHealing);
        assert!(change.applied);
        assert_eq!(change.after, 100.0);
    }

    #[test]
    fn test_max_health_change_rescales_current() {
        let mut set = HealthAttributeSet::new(100.0);
        set.set(Health, 50.0);
        set.set(MaxHealth, 200.0);
        assert_eq!(set.health(), 100.0);
        assert_eq!(set.max_health(), 200.0);
    }

    #[test]
    fn test_names_round_trip() {
        for attribute in HealthAttribute::ALL {
            assert_eq!(HealthAttribute::from_name(attribute.name()), Some(attribute));
        }
        assert_eq!(HealthAttribute::from_name("Mana"), None);
    }

    #[test]
    fn test_capture_side() {
        assert!(DamageResistance.is_target_captured());
        assert!(ElementalDamageHealingCoefficient.is_target_captured());
        assert!(!CriticalChance.is_target_captured());
        assert!(!DamageMultiplier.is_target_captured());
    }
}
