//! Shared combat constants, attribute ranges and the hit payload.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Default attribute values — single source of truth for actors and tools.
pub mod defaults {
    pub const HEALTH: f32 = 100.0;
    pub const CRIT_CHANCE: f32 = 0.0;
    pub const CRIT_MULTIPLIER: f32 = 0.5;
    pub const DAMAGE_MULTIPLIER: f32 = 0.0;
    pub const DAMAGE_RESISTANCE: f32 = 0.0;
    pub const HEALING_COEFFICIENT: f32 = 0.0;
}

/// Allowed ranges for clamped attributes.
pub mod ranges {
    pub const CRIT_CHANCE: (f32, f32) = (0.0, 1.0);
    pub const CRIT_MULTIPLIER: (f32, f32) = (0.0, 10.0);
    pub const COEFFICIENT: (f32, f32) = (0.0, 1.0);
    pub const RESISTANCE: (f32, f32) = (0.0, 1.0);
}

pub fn clamp_to(value: f32, (min, max): (f32, f32)) -> f32 {
    value.clamp(min, max)
}

/// Result of a trace or contact query: where the hit landed and on what.
///
/// `hit_actor` is an opaque actor key owned by the caller's world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    pub impact_point: glam::Vec3,
    pub impact_normal: glam::Vec3,
    pub surface: Option<SmolStr>,
    pub blocking_hit: bool,
    pub hit_actor: Option<u64>,
}

impl HitResult {
    pub fn blocking(impact_point: glam::Vec3, impact_normal: glam::Vec3) -> Self {
        Self {
            impact_point,
            impact_normal,
            blocking_hit: true,
            ..Default::default()
        }
    }

    pub fn with_surface(mut self, surface: impl Into<SmolStr>) -> Self {
        self.surface = Some(surface.into());
        self
    }

    /// Copy of this result, or an empty one if it never blocked.
    pub fn blocking_or_default(&self) -> HitResult {
        if self.blocking_hit {
            self.clone()
        } else {
            HitResult::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_range() {
        assert_eq!(clamp_to(1.5, ranges::CRIT_CHANCE), 1.0);
        assert_eq!(clamp_to(-0.5, ranges::RESISTANCE), 0.0);
        assert_eq!(clamp_to(12.0, ranges::CRIT_MULTIPLIER), 10.0);
    }

    #[test]
    fn test_non_blocking_hit_result_is_emptied() {
        let hit = HitResult {
            impact_point: glam::Vec3::new(1.0, 2.0, 3.0),
            blocking_hit: false,
            ..Default::default()
        };
        assert_eq!(hit.blocking_or_default(), HitResult::default());

        let blocking = HitResult::blocking(glam::Vec3::X, glam::Vec3::Y).with_surface("stone");
        assert_eq!(blocking.blocking_or_default(), blocking);
    }
}
