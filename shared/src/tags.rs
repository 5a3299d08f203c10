//! Hierarchical gameplay tags.
//!
//! A tag is a dot-separated path such as `Damage.Type.Elemental.Fire`. A tag
//! matches every one of its parents, so `Damage.Type.Elemental.Fire` matches
//! `Damage.Type` but not `Damage.Typo`.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Tag names used by the pipeline.
pub mod names {
    pub const DAMAGE_TYPE_ROOT: &str = "Damage.Type";
    pub const DAMAGE_TYPE_PHYSICAL: &str = "Damage.Type.Physical";
    pub const DAMAGE_TYPE_ELEMENTAL: &str = "Damage.Type.Elemental";
    pub const DAMAGE_TYPE_FIRE: &str = "Damage.Type.Elemental.Fire";
    pub const DAMAGE_CRITICAL: &str = "Damage.Modifier.Critical";
    pub const DAMAGE_DEBUG_SIMULATED: &str = "Damage.Modifier.DebugSimulated";

    pub const DATA_DAMAGE_OVER_TIME: &str = "Data.DamageOverTime";

    pub const STATUS_DEATH: &str = "Status.Death";
    pub const STATUS_BURN_STACK: &str = "Status.Burn.Stack";

    pub const EVENT_ON_DAMAGE_DEALT: &str = "Event.Gameplay.OnDamageDealt";
    pub const EVENT_ON_HEALING: &str = "Event.Gameplay.OnHealing";
    pub const EVENT_ON_DEATH: &str = "Event.OnDeath";
    pub const EVENT_ON_DEATH_DEALT: &str = "Event.OnDeathDealt";
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameplayTag(SmolStr);

impl GameplayTag {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` is `parent` or lives underneath it.
    pub fn matches(&self, parent: &GameplayTag) -> bool {
        let name = self.as_str();
        let parent = parent.as_str();
        name == parent
            || (name.len() > parent.len()
                && name.starts_with(parent)
                && name.as_bytes()[parent.len()] == b'.')
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameplayTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Small owned set of tags. Insertion order is kept, duplicates are not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagContainer(Vec<GameplayTag>);

impl TagContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: impl Into<GameplayTag>) -> Self {
        self.add(tag.into());
        self
    }

    pub fn add(&mut self, tag: GameplayTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    pub fn append(&mut self, other: &TagContainer) {
        for tag in &other.0 {
            self.add(tag.clone());
        }
    }

    pub fn remove(&mut self, tag: &GameplayTag) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Hierarchical check: any contained tag matches `tag`.
    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.0.iter().any(|t| t.matches(tag))
    }

    pub fn has_tag_exact(&self, tag: &GameplayTag) -> bool {
        self.0.contains(tag)
    }

    /// First contained tag underneath `parent`.
    pub fn first_matching(&self, parent: &GameplayTag) -> Option<&GameplayTag> {
        self.0.iter().find(|t| t.matches(parent))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GameplayTag> for TagContainer {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        let mut container = TagContainer::new();
        for tag in iter {
            container.add(tag);
        }
        container
    }
}
