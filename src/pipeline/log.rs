//! Damage log: retained copies of resolved modifications for debug panels
//! and replay.

use crate::world::ActorUid;
use damage_pipeline_shared::tags::TagContainer;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out damage ids: unique, strictly increasing, first id is 1.
#[derive(Debug)]
pub struct DamageIdGenerator(AtomicU32);

impl DamageIdGenerator {
    pub const fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    pub fn next_id(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for DamageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide damage id source shared by every pipeline.
pub static DAMAGE_IDS: DamageIdGenerator = DamageIdGenerator::new();

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageLogEntry {
    pub damage_id: u32,
    pub target_id: ActorUid,
    pub instigator_id: ActorUid,
    pub source_object_id: Option<ActorUid>,
    pub target_name: SmolStr,
    pub instigator_name: SmolStr,
    pub timestamp: f32,
    pub target_tags: TagContainer,
    pub instigator_tags: TagContainer,
    pub context_tags: TagContainer,
    /// Attribute magnitudes that shaped the result, keyed by attribute name.
    pub attributes: BTreeMap<String, f32>,
    pub base_value: f32,
    pub modified_value: f32,
    /// Target health once the modification was committed.
    pub final_value: f32,
    pub is_damage: bool,
    pub is_critical: bool,
    pub damage_resisted: bool,
    pub over_time: bool,
    pub killed_target: bool,
}

impl DamageLogEntry {
    pub fn involves(&self, uid: ActorUid) -> bool {
        self.target_id == uid || self.instigator_id == uid
    }
}

/// Newest-first log. With a capacity, the oldest entry falls off the back.
#[derive(Debug, Default)]
pub struct DamageLog {
    entries: VecDeque<DamageLogEntry>,
    capacity: usize,
}

impl DamageLog {
    /// `capacity == 0` keeps everything.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, entry: DamageLogEntry) {
        self.entries.push_front(entry);
        if self.capacity > 0 {
            self.entries.truncate(self.capacity);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &DamageLogEntry> {
        self.entries.iter()
    }

    pub fn entries_for_actor(&self, uid: ActorUid) -> Vec<DamageLogEntry> {
        self.entries.iter().filter(|e| e.involves(uid)).cloned().collect()
    }

    pub fn entry_by_id(&self, damage_id: u32) -> Option<&DamageLogEntry> {
        self.entries.iter().find(|e| e.damage_id == damage_id)
    }

    pub fn latest(&self) -> Option<&DamageLogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pretty RON dump of the log, newest first.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let entries: Vec<&DamageLogEntry> = self.entries.iter().collect();
        ron::ser::to_string_pretty(&entries, Default::default())
    }
}
