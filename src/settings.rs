use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

pub const SETTINGS_PATH: &str = "assets/damage_pipeline.ron";

/// Tunables for the pipeline, stored as RON next to the game's other assets.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// How many damage log entries are kept. `0` keeps everything.
    pub damage_log_capacity: usize,
    pub capture_damage_log: bool,
    /// Heal the instigator for every resolved damage on the next tick.
    pub lifesteal_echo: bool,
    /// Resource granted to whoever lands a killing blow.
    pub kill_reward: Option<KillReward>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct KillReward {
    pub resource: String,
    pub amount: f32,
}

impl Default for KillReward {
    fn default() -> Self {
        Self {
            resource: "CardEnergy".into(),
            amount: 1.0,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            damage_log_capacity: 256,
            capture_damage_log: true,
            lifesteal_echo: true,
            kill_reward: Some(KillReward::default()),
        }
    }
}

impl PipelineSettings {
    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(content)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let content = ron::ser::to_string_pretty(self, Default::default())?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read settings from `path`, falling back to defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(settings) => {
                info!("loaded damage pipeline settings from '{}'", path.display());
                settings
            }
            Err(e) => {
                info!(
                    "unable to load damage pipeline settings from '{}', switching to defaults: {e}",
                    path.display()
                );
                Self::default()
            }
        }
    }
}
