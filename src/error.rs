use crate::world::ActorId;
use thiserror::Error;

/// Why a pipeline request was refused. Public entry points log these and
/// return `false`; nothing is surfaced to the player.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("{role} {id:?} is invalid or has been destroyed")]
    InvalidActor { role: &'static str, id: ActorId },
    #[error("{role} {id:?} has no ability system")]
    MissingAbilitySystem { role: &'static str, id: ActorId },
    #[error("magnitude {0} is not positive")]
    NonPositiveMagnitude(f32),
    #[error("no damage log entry with id {0}")]
    UnknownDamageId(u32),
    #[error("no live actor with unique id {0}")]
    UnknownActorUid(u32),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unable to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}
