//! Error types for the detection core.
//!
//! Only genuine faults live here. A vetoed notification or an item nobody
//! claims is an ordinary [`GestureOutcome`](crate::dispatcher::GestureOutcome),
//! not an error.

/// Errors from the ability registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbilityError {
    /// Activation was requested for an id that is not registered.
    /// Indicates the registry and the caller are out of sync.
    #[error("unknown ability: {0}")]
    UnknownAbility(String),
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Umbrella error returned by dispatcher entry points.
#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type GestureResult<T> = Result<T, GestureError>;
