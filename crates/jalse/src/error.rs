//! # Errors
//!
//! This module defines the error type shared by the action engine and the
//! entity tree. Centralizing it keeps error handling consistent across every
//! public operation in the crate.

use crate::Identifier;

/// Errors surfaced by the action engine and the entity container tree.
#[derive(Debug, thiserror::Error)]
pub enum JalseError {
    #[error("engine is stopped")]
    EngineStopped,
    #[error("entity {0} is already associated")]
    EntityAlreadyAssociated(Identifier),
    #[error("entity {0} is not alive")]
    EntityNotAlive(Identifier),
    #[error("factory entity limit reached")]
    EntityLimitReached,
    #[error("cannot transfer an entity to itself")]
    CannotSelfTransfer,
    #[error("entity was exported but the destination refused it")]
    ExportedButNotTransferred,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("await is not supported on a periodic action context")]
    PeriodicAwaitUnsupported,
    #[error("action context was cancelled")]
    Cancellation,
}

pub type JalseResult<T> = Result<T, JalseError>;
