//! Error types for the CADENCE scheduling core.
//!
//! Scheduler-level failures are represented by [`CadenceError`]; faults raised
//! inside command bodies are opaque [`anyhow::Error`] values routed to the
//! scheduler's fault sink instead.

use crate::core::ResourceId;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type CadenceResult<T> = Result<T, CadenceError>;

/// Errors surfaced by scheduler and command-construction APIs.
#[derive(Debug, Error)]
pub enum CadenceError {
    /// A schedule request lost arbitration to an equal-or-higher-priority
    /// command that shares at least one required resource. Non-fatal; the
    /// running command is left undisturbed.
    #[error("scheduling conflict: '{command}' cannot preempt '{holder}'")]
    SchedulingConflict {
        /// Name of the rejected command.
        command: String,
        /// Name of the running or queued command that holds the resources.
        holder: String,
    },

    /// A command references a resource handle that was not registered with
    /// this scheduler instance.
    #[error("unknown resource handle {0:?}")]
    UnknownResource(ResourceId),

    /// A race group was constructed with no children. An empty race can never
    /// finish, so it is rejected at construction.
    #[error("race group '{0}' requires at least one child command")]
    EmptyRace(String),

    /// A default command factory produced a command that does not require
    /// exactly the resource it is registered for.
    #[error("invalid default command '{command}' for resource '{resource}': {reason}")]
    InvalidDefaultCommand {
        /// Name of the offending command.
        command: String,
        /// Name of the resource the default was registered for.
        resource: String,
        /// Why the command was rejected.
        reason: String,
    },
}
