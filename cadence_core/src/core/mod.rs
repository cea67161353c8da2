//! Core command and resource primitives.
//!
//! - [`ResourceId`] / [`RequirementSet`]: exclusively-ownable resource
//!   handles and the sets commands require.
//! - [`Command`] / [`Action`]: schedulable units of behavior and the atomic
//!   step-per-tick body trait.
//! - [`Priority`]: arbitration ordinal; higher wins.

pub mod command;
pub mod resource;

pub use command::{Action, Command, Completion, Priority};
pub use resource::{RequirementSet, ResourceId};
