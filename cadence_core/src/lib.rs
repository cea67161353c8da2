//! # CADENCE Core
//!
//! The cooperative command-scheduling core for the CADENCE robotics
//! framework.
//!
//! CADENCE lets independently-authored units of behavior ("commands") run
//! concurrently within a single control thread, contend for exclusive
//! ownership of shared mechanisms, and compose into sequences, parallel
//! groups, and race/deadline groups. This crate provides the building
//! blocks:
//!
//! - **Resources**: exclusively-ownable handles for hardware or logical
//!   subsystems, with optional default commands
//! - **Commands**: named units of work with fixed requirement sets and
//!   priorities, atomic or composed
//! - **Continuations**: the suspension protocol a command body yields
//!   through (`park`, `until`, `delay`, `run_to_completion`)
//! - **Scheduler**: resource arbitration and one-step-per-tick execution,
//!   driven by an external fixed-rate loop
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence_core::{Command, Scheduler};
//! use std::time::Duration;
//!
//! let mut scheduler = Scheduler::new();
//! let drivetrain = scheduler.register_resource("drivetrain");
//!
//! let cmd = Command::run("pulse-forward", |co| async move {
//!     // drive output on
//!     co.delay(Duration::from_millis(500)).await;
//!     // drive output off
//!     Ok(())
//! })
//! .requires(drivetrain);
//!
//! scheduler.schedule(cmd).unwrap();
//! scheduler.tick();
//! ```
//!
//! ## Threading
//!
//! The scheduler is strictly single-threaded: command bodies run inline
//! within [`Scheduler::tick`], which must be called from one periodic loop.
//! The types here are deliberately not `Send`; use one scheduler instance
//! per thread (typically exactly one per robot program, constructed
//! explicitly and passed where needed — there is no hidden global).

pub mod core;
pub mod error;
pub mod scheduling;

// Re-export commonly used types for easy access
pub use crate::core::{Action, Command, Completion, Priority, RequirementSet, ResourceId};
pub use error::{CadenceError, CadenceResult};
pub use scheduling::{
    CommandId, CommandState, Continuation, FaultSink, LogFaultSink, Scheduler, SchedulerConfig,
    SchedulerEvent, TieBreak,
};
