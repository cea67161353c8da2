//! CADENCE scheduling system.
//!
//! Cooperative, tick-driven command execution:
//!
//! - **Scheduler**: resource arbitration and the four-phase tick loop
//! - **Continuation**: the suspension protocol command bodies yield through
//! - **Config**: tie-break policy and instance tuning
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadence_core::{Command, Scheduler};
//!
//! let mut scheduler = Scheduler::new();
//! let drivetrain = scheduler.register_resource("drivetrain");
//! scheduler.schedule(drive_forward.requires(drivetrain))?;
//! loop {
//!     scheduler.tick(); // from the robot's fixed-rate loop
//! }
//! ```

pub mod config;
pub mod continuation;
pub mod scheduler;

pub use config::{SchedulerConfig, TieBreak};
pub use continuation::{Continuation, Park};
pub use scheduler::{
    CommandId, CommandState, FaultSink, LogFaultSink, Scheduler, SchedulerEvent,
};
