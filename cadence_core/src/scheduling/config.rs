//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Policy for resolving a schedule request whose priority exactly equals a
/// conflicting running (or queued) command's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// The new request evicts the incumbent. This matches the usual
    /// driver-station expectation: the most recent intent wins.
    NewcomerWins,
    /// The incumbent keeps its resources and the request is rejected.
    IncumbentWins,
}

/// Tunable scheduler behavior. Construct with [`SchedulerConfig::default`]
/// or a preset, then adjust fields directly or through the `with_*` helpers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduler name, used in log lines (useful when several instances
    /// coexist, e.g. one per test).
    pub name: String,
    /// Equal-priority arbitration policy.
    pub tie_break: TieBreak,
    /// Running-command capacity to pre-allocate, bounding reallocation during
    /// the control loop.
    pub capacity: usize,
    /// How many terminal command records the status table retains for
    /// [`Scheduler::state`](crate::Scheduler::state) queries. Older terminal
    /// records are forgotten, keeping the table bounded over an unbounded
    /// run.
    pub history_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "scheduler".to_string(),
            tie_break: TieBreak::NewcomerWins,
            capacity: 16,
            history_capacity: 128,
        }
    }
}

impl SchedulerConfig {
    /// Preset where a running command can only be displaced by strictly
    /// higher priority, never by an equal-priority newcomer.
    pub fn incumbent_wins() -> Self {
        Self {
            tie_break: TieBreak::IncumbentWins,
            ..Self::default()
        }
    }

    /// Sets the scheduler name (chainable).
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sets the pre-allocated running-command capacity (chainable).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the terminal-record retention window (chainable).
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}
