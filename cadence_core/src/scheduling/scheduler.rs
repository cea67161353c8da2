//! The tick-driven command scheduler.
//!
//! One [`Scheduler::tick`] call runs four fixed phases:
//!
//! 1. Drain pending cancel requests: running targets transition to Canceled,
//!    their interrupted hooks fire, and their resources release.
//! 2. Start pending schedule requests through priority arbitration.
//!    Conflicting running commands of strictly lower priority are canceled;
//!    a conflicting command of higher priority (or equal, under
//!    incumbent-wins) rejects the request.
//! 3. Step every running command exactly once, in schedule order.
//! 4. Backfill default commands onto idle resources, resolved through the
//!    same arbitration path, so an idle resource with a default never stays
//!    idle across a tick boundary.
//!
//! The scheduler is strictly single-threaded: `tick` takes `&mut self`, so
//! ticks can never overlap, and command bodies run inline inside the tick.
//! Multiple independent scheduler instances may coexist; there is no global
//! singleton.

use crate::core::command::BodyFuture;
use crate::core::{Command, Priority, RequirementSet, ResourceId};
use crate::error::{CadenceError, CadenceResult};
use crate::scheduling::config::{SchedulerConfig, TieBreak};
use crate::scheduling::continuation::{Continuation, TickClock};
use futures::task::noop_waker_ref;
use log::{debug, error, trace, warn};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Source of the per-instance token stamped into every [`ResourceId`] a
/// scheduler issues. Handles from one scheduler never validate on another.
static NEXT_SCHEDULER_TOKEN: AtomicU32 = AtomicU32::new(0);

/// Token identifying one scheduled command instance. Issued by
/// [`Scheduler::schedule`]; used for cancellation and status queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CommandId(u64);

/// Lifecycle state of a scheduled command instance.
///
/// The pre-scheduling "idle" state is simply an unscheduled [`Command`]
/// value; it has no entry here. All three right-hand states are terminal — a
/// terminal instance is never restarted, a fresh `Command` must be
/// constructed instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CommandState {
    /// Queued for arbitration at the next tick.
    Scheduled,
    /// Owns its resources and is stepped once per tick.
    Running,
    /// Completed normally.
    Finished,
    /// Canceled by request, priority eviction, or group teardown.
    Canceled,
    /// A fault escaped the command's body.
    Errored,
}

impl CommandState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandState::Finished | CommandState::Canceled | CommandState::Errored
        )
    }
}

/// Structured notifications emitted as the scheduler mutates its state.
/// Registered listeners receive every event synchronously; they are meant
/// for telemetry and test probes and must not take long.
#[derive(Clone, Debug, Serialize)]
pub enum SchedulerEvent {
    /// A schedule request was accepted into the pending queue.
    Scheduled { id: CommandId, name: String },
    /// The command won arbitration, acquired its resources, and is Running.
    Started { id: CommandId, name: String },
    /// The command completed normally.
    Finished { id: CommandId, name: String },
    /// The command reached the Canceled state.
    Canceled { id: CommandId, name: String },
    /// The command is being evicted in favor of a conflicting command.
    /// Always followed by a `Canceled` event for the same instance.
    Interrupted {
        id: CommandId,
        name: String,
        by: String,
    },
    /// A schedule request lost arbitration at tick time and never started.
    Rejected {
        id: CommandId,
        name: String,
        holder: String,
    },
    /// A fault escaped the command's body.
    Errored {
        id: CommandId,
        name: String,
        detail: String,
    },
}

/// External collaborator notified when a fault escapes a command body.
/// The scheduler always reports and always releases the command's resources;
/// it never retries and never suppresses.
pub trait FaultSink {
    /// Called once per faulted command, during the tick that observed the
    /// fault.
    fn report_fault(&mut self, command: &str, detail: &anyhow::Error);
}

/// Default sink: reports through `log::error!`.
pub struct LogFaultSink;

impl FaultSink for LogFaultSink {
    fn report_fault(&mut self, command: &str, detail: &anyhow::Error) {
        error!("command '{}' faulted: {:#}", command, detail);
    }
}

struct DefaultSlot {
    /// Name of the command the factory produces, for introspection.
    name: String,
    factory: Box<dyn FnMut() -> Command>,
    /// Instance built during registration validation, used for the first
    /// backfill instead of being thrown away.
    primed: Option<Command>,
}

struct ResourceSlot {
    name: String,
    owner: Option<CommandId>,
    default: Option<DefaultSlot>,
}

struct RunningCommand {
    id: CommandId,
    name: String,
    requirements: RequirementSet,
    priority: Priority,
    future: BodyFuture,
}

struct PendingSchedule {
    id: CommandId,
    command: Command,
}

struct CommandRecord {
    name: String,
    state: CommandState,
}

enum Outcome {
    Finished,
    Canceled,
    Errored(anyhow::Error),
}

/// Owns the resource-ownership table and the set of in-flight commands, and
/// drives one arbitration-and-step round per external tick.
pub struct Scheduler {
    config: SchedulerConfig,
    /// Instance token stamped into every issued [`ResourceId`].
    token: u32,
    resources: Vec<ResourceSlot>,
    /// Running commands in schedule order. Stepping order is this order, so
    /// execution is deterministic for a given schedule history.
    running: Vec<RunningCommand>,
    pending_schedules: Vec<PendingSchedule>,
    pending_cancels: Vec<CommandId>,
    records: HashMap<CommandId, CommandRecord>,
    /// Terminal command ids, oldest first. The status table keeps at most
    /// `config.history_capacity` terminal records; older ones are forgotten
    /// so the table stays bounded over an unbounded run.
    terminal_history: VecDeque<CommandId>,
    next_id: u64,
    clock: Rc<TickClock>,
    fault_sink: Box<dyn FaultSink>,
    listeners: Vec<Box<dyn FnMut(&SchedulerEvent)>>,
    ticks: u64,
    last_tick_runtime: Option<Duration>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates a scheduler with an explicit configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            running: Vec::with_capacity(config.capacity),
            config,
            token: NEXT_SCHEDULER_TOKEN.fetch_add(1, Ordering::Relaxed),
            resources: Vec::new(),
            pending_schedules: Vec::new(),
            pending_cancels: Vec::new(),
            records: HashMap::new(),
            terminal_history: VecDeque::new(),
            next_id: 1,
            clock: TickClock::new(Instant::now()),
            fault_sink: Box::new(LogFaultSink),
            listeners: Vec::new(),
            ticks: 0,
            last_tick_runtime: None,
        }
    }

    /// Replaces the fault sink (chainable).
    pub fn with_fault_sink(mut self, sink: impl FaultSink + 'static) -> Self {
        self.fault_sink = Box::new(sink);
        self
    }

    /// Registers a listener for scheduler lifecycle events.
    pub fn add_event_listener(&mut self, listener: impl FnMut(&SchedulerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ------------------------------------------------------------------
    // Resource registration
    // ------------------------------------------------------------------

    /// Registers an exclusively-ownable resource. Performed during setup,
    /// before scheduling begins.
    pub fn register_resource(&mut self, name: &str) -> ResourceId {
        let id = ResourceId::new(self.token, self.resources.len());
        self.resources.push(ResourceSlot {
            name: name.to_string(),
            owner: None,
            default: None,
        });
        debug!("[{}] registered resource '{}'", self.config.name, name);
        id
    }

    /// Registers the default command for a resource. The factory is invoked
    /// each time the resource needs backfilling, because command instances
    /// are single-use. Its commands must require exactly this resource.
    ///
    /// Registration does not schedule anything immediately: the default
    /// becomes eligible on the next tick that finds the resource idle.
    /// Re-registering replaces any previous default.
    pub fn set_default_command<F>(&mut self, resource: ResourceId, mut factory: F) -> CadenceResult<()>
    where
        F: FnMut() -> Command + 'static,
    {
        let resource_name = self
            .resource_name(resource)
            .ok_or(CadenceError::UnknownResource(resource))?
            .to_string();

        let sample = factory();
        if sample.requirements().len() != 1 || !sample.requirements().contains(resource) {
            return Err(CadenceError::InvalidDefaultCommand {
                command: sample.name().to_string(),
                resource: resource_name,
                reason: "a default command must require exactly the resource it serves"
                    .to_string(),
            });
        }

        self.resources[resource.index()].default = Some(DefaultSlot {
            name: sample.name().to_string(),
            factory: Box::new(factory),
            primed: Some(sample),
        });
        Ok(())
    }

    /// Slot lookup that refuses handles issued by other scheduler instances.
    fn slot(&self, resource: ResourceId) -> Option<&ResourceSlot> {
        if resource.scheduler != self.token {
            return None;
        }
        self.resources.get(resource.index())
    }

    /// Current owner of a resource, if any.
    pub fn owner(&self, resource: ResourceId) -> Option<CommandId> {
        self.slot(resource)?.owner
    }

    /// Name a resource was registered under.
    pub fn resource_name(&self, resource: ResourceId) -> Option<&str> {
        self.slot(resource).map(|s| s.name.as_str())
    }

    /// Name of the command a resource's default factory produces.
    pub fn default_command_name(&self, resource: ResourceId) -> Option<&str> {
        self.slot(resource)?.default.as_ref().map(|d| d.name.as_str())
    }

    // ------------------------------------------------------------------
    // Schedule / cancel entry points
    // ------------------------------------------------------------------

    /// Requests that `command` run. The request is arbitrated at the start
    /// of the next tick; conflicts that are already decided — a running or
    /// queued command sharing a resource that the request does not outrank
    /// under the tie-break policy — are rejected here, so the caller learns
    /// immediately.
    ///
    /// Commands with a pending cancel request do not block a new request;
    /// the cancel resolves first within the tick.
    pub fn schedule(&mut self, command: Command) -> CadenceResult<CommandId> {
        for res in command.requirements().iter() {
            if self.slot(res).is_none() {
                return Err(CadenceError::UnknownResource(res));
            }
        }

        // Decided conflicts are surfaced now rather than at tick time.
        if let Some(holder) = self.blocking_running_conflict(&command) {
            warn!(
                "[{}] rejecting '{}': conflicts with running '{}'",
                self.config.name,
                command.name(),
                holder
            );
            return Err(CadenceError::SchedulingConflict {
                command: command.name().to_string(),
                holder,
            });
        }
        if let Some(holder) = self.blocking_queued_conflict(&command) {
            warn!(
                "[{}] rejecting '{}': conflicts with queued '{}'",
                self.config.name,
                command.name(),
                holder
            );
            return Err(CadenceError::SchedulingConflict {
                command: command.name().to_string(),
                holder,
            });
        }

        // The request outranks every conflicting queued command; evict them
        // now. They never started, so no hooks fire.
        self.evict_conflicting_queued(&command);

        let id = self.allocate(command.name());
        trace!("[{}] queued '{}'", self.config.name, command.name());
        self.emit(&SchedulerEvent::Scheduled {
            id,
            name: command.name().to_string(),
        });
        self.pending_schedules.push(PendingSchedule { id, command });
        Ok(id)
    }

    /// Requests cancellation. Queued targets are removed immediately without
    /// any hook running; running targets are canceled at the start of the
    /// next tick, receiving `on_end(true)`. Cancelling a terminal or unknown
    /// command is a no-op.
    pub fn cancel(&mut self, id: CommandId) {
        if let Some(pos) = self.pending_schedules.iter().position(|p| p.id == id) {
            let pending = self.pending_schedules.remove(pos);
            self.set_state(id, CommandState::Canceled);
            self.emit(&SchedulerEvent::Canceled {
                id,
                name: pending.command.name().to_string(),
            });
            return;
        }

        let running = matches!(
            self.records.get(&id).map(|r| r.state),
            Some(CommandState::Running)
        );
        if running && !self.pending_cancels.contains(&id) {
            self.pending_cancels.push(id);
        }
    }

    /// Cancels every queued and running command immediately. Queued commands
    /// are dropped without hooks; running commands receive `on_end(true)`.
    /// Default commands backfill on the next tick unless superseded.
    pub fn cancel_all(&mut self) {
        for pending in std::mem::take(&mut self.pending_schedules) {
            self.set_state(pending.id, CommandState::Canceled);
            self.emit(&SchedulerEvent::Canceled {
                id: pending.id,
                name: pending.command.name().to_string(),
            });
        }
        let ids: Vec<CommandId> = self.running.iter().map(|r| r.id).collect();
        for id in ids {
            self.finish_command(id, Outcome::Canceled);
        }
        self.pending_cancels.clear();
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Runs one arbitration-and-step round at the current wall-clock time.
    /// Must be called from a single external periodic loop; `&mut self`
    /// makes concurrent re-entry unrepresentable.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Runs one round at an explicit time. Lets simulations and tests drive
    /// `delay` deterministically with virtual time; `now` must never move
    /// backwards across calls.
    pub fn tick_at(&mut self, now: Instant) {
        let started = Instant::now();
        self.clock.set(now);
        self.ticks += 1;
        trace!("[{}] tick {} begin", self.config.name, self.ticks);

        self.drain_cancels();
        self.start_queued();
        self.step_running();
        self.backfill_defaults();
        self.audit_ownership();

        self.last_tick_runtime = Some(started.elapsed());
    }

    fn drain_cancels(&mut self) {
        for id in std::mem::take(&mut self.pending_cancels) {
            self.finish_command(id, Outcome::Canceled);
        }
    }

    fn start_queued(&mut self) {
        for pending in std::mem::take(&mut self.pending_schedules) {
            self.try_start(pending.id, pending.command);
        }
    }

    /// Arbitrates one schedule request against the running set and starts it
    /// if it wins. The request was screened when it was queued, but the
    /// running set may have changed since.
    fn try_start(&mut self, id: CommandId, command: Command) {
        let mut evictions: Vec<CommandId> = Vec::new();
        let mut blocked_by: Option<String> = None;
        for run in &self.running {
            if !run.requirements.intersects(command.requirements()) {
                continue;
            }
            if self.outranks(command.priority(), run.priority) {
                evictions.push(run.id);
            } else {
                blocked_by = Some(run.name.clone());
                break;
            }
        }

        if let Some(holder) = blocked_by {
            warn!(
                "[{}] '{}' lost arbitration to running '{}'",
                self.config.name,
                command.name(),
                holder
            );
            self.set_state(id, CommandState::Canceled);
            self.emit(&SchedulerEvent::Rejected {
                id,
                name: command.name().to_string(),
                holder,
            });
            return;
        }

        for victim in evictions {
            if let Some(victim_name) = self.command_name(victim).map(str::to_string) {
                self.emit(&SchedulerEvent::Interrupted {
                    id: victim,
                    name: victim_name,
                    by: command.name().to_string(),
                });
            }
            self.finish_command(victim, Outcome::Canceled);
        }

        for res in command.requirements().iter() {
            self.resources[res.index()].owner = Some(id);
        }

        let name = command.name().to_string();
        let priority = command.priority();
        let requirements = command.requirements().clone();
        let co = Continuation::new(Rc::clone(&self.clock), Rc::new(requirements.clone()));
        let future = command.into_body(&co);
        self.running.push(RunningCommand {
            id,
            name: name.clone(),
            requirements,
            priority,
            future,
        });
        self.set_state(id, CommandState::Running);
        debug!("[{}] started '{}'", self.config.name, name);
        self.emit(&SchedulerEvent::Started { id, name });
    }

    /// Advances every running command by exactly one step, in schedule
    /// order. Bodies are futures; one step is one poll with a no-op waker.
    fn step_running(&mut self) {
        let ids: Vec<CommandId> = self.running.iter().map(|r| r.id).collect();
        for id in ids {
            let Some(pos) = self.running.iter().position(|r| r.id == id) else {
                continue;
            };
            let mut cx = Context::from_waker(noop_waker_ref());
            match self.running[pos].future.as_mut().poll(&mut cx) {
                Poll::Pending => {}
                Poll::Ready(Ok(())) => self.finish_command(id, Outcome::Finished),
                Poll::Ready(Err(fault)) => self.finish_command(id, Outcome::Errored(fault)),
            }
        }
    }

    /// Schedules default commands onto idle resources, through the same
    /// arbitration path as ordinary requests but at the lowest priority.
    fn backfill_defaults(&mut self) {
        let mut ready: Vec<(usize, Command)> = Vec::new();
        for index in 0..self.resources.len() {
            let slot = &mut self.resources[index];
            if slot.owner.is_some() {
                continue;
            }
            let Some(default) = slot.default.as_mut() else {
                continue;
            };
            let command = default.primed.take().unwrap_or_else(|| (default.factory)());
            ready.push((index, command));
        }

        for (index, command) in ready {
            let command = command.with_priority(Priority::DEFAULT_COMMAND);
            let valid = command.requirements().len() == 1
                && command
                    .requirements()
                    .contains(ResourceId::new(self.token, index));
            if !valid {
                // The factory no longer honors the contract it was validated
                // against at registration. Disable it rather than corrupt
                // the ownership table.
                error!(
                    "[{}] default factory for '{}' produced '{}' with wrong requirements; disabling",
                    self.config.name, self.resources[index].name, command.name()
                );
                self.resources[index].default = None;
                continue;
            }
            let id = self.allocate(command.name());
            self.emit(&SchedulerEvent::Scheduled {
                id,
                name: command.name().to_string(),
            });
            self.try_start(id, command);
        }
    }

    /// Defensive check of the single shared mutable structure. A violation
    /// here means a scheduler bug, not a user error; abort loudly instead of
    /// running a control loop on a corrupted ownership table.
    fn audit_ownership(&self) {
        for (index, slot) in self.resources.iter().enumerate() {
            if let Some(owner) = slot.owner {
                let run = self.running.iter().find(|r| r.id == owner);
                match run {
                    None => panic!(
                        "ownership table corrupted: resource '{}' owned by terminated command {:?}",
                        slot.name, owner
                    ),
                    Some(run) => assert!(
                        run.requirements.contains(ResourceId::new(self.token, index)),
                        "ownership table corrupted: resource '{}' owned by '{}' which does not require it",
                        slot.name,
                        run.name
                    ),
                }
            }
        }
        for run in &self.running {
            for res in run.requirements.iter() {
                assert!(
                    self.resources[res.index()].owner == Some(run.id),
                    "ownership table corrupted: running '{}' lost ownership of resource '{}'",
                    run.name,
                    self.resources[res.index()].name
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Last known lifecycle state for a command instance. Terminal states
    /// are retained for the most recent `history_capacity` terminal commands
    /// only; `None` means the id is unknown or its record has rotated out.
    pub fn state(&self, id: CommandId) -> Option<CommandState> {
        self.records.get(&id).map(|r| r.state)
    }

    /// Whether the command is currently running.
    pub fn is_running(&self, id: CommandId) -> bool {
        matches!(self.state(id), Some(CommandState::Running))
    }

    /// Name the command was scheduled under.
    pub fn command_name(&self, id: CommandId) -> Option<&str> {
        self.records.get(&id).map(|r| r.name.as_str())
    }

    /// Running commands in schedule (and therefore stepping) order.
    pub fn running_commands(&self) -> Vec<CommandId> {
        self.running.iter().map(|r| r.id).collect()
    }

    /// Running commands that require a particular resource.
    pub fn running_commands_for(&self, resource: ResourceId) -> Vec<CommandId> {
        self.running
            .iter()
            .filter(|r| r.requirements.contains(resource))
            .map(|r| r.id)
            .collect()
    }

    /// Commands accepted but not yet arbitrated.
    pub fn queued_commands(&self) -> Vec<CommandId> {
        self.pending_schedules.iter().map(|p| p.id).collect()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wall-clock time the most recent tick took, if any tick has run.
    pub fn last_tick_runtime(&self) -> Option<Duration> {
        self.last_tick_runtime
    }

    /// Number of command instances in the status table: queued, running, and
    /// the bounded window of recently terminal records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn allocate(&mut self, name: &str) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        self.records.insert(
            id,
            CommandRecord {
                name: name.to_string(),
                state: CommandState::Scheduled,
            },
        );
        id
    }

    /// Applies a state transition and, for terminal states, rotates the id
    /// into the bounded retention window. Every terminal transition passes
    /// through here exactly once, so the status table cannot grow without
    /// bound however long the control loop runs.
    fn set_state(&mut self, id: CommandId, state: CommandState) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        record.state = state;
        if state.is_terminal() {
            self.terminal_history.push_back(id);
            while self.terminal_history.len() > self.config.history_capacity {
                if let Some(oldest) = self.terminal_history.pop_front() {
                    self.records.remove(&oldest);
                }
            }
        }
    }

    /// Whether a new request at `incoming` priority displaces an incumbent.
    fn outranks(&self, incoming: Priority, incumbent: Priority) -> bool {
        incoming > incumbent
            || (incoming == incumbent && self.config.tie_break == TieBreak::NewcomerWins)
    }

    /// The first running command that blocks `command`, skipping incumbents
    /// with a pending cancel (those resolve before arbitration).
    fn blocking_running_conflict(&self, command: &Command) -> Option<String> {
        self.running
            .iter()
            .filter(|r| !self.pending_cancels.contains(&r.id))
            .find(|r| {
                r.requirements.intersects(command.requirements())
                    && !self.outranks(command.priority(), r.priority)
            })
            .map(|r| r.name.clone())
    }

    /// The first queued command that blocks `command`.
    fn blocking_queued_conflict(&self, command: &Command) -> Option<String> {
        self.pending_schedules
            .iter()
            .find(|p| {
                p.command.conflicts_with(command)
                    && !self.outranks(command.priority(), p.command.priority())
            })
            .map(|p| p.command.name().to_string())
    }

    /// Removes queued commands the newcomer outranks. They never started, so
    /// no lifecycle hooks run.
    fn evict_conflicting_queued(&mut self, command: &Command) {
        let mut evicted: Vec<(CommandId, String)> = Vec::new();
        self.pending_schedules.retain(|p| {
            if p.command.conflicts_with(command) {
                evicted.push((p.id, p.command.name().to_string()));
                false
            } else {
                true
            }
        });
        for (id, name) in evicted {
            self.set_state(id, CommandState::Canceled);
            self.emit(&SchedulerEvent::Interrupted {
                id,
                name: name.clone(),
                by: command.name().to_string(),
            });
            self.emit(&SchedulerEvent::Canceled { id, name });
        }
    }

    /// Removes a command from the running set and applies its terminal
    /// state. Dropping the body future is what delivers interrupted hooks to
    /// a canceled command's started-but-unfinished actions; it happens
    /// before the resources release, matching the documented tick order.
    fn finish_command(&mut self, id: CommandId, outcome: Outcome) {
        let Some(pos) = self.running.iter().position(|r| r.id == id) else {
            return;
        };
        let run = self.running.remove(pos);
        let name = run.name;
        drop(run.future);
        for slot in &mut self.resources {
            if slot.owner == Some(id) {
                slot.owner = None;
            }
        }

        match outcome {
            Outcome::Finished => {
                self.set_state(id, CommandState::Finished);
                debug!("[{}] finished '{}'", self.config.name, name);
                self.emit(&SchedulerEvent::Finished { id, name });
            }
            Outcome::Canceled => {
                self.set_state(id, CommandState::Canceled);
                debug!("[{}] canceled '{}'", self.config.name, name);
                self.emit(&SchedulerEvent::Canceled { id, name });
            }
            Outcome::Errored(fault) => {
                self.set_state(id, CommandState::Errored);
                error!("[{}] command '{}' errored: {:#}", self.config.name, name, fault);
                self.fault_sink.report_fault(&name, &fault);
                self.emit(&SchedulerEvent::Errored {
                    id,
                    name,
                    detail: format!("{:#}", fault),
                });
            }
        }
    }

    fn emit(&mut self, event: &SchedulerEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}
