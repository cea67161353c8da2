//! Commands: schedulable units of behavior.
//!
//! A [`Command`] pairs a name and a fixed [`RequirementSet`] with a body.
//! Bodies come in two primitive flavors:
//!
//! - **Atomic**: an [`Action`] implementation whose `execute` hook runs once
//!   per scheduler tick, bracketed by `on_start`/`on_end` lifecycle hooks.
//! - **Coroutine**: a free-form async body written against a
//!   [`Continuation`], suspending at `park`/`until`/`delay` points.
//!
//! Group builders ([`Command::sequence`], [`Command::parallel_all`],
//! [`Command::race`], [`Command::deadline`]) compose commands into larger
//! commands; a group's requirement set is the union of its children's,
//! captured once at construction.
//!
//! A `Command` is an inert value until handed to
//! [`Scheduler::schedule`](crate::Scheduler::schedule), which consumes it.
//! Terminal commands are never reused; construct a fresh instance to run the
//! same behavior again.

use crate::core::resource::{RequirementSet, ResourceId};
use crate::error::{CadenceError, CadenceResult};
use crate::scheduling::continuation::Continuation;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::{poll_fn, Future};
use std::task::Poll;

/// Scheduling priority. Higher values win arbitration.
///
/// A newly scheduled command cancels conflicting running commands of strictly
/// lower priority; equal priorities are resolved by the scheduler's
/// [`TieBreak`](crate::TieBreak) policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub i32);

impl Priority {
    /// Priority assigned to ordinary commands that don't specify one.
    pub const NORMAL: Priority = Priority(0);

    /// The lowest ordinal. Forced onto default commands so they lose every
    /// arbitration against explicitly scheduled work.
    pub const DEFAULT_COMMAND: Priority = Priority(i32::MIN);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

/// Outcome of one [`Action::execute`] step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The action has more work; step it again next tick.
    Continue,
    /// The action is finished; `on_end(false)` fires and resources release.
    Done,
}

/// An atomic command body stepped once per tick.
///
/// `execute` must perform a bounded amount of work; the scheduler regains
/// control only when it returns. An implementation that spins or blocks
/// internally will blow the control loop's period deadline — that is a usage
/// error, not something the scheduler defends against.
pub trait Action {
    /// Called once when the command starts running.
    fn on_start(&mut self) {}

    /// One step of body logic. Returning `Err` marks the command Errored and
    /// routes the fault to the scheduler's fault sink.
    fn execute(&mut self) -> anyhow::Result<Completion>;

    /// Called exactly once when the command reaches a terminal state.
    /// `interrupted` is true for cancellation (external request, priority
    /// eviction, group teardown) and for faults; false for normal completion.
    fn on_end(&mut self, _interrupted: bool) {}
}

pub(crate) type BodyFuture = LocalBoxFuture<'static, anyhow::Result<()>>;
type CoroutineFn = Box<dyn FnOnce(Continuation) -> BodyFuture>;

pub(crate) enum Body {
    Action(Box<dyn Action>),
    Coroutine(CoroutineFn),
    Sequence(Vec<Command>),
    ParallelAll(Vec<Command>),
    Race {
        children: Vec<Command>,
        /// Index of the designated deadline child, if any. `None` means the
        /// plain race: first finisher wins.
        deadline: Option<usize>,
    },
}

/// A named, schedulable unit of behavior with a fixed resource requirement
/// set and a priority.
pub struct Command {
    name: String,
    requirements: RequirementSet,
    priority: Priority,
    body: Body,
}

impl Command {
    fn with_body(name: impl Into<String>, body: Body) -> Self {
        Self {
            name: name.into(),
            requirements: RequirementSet::new(),
            priority: Priority::NORMAL,
            body,
        }
    }

    /// Wraps an [`Action`] into an atomic command.
    pub fn from_action(name: impl Into<String>, action: impl Action + 'static) -> Self {
        Self::with_body(name, Body::Action(Box::new(action)))
    }

    /// Builds a command from a raw coroutine body. The body receives the
    /// [`Continuation`] it must suspend through.
    ///
    /// ```ignore
    /// let cmd = Command::run("drive-off-line", |co| async move {
    ///     drivetrain_out.set(0.5);
    ///     co.delay(Duration::from_millis(750)).await;
    ///     drivetrain_out.set(0.0);
    ///     Ok(())
    /// });
    /// ```
    pub fn run<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(Continuation) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self::with_body(
            name,
            Body::Coroutine(Box::new(move |co| Box::pin(body(co)))),
        )
    }

    /// Builds a one-shot command that runs a closure and finishes in the same
    /// tick it starts.
    pub fn run_once<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        Self::run(name, |_co| async move { f() })
    }

    /// Runs `children` one after another, in listed order. Finishes when the
    /// last child finishes. An empty sequence finishes immediately on its
    /// first step.
    pub fn sequence(name: impl Into<String>, children: Vec<Command>) -> Self {
        let requirements = union_of(&children);
        let mut cmd = Self::with_body(name, Body::Sequence(children));
        cmd.requirements = requirements;
        cmd
    }

    /// Starts `children` together and advances every still-running child once
    /// per tick. Finishes only when every child has finished. An empty group
    /// finishes immediately on its first step.
    pub fn parallel_all(name: impl Into<String>, children: Vec<Command>) -> Self {
        let requirements = union_of(&children);
        let mut cmd = Self::with_body(name, Body::ParallelAll(children));
        cmd.requirements = requirements;
        cmd
    }

    /// Starts `children` together and finishes as soon as any child finishes,
    /// cancelling the rest at that instant. A race with zero children could
    /// never finish and is rejected at construction.
    pub fn race(name: impl Into<String>, children: Vec<Command>) -> CadenceResult<Self> {
        let name = name.into();
        if children.is_empty() {
            return Err(CadenceError::EmptyRace(name));
        }
        let requirements = union_of(&children);
        let mut cmd = Self::with_body(
            name,
            Body::Race {
                children,
                deadline: None,
            },
        );
        cmd.requirements = requirements;
        Ok(cmd)
    }

    /// Race variant with a designated deadline child: the group finishes when
    /// `deadline` finishes, regardless of the other children, which are
    /// cancelled at that instant if still running.
    pub fn deadline(name: impl Into<String>, deadline: Command, others: Vec<Command>) -> Self {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(deadline);
        children.extend(others);
        let requirements = union_of(&children);
        let mut cmd = Self::with_body(
            name,
            Body::Race {
                children,
                deadline: Some(0),
            },
        );
        cmd.requirements = requirements;
        cmd
    }

    /// Declares that this command requires exclusive ownership of `resource`.
    pub fn requires(mut self, resource: ResourceId) -> Self {
        self.requirements.insert(resource);
        self
    }

    /// Declares several required resources at once.
    pub fn requires_all(mut self, resources: impl IntoIterator<Item = ResourceId>) -> Self {
        for id in resources {
            self.requirements.insert(id);
        }
        self
    }

    /// Sets the arbitration priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Command name, used in logs, events, and fault reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The immutable requirement set.
    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    /// Arbitration priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether the two commands require at least one common resource.
    pub fn conflicts_with(&self, other: &Command) -> bool {
        self.requirements.intersects(&other.requirements)
    }

    /// Converts the command body into the future the scheduler polls once per
    /// tick. Lifecycle hooks fire inside the future: `on_start` on the first
    /// poll, `on_end(false)` on normal completion, `on_end(true)` when the
    /// future is dropped after starting but before finishing.
    pub(crate) fn into_body(self, co: &Continuation) -> BodyFuture {
        match self.body {
            Body::Action(action) => action_future(action, co.clone()),
            Body::Coroutine(f) => f(co.clone()),
            Body::Sequence(children) => {
                let co = co.clone();
                Box::pin(async move {
                    for child in children {
                        co.run_to_completion(child).await?;
                    }
                    Ok(())
                })
            }
            Body::ParallelAll(children) => parallel_future(children, co.clone()),
            Body::Race { children, deadline } => race_future(children, deadline, co.clone()),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn union_of(children: &[Command]) -> RequirementSet {
    let mut set = RequirementSet::new();
    for child in children {
        set.union_with(&child.requirements);
    }
    set
}

/// Drop guard that delivers `on_end(true)` to actions that started but never
/// finished. Dropping a body future mid-flight is how the scheduler cancels:
/// the guard guarantees the interrupted hook fires exactly once, and never
/// for actions that already completed normally.
struct StartedAction {
    action: Box<dyn Action>,
    finished: bool,
}

impl Drop for StartedAction {
    fn drop(&mut self) {
        if !self.finished {
            self.action.on_end(true);
        }
    }
}

fn action_future(action: Box<dyn Action>, co: Continuation) -> BodyFuture {
    Box::pin(async move {
        let mut run = StartedAction {
            action,
            finished: false,
        };
        run.action.on_start();
        loop {
            match run.action.execute() {
                Ok(Completion::Done) => break,
                Ok(Completion::Continue) => co.park().await,
                // The guard is still armed, so dropping this future delivers
                // on_end(true) after the fault is reported.
                Err(fault) => return Err(fault),
            }
        }
        run.finished = true;
        run.action.on_end(false);
        Ok(())
    })
}

fn parallel_future(children: Vec<Command>, co: Continuation) -> BodyFuture {
    Box::pin(async move {
        let mut slots: Vec<Option<BodyFuture>> = children
            .into_iter()
            .map(|child| Some(child.into_body(&co)))
            .collect();
        poll_fn(move |cx| {
            let mut pending = false;
            for slot in slots.iter_mut() {
                if let Some(fut) = slot {
                    match fut.as_mut().poll(cx) {
                        // Finished children are dropped from the round so
                        // they are never stepped again.
                        Poll::Ready(Ok(())) => *slot = None,
                        // A faulted child takes the group down; the siblings
                        // are interrupted when `slots` drops.
                        Poll::Ready(Err(fault)) => return Poll::Ready(Err(fault)),
                        Poll::Pending => pending = true,
                    }
                }
            }
            if pending {
                Poll::Pending
            } else {
                Poll::Ready(Ok(()))
            }
        })
        .await
    })
}

fn race_future(children: Vec<Command>, deadline: Option<usize>, co: Continuation) -> BodyFuture {
    Box::pin(async move {
        let mut slots: Vec<Option<BodyFuture>> = children
            .into_iter()
            .map(|child| Some(child.into_body(&co)))
            .collect();
        // The deadline child is polled last in each round so every sibling
        // still gets its step in the tick the deadline resolves.
        let order: Vec<usize> = match deadline {
            None => (0..slots.len()).collect(),
            Some(d) => (0..slots.len()).filter(|&i| i != d).chain([d]).collect(),
        };
        poll_fn(move |cx| {
            for &index in &order {
                let result = match slots[index].as_mut() {
                    Some(fut) => fut.as_mut().poll(cx),
                    None => continue,
                };
                match result {
                    Poll::Ready(Ok(())) => {
                        // Plain race: first finisher wins. Deadline race: only
                        // the designated child ends the group. The losers are
                        // interrupted when `slots` drops.
                        if deadline.map_or(true, |d| d == index) {
                            return Poll::Ready(Ok(()));
                        }
                        slots[index] = None;
                    }
                    Poll::Ready(Err(fault)) => return Poll::Ready(Err(fault)),
                    Poll::Pending => {}
                }
            }
            Poll::Pending
        })
        .await
    })
}
