//! The suspension protocol command bodies yield through.
//!
//! Command bodies are lightweight cooperative coroutines: futures the
//! scheduler polls exactly once per tick with a no-op waker. A body runs
//! until it reaches one of the suspension points below (or returns), at which
//! point control goes back to the tick loop; on the next tick it resumes at
//! the exact point it suspended.
//!
//! The contract a body must honor: reach a suspension point within bounded
//! work. A body that computes without suspending stalls the control loop —
//! that is a usage error in the command, not a scheduler bug, and nothing
//! here defends against it. Blocking I/O must instead be modeled as
//! [`Continuation::until`] polling a non-blocking condition.

use crate::core::command::BodyFuture;
use crate::core::{Command, RequirementSet};
use std::cell::Cell;
use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Shared tick clock. The scheduler stamps it at the start of every tick;
/// `delay` futures compare against it rather than sampling wall time, so
/// simulated time via `Scheduler::tick_at` behaves identically to real time.
pub(crate) struct TickClock {
    now: Cell<Instant>,
}

impl TickClock {
    pub(crate) fn new(now: Instant) -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(now),
        })
    }

    pub(crate) fn set(&self, now: Instant) {
        self.now.set(now);
    }
}

/// Per-running-command execution context handed to coroutine bodies.
///
/// A continuation is created when its command starts running and is destroyed
/// with the command's body when the command reaches a terminal state. Clones
/// handed to composed children share the parent's clock and ownership scope.
#[derive(Clone)]
pub struct Continuation {
    clock: Rc<TickClock>,
    /// Resources owned by the running root command. Children driven through
    /// [`run_to_completion`](Self::run_to_completion) must stay within this
    /// set; they execute under the root's ownership, not their own.
    owned: Rc<RequirementSet>,
}

impl Continuation {
    pub(crate) fn new(clock: Rc<TickClock>, owned: Rc<RequirementSet>) -> Self {
        Self { clock, owned }
    }

    /// Current tick time. Constant for the duration of a tick.
    pub fn now(&self) -> Instant {
        self.clock.now.get()
    }

    /// Suspends until the next tick, resuming at the point of the call.
    pub fn park(&self) -> Park {
        Park { parked: false }
    }

    /// Suspends, re-checking `predicate` once per tick, and resumes in the
    /// tick it first returns true. A predicate that is already true does not
    /// suspend.
    pub fn until<P>(&self, mut predicate: P) -> impl Future<Output = ()>
    where
        P: FnMut() -> bool,
    {
        poll_fn(move |_cx| {
            if predicate() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
    }

    /// Suspends until at least `duration` of tick-time has elapsed, measured
    /// from the step the future is first awaited.
    pub fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        let clock = Rc::clone(&self.clock);
        let mut deadline: Option<Instant> = None;
        poll_fn(move |_cx| {
            let now = clock.now.get();
            let target = *deadline.get_or_insert_with(|| now + duration);
            if now >= target {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
    }

    /// Inline-executes `command`'s full lifecycle as a blocking sub-step,
    /// advancing it one step per tick, and resumes the caller once it
    /// finishes. The sub-command's fault, if any, becomes the caller's.
    ///
    /// The sub-command runs under the caller's resource ownership: it faults
    /// immediately if it requires a resource the running root command does
    /// not own. This is the primitive the group builders are expressed in;
    /// leaf commands should rarely need it directly.
    pub fn run_to_completion(&self, command: Command) -> impl Future<Output = anyhow::Result<()>> {
        let body: Result<BodyFuture, String> = if command.requirements().is_subset_of(&self.owned) {
            Ok(command.into_body(self))
        } else {
            Err(command.name().to_string())
        };
        async move {
            match body {
                Ok(fut) => fut.await,
                Err(name) => Err(anyhow::anyhow!(
                    "sub-command '{name}' requires resources its parent does not own"
                )),
            }
        }
    }
}

/// Future returned by [`Continuation::park`]: pending on the first poll,
/// ready on the next.
pub struct Park {
    parked: bool,
}

impl Future for Park {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.parked {
            Poll::Ready(())
        } else {
            self.parked = true;
            Poll::Pending
        }
    }
}
