// Lifecycle states, cancellation, default commands, faults, and virtual time.
use cadence_core::{
    Action, CadenceError, Command, CommandState, Completion, FaultSink, Priority, Scheduler,
    SchedulerEvent,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

type Trace = Rc<RefCell<Vec<String>>>;

struct StepsAction {
    name: &'static str,
    steps_left: u32,
    trace: Trace,
}

impl Action for StepsAction {
    fn on_start(&mut self) {
        self.trace.borrow_mut().push(format!("{}:start", self.name));
    }

    fn execute(&mut self) -> anyhow::Result<Completion> {
        self.trace.borrow_mut().push(format!("{}:step", self.name));
        self.steps_left -= 1;
        Ok(if self.steps_left == 0 {
            Completion::Done
        } else {
            Completion::Continue
        })
    }

    fn on_end(&mut self, interrupted: bool) {
        let tag = if interrupted { "interrupted" } else { "ok" };
        self.trace
            .borrow_mut()
            .push(format!("{}:end:{}", self.name, tag));
    }
}

fn steps(name: &'static str, count: u32, trace: &Trace) -> Command {
    Command::from_action(
        name,
        StepsAction {
            name,
            steps_left: count,
            trace: Rc::clone(trace),
        },
    )
}

fn hold(name: &'static str, trace: &Trace) -> Command {
    steps(name, u32::MAX, trace)
}

fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

fn count_of(trace: &Trace, entry: &str) -> usize {
    trace.borrow().iter().filter(|e| e.as_str() == entry).count()
}

#[test]
fn cancel_running_command_fires_hook_and_frees_resource() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();
    let x = scheduler.register_resource("x");

    let id = scheduler.schedule(hold("c", &trace).requires(x)).unwrap();
    scheduler.tick();
    assert!(scheduler.is_running(id));

    scheduler.cancel(id);
    // Nothing happens until the next tick drains cancel requests.
    assert!(scheduler.is_running(id));

    scheduler.tick();
    assert_eq!(scheduler.state(id), Some(CommandState::Canceled));
    assert_eq!(scheduler.owner(x), None);
    assert_eq!(count_of(&trace, "c:end:interrupted"), 1);
    assert_eq!(count_of(&trace, "c:step"), 1);
}

#[test]
fn cancel_queued_command_runs_no_hooks() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();

    let id = scheduler.schedule(steps("c", 3, &trace)).unwrap();
    scheduler.cancel(id);
    scheduler.tick();

    assert_eq!(scheduler.state(id), Some(CommandState::Canceled));
    assert!(trace.borrow().is_empty());
}

#[test]
fn cancel_is_idempotent() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();

    let id = scheduler.schedule(hold("c", &trace)).unwrap();
    scheduler.tick();

    scheduler.cancel(id);
    scheduler.cancel(id);
    scheduler.tick();
    scheduler.cancel(id); // already terminal, must be a no-op

    assert_eq!(scheduler.state(id), Some(CommandState::Canceled));
    assert_eq!(count_of(&trace, "c:end:interrupted"), 1);
}

#[test]
fn cancel_all_sweeps_queued_and_running() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();
    let x = scheduler.register_resource("x");

    let running = scheduler.schedule(hold("r", &trace).requires(x)).unwrap();
    scheduler.tick();
    let queued = scheduler.schedule(hold("q", &trace)).unwrap();

    scheduler.cancel_all();
    scheduler.tick();

    assert_eq!(scheduler.state(running), Some(CommandState::Canceled));
    assert_eq!(scheduler.state(queued), Some(CommandState::Canceled));
    assert_eq!(scheduler.owner(x), None);
    assert!(scheduler.running_commands().is_empty());
    assert_eq!(count_of(&trace, "r:end:interrupted"), 1);
    assert!(!trace.borrow().iter().any(|e| e.starts_with("q:")));
}

#[test]
fn one_shot_finishes_in_its_first_tick() {
    let fired = Rc::new(Cell::new(false));
    let probe = Rc::clone(&fired);
    let mut scheduler = Scheduler::new();

    let id = scheduler
        .schedule(Command::run_once("shot", move || {
            probe.set(true);
            Ok(())
        }))
        .unwrap();
    scheduler.tick();

    assert!(fired.get());
    assert_eq!(scheduler.state(id), Some(CommandState::Finished));
}

struct RecordingSink(Rc<RefCell<Vec<String>>>);

impl FaultSink for RecordingSink {
    fn report_fault(&mut self, command: &str, detail: &anyhow::Error) {
        self.0.borrow_mut().push(format!("{command}: {detail}"));
    }
}

#[test]
fn fault_reports_to_sink_and_releases_resources() {
    let trace = new_trace();
    let faults = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::new().with_fault_sink(RecordingSink(Rc::clone(&faults)));
    let x = scheduler.register_resource("x");
    let y = scheduler.register_resource("y");

    struct Exploding {
        trace: Trace,
    }
    impl Action for Exploding {
        fn execute(&mut self) -> anyhow::Result<Completion> {
            Err(anyhow::anyhow!("encoder glitch"))
        }
        fn on_end(&mut self, interrupted: bool) {
            let tag = if interrupted { "interrupted" } else { "ok" };
            self.trace.borrow_mut().push(format!("boom:end:{tag}"));
        }
    }

    let bystander = scheduler.schedule(hold("by", &trace).requires(y)).unwrap();
    let faulty = scheduler
        .schedule(
            Command::from_action(
                "boom",
                Exploding {
                    trace: Rc::clone(&trace),
                },
            )
            .requires(x),
        )
        .unwrap();
    scheduler.tick();

    assert_eq!(scheduler.state(faulty), Some(CommandState::Errored));
    assert_eq!(scheduler.owner(x), None);
    assert_eq!(*faults.borrow(), vec!["boom: encoder glitch"]);
    // The body never finished, so the interruption hook ran.
    assert_eq!(count_of(&trace, "boom:end:interrupted"), 1);
    // Siblings on other resources are untouched.
    assert!(scheduler.is_running(bystander));
}

#[test]
fn default_command_backfills_idle_resource() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();
    let y = scheduler.register_resource("y");

    let factory_trace = Rc::clone(&trace);
    scheduler
        .set_default_command(y, move || hold("idle-y", &factory_trace).requires(y))
        .unwrap();
    assert_eq!(scheduler.default_command_name(y), Some("idle-y"));
    // Registration does not schedule anything by itself.
    assert_eq!(scheduler.owner(y), None);
    assert!(scheduler.queued_commands().is_empty());

    scheduler.tick();
    let default_id = scheduler.owner(y).expect("default holds the idle resource");
    assert!(scheduler.is_running(default_id));
    assert_eq!(count_of(&trace, "idle-y:start"), 1);

    scheduler.tick();
    assert_eq!(scheduler.owner(y), Some(default_id));
}

#[test]
fn scheduled_command_displaces_default_then_default_returns() {
    let trace = new_trace();
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::new();
    let y = scheduler.register_resource("y");

    let factory_trace = Rc::clone(&trace);
    scheduler
        .set_default_command(y, move || hold("idle-y", &factory_trace).requires(y))
        .unwrap();
    let probe = Rc::clone(&events);
    scheduler.add_event_listener(move |event| {
        if let SchedulerEvent::Started { name, .. } = event {
            probe.borrow_mut().push(name.clone());
        }
    });

    scheduler.tick(); // default starts

    let task = scheduler
        .schedule(steps("task", 2, &trace).requires(y).with_priority(Priority(1)))
        .unwrap();
    scheduler.tick(); // default evicted, task starts
    assert_eq!(scheduler.owner(y), Some(task));
    assert_eq!(count_of(&trace, "idle-y:end:interrupted"), 1);

    scheduler.tick(); // task finishes; a fresh default backfills the same tick
    assert_eq!(scheduler.state(task), Some(CommandState::Finished));
    assert!(scheduler.owner(y).is_some());
    assert_ne!(scheduler.owner(y), Some(task));
    assert_eq!(*events.borrow(), vec!["idle-y", "task", "idle-y"]);
}

#[test]
fn displacing_one_default_leaves_unrelated_defaults_alone() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();
    let y = scheduler.register_resource("y");
    let z = scheduler.register_resource("z");

    let t1 = Rc::clone(&trace);
    scheduler
        .set_default_command(y, move || hold("idle-y", &t1).requires(y))
        .unwrap();
    let t2 = Rc::clone(&trace);
    scheduler
        .set_default_command(z, move || hold("idle-z", &t2).requires(z))
        .unwrap();
    scheduler.tick();
    let idle_z = scheduler.owner(z).unwrap();

    let task = scheduler
        .schedule(steps("task", 2, &trace).requires(y).with_priority(Priority(1)))
        .unwrap();
    scheduler.tick();

    assert_eq!(scheduler.owner(y), Some(task));
    assert_eq!(scheduler.owner(z), Some(idle_z));
    assert!(scheduler.is_running(idle_z));
    assert_eq!(count_of(&trace, "idle-z:start"), 1);
    assert!(!trace.borrow().iter().any(|e| e.starts_with("idle-z:end")));
}

#[test]
fn invalid_default_command_is_rejected_at_registration() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();
    let y = scheduler.register_resource("y");
    let z = scheduler.register_resource("z");

    // Requires nothing.
    let factory_trace = Rc::clone(&trace);
    let result = scheduler.set_default_command(y, move || hold("bare", &factory_trace));
    assert!(matches!(
        result,
        Err(CadenceError::InvalidDefaultCommand { .. })
    ));

    // Requires an extra resource beyond the one it serves.
    let factory_trace = Rc::clone(&trace);
    let result = scheduler.set_default_command(y, move || {
        hold("greedy", &factory_trace).requires(y).requires(z)
    });
    assert!(matches!(
        result,
        Err(CadenceError::InvalidDefaultCommand { .. })
    ));
}

#[test]
fn delay_resumes_at_its_deadline_under_virtual_time() {
    let mut scheduler = Scheduler::new();
    let t0 = Instant::now();

    let id = scheduler
        .schedule(Command::run("timed", |co| async move {
            co.delay(Duration::from_millis(100)).await;
            Ok(())
        }))
        .unwrap();

    scheduler.tick_at(t0);
    assert!(scheduler.is_running(id));
    scheduler.tick_at(t0 + Duration::from_millis(50));
    assert!(scheduler.is_running(id));
    scheduler.tick_at(t0 + Duration::from_millis(100));
    assert_eq!(scheduler.state(id), Some(CommandState::Finished));
}

#[test]
fn until_polls_its_predicate_once_per_tick() {
    let flag = Rc::new(Cell::new(false));
    let probe = Rc::clone(&flag);
    let mut scheduler = Scheduler::new();

    let id = scheduler
        .schedule(Command::run("awaits", move |co| async move {
            co.until(move || probe.get()).await;
            Ok(())
        }))
        .unwrap();

    scheduler.tick();
    scheduler.tick();
    assert!(scheduler.is_running(id));

    flag.set(true);
    scheduler.tick();
    assert_eq!(scheduler.state(id), Some(CommandState::Finished));
}

#[test]
fn nested_run_to_completion_outside_owned_resources_faults() {
    let trace = new_trace();
    let faults = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::new().with_fault_sink(RecordingSink(Rc::clone(&faults)));
    let x = scheduler.register_resource("x");

    let sub = steps("sub", 1, &trace).requires(x);
    let id = scheduler
        .schedule(Command::run("parent", move |co| async move {
            co.run_to_completion(sub).await
        }))
        .unwrap();
    scheduler.tick();

    assert_eq!(scheduler.state(id), Some(CommandState::Errored));
    assert_eq!(faults.borrow().len(), 1);
    // The sub-command never ran at all.
    assert!(trace.borrow().is_empty());
}

#[test]
fn event_listener_sees_the_full_lifecycle() {
    let trace = new_trace();
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = Scheduler::new();

    let probe = Rc::clone(&events);
    scheduler.add_event_listener(move |event| {
        let tag = match event {
            SchedulerEvent::Scheduled { .. } => "scheduled",
            SchedulerEvent::Started { .. } => "started",
            SchedulerEvent::Finished { .. } => "finished",
            SchedulerEvent::Canceled { .. } => "canceled",
            SchedulerEvent::Interrupted { .. } => "interrupted",
            SchedulerEvent::Rejected { .. } => "rejected",
            SchedulerEvent::Errored { .. } => "errored",
        };
        probe.borrow_mut().push(tag);
    });

    scheduler.schedule(steps("c", 1, &trace)).unwrap();
    scheduler.tick();

    assert_eq!(*events.borrow(), vec!["scheduled", "started", "finished"]);
}

#[test]
fn status_table_stays_bounded_across_many_backfill_cycles() {
    let mut scheduler = Scheduler::new();
    let y = scheduler.register_resource("y");

    // A one-shot default finishes every tick, so each tick allocates a
    // fresh instance through the factory.
    scheduler
        .set_default_command(y, move || Command::run_once("blip", || Ok(())).requires(y))
        .unwrap();
    for _ in 0..1000 {
        scheduler.tick();
    }

    assert!(
        scheduler.record_count() <= 200,
        "status table grew to {} entries",
        scheduler.record_count()
    );
}

#[test]
fn recent_terminal_states_remain_queryable() {
    let trace = new_trace();
    let mut scheduler = Scheduler::new();

    let id = scheduler.schedule(steps("c", 1, &trace)).unwrap();
    scheduler.tick();
    for _ in 0..50 {
        scheduler.schedule(Command::run_once("shot", || Ok(()))).unwrap();
        scheduler.tick();
    }

    // Well within the retention window, so the record is still there.
    assert_eq!(scheduler.state(id), Some(CommandState::Finished));
}

#[test]
fn tick_counters_advance() {
    let mut scheduler = Scheduler::new();
    assert_eq!(scheduler.ticks(), 0);
    assert!(scheduler.last_tick_runtime().is_none());

    scheduler.tick();
    scheduler.tick();
    assert_eq!(scheduler.ticks(), 2);
    assert!(scheduler.last_tick_runtime().is_some());
}
