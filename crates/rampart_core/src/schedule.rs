//! Cooperative sequencing with explicit wait-points
//!
//! A [`Sequence`] is a resumable state machine: every call to
//! [`Sequence::resume`] runs until the next wait-point and reports it as a
//! [`Step`]. The [`Scheduler`] holds the single pending continuation of each
//! task and resumes it exactly once when its wait is satisfied by a
//! [`Tick`].
//!
//! ```text
//!  start ──► Start ──any tick──► resume ──Wait(w)──► Pending(w) ──tick satisfies w──► resume ...
//!                                       └─Done────► dropped
//!  cancel() at any point ─────────────────────────► dropped, never resumed again
//! ```

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Named wait-points a sequence can yield on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WaitPoint {
    /// Resume at the end of the current frame
    EndOfFrame,
    /// Resume on the next physics tick
    FixedUpdate,
    TenthOfSecond,
    QuarterSecond,
    HalfSecond,
    OneSecond,
    TwoSeconds,
    FiveSeconds,
}

impl WaitPoint {
    /// Seconds to wait for timed wait-points, `None` for phase waits
    pub fn duration(&self) -> Option<f32> {
        match self {
            WaitPoint::EndOfFrame | WaitPoint::FixedUpdate => None,
            WaitPoint::TenthOfSecond => Some(0.1),
            WaitPoint::QuarterSecond => Some(0.25),
            WaitPoint::HalfSecond => Some(0.5),
            WaitPoint::OneSecond => Some(1.0),
            WaitPoint::TwoSeconds => Some(2.0),
            WaitPoint::FiveSeconds => Some(5.0),
        }
    }
}

impl Default for WaitPoint {
    fn default() -> Self {
        Self::OneSecond
    }
}

/// Outcome of one resumption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend until the wait-point is satisfied
    Wait(WaitPoint),
    /// The sequence has finished
    Done,
}

/// Phase signals that satisfy waits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// A rendered frame of `dt` seconds; advances timed waits
    Frame(f32),
    /// A physics step
    FixedUpdate,
    /// End of the current frame
    EndOfFrame,
}

/// A resumable procedure driven by a [`Scheduler`]
pub trait Sequence<C> {
    fn resume(&mut self, ctx: &mut C) -> Step;
}

impl<C, F> Sequence<C> for F
where
    F: FnMut(&mut C) -> Step,
{
    fn resume(&mut self, ctx: &mut C) -> Step {
        self(ctx)
    }
}

/// Access to the scheduler embedded in a context
pub trait Scheduled: Sized {
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;
}

#[derive(Debug)]
struct TaskState {
    id: u64,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/// Shared handle to a started task
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<TaskState>,
}

impl TaskHandle {
    fn new(id: u64) -> Self {
        Self {
            state: Arc::new(TaskState {
                id,
                cancelled: AtomicBool::new(false),
                finished: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// Abort the task; its continuation never runs afterwards
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// True once the sequence returned [`Step::Done`]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }

    fn finish(&self) {
        self.state.finished.store(true, Ordering::Release);
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.state.id)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Start,
    Timer(f32),
    FixedUpdate,
    EndOfFrame,
}

impl Pending {
    fn from_wait(wait: WaitPoint) -> Self {
        match wait {
            WaitPoint::EndOfFrame => Pending::EndOfFrame,
            WaitPoint::FixedUpdate => Pending::FixedUpdate,
            timed => Pending::Timer(timed.duration().unwrap_or(0.0)),
        }
    }

    /// Feed a tick; returns true when the wait is satisfied
    fn advance(&mut self, tick: Tick) -> bool {
        match (self, tick) {
            (Pending::Start, _) => true,
            (Pending::Timer(remaining), Tick::Frame(dt)) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            (Pending::FixedUpdate, Tick::FixedUpdate) => true,
            (Pending::EndOfFrame, Tick::EndOfFrame) => true,
            _ => false,
        }
    }
}

struct Task<C> {
    handle: TaskHandle,
    sequence: Box<dyn Sequence<C> + Send>,
    pending: Pending,
}

/// Owner of every pending continuation
pub struct Scheduler<C> {
    tasks: Vec<Task<C>>,
    in_flight: Vec<TaskHandle>,
    next_id: u64,
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            in_flight: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a sequence; it first resumes on the next poll of any tick
    pub fn start<S>(&mut self, sequence: S) -> TaskHandle
    where
        S: Sequence<C> + Send + 'static,
    {
        let handle = TaskHandle::new(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            handle: handle.clone(),
            sequence: Box::new(sequence),
            pending: Pending::Start,
        });
        handle
    }

    /// Cancel every task, including ones being resumed right now
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for task in self.tasks.drain(..) {
            task.handle.cancel();
            cancelled += 1;
        }
        for handle in &self.in_flight {
            if handle.is_running() {
                handle.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Number of suspended tasks that can still resume
    pub fn len(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| !task.handle.is_cancelled())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_ready(&mut self, tick: Tick) -> Vec<Task<C>> {
        self.tasks.retain(|task| !task.handle.is_cancelled());

        let mut ready = Vec::new();
        let mut waiting = Vec::with_capacity(self.tasks.len());
        for mut task in self.tasks.drain(..) {
            if task.pending.advance(tick) {
                ready.push(task);
            } else {
                waiting.push(task);
            }
        }
        self.tasks = waiting;
        ready
    }
}

impl<C: Scheduled> Scheduler<C> {
    /// Resume every task whose wait `tick` satisfies
    ///
    /// Tasks started or re-suspended while this poll runs are not resumed
    /// again until a later poll. Returns the number of resumptions.
    pub fn poll(ctx: &mut C, tick: Tick) -> usize {
        let ready = ctx.scheduler_mut().take_ready(tick);
        if ready.is_empty() {
            return 0;
        }

        let mark = ctx.scheduler_mut().in_flight.len();
        ctx.scheduler_mut()
            .in_flight
            .extend(ready.iter().map(|task| task.handle.clone()));

        let mut resumed = 0;
        for mut task in ready {
            if task.handle.is_cancelled() {
                continue;
            }
            resumed += 1;
            match task.sequence.resume(ctx) {
                Step::Wait(wait) => {
                    if task.handle.is_cancelled() {
                        continue;
                    }
                    task.pending = Pending::from_wait(wait);
                    ctx.scheduler_mut().tasks.push(task);
                }
                Step::Done => task.handle.finish(),
            }
        }

        ctx.scheduler_mut().in_flight.truncate(mark);
        resumed
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
