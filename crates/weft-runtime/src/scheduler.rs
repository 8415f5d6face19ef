//! Two-lane task scheduler
//!
//! High-priority work (initial renders, resumed suspensions) drains
//! exhaustively at microtask timing, including tasks enqueued while
//! draining. Low-priority work (re-renders) runs inside frame callbacks
//! under a time slice so long update storms cannot starve paint: 4ms on
//! an uncongested frame, 40ms once the queue has carried work over.

use std::collections::VecDeque;
use std::time::Instant;

/// Slice for a frame with no carried-over work
pub const FIRST_FRAME_SLICE_MS: f64 = 4.0;
/// Slice once the low lane is congested
pub const CATCHUP_FRAME_SLICE_MS: f64 = 40.0;

/// Task priority lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Microtask lane, drained exhaustively
    High,
    /// Frame lane, drained under a time slice
    Low,
}

/// A unit of scheduled work
pub type Task<Ctx> = Box<dyn FnOnce(&mut Ctx)>;

/// What the embedder should schedule after an enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushRequest {
    /// A flush is already pending
    None,
    /// Schedule a microtask-timed flush
    Microtask,
    /// Schedule a frame-timed flush
    Frame,
}

/// Result of a frame flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Both lanes are empty
    Idle,
    /// The slice expired with work left; another frame was requested
    MorePending,
}

/// Scheduler counters
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    pub high_tasks_run: u64,
    pub low_tasks_run: u64,
    pub microtask_flushes: u64,
    pub frame_flushes: u64,
    /// Frames that expired their slice with work remaining
    pub slice_overruns: u64,
}

/// Monotonic clock driving frame slices
pub trait FrameClock {
    fn now_ms(&self) -> f64;
}

/// Real wall-time clock
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Two FIFO lanes plus flush bookkeeping
pub struct TaskQueue<Ctx> {
    high: VecDeque<Task<Ctx>>,
    low: VecDeque<Task<Ctx>>,
    microtask_requested: bool,
    frame_requested: bool,
    /// The previous frame ended with work left over
    congested: bool,
    stats: SchedulerStats,
}

impl<Ctx> Default for TaskQueue<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> TaskQueue<Ctx> {
    pub fn new() -> Self {
        Self {
            high: VecDeque::new(),
            low: VecDeque::new(),
            microtask_requested: false,
            frame_requested: false,
            congested: false,
            stats: SchedulerStats::default(),
        }
    }

    /// Enqueue a task; the return value says which flush (if any) the
    /// embedder should now schedule. At most one flush per lane is
    /// requested at a time.
    pub fn enqueue(&mut self, priority: Priority, task: Task<Ctx>) -> FlushRequest {
        match priority {
            Priority::High => {
                self.high.push_back(task);
                if self.microtask_requested {
                    FlushRequest::None
                } else {
                    self.microtask_requested = true;
                    FlushRequest::Microtask
                }
            }
            Priority::Low => {
                self.low.push_back(task);
                if self.frame_requested {
                    FlushRequest::None
                } else {
                    self.frame_requested = true;
                    FlushRequest::Frame
                }
            }
        }
    }

    pub fn microtask_requested(&self) -> bool {
        self.microtask_requested
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    pub fn high_len(&self) -> usize {
        self.high.len()
    }

    pub fn low_len(&self) -> usize {
        self.low.len()
    }

    pub fn is_idle(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    fn pop_high(&mut self) -> Option<Task<Ctx>> {
        let task = self.high.pop_front();
        if task.is_some() {
            self.stats.high_tasks_run += 1;
        }
        task
    }

    fn pop_low(&mut self) -> Option<Task<Ctx>> {
        let task = self.low.pop_front();
        if task.is_some() {
            self.stats.low_tasks_run += 1;
        }
        task
    }
}

impl<Ctx> std::fmt::Debug for TaskQueue<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("high", &self.high.len())
            .field("low", &self.low.len())
            .field("microtask_requested", &self.microtask_requested)
            .field("frame_requested", &self.frame_requested)
            .field("congested", &self.congested)
            .finish()
    }
}

/// Microtask-timed flush: run the high lane to exhaustion, including
/// tasks it enqueues while running.
///
/// `queue_of` projects the queue out of the context so tasks can take
/// `&mut Ctx` while the queue itself stays borrow-free between pops.
pub fn drain_high<Ctx>(ctx: &mut Ctx, queue_of: fn(&mut Ctx) -> &mut TaskQueue<Ctx>) {
    queue_of(ctx).stats.microtask_flushes += 1;

    while let Some(task) = queue_of(ctx).pop_high() {
        task(ctx);
    }

    // cleared after the drain so reentrant enqueues do not request a
    // second flush for work this one already ran
    queue_of(ctx).microtask_requested = false;
}

/// Frame-timed flush: drain the high lane first, then run low-lane
/// tasks until the slice expires. Leftover work re-requests a frame
/// and widens the next slice.
pub fn drain_frame<Ctx>(
    ctx: &mut Ctx,
    queue_of: fn(&mut Ctx) -> &mut TaskQueue<Ctx>,
    clock: &dyn FrameClock,
) -> FlushOutcome {
    let slice = {
        let queue = queue_of(ctx);
        queue.stats.frame_flushes += 1;
        if queue.congested {
            CATCHUP_FRAME_SLICE_MS
        } else {
            FIRST_FRAME_SLICE_MS
        }
    };

    while let Some(task) = queue_of(ctx).pop_high() {
        task(ctx);
    }
    queue_of(ctx).microtask_requested = false;

    let start = clock.now_ms();
    loop {
        if clock.now_ms() - start >= slice {
            break;
        }
        match queue_of(ctx).pop_low() {
            Some(task) => task(ctx),
            None => break,
        }
    }

    let queue = queue_of(ctx);
    if queue.low.is_empty() {
        queue.congested = false;
        queue.frame_requested = false;
        FlushOutcome::Idle
    } else {
        // leftover work carries into the next, wider frame
        queue.congested = true;
        queue.frame_requested = true;
        queue.stats.slice_overruns += 1;
        tracing::trace!(remaining = queue.low.len(), "frame slice expired");
        FlushOutcome::MorePending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct TestCtx {
        queue: TaskQueue<TestCtx>,
        log: Vec<&'static str>,
    }

    fn queue_of(ctx: &mut TestCtx) -> &mut TaskQueue<TestCtx> {
        &mut ctx.queue
    }

    struct TestClock(Rc<Cell<f64>>);

    impl FrameClock for TestClock {
        fn now_ms(&self) -> f64 {
            self.0.get()
        }
    }

    #[test]
    fn test_high_lane_drains_reentrant_tasks() {
        let mut ctx = TestCtx {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        ctx.queue.enqueue(
            Priority::High,
            Box::new(|c: &mut TestCtx| {
                c.log.push("a");
                c.queue
                    .enqueue(Priority::High, Box::new(|c: &mut TestCtx| c.log.push("c")));
            }),
        );
        ctx.queue
            .enqueue(Priority::High, Box::new(|c: &mut TestCtx| c.log.push("b")));
        ctx.queue
            .enqueue(Priority::Low, Box::new(|c: &mut TestCtx| c.log.push("low")));

        drain_high(&mut ctx, queue_of);

        // the re-enqueued task ran in the same flush; low stayed put
        assert_eq!(ctx.log, vec!["a", "b", "c"]);
        assert_eq!(ctx.queue.low_len(), 1);
        assert!(!ctx.queue.microtask_requested());
    }

    #[test]
    fn test_flush_requested_once_per_lane() {
        let mut ctx = TestCtx {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        let first = ctx.queue.enqueue(Priority::High, Box::new(|_: &mut TestCtx| {}));
        let second = ctx.queue.enqueue(Priority::High, Box::new(|_: &mut TestCtx| {}));

        assert_eq!(first, FlushRequest::Microtask);
        assert_eq!(second, FlushRequest::None);
        assert_eq!(
            ctx.queue.enqueue(Priority::Low, Box::new(|_: &mut TestCtx| {})),
            FlushRequest::Frame
        );
    }

    #[test]
    fn test_frame_drains_high_before_low() {
        let mut ctx = TestCtx {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        ctx.queue
            .enqueue(Priority::Low, Box::new(|c: &mut TestCtx| c.log.push("low")));
        ctx.queue
            .enqueue(Priority::High, Box::new(|c: &mut TestCtx| c.log.push("high")));

        let clock = TestClock(Rc::new(Cell::new(0.0)));
        let outcome = drain_frame(&mut ctx, queue_of, &clock);

        assert_eq!(ctx.log, vec!["high", "low"]);
        assert_eq!(outcome, FlushOutcome::Idle);
    }

    #[test]
    fn test_slice_expiry_and_congestion() {
        let time = Rc::new(Cell::new(0.0));
        let mut ctx = TestCtx {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        // each task burns 3ms of fake time
        for name in ["t1", "t2", "t3"] {
            let time = Rc::clone(&time);
            ctx.queue.enqueue(
                Priority::Low,
                Box::new(move |c: &mut TestCtx| {
                    c.log.push(name);
                    time.set(time.get() + 3.0);
                }),
            );
        }

        let clock = TestClock(Rc::clone(&time));
        let outcome = drain_frame(&mut ctx, queue_of, &clock);

        // 4ms slice: t1 (0ms) and t2 (3ms) ran, t3 carried over
        assert_eq!(outcome, FlushOutcome::MorePending);
        assert_eq!(ctx.log, vec!["t1", "t2"]);
        assert!(ctx.queue.frame_requested());
        assert_eq!(ctx.queue.stats().slice_overruns, 1);

        // the congested frame gets the wider slice and finishes
        let outcome = drain_frame(&mut ctx, queue_of, &clock);
        assert_eq!(outcome, FlushOutcome::Idle);
        assert_eq!(ctx.log, vec!["t1", "t2", "t3"]);
        assert!(!ctx.queue.frame_requested());
    }

    #[test]
    fn test_tasks_run_fifo_within_a_lane() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = TestCtx {
            queue: TaskQueue::new(),
            log: Vec::new(),
        };
        for i in 0..5 {
            let order = Rc::clone(&order);
            ctx.queue.enqueue(
                Priority::High,
                Box::new(move |_: &mut TestCtx| order.borrow_mut().push(i)),
            );
        }
        drain_high(&mut ctx, queue_of);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
    }
}
