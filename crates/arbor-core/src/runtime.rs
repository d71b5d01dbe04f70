use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures_task::{waker, ArcWake};

use crate::collections::map::HashMap;
use crate::platform::RuntimeScheduler;
use crate::NodeId;

pub type TaskId = u64;

type LocalTask = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Ids of tasks whose wakers fired since the last poll.
///
/// This is the only piece of the runtime that may be touched from another
/// thread, so it is the only piece behind a lock.
struct ReadyQueue {
    ids: Mutex<VecDeque<TaskId>>,
    scheduler: Arc<dyn RuntimeScheduler>,
}

impl ReadyQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<TaskId>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, id: TaskId) {
        self.lock().push_back(id);
        self.scheduler.request_pump();
    }

    fn take_all(&self) -> Vec<TaskId> {
        self.lock().drain(..).collect()
    }

    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

struct TaskWaker {
    id: TaskId,
    queue: Arc<ReadyQueue>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.queue.push(arc_self.id);
    }
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    ready: Arc<ReadyQueue>,
    tasks: RefCell<HashMap<TaskId, LocalTask>>,
    next_task_id: Cell<TaskId>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            ready: Arc::new(ReadyQueue {
                ids: Mutex::new(VecDeque::new()),
                scheduler: Arc::clone(&scheduler),
            }),
            scheduler,
            tasks: RefCell::new(HashMap::new()),
            next_task_id: Cell::new(1),
        }
    }

    fn spawn(&self, task: LocalTask) -> TaskId {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);
        self.tasks.borrow_mut().insert(id, task);
        self.ready.push(id);
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        // Dropping the future is the cancellation.
        let removed = self.tasks.borrow_mut().remove(&id);
        removed.is_some()
    }

    fn is_live(&self, id: TaskId) -> bool {
        self.tasks.borrow().contains_key(&id)
    }

    /// Polls every task that was ready when the call began. Tasks woken
    /// while this runs are left for the next turn.
    fn poll_ready(&self) -> usize {
        let mut polled = 0;
        for id in self.ready.take_all() {
            // Take the future out so a poll never runs under a map borrow.
            let Some(mut task) = self.tasks.borrow_mut().remove(&id) else {
                continue;
            };
            let waker = waker(Arc::new(TaskWaker {
                id,
                queue: Arc::clone(&self.ready),
            }));
            let mut cx = Context::from_waker(&waker);
            polled += 1;
            match task.as_mut().poll(&mut cx) {
                Poll::Ready(()) => log::trace!("task {id} completed"),
                Poll::Pending => {
                    self.tasks.borrow_mut().insert(id, task);
                }
            }
        }
        polled
    }
}

/// Owning-context executor for the futures controllers start.
///
/// Futures are `!Send` and never leave the thread that owns the tree.
/// Wakers only record the task id and ask the [`RuntimeScheduler`] for a
/// pump; the actual poll happens inside `Tree::pump`.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn scheduler(&self) -> Arc<dyn RuntimeScheduler> {
        Arc::clone(&self.inner.scheduler)
    }

    pub fn has_ready_tasks(&self) -> bool {
        !self.inner.ready.is_empty()
    }

    pub fn live_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn poll_ready(&self) -> usize {
        self.inner.poll_ready()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

/// Scheduler that ignores pump requests; the host pumps on its own cadence.
#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn request_pump(&self) {}
}

/// Weak handle to a [`Runtime`]. Every operation is a no-op once the
/// runtime is gone.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// A handle bound to no runtime, used by nodes that are not attached yet.
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    pub fn is_detached(&self) -> bool {
        self.0.strong_count() == 0
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Option<TaskId> {
        self.0.upgrade().map(|inner| inner.spawn(Box::pin(task)))
    }

    pub fn cancel(&self, id: TaskId) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.cancel(id))
            .unwrap_or(false)
    }

    pub fn is_live(&self, id: TaskId) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.is_live(id))
            .unwrap_or(false)
    }

    pub fn request_pump(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.scheduler.request_pump();
        }
    }

    pub fn poll_ready(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.poll_ready())
            .unwrap_or(0)
    }

    pub fn has_ready_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| !inner.ready.is_empty())
            .unwrap_or(false)
    }
}

/// The set of tasks one node has started.
///
/// Every task a controller spawns is registered here, and the node cancels
/// the whole set unconditionally when it deactivates. A completion can
/// therefore never run against a torn-down subtree.
pub struct TaskScope {
    owner: NodeId,
    runtime: RuntimeHandle,
    tasks: Vec<TaskId>,
}

impl TaskScope {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            runtime: RuntimeHandle::detached(),
            tasks: Vec::new(),
        }
    }

    pub(crate) fn bind(&mut self, runtime: RuntimeHandle) {
        self.runtime = runtime;
    }

    pub fn spawn(&mut self, task: impl Future<Output = ()> + 'static) -> Option<TaskId> {
        let runtime = &self.runtime;
        self.tasks.retain(|id| runtime.is_live(*id));
        let id = self.runtime.spawn(task);
        match id {
            Some(id) => {
                log::trace!("node {} spawned task {id}", self.owner);
                self.tasks.push(id);
            }
            None => log::warn!("node {} spawned a task without a runtime", self.owner),
        }
        id
    }

    /// Cancels every task still running; returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self
            .tasks
            .drain(..)
            .filter(|id| self.runtime.cancel(*id))
            .count();
        if cancelled > 0 {
            log::debug!("node {} cancelled {cancelled} task(s)", self.owner);
        }
        cancelled
    }

    pub fn live(&self) -> usize {
        self.tasks
            .iter()
            .filter(|id| self.runtime.is_live(**id))
            .count()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingScheduler {
        requests: AtomicUsize,
    }

    impl RuntimeScheduler for CountingScheduler {
        fn request_pump(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Pending for `turns` polls, waking itself each time.
    struct Turns(u32);

    impl Future for Turns {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 == 0 {
                return Poll::Ready(());
            }
            self.0 -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    #[test]
    fn spawn_requests_a_pump_and_runs_on_poll() {
        let scheduler = Arc::new(CountingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let hits = Rc::new(Cell::new(0));
        let hits_in_task = hits.clone();
        runtime
            .handle()
            .spawn(async move { hits_in_task.set(hits_in_task.get() + 1) })
            .expect("runtime alive");

        assert_eq!(scheduler.requests.load(Ordering::SeqCst), 1);
        assert_eq!(hits.get(), 0);
        assert_eq!(runtime.poll_ready(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(runtime.live_tasks(), 0);
    }

    #[test]
    fn self_waking_task_advances_one_step_per_poll() {
        let runtime = Runtime::default();
        runtime.handle().spawn(Turns(2));

        assert_eq!(runtime.poll_ready(), 1);
        assert!(runtime.has_ready_tasks());
        assert_eq!(runtime.poll_ready(), 1);
        assert_eq!(runtime.poll_ready(), 1);
        assert_eq!(runtime.live_tasks(), 0);
        assert_eq!(runtime.poll_ready(), 0);
    }

    #[test]
    fn cancelled_task_is_dropped_before_completion() {
        let runtime = Runtime::default();
        let finished = Rc::new(Cell::new(false));
        let mut scope = TaskScope::new(7);
        scope.bind(runtime.handle());

        let flag = finished.clone();
        scope.spawn(async move {
            Turns(3).await;
            flag.set(true);
        });
        runtime.poll_ready();
        assert_eq!(scope.live(), 1);

        assert_eq!(scope.cancel_all(), 1);
        for _ in 0..5 {
            runtime.poll_ready();
        }
        assert!(!finished.get());
        assert_eq!(runtime.live_tasks(), 0);
    }

    #[test]
    fn dropping_the_scope_cancels_its_tasks() {
        let runtime = Runtime::default();
        {
            let mut scope = TaskScope::new(1);
            scope.bind(runtime.handle());
            scope.spawn(Turns(10));
            assert_eq!(runtime.live_tasks(), 1);
        }
        assert_eq!(runtime.live_tasks(), 0);
    }

    #[test]
    fn unbound_scope_cannot_spawn() {
        let mut scope = TaskScope::new(3);
        assert!(scope.spawn(async {}).is_none());
        assert_eq!(scope.live(), 0);
    }
}
