use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arbor_core::{
    Builder, Controller, MemorySurface, Node, NodeId, PumpStats, Runtime, RuntimeScheduler,
    SavedState, Scope, Surface, SurfaceFactory, SurfaceId, Tree, TreeError, SURFACE_FACTORY,
};
use indexmap::IndexMap;

/// A topology call made on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    Insert,
    Remove,
    Present,
    Dismiss,
}

impl SurfaceOp {
    fn verb(self) -> &'static str {
        match self {
            SurfaceOp::Insert => "insert",
            SurfaceOp::Remove => "remove",
            SurfaceOp::Present => "present",
            SurfaceOp::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub op: SurfaceOp,
    pub parent: SurfaceId,
    pub child: SurfaceId,
}

#[derive(Default)]
struct SurfaceLogInner {
    kinds: IndexMap<SurfaceId, &'static str>,
    events: Vec<SurfaceEvent>,
}

/// Shared record of every surface a [`RecordingSurfaceFactory`] created and
/// every topology call made on them, in call order.
#[derive(Clone, Default)]
pub struct SurfaceLog {
    inner: Rc<RefCell<SurfaceLogInner>>,
}

impl SurfaceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.inner.borrow().events.clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().events.clear();
    }

    pub fn kind_of(&self, surface: SurfaceId) -> Option<&'static str> {
        self.inner.borrow().kinds.get(&surface).copied()
    }

    /// Events as `"<op> <child kind> <- <parent kind>"` lines.
    pub fn describe(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        let kind = |id: SurfaceId| inner.kinds.get(&id).copied().unwrap_or("?");
        inner
            .events
            .iter()
            .map(|event| {
                format!(
                    "{} {} <- {}",
                    event.op.verb(),
                    kind(event.child),
                    kind(event.parent)
                )
            })
            .collect()
    }

    fn register(&self, surface: SurfaceId, kind: &'static str) {
        self.inner.borrow_mut().kinds.insert(surface, kind);
    }

    fn record(&self, op: SurfaceOp, parent: SurfaceId, child: SurfaceId) {
        self.inner
            .borrow_mut()
            .events
            .push(SurfaceEvent { op, parent, child });
    }
}

impl fmt::Debug for SurfaceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}

/// In-memory surface that reports every topology call to a [`SurfaceLog`].
pub struct RecordingSurface {
    inner: MemorySurface,
    log: SurfaceLog,
}

impl RecordingSurface {
    pub fn new(kind: &'static str, log: &SurfaceLog) -> Self {
        let inner = MemorySurface::new(kind);
        log.register(inner.id(), kind);
        Self {
            inner,
            log: log.clone(),
        }
    }
}

impl Surface for RecordingSurface {
    fn id(&self) -> SurfaceId {
        self.inner.id()
    }

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn insert_child(&mut self, child: SurfaceId, at_end: bool) {
        self.log.record(SurfaceOp::Insert, self.id(), child);
        self.inner.insert_child(child, at_end);
    }

    fn remove_child(&mut self, child: SurfaceId) {
        self.log.record(SurfaceOp::Remove, self.id(), child);
        self.inner.remove_child(child);
    }

    fn present(&mut self, child: SurfaceId) {
        self.log.record(SurfaceOp::Present, self.id(), child);
        self.inner.present(child);
    }

    fn dismiss(&mut self, child: SurfaceId) {
        self.log.record(SurfaceOp::Dismiss, self.id(), child);
        self.inner.dismiss(child);
    }

    fn children(&self) -> Vec<SurfaceId> {
        self.inner.children()
    }

    fn presented(&self) -> Vec<SurfaceId> {
        self.inner.presented()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSurfaceFactory {
    log: SurfaceLog,
}

impl RecordingSurfaceFactory {
    pub fn new(log: SurfaceLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &SurfaceLog {
        &self.log
    }
}

impl SurfaceFactory for RecordingSurfaceFactory {
    fn create(&self, kind: &'static str) -> Box<dyn Surface> {
        Box::new(RecordingSurface::new(kind, &self.log))
    }
}

/// Scheduler that only counts pump requests; the harness pumps explicitly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: AtomicUsize,
}

impl ManualScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns the count accumulated since the last call and resets it.
    pub fn take_requests(&self) -> usize {
        self.requests.swap(0, Ordering::SeqCst)
    }
}

impl RuntimeScheduler for ManualScheduler {
    fn request_pump(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Headless harness for driving a [`Tree`] in tests.
///
/// Every surface in the tree is a [`RecordingSurface`], so tests can assert
/// on topology calls and their order. Pumping is explicit: nothing runs
/// until the test asks for a turn or for quiescence.
pub struct TreeHarness {
    tree: Tree,
    scheduler: Arc<ManualScheduler>,
    surfaces: SurfaceLog,
}

impl TreeHarness {
    /// Harness whose root scope is `scope` plus a recording surface factory.
    pub fn new(scope: Scope) -> Self {
        let surfaces = SurfaceLog::new();
        let factory: Rc<dyn SurfaceFactory> = Rc::new(RecordingSurfaceFactory::new(surfaces.clone()));
        let scope = scope
            .extend("harness")
            .provide(&SURFACE_FACTORY, factory)
            .build();
        let scheduler = Arc::new(ManualScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let window = Box::new(RecordingSurface::new("window", &surfaces));
        Self {
            tree: Tree::new(runtime, scope, window),
            scheduler,
            surfaces,
        }
    }

    pub fn launch<B: Builder>(&mut self, builder: &B, args: B::Args) -> Result<NodeId, TreeError> {
        self.tree.launch(builder, args, None)
    }

    pub fn relaunch<B: Builder>(
        &mut self,
        builder: &B,
        args: B::Args,
        saved: SavedState,
    ) -> Result<NodeId, TreeError> {
        self.tree.launch(builder, args, Some(saved))
    }

    pub fn shutdown(&mut self) -> Option<SavedState> {
        self.tree.shutdown()
    }

    pub fn send<E: 'static>(&mut self, path: &str, event: E) -> Result<(), TreeError> {
        self.tree.send(path, event)
    }

    /// One executor poll plus one event delivery round.
    pub fn turn(&mut self) -> Result<PumpStats, TreeError> {
        self.tree.turn()
    }

    /// Drive the tree until no task is ready and no event is queued.
    pub fn pump_until_idle(&mut self) -> Result<PumpStats, TreeError> {
        self.tree.pump()
    }

    /// Sends `event` and pumps to quiescence.
    pub fn dispatch<E: 'static>(&mut self, path: &str, event: E) -> Result<PumpStats, TreeError> {
        self.send(path, event)?;
        self.pump_until_idle()
    }

    pub fn back(&mut self) -> Result<bool, TreeError> {
        self.tree.handle_back_press()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        self.tree.node(path)
    }

    pub fn controller<C: Controller>(&self, path: &str) -> Option<&C> {
        self.node(path)?.controller::<C>()
    }

    /// Kind of the node at `path`, if there is one.
    pub fn kind_at(&self, path: &str) -> Option<&'static str> {
        self.node(path).map(Node::kind)
    }

    /// Every node as `(path, kind)`, pre-order; the root's path is `""`.
    pub fn shape(&self) -> Vec<(String, &'static str)> {
        let mut shape = Vec::new();
        if let Some(root) = self.tree.root() {
            collect_shape(root, String::new(), &mut shape);
        }
        shape
    }

    pub fn surfaces(&self) -> &SurfaceLog {
        &self.surfaces
    }

    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    pub fn live_tasks(&self) -> usize {
        self.tree.runtime().live_tasks()
    }

    pub fn dump(&self) -> String {
        self.tree.dump()
    }
}

fn collect_shape(node: &Node, path: String, shape: &mut Vec<(String, &'static str)>) {
    shape.push((path.clone(), node.kind()));
    for slot in node.router().slots() {
        let Some(child) = node.child(slot) else {
            continue;
        };
        let child_path = if path.is_empty() {
            slot.name().to_string()
        } else {
            format!("{path}/{slot}")
        };
        collect_shape(child, child_path, shape);
    }
}

/// Convenience helper for tests that only need a harness for one closure.
pub fn run_tree_test<R>(scope: Scope, f: impl FnOnce(&mut TreeHarness) -> R) -> R {
    let mut harness = TreeHarness::new(scope);
    f(&mut harness)
}
