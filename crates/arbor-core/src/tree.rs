use crate::builder::Builder;
use crate::error::TreeError;
use crate::node::Node;
use crate::router::{Router, Slot};
use crate::runtime::Runtime;
use crate::saved_state::SavedState;
use crate::scope::Scope;
use crate::surface::{MemorySurface, Surface};
use crate::NodeId;

/// The host's single slot.
pub const ROOT: Slot = Slot::new("root");

const HOST_ID: NodeId = 0;
const DEFAULT_MAX_ROUNDS: usize = 64;

/// Counters from one or more pump rounds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    pub rounds: usize,
    pub tasks_polled: usize,
    pub events_dispatched: usize,
}

impl PumpStats {
    pub fn is_idle(&self) -> bool {
        self.tasks_polled == 0 && self.events_dispatched == 0
    }

    fn absorb(&mut self, other: PumpStats) {
        self.rounds += other.rounds;
        self.tasks_polled += other.tasks_polled;
        self.events_dispatched += other.events_dispatched;
    }
}

/// Owns the root node and forwards host lifecycle into it.
///
/// The tree is a router of its own over the platform window, with a single
/// [`ROOT`] slot, so launching and shutting down reuse attach and detach.
pub struct Tree {
    runtime: Runtime,
    host: Router,
    max_rounds: usize,
}

impl Tree {
    pub fn new(runtime: Runtime, scope: Scope, window: Box<dyn Surface>) -> Self {
        let mut host = Router::new(HOST_ID, "host", scope, window);
        host.bind(runtime.handle(), Default::default());
        Self {
            runtime,
            host,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_memory_window(runtime: Runtime, scope: Scope) -> Self {
        Self::new(runtime, scope, Box::new(MemorySurface::new("window")))
    }

    /// Bounds how many rounds a single `pump` may run before giving up.
    pub fn set_max_rounds(&mut self, rounds: usize) {
        self.max_rounds = rounds.max(1);
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn scope(&self) -> &Scope {
        self.host.scope()
    }

    pub fn window(&self) -> &dyn Surface {
        self.host.surface()
    }

    pub fn is_launched(&self) -> bool {
        self.host.is_occupied(ROOT)
    }

    pub fn root(&self) -> Option<&Node> {
        self.host.child(ROOT)
    }

    /// Looks up a node by slot path relative to the root; `""` is the root.
    pub fn node(&self, path: &str) -> Option<&Node> {
        self.root()?.descendant(path)
    }

    /// Builds and activates the root. `saved` is routed down to whichever
    /// nodes get attached at the matching slot paths.
    pub fn launch<B: Builder>(
        &mut self,
        builder: &B,
        args: B::Args,
        saved: Option<SavedState>,
    ) -> Result<NodeId, TreeError> {
        if self.is_launched() {
            return Err(TreeError::AlreadyLaunched);
        }
        if let Some(saved) = saved {
            self.host.restore_child(ROOT, saved);
        }
        log::debug!("launching {}", builder.kind());
        Ok(self.host.attach(ROOT, builder, args)?)
    }

    /// Captures the saved state of the whole tree, then tears it down.
    pub fn shutdown(&mut self) -> Option<SavedState> {
        let saved = self.root()?.save_state();
        self.host.detach(ROOT);
        log::debug!("tree shut down");
        Some(saved)
    }

    /// Returns `false` when nothing in the tree consumed the press; the
    /// platform should then apply its default.
    pub fn handle_back_press(&mut self) -> Result<bool, TreeError> {
        let Some(root) = self.host.child_mut(ROOT) else {
            return Ok(false);
        };
        let consumed = root.handle_back_press()?;
        log::debug!("back press consumed: {consumed}");
        Ok(consumed)
    }

    /// Queues `event` for the node at `path`.
    pub fn send<E: 'static>(&mut self, path: &str, event: E) -> Result<(), TreeError> {
        let node = self.node(path).ok_or_else(|| TreeError::NoSuchNode {
            path: path.to_string(),
        })?;
        if node.post(event) {
            Ok(())
        } else {
            Err(TreeError::EventTypeMismatch {
                path: path.to_string(),
                expected: node.event_type(),
            })
        }
    }

    /// One round: poll the tasks that are ready, then deliver every queued
    /// event.
    pub fn turn(&mut self) -> Result<PumpStats, TreeError> {
        let tasks_polled = self.runtime.poll_ready();
        let events_dispatched = match self.host.child_mut(ROOT) {
            Some(root) => root.dispatch_pending()?,
            None => 0,
        };
        Ok(PumpStats {
            rounds: 1,
            tasks_polled,
            events_dispatched,
        })
    }

    /// Runs rounds until nothing is ready and no events are queued.
    pub fn pump(&mut self) -> Result<PumpStats, TreeError> {
        let mut total = PumpStats::default();
        while total.rounds < self.max_rounds {
            let round = self.turn()?;
            total.absorb(round);
            if self.is_idle() {
                return Ok(total);
            }
        }
        log::warn!(
            "pump stopped after {} rounds with work still pending",
            total.rounds
        );
        Ok(total)
    }

    pub fn is_idle(&self) -> bool {
        !self.runtime.has_ready_tasks()
            && self.root().map(Node::pending_events).unwrap_or(0) == 0
    }

    pub fn dump(&self) -> String {
        let mut output = String::new();
        match self.root() {
            Some(root) => root.dump_into(&mut output, "", 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        if self.is_launched() {
            self.host.detach(ROOT);
        }
    }
}
