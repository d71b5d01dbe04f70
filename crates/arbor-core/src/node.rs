use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::controller::{AnyController, Controller, ControllerCell};
use crate::error::RouteError;
use crate::router::{Presentation, Router, Slot};
use crate::runtime::{RuntimeHandle, TaskScope};
use crate::saved_state::{Bundle, SavedState};
use crate::scope::Scope;
use crate::surface::{Surface, SurfaceId};
use crate::NodeId;

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Where a node is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built, not yet part of the live tree.
    Inactive,
    /// Surface inserted, controller activated.
    Active,
    /// Torn down. Terminal.
    Detached,
}

/// One unit of the tree: a controller, a surface, and a router for
/// children. Nodes come from [`Builder`](crate::Builder)s and are owned by
/// the router they are attached to.
pub struct Node {
    id: NodeId,
    kind: &'static str,
    lifecycle: Lifecycle,
    router: Router,
    controller: Box<dyn AnyController>,
    tasks: TaskScope,
}

impl Node {
    /// Assembles an inactive node. Meant to be called from a builder.
    pub fn new<C: Controller>(
        kind: &'static str,
        scope: Scope,
        surface: Box<dyn Surface>,
        controller: C,
    ) -> Self {
        let id = next_node_id();
        Self {
            id,
            kind,
            lifecycle: Lifecycle::Inactive,
            router: Router::new(id, kind, scope, surface),
            controller: Box::new(ControllerCell::new(id, controller)),
            tasks: TaskScope::new(id),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn scope(&self) -> &Scope {
        self.router.scope()
    }

    pub fn surface(&self) -> &dyn Surface {
        self.router.surface()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.router.surface().id()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn child(&self, slot: Slot) -> Option<&Node> {
        self.router.child(slot)
    }

    /// Follows a `/`-separated slot path; `""` is this node.
    pub fn descendant(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.router.child_named(segment))
    }

    pub fn controller<C: Controller>(&self) -> Option<&C> {
        self.controller.as_any().downcast_ref::<C>()
    }

    pub fn event_type(&self) -> &'static str {
        self.controller.event_type()
    }

    /// Queues `event` for this node's controller. Returns `false`, dropping
    /// the event, when the controller expects another type.
    pub fn post<E: 'static>(&self, event: E) -> bool {
        self.controller.post(Box::new(event)).is_ok()
    }

    /// Undelivered events in this subtree.
    pub fn pending_events(&self) -> usize {
        self.controller.pending()
            + self
                .router
                .children()
                .map(|(_, child, _)| child.pending_events())
                .sum::<usize>()
    }

    pub fn live_tasks(&self) -> usize {
        self.tasks.live()
    }

    pub fn save_state(&self) -> SavedState {
        let mut bundle = Bundle::new();
        self.controller.save_state(&mut bundle);
        let mut state = SavedState::new(bundle);
        for (slot, child, _) in self.router.children() {
            state.insert_child(slot.name(), child.save_state());
        }
        state
    }

    pub(crate) fn activate(
        &mut self,
        runtime: &RuntimeHandle,
        saved: Option<SavedState>,
    ) -> Result<(), RouteError> {
        debug_assert_eq!(self.lifecycle, Lifecycle::Inactive, "node {} activated twice", self.id);
        let (bundle, restore) = match saved {
            Some(saved) => {
                let (bundle, children) = saved.into_parts();
                (Some(bundle), children)
            }
            None => (None, Default::default()),
        };
        self.controller.bind(runtime.clone());
        self.tasks.bind(runtime.clone());
        self.router.bind(runtime.clone(), restore);
        log::debug!("activating {} [{}]", self.kind, self.id);
        self.controller
            .activate(&mut self.router, &mut self.tasks, bundle.as_ref())?;
        self.lifecycle = Lifecycle::Active;
        Ok(())
    }

    /// Post-order: children go first, then this controller deactivates and
    /// its tasks are dropped. A node whose activation failed is never
    /// deactivated.
    pub(crate) fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::Detached {
            return;
        }
        self.router.detach_all();
        if self.lifecycle == Lifecycle::Active {
            log::debug!("deactivating {} [{}]", self.kind, self.id);
            self.controller.deactivate();
        }
        self.tasks.cancel_all();
        self.lifecycle = Lifecycle::Detached;
    }

    /// Delivers queued events, this node first, then its children in attach
    /// order. Returns how many events were delivered.
    pub(crate) fn dispatch_pending(&mut self) -> Result<usize, RouteError> {
        if self.lifecycle != Lifecycle::Active {
            return Ok(0);
        }
        let mut delivered = self.controller.dispatch(&mut self.router, &mut self.tasks)?;
        for slot in self.router.slots() {
            if let Some(child) = self.router.child_mut(slot) {
                delivered += child.dispatch_pending()?;
            }
        }
        Ok(delivered)
    }

    /// Topmost child first; falls back to this controller's own handling.
    pub(crate) fn handle_back_press(&mut self) -> Result<bool, RouteError> {
        if let Some(top) = self.router.top_mut() {
            if top.handle_back_press()? {
                return Ok(true);
            }
        }
        self.controller
            .handle_back_press(&mut self.router, &mut self.tasks)
    }

    pub(crate) fn dump_into(&self, output: &mut String, label: &str, depth: usize) {
        let indent = "  ".repeat(depth);
        output.push_str(&format!(
            "{indent}{label}[{}] {} ({:?}) surface={}\n",
            self.id,
            self.kind,
            self.lifecycle,
            self.surface_id()
        ));
        for (slot, child, presentation) in self.router.children() {
            let label = match presentation {
                Presentation::Embedded => format!("{slot}: "),
                Presentation::FullScreen => format!("{slot} (presented): "),
            };
            child.dump_into(output, &label, depth + 1);
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            log::warn!("{} [{}] dropped while active; tearing down", self.kind, self.id);
            self.teardown();
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("lifecycle", &self.lifecycle)
            .field("slots", &self.router.slots())
            .finish()
    }
}
