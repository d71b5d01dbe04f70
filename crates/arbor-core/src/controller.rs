use std::any::{type_name, Any};
use std::future::Future;

use crate::error::RouteError;
use crate::mailbox::{EventSender, Mailbox};
use crate::router::Router;
use crate::runtime::{RuntimeHandle, TaskId, TaskScope};
use crate::saved_state::Bundle;
use crate::scope::Scope;
use crate::NodeId;

/// Business logic of one node.
///
/// The engine calls `activate` exactly once, after the node's surface has
/// been inserted into its parent's, and `deactivate` exactly once, after the
/// node's own children were torn down. A controller whose `activate`
/// returned an error is not deactivated; whatever it attached is still torn
/// down and its tasks cancelled.
///
/// Events arrive through the node's mailbox and are delivered with
/// `on_event` on the owning context; this is where listener notifications
/// from children and completions of spawned tasks land.
pub trait Controller: 'static {
    type Event: 'static;

    fn activate(
        &mut self,
        _cx: &mut NodeContext<'_, Self::Event>,
        _saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        Ok(())
    }

    fn deactivate(&mut self) {}

    fn on_event(
        &mut self,
        _cx: &mut NodeContext<'_, Self::Event>,
        _event: Self::Event,
    ) -> Result<(), RouteError> {
        Ok(())
    }

    /// Local back handling, asked only after the topmost child declined.
    fn handle_back_press(
        &mut self,
        _cx: &mut NodeContext<'_, Self::Event>,
    ) -> Result<bool, RouteError> {
        Ok(false)
    }

    fn save_state(&self, _bundle: &mut Bundle) {}
}

/// What a controller can reach while the engine is calling into it.
pub struct NodeContext<'a, E> {
    node: NodeId,
    router: &'a mut Router,
    tasks: &'a mut TaskScope,
    mailbox: &'a Mailbox<E>,
}

impl<'a, E: 'static> NodeContext<'a, E> {
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn router(&mut self) -> &mut Router {
        &mut *self.router
    }

    pub fn scope(&self) -> &Scope {
        self.router.scope()
    }

    /// A weak sender to this node's own mailbox, e.g. for a listener
    /// adapter handed to a child builder.
    pub fn sender(&self) -> EventSender<E> {
        self.mailbox.sender()
    }

    /// Runs `task` on the owning context; its output comes back to this
    /// controller as an event. The task is cancelled when the node
    /// deactivates, and the event is never delivered in that case.
    pub fn spawn<F>(&mut self, task: F) -> Option<TaskId>
    where
        F: Future<Output = E> + 'static,
    {
        let sender = self.mailbox.sender();
        self.tasks.spawn(async move {
            let event = task.await;
            sender.send(event);
        })
    }

    pub fn cancel_tasks(&mut self) -> usize {
        self.tasks.cancel_all()
    }

    pub fn live_tasks(&self) -> usize {
        self.tasks.live()
    }
}

/// Object-safe face of a [`Controller`] together with its mailbox.
pub(crate) trait AnyController {
    fn bind(&self, runtime: RuntimeHandle);
    fn activate(
        &mut self,
        router: &mut Router,
        tasks: &mut TaskScope,
        saved: Option<&Bundle>,
    ) -> Result<(), RouteError>;
    fn deactivate(&mut self);
    fn dispatch(&mut self, router: &mut Router, tasks: &mut TaskScope) -> Result<usize, RouteError>;
    fn handle_back_press(
        &mut self,
        router: &mut Router,
        tasks: &mut TaskScope,
    ) -> Result<bool, RouteError>;
    fn save_state(&self, bundle: &mut Bundle);
    fn post(&self, event: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
    fn pending(&self) -> usize;
    fn event_type(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct ControllerCell<C: Controller> {
    node: NodeId,
    controller: C,
    mailbox: Mailbox<C::Event>,
}

impl<C: Controller> ControllerCell<C> {
    pub(crate) fn new(node: NodeId, controller: C) -> Self {
        Self {
            node,
            controller,
            mailbox: Mailbox::new(node),
        }
    }

    fn context<'a>(
        node: NodeId,
        mailbox: &'a Mailbox<C::Event>,
        router: &'a mut Router,
        tasks: &'a mut TaskScope,
    ) -> NodeContext<'a, C::Event> {
        NodeContext {
            node,
            router,
            tasks,
            mailbox,
        }
    }
}

impl<C: Controller> AnyController for ControllerCell<C> {
    fn bind(&self, runtime: RuntimeHandle) {
        self.mailbox.bind(runtime);
    }

    fn activate(
        &mut self,
        router: &mut Router,
        tasks: &mut TaskScope,
        saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        let mut cx = Self::context(self.node, &self.mailbox, router, tasks);
        self.controller.activate(&mut cx, saved)
    }

    fn deactivate(&mut self) {
        self.controller.deactivate();
    }

    fn dispatch(&mut self, router: &mut Router, tasks: &mut TaskScope) -> Result<usize, RouteError> {
        let mut delivered = 0;
        // One event at a time: a handler may post to its own mailbox.
        while let Some(event) = self.mailbox.take() {
            log::trace!("node {} handling {}", self.node, type_name::<C::Event>());
            let mut cx = Self::context(self.node, &self.mailbox, router, tasks);
            self.controller.on_event(&mut cx, event)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    fn handle_back_press(
        &mut self,
        router: &mut Router,
        tasks: &mut TaskScope,
    ) -> Result<bool, RouteError> {
        let mut cx = Self::context(self.node, &self.mailbox, router, tasks);
        self.controller.handle_back_press(&mut cx)
    }

    fn save_state(&self, bundle: &mut Bundle) {
        self.controller.save_state(bundle);
    }

    fn post(&self, event: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let event = event.downcast::<C::Event>()?;
        self.mailbox.post(*event);
        Ok(())
    }

    fn pending(&self) -> usize {
        self.mailbox.len()
    }

    fn event_type(&self) -> &'static str {
        type_name::<C::Event>()
    }

    fn as_any(&self) -> &dyn Any {
        &self.controller
    }
}
