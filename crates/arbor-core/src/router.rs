use std::fmt;

use indexmap::IndexMap;

use crate::builder::Builder;
use crate::error::RouteError;
use crate::node::Node;
use crate::runtime::RuntimeHandle;
use crate::saved_state::SavedState;
use crate::scope::Scope;
use crate::surface::{Surface, SurfaceId};
use crate::NodeId;

/// A named position in a router. Holds at most one child at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(&'static str);

impl Slot {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How a child's surface joins its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    /// `insert_child` at the end on attach, `remove_child` on detach.
    #[default]
    Embedded,
    /// `present` on attach, `dismiss` on detach.
    FullScreen,
}

/// The two states a slot can be in.
#[derive(Clone, Copy)]
pub enum SlotState<'a> {
    Empty,
    Occupied(&'a Node),
}

impl<'a> SlotState<'a> {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotState::Empty)
    }

    pub fn is_occupied(&self) -> bool {
        !self.is_empty()
    }

    pub fn node(&self) -> Option<&'a Node> {
        match self {
            SlotState::Empty => None,
            SlotState::Occupied(node) => Some(node),
        }
    }
}

impl fmt::Debug for SlotState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Empty => f.write_str("Empty"),
            SlotState::Occupied(node) => write!(f, "Occupied({} [{}])", node.kind(), node.id()),
        }
    }
}

struct Child {
    node: Node,
    presentation: Presentation,
}

/// Tree management for one node: its surface and its children by slot.
///
/// Children are kept in attach order, which is also the order their
/// surfaces were inserted; the last attached child is the one on top and
/// the one asked first about back presses.
pub struct Router {
    owner: NodeId,
    owner_kind: &'static str,
    scope: Scope,
    surface: Box<dyn Surface>,
    runtime: RuntimeHandle,
    children: IndexMap<Slot, Child>,
    restore: IndexMap<String, SavedState>,
}

impl Router {
    pub(crate) fn new(
        owner: NodeId,
        owner_kind: &'static str,
        scope: Scope,
        surface: Box<dyn Surface>,
    ) -> Self {
        Self {
            owner,
            owner_kind,
            scope,
            surface,
            runtime: RuntimeHandle::detached(),
            children: IndexMap::new(),
            restore: IndexMap::new(),
        }
    }

    pub(crate) fn bind(&mut self, runtime: RuntimeHandle, restore: IndexMap<String, SavedState>) {
        self.runtime = runtime;
        self.restore = restore;
    }

    /// State handed to the next child attached at `slot`.
    pub(crate) fn restore_child(&mut self, slot: Slot, state: SavedState) {
        self.restore.insert(slot.name().to_string(), state);
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn slot(&self, slot: Slot) -> SlotState<'_> {
        match self.children.get(&slot) {
            Some(child) => SlotState::Occupied(&child.node),
            None => SlotState::Empty,
        }
    }

    pub fn is_occupied(&self, slot: Slot) -> bool {
        self.children.contains_key(&slot)
    }

    pub fn child(&self, slot: Slot) -> Option<&Node> {
        self.children.get(&slot).map(|child| &child.node)
    }

    pub fn child_named(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(slot, _)| slot.name() == name)
            .map(|(_, child)| &child.node)
    }

    pub fn presentation(&self, slot: Slot) -> Option<Presentation> {
        self.children.get(&slot).map(|child| child.presentation)
    }

    /// Occupied slots in attach order.
    pub fn slots(&self) -> Vec<Slot> {
        self.children.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn top(&self) -> Option<&Node> {
        self.children.last().map(|(_, child)| &child.node)
    }

    pub fn attach<B: Builder>(
        &mut self,
        slot: Slot,
        builder: &B,
        args: B::Args,
    ) -> Result<NodeId, RouteError> {
        self.attach_with(slot, Presentation::Embedded, builder, args)
    }

    pub fn present<B: Builder>(
        &mut self,
        slot: Slot,
        builder: &B,
        args: B::Args,
    ) -> Result<NodeId, RouteError> {
        self.attach_with(slot, Presentation::FullScreen, builder, args)
    }

    /// Builds a child, shows its surface, activates it, and records it at
    /// `slot`. Attaching into an occupied slot is refused; detach first.
    pub fn attach_with<B: Builder>(
        &mut self,
        slot: Slot,
        presentation: Presentation,
        builder: &B,
        args: B::Args,
    ) -> Result<NodeId, RouteError> {
        if self.children.contains_key(&slot) {
            log::error!(
                "{} [{}]: refusing to attach {} into occupied slot `{slot}`",
                self.owner_kind,
                self.owner,
                builder.kind()
            );
            return Err(RouteError::SlotOccupied { slot });
        }
        let node = builder.build(&self.scope, args)?;
        self.mount(slot, presentation, node)
    }

    /// Tears the child at `slot` down, descendants first, and removes its
    /// surface. Returns `false` (and does nothing) when the slot is empty.
    pub fn detach(&mut self, slot: Slot) -> bool {
        let Some(mut child) = self.children.shift_remove(&slot) else {
            return false;
        };
        child.node.teardown();
        self.hide(child.node.surface_id(), child.presentation);
        log::debug!(
            "{} [{}]: detached {} [{}] from `{slot}`",
            self.owner_kind,
            self.owner,
            child.node.kind(),
            child.node.id()
        );
        true
    }

    /// Swaps the occupant of `slot`. The replacement is built before the
    /// current child is detached, so a build error leaves the slot as it was.
    /// An activation error still leaves the slot empty.
    pub fn replace<B: Builder>(
        &mut self,
        slot: Slot,
        builder: &B,
        args: B::Args,
    ) -> Result<NodeId, RouteError> {
        let presentation = self.presentation(slot).unwrap_or_default();
        let node = builder.build(&self.scope, args)?;
        self.detach(slot);
        self.mount(slot, presentation, node)
    }

    fn mount(
        &mut self,
        slot: Slot,
        presentation: Presentation,
        mut node: Node,
    ) -> Result<NodeId, RouteError> {
        let surface = node.surface_id();
        self.show(surface, presentation);

        let saved = self.restore.shift_remove(slot.name());
        if let Err(source) = node.activate(&self.runtime, saved) {
            node.teardown();
            self.hide(surface, presentation);
            log::error!(
                "{} [{}]: {} failed to activate at `{slot}`: {source}",
                self.owner_kind,
                self.owner,
                node.kind()
            );
            return Err(RouteError::Activation {
                slot,
                source: Box::new(source),
            });
        }

        let id = node.id();
        log::debug!(
            "{} [{}]: attached {} [{id}] at `{slot}`",
            self.owner_kind,
            self.owner,
            node.kind()
        );
        self.children.insert(slot, Child { node, presentation });
        Ok(id)
    }

    pub(crate) fn child_mut(&mut self, slot: Slot) -> Option<&mut Node> {
        self.children.get_mut(&slot).map(|child| &mut child.node)
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Node> {
        self.children.last_mut().map(|(_, child)| &mut child.node)
    }

    /// Most recently attached first.
    pub(crate) fn detach_all(&mut self) {
        while let Some(slot) = self.children.last().map(|(slot, _)| *slot) {
            self.detach(slot);
        }
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (Slot, &Node, Presentation)> {
        self.children
            .iter()
            .map(|(slot, child)| (*slot, &child.node, child.presentation))
    }

    fn show(&mut self, surface: SurfaceId, presentation: Presentation) {
        match presentation {
            Presentation::Embedded => self.surface.insert_child(surface, true),
            Presentation::FullScreen => self.surface.present(surface),
        }
    }

    fn hide(&mut self, surface: SurfaceId, presentation: Presentation) {
        match presentation {
            Presentation::Embedded => self.surface.remove_child(surface),
            Presentation::FullScreen => self.surface.dismiss(surface),
        }
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("owner", &self.owner)
            .field("owner_kind", &self.owner_kind)
            .field("slots", &self.slots())
            .finish()
    }
}
