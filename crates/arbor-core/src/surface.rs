use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::scope::{Capability, Scope};
use crate::error::BuildError;

pub type SurfaceId = usize;

static NEXT_SURFACE_ID: AtomicUsize = AtomicUsize::new(1);

pub fn next_surface_id() -> SurfaceId {
    NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)
}

/// The visual handle of a node.
///
/// The engine only relies on ordered insertion and removal of child
/// surfaces and on present/dismiss for full-screen children. Everything a
/// platform does to actually draw is behind this trait.
pub trait Surface {
    fn id(&self) -> SurfaceId;
    fn kind(&self) -> &'static str;
    fn insert_child(&mut self, child: SurfaceId, at_end: bool);
    fn remove_child(&mut self, child: SurfaceId);
    fn present(&mut self, child: SurfaceId);
    fn dismiss(&mut self, child: SurfaceId);
    /// Embedded children in paint order; the last one is on top.
    fn children(&self) -> Vec<SurfaceId>;
    fn presented(&self) -> Vec<SurfaceId> {
        Vec::new()
    }
}

pub trait SurfaceFactory {
    fn create(&self, kind: &'static str) -> Box<dyn Surface>;
}

pub const SURFACE_FACTORY: Capability<dyn SurfaceFactory> = Capability::new("surface_factory");

/// Creates the surface for a node of `kind` through the scope's factory,
/// falling back to a [`MemorySurface`] when no factory is provided.
pub fn surface_for(scope: &Scope, kind: &'static str) -> Box<dyn Surface> {
    match scope.get(&SURFACE_FACTORY) {
        Some(factory) => factory.create(kind),
        None => Box::new(MemorySurface::new(kind)),
    }
}

/// Like [`surface_for`], but a missing factory is a build error.
pub fn require_surface(scope: &Scope, kind: &'static str) -> Result<Box<dyn Surface>, BuildError> {
    Ok(scope.require(&SURFACE_FACTORY)?.create(kind))
}

#[derive(Clone, PartialEq, Eq)]
pub struct MemorySurface {
    id: SurfaceId,
    kind: &'static str,
    children: Vec<SurfaceId>,
    presented: Vec<SurfaceId>,
}

impl MemorySurface {
    pub fn new(kind: &'static str) -> Self {
        Self {
            id: next_surface_id(),
            kind,
            children: Vec::new(),
            presented: Vec::new(),
        }
    }
}

impl Surface for MemorySurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn insert_child(&mut self, child: SurfaceId, at_end: bool) {
        if at_end {
            self.children.push(child);
        } else {
            self.children.insert(0, child);
        }
    }

    fn remove_child(&mut self, child: SurfaceId) {
        self.children.retain(|id| *id != child);
    }

    fn present(&mut self, child: SurfaceId) {
        self.presented.push(child);
    }

    fn dismiss(&mut self, child: SurfaceId) {
        self.presented.retain(|id| *id != child);
    }

    fn children(&self) -> Vec<SurfaceId> {
        self.children.clone()
    }

    fn presented(&self) -> Vec<SurfaceId> {
        self.presented.clone()
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySurface")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("presented", &self.presented)
            .finish()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemorySurfaceFactory;

impl SurfaceFactory for MemorySurfaceFactory {
    fn create(&self, kind: &'static str) -> Box<dyn Surface> {
        Box::new(MemorySurface::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn memory_surface_keeps_insertion_order() {
        let mut surface = MemorySurface::new("root");
        surface.insert_child(10, true);
        surface.insert_child(11, true);
        surface.insert_child(9, false);
        assert_eq!(surface.children(), vec![9, 10, 11]);

        surface.remove_child(10);
        assert_eq!(surface.children(), vec![9, 11]);
    }

    #[test]
    fn present_and_dismiss_are_separate_from_children() {
        let mut surface = MemorySurface::new("root");
        surface.insert_child(1, true);
        surface.present(2);
        assert_eq!(surface.children(), vec![1]);
        assert_eq!(surface.presented(), vec![2]);

        surface.dismiss(2);
        assert!(surface.presented().is_empty());
    }

    #[test]
    fn factory_comes_from_scope() {
        let bare = Scope::root();
        assert_eq!(surface_for(&bare, "leaf").kind(), "leaf");
        assert!(require_surface(&bare, "leaf").is_err());

        let scope = bare
            .extend("host")
            .provide(&SURFACE_FACTORY, Rc::new(MemorySurfaceFactory))
            .build();
        let a = require_surface(&scope, "leaf").expect("factory provided");
        let b = require_surface(&scope, "leaf").expect("factory provided");
        assert_ne!(a.id(), b.id());
    }
}
