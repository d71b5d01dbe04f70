//! Immutable capability records handed from parent to child.
//!
//! A node never looks services up globally. Its builder receives the
//! parent's [`Scope`], extends it with whatever the node adds, and reads the
//! capabilities the node needs from the resulting chain. Missing
//! capabilities surface as [`BuildError::MissingCapability`] at build time.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::error::BuildError;

/// Typed, named key for a value stored in a [`Scope`].
pub struct Capability<T: ?Sized + 'static> {
    name: &'static str,
    _marker: PhantomData<fn() -> Rc<T>>,
}

impl<T: ?Sized + 'static> Capability<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized + 'static> Clone for Capability<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for Capability<T> {}

impl<T: ?Sized + 'static> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

struct ScopeInner {
    owner: &'static str,
    parent: Option<Scope>,
    // Values are stored as `Rc<T>` boxed behind `dyn Any`, so unsized
    // capabilities (`dyn Trait`) work the same as concrete ones.
    entries: HashMap<&'static str, Rc<dyn Any>>,
}

/// One link in the capability chain. Cloning is cheap and shares the link.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// An empty scope with no parent, owned by the host.
    pub fn root() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                owner: "host",
                parent: None,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn owner(&self) -> &'static str {
        self.inner.owner
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    /// Starts a child scope. The child sees everything this scope sees plus
    /// whatever is provided on the returned builder.
    pub fn extend(&self, owner: &'static str) -> ScopeBuilder {
        ScopeBuilder {
            owner,
            parent: self.clone(),
            entries: HashMap::new(),
        }
    }

    /// Looks the capability up, nearest scope first.
    pub fn get<T: ?Sized + 'static>(&self, capability: &Capability<T>) -> Option<Rc<T>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(entry) = scope.inner.entries.get(capability.name) {
                let value = entry.downcast_ref::<Rc<T>>().cloned();
                if value.is_none() {
                    log::warn!(
                        "capability `{}` in scope `{}` is not a {}",
                        capability.name,
                        scope.owner(),
                        std::any::type_name::<T>()
                    );
                }
                return value;
            }
            current = scope.parent();
        }
        None
    }

    pub fn require<T: ?Sized + 'static>(
        &self,
        capability: &Capability<T>,
    ) -> Result<Rc<T>, BuildError> {
        self.get(capability)
            .ok_or(BuildError::MissingCapability {
                node: self.owner(),
                capability: capability.name,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(scope) = current {
            if scope.inner.entries.contains_key(name) {
                return true;
            }
            current = scope.parent();
        }
        false
    }

    /// Names visible from this scope, nearest first, without duplicates.
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            let mut local: Vec<&'static str> = scope.inner.entries.keys().copied().collect();
            local.sort_unstable();
            for name in local {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            current = scope.parent();
        }
        names
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent();
        }
        depth
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("owner", &self.owner())
            .field("depth", &self.depth())
            .field("capabilities", &self.capability_names())
            .finish()
    }
}

#[must_use = "call `build` to obtain the scope"]
pub struct ScopeBuilder {
    owner: &'static str,
    parent: Scope,
    entries: HashMap<&'static str, Rc<dyn Any>>,
}

impl ScopeBuilder {
    pub fn provide<T: ?Sized + 'static>(mut self, capability: &Capability<T>, value: Rc<T>) -> Self {
        self.entries
            .insert(capability.name, Rc::new(value) as Rc<dyn Any>);
        self
    }

    /// Reads a capability the new node depends on from the parent chain.
    /// A miss is reported against this builder's owner.
    pub fn require<T: ?Sized + 'static>(
        &self,
        capability: &Capability<T>,
    ) -> Result<Rc<T>, BuildError> {
        self.parent
            .get(capability)
            .ok_or(BuildError::MissingCapability {
                node: self.owner,
                capability: capability.name,
            })
    }

    pub fn build(self) -> Scope {
        Scope {
            inner: Rc::new(ScopeInner {
                owner: self.owner,
                parent: Some(self.parent),
                entries: self.entries,
            }),
        }
    }
}
