use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::runtime::RuntimeHandle;
use crate::NodeId;

struct MailboxInner<E> {
    queue: RefCell<VecDeque<E>>,
    runtime: RefCell<RuntimeHandle>,
}

/// Per-node queue of controller events, drained on the owning context.
///
/// The node holds the only strong reference. Everything else (listener
/// adapters in children, completions of spawned tasks) holds an
/// [`EventSender`], so a detached node's queue disappears with it.
pub(crate) struct Mailbox<E> {
    owner: NodeId,
    inner: Rc<MailboxInner<E>>,
}

impl<E> Mailbox<E> {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            inner: Rc::new(MailboxInner {
                queue: RefCell::new(VecDeque::new()),
                runtime: RefCell::new(RuntimeHandle::detached()),
            }),
        }
    }

    pub(crate) fn bind(&self, runtime: RuntimeHandle) {
        *self.inner.runtime.borrow_mut() = runtime;
    }

    pub(crate) fn sender(&self) -> EventSender<E> {
        EventSender {
            owner: self.owner,
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn post(&self, event: E) {
        self.inner.queue.borrow_mut().push_back(event);
        self.inner.runtime.borrow().request_pump();
    }

    pub(crate) fn take(&self) -> Option<E> {
        self.inner.queue.borrow_mut().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.queue.borrow().len()
    }
}

/// Weak, cloneable handle for posting events to one node's controller.
///
/// Listener adapters wrap one of these. Sending never keeps the target
/// alive; once the node is detached every send is discarded.
pub struct EventSender<E> {
    owner: NodeId,
    inner: Weak<MailboxInner<E>>,
}

impl<E> EventSender<E> {
    /// Returns `false` when the target node no longer exists.
    pub fn send(&self, event: impl Into<E>) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.queue.borrow_mut().push_back(event.into());
                inner.runtime.borrow().request_pump();
                true
            }
            None => {
                log::debug!("node {} is gone; discarding event", self.owner);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn target(&self) -> NodeId {
        self.owner
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventSender<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("target", &self.owner)
            .field("connected", &self.is_connected())
            .finish()
    }
}
