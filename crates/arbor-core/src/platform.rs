//! Platform abstraction traits for the Arbor runtime.
//!
//! The tree never decides on its own when to run. Wakers and event senders
//! ask the host, through [`RuntimeScheduler`], to pump the tree on the
//! owning thread at its next opportunity.

/// Requests pumps of the tree on behalf of the runtime.
///
/// Implementations may be called from any thread (task wakers are
/// `Send + Sync`), but the pump itself must happen on the thread that owns
/// the tree.
pub trait RuntimeScheduler: Send + Sync {
    /// Ask the host to call `Tree::pump` soon.
    fn request_pump(&self);
}
