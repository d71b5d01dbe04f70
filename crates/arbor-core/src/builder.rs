use crate::error::BuildError;
use crate::node::Node;
use crate::scope::Scope;

/// Per-kind factory for nodes.
///
/// `build` extends the parent scope with whatever the node adds, creates the
/// surface and controller against that scope, wires any listener carried in
/// `args`, and returns the node in [`Lifecycle::Inactive`]. The only
/// failures are programmer errors: a capability the node needs is absent
/// from the chain, or `args` are malformed.
///
/// [`Lifecycle::Inactive`]: crate::Lifecycle::Inactive
pub trait Builder {
    type Args;

    fn kind(&self) -> &'static str;

    fn build(&self, parent: &Scope, args: Self::Args) -> Result<Node, BuildError>;
}

impl<B: Builder + ?Sized> Builder for &B {
    type Args = B::Args;

    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn build(&self, parent: &Scope, args: Self::Args) -> Result<Node, BuildError> {
        (**self).build(parent, args)
    }
}
