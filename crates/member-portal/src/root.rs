//! Session root: its `session` slot holds either the logged-out or the
//! logged-in subtree, swapped on listener notifications.

use std::rc::Rc;

use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, EventSender, Node, NodeContext,
    RouteError, Scope, Slot,
};

use crate::capabilities::SESSION;
use crate::logged_in::{LoggedInArgs, LoggedInBuilder, LoggedInListener};
use crate::logged_out::{LoggedOutBuilder, LoggedOutListener};
use crate::session::SessionService;

pub const SESSION_SLOT: Slot = Slot::new("session");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    HasSession(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootEvent {
    DidLogin(String),
    DidLogout,
}

/// Listener handed to both session children; forwards into the root's
/// mailbox without keeping the root alive.
struct RootListener {
    root: EventSender<RootEvent>,
}

impl LoggedOutListener for RootListener {
    fn did_login(&self, member_id: String) {
        self.root.send(RootEvent::DidLogin(member_id));
    }
}

impl LoggedInListener for RootListener {
    fn did_logout(&self) {
        self.root.send(RootEvent::DidLogout);
    }
}

pub struct RootController {
    session: Rc<dyn SessionService>,
    state: SessionState,
}

impl RootController {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn show_logged_out(&mut self, cx: &mut NodeContext<'_, RootEvent>) -> Result<(), RouteError> {
        let listener: Rc<dyn LoggedOutListener> = Rc::new(RootListener { root: cx.sender() });
        cx.router().replace(SESSION_SLOT, &LoggedOutBuilder, listener)?;
        self.state = SessionState::NoSession;
        Ok(())
    }

    fn show_logged_in(
        &mut self,
        cx: &mut NodeContext<'_, RootEvent>,
        member_id: String,
    ) -> Result<(), RouteError> {
        let listener: Rc<dyn LoggedInListener> = Rc::new(RootListener { root: cx.sender() });
        let args = LoggedInArgs {
            member_id: member_id.clone(),
            listener,
        };
        cx.router().replace(SESSION_SLOT, &LoggedInBuilder, args)?;
        self.state = SessionState::HasSession(member_id);
        Ok(())
    }
}

impl Controller for RootController {
    type Event = RootEvent;

    fn activate(
        &mut self,
        cx: &mut NodeContext<'_, RootEvent>,
        _saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        let member_id = self
            .session
            .current_identifier()
            .filter(|id| self.session.is_authenticated() && !id.trim().is_empty());
        match member_id {
            Some(member_id) => self.show_logged_in(cx, member_id),
            None => self.show_logged_out(cx),
        }
    }

    fn on_event(
        &mut self,
        cx: &mut NodeContext<'_, RootEvent>,
        event: RootEvent,
    ) -> Result<(), RouteError> {
        match event {
            RootEvent::DidLogin(member_id) => {
                if self.state != SessionState::NoSession {
                    log::debug!("ignoring login of {member_id} in {:?}", self.state);
                    return Ok(());
                }
                if member_id.trim().is_empty() {
                    log::warn!("login reported without a member id; staying signed out");
                    return Ok(());
                }
                log::info!("session started for {member_id}");
                self.show_logged_in(cx, member_id)
            }
            RootEvent::DidLogout => {
                let SessionState::HasSession(member_id) = &self.state else {
                    log::debug!("ignoring logout without a session");
                    return Ok(());
                };
                log::info!("session ended for {member_id}");
                self.session.logout();
                self.show_logged_out(cx)
            }
        }
    }
}

pub struct RootBuilder;

impl Builder for RootBuilder {
    type Args = ();

    fn kind(&self) -> &'static str {
        "root"
    }

    fn build(&self, parent: &Scope, _args: ()) -> Result<Node, BuildError> {
        let scope = parent.extend("root");
        let session = scope.require(&SESSION)?;
        let scope = scope.build();
        let surface = surface_for(&scope, "root");
        let controller = RootController {
            session,
            state: SessionState::NoSession,
        };
        Ok(Node::new("root", scope, surface, controller))
    }
}
