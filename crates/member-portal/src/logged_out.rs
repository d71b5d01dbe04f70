//! The sign-in screen.

use std::rc::Rc;

use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, Node, NodeContext, RouteError, Scope,
};

use crate::capabilities::SESSION;
use crate::session::{AuthError, Credentials, Session, SessionService};

const MEMBER_ID_KEY: &str = "member_id";

/// Told when a member has signed in. Implemented by whoever owns the
/// logged-out node.
pub trait LoggedOutListener {
    fn did_login(&self, member_id: String);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginForm {
    Idle,
    Submitting,
    Failed(AuthError),
}

#[derive(Debug)]
pub enum LoggedOutEvent {
    Submit(Credentials),
    LoginFinished(Result<Session, AuthError>),
}

pub struct LoggedOutController {
    session: Rc<dyn SessionService>,
    listener: Rc<dyn LoggedOutListener>,
    form: LoginForm,
    member_id: String,
}

impl LoggedOutController {
    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    /// The member id last typed into the form.
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    fn submit(
        &mut self,
        cx: &mut NodeContext<'_, LoggedOutEvent>,
        credentials: Credentials,
    ) {
        if self.form == LoginForm::Submitting {
            log::debug!("login already in flight; ignoring submit");
            return;
        }
        self.member_id = credentials.member_id.clone();
        if credentials.member_id.trim().is_empty() || credentials.password.is_empty() {
            self.form = LoginForm::Failed(AuthError::InvalidCredentials);
            return;
        }
        self.form = LoginForm::Submitting;
        let login = self.session.login(credentials);
        cx.spawn(async move { LoggedOutEvent::LoginFinished(login.await) });
    }
}

impl Controller for LoggedOutController {
    type Event = LoggedOutEvent;

    fn activate(
        &mut self,
        _cx: &mut NodeContext<'_, LoggedOutEvent>,
        saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        if let Some(member_id) = saved.and_then(|bundle| bundle.get(MEMBER_ID_KEY)) {
            self.member_id = member_id.to_string();
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut NodeContext<'_, LoggedOutEvent>,
        event: LoggedOutEvent,
    ) -> Result<(), RouteError> {
        match event {
            LoggedOutEvent::Submit(credentials) => self.submit(cx, credentials),
            LoggedOutEvent::LoginFinished(Ok(session)) => {
                self.form = LoginForm::Idle;
                self.listener.did_login(session.member_id);
            }
            LoggedOutEvent::LoginFinished(Err(err)) => {
                log::warn!("login failed: {err}");
                self.form = LoginForm::Failed(err);
            }
        }
        Ok(())
    }

    fn save_state(&self, bundle: &mut Bundle) {
        if !self.member_id.is_empty() {
            bundle.put(MEMBER_ID_KEY, self.member_id.as_str());
        }
    }
}

pub struct LoggedOutBuilder;

impl Builder for LoggedOutBuilder {
    type Args = Rc<dyn LoggedOutListener>;

    fn kind(&self) -> &'static str {
        "logged_out"
    }

    fn build(&self, parent: &Scope, listener: Rc<dyn LoggedOutListener>) -> Result<Node, BuildError> {
        let scope = parent.extend("logged_out");
        let session = scope.require(&SESSION)?;
        let scope = scope.build();
        let surface = surface_for(&scope, "logged_out");
        let controller = LoggedOutController {
            session,
            listener,
            form: LoginForm::Idle,
            member_id: String::new(),
        };
        Ok(Node::new("logged_out", scope, surface, controller))
    }
}
