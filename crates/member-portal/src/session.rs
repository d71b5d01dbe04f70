//! Authentication capability and its in-memory mock.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use thiserror::Error;

use crate::config::PortalConfig;
use crate::latency::latency;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid member id or password")]
    InvalidCredentials,
    #[error("network error")]
    Network,
    #[error("unknown error")]
    Unknown,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub member_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(member_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("member_id", &self.member_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub member_id: String,
    pub member_name: String,
}

pub type LoginFuture = Pin<Box<dyn Future<Output = Result<Session, AuthError>>>>;

/// Who is signed in, and the operations that change it.
pub trait SessionService {
    fn is_authenticated(&self) -> bool;
    fn current_identifier(&self) -> Option<String>;
    fn current_name(&self) -> Option<String>;
    /// Resolves on the owning context; the session is stored only if the
    /// returned future runs to completion.
    fn login(&self, credentials: Credentials) -> LoginFuture;
    fn logout(&self);
}

/// Accepts the configured demo credentials and keeps the session in memory.
pub struct MockSessionService {
    member_id: String,
    password: String,
    member_name: String,
    token: String,
    latency: u32,
    session: Rc<RefCell<Option<Session>>>,
    attempts: Cell<u32>,
}

impl MockSessionService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            member_id: config.demo_member_id.clone(),
            password: config.demo_password.clone(),
            member_name: config.demo_member_name.clone(),
            token: config.demo_token.clone(),
            latency: config.login_latency,
            session: Rc::new(RefCell::new(None)),
            attempts: Cell::new(0),
        }
    }

    /// A service that already holds the demo member's session.
    pub fn signed_in(config: &PortalConfig) -> Self {
        let service = Self::new(config);
        *service.session.borrow_mut() = Some(service.demo_session());
        service
    }

    /// Number of `login` calls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn demo_session(&self) -> Session {
        Session {
            token: self.token.clone(),
            member_id: self.member_id.clone(),
            member_name: self.member_name.clone(),
        }
    }
}

impl SessionService for MockSessionService {
    fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    fn current_identifier(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.member_id.clone())
    }

    fn current_name(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.member_name.clone())
    }

    fn login(&self, credentials: Credentials) -> LoginFuture {
        self.attempts.set(self.attempts.get() + 1);
        let accepted = credentials.member_id == self.member_id && credentials.password == self.password;
        let outcome = if accepted {
            Ok(self.demo_session())
        } else {
            Err(AuthError::InvalidCredentials)
        };
        let store = Rc::clone(&self.session);
        let delay = latency(self.latency);
        Box::pin(async move {
            delay.await;
            if let Ok(session) = &outcome {
                log::info!("member {} signed in", session.member_id);
                *store.borrow_mut() = Some(session.clone());
            }
            outcome
        })
    }

    fn logout(&self) {
        if let Some(session) = self.session.borrow_mut().take() {
            log::info!("member {} signed out", session.member_id);
        }
    }
}
