use std::rc::Rc;

use arbor_core::{Capability, Scope};

use crate::config::PortalConfig;
use crate::member::{MemberService, MockMemberService};
use crate::session::{MockSessionService, SessionService};

pub const CONFIG: Capability<PortalConfig> = Capability::new("config");
pub const SESSION: Capability<dyn SessionService> = Capability::new("session");
pub const MEMBER_SERVICE: Capability<dyn MemberService> = Capability::new("member_service");
/// Provided by the logged-in node to its subtree.
pub const MEMBER_ID: Capability<String> = Capability::new("member_id");

/// The shared services a portal tree runs against.
#[derive(Clone)]
pub struct PortalServices {
    pub config: Rc<PortalConfig>,
    pub session: Rc<dyn SessionService>,
    pub members: Rc<dyn MemberService>,
}

impl PortalServices {
    pub fn new(
        config: PortalConfig,
        session: Rc<dyn SessionService>,
        members: Rc<dyn MemberService>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            session,
            members,
        }
    }

    /// Mocked backend driven by `config`.
    pub fn mock(config: PortalConfig) -> Self {
        let session = Rc::new(MockSessionService::new(&config));
        let members = Rc::new(MockMemberService::new(&config));
        Self::new(config, session, members)
    }

    /// Extends `parent` with every portal capability.
    pub fn scope(&self, parent: &Scope) -> Scope {
        parent
            .extend("portal")
            .provide(&CONFIG, Rc::clone(&self.config))
            .provide(&SESSION, Rc::clone(&self.session))
            .provide(&MEMBER_SERVICE, Rc::clone(&self.members))
            .build()
    }
}
