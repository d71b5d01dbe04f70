//! Member portal node kinds for the Arbor tree engine.
//!
//! The tree is a session root that holds either the sign-in screen or the
//! signed-in shell, and the shell holds one feature tab at a time:
//!
//! ```text
//! root
//! └── session: logged_out             (no session)
//!            | logged_in              (session for one member)
//!              └── tab: dashboard | benefits | claims | providers | member_card | messages
//!                  └── detail         (presented full screen)
//! ```
//!
//! Backend services are mocked; see [`PortalServices::mock`].

pub mod capabilities;
pub mod config;
pub mod detail;
pub mod feature;
pub mod latency;
pub mod logged_in;
pub mod logged_out;
pub mod member;
pub mod root;
pub mod session;

pub use capabilities::{PortalServices, CONFIG, MEMBER_ID, MEMBER_SERVICE, SESSION};
pub use config::{ConfigError, PortalConfig};
pub use detail::{DetailBuilder, DetailController};
pub use feature::{
    FeatureBuilder, FeatureController, FeatureEvent, FeatureTab, Fetch, ParseTabError, DETAIL_SLOT,
};
pub use logged_in::{
    LoggedInArgs, LoggedInBuilder, LoggedInController, LoggedInEvent, LoggedInListener, TAB_SLOT,
};
pub use logged_out::{
    LoggedOutBuilder, LoggedOutController, LoggedOutEvent, LoggedOutListener, LoginForm,
};
pub use member::{
    CoverageType, Member, MemberCard, MemberError, MemberService, MockMemberService,
};
pub use root::{RootBuilder, RootController, RootEvent, SessionState, SESSION_SLOT};
pub use session::{AuthError, Credentials, MockSessionService, Session, SessionService};

#[cfg(test)]
#[path = "tests/portal_tests.rs"]
mod portal_tests;
