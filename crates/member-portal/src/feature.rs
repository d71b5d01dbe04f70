//! The logged-in feature tabs, all built by one [`FeatureBuilder`].

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, Node, NodeContext, RouteError, Scope,
    Slot,
};
use thiserror::Error;

use crate::capabilities::{MEMBER_ID, MEMBER_SERVICE};
use crate::detail::DetailBuilder;
use crate::member::{CoverageType, Member, MemberCard, MemberError, MemberService};

pub const DETAIL_SLOT: Slot = Slot::new("detail");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab `{0}`")]
pub struct ParseTabError(pub String);

/// The closed set of screens reachable from the logged-in tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureTab {
    Dashboard,
    Benefits,
    Claims,
    Providers,
    MemberCard,
    Messages,
}

impl FeatureTab {
    pub const ALL: [FeatureTab; 6] = [
        FeatureTab::Dashboard,
        FeatureTab::Benefits,
        FeatureTab::Claims,
        FeatureTab::Providers,
        FeatureTab::MemberCard,
        FeatureTab::Messages,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FeatureTab::Dashboard => "dashboard",
            FeatureTab::Benefits => "benefits",
            FeatureTab::Claims => "claims",
            FeatureTab::Providers => "providers",
            FeatureTab::MemberCard => "member_card",
            FeatureTab::Messages => "messages",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            FeatureTab::Dashboard => "Dashboard",
            FeatureTab::Benefits => "Benefits",
            FeatureTab::Claims => "Claims",
            FeatureTab::Providers => "Find Care",
            FeatureTab::MemberCard => "ID Card",
            FeatureTab::Messages => "Messages",
        }
    }
}

impl fmt::Display for FeatureTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureTab {
    type Err = ParseTabError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_");
        match wanted.as_str() {
            "card" | "membercard" | "id_card" => return Ok(FeatureTab::MemberCard),
            "find_care" => return Ok(FeatureTab::Providers),
            _ => {}
        }
        FeatureTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == wanted)
            .ok_or_else(|| ParseTabError(value.to_string()))
    }
}

/// State of one backend fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(MemberError),
}

impl<T> Fetch<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Fetch::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetch::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn settle(&mut self, result: Result<T, MemberError>) {
        *self = match result {
            Ok(value) => Fetch::Ready(value),
            Err(err) => Fetch::Failed(err),
        };
    }
}

#[derive(Debug)]
pub enum FeatureEvent {
    OpenDetail(String),
    CloseDetail,
    MemberLoaded(Result<Member, MemberError>),
    CardLoaded(Result<MemberCard, MemberError>),
}

pub struct FeatureController {
    tab: FeatureTab,
    member_id: Rc<String>,
    members: Rc<dyn MemberService>,
    member: Fetch<Member>,
    card: Fetch<MemberCard>,
}

impl FeatureController {
    pub fn tab(&self) -> FeatureTab {
        self.tab
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn member(&self) -> &Fetch<Member> {
        &self.member
    }

    pub fn card(&self) -> &Fetch<MemberCard> {
        &self.card
    }
}

impl Controller for FeatureController {
    type Event = FeatureEvent;

    fn activate(
        &mut self,
        cx: &mut NodeContext<'_, FeatureEvent>,
        _saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        match self.tab {
            FeatureTab::Dashboard => {
                self.member = Fetch::Loading;
                let fetch = self.members.member(&self.member_id);
                cx.spawn(async move { FeatureEvent::MemberLoaded(fetch.await) });
            }
            FeatureTab::MemberCard => {
                self.card = Fetch::Loading;
                let fetch = self
                    .members
                    .member_card(&self.member_id, CoverageType::Medical);
                cx.spawn(async move { FeatureEvent::CardLoaded(fetch.await) });
            }
            _ => {}
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut NodeContext<'_, FeatureEvent>,
        event: FeatureEvent,
    ) -> Result<(), RouteError> {
        match event {
            FeatureEvent::OpenDetail(title) => {
                let router = cx.router();
                router.detach(DETAIL_SLOT);
                router.present(DETAIL_SLOT, &DetailBuilder, title)?;
            }
            FeatureEvent::CloseDetail => {
                cx.router().detach(DETAIL_SLOT);
            }
            FeatureEvent::MemberLoaded(result) => {
                if let Err(err) = &result {
                    log::warn!("{}: member fetch failed: {err}", self.tab);
                }
                self.member.settle(result);
            }
            FeatureEvent::CardLoaded(result) => {
                if let Err(err) = &result {
                    log::warn!("{}: card fetch failed: {err}", self.tab);
                }
                self.card.settle(result);
            }
        }
        Ok(())
    }

    /// Dismisses an open detail overlay.
    fn handle_back_press(
        &mut self,
        cx: &mut NodeContext<'_, FeatureEvent>,
    ) -> Result<bool, RouteError> {
        Ok(cx.router().detach(DETAIL_SLOT))
    }
}

pub struct FeatureBuilder;

impl Builder for FeatureBuilder {
    type Args = FeatureTab;

    fn kind(&self) -> &'static str {
        "feature"
    }

    fn build(&self, parent: &Scope, tab: FeatureTab) -> Result<Node, BuildError> {
        let scope = parent.extend(tab.as_str());
        let member_id = scope.require(&MEMBER_ID)?;
        let members = scope.require(&MEMBER_SERVICE)?;
        let scope = scope.build();
        let surface = surface_for(&scope, tab.as_str());
        let controller = FeatureController {
            tab,
            member_id,
            members,
            member: Fetch::Idle,
            card: Fetch::Idle,
        };
        Ok(Node::new(tab.as_str(), scope, surface, controller))
    }
}
