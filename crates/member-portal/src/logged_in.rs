//! The signed-in shell: a tab bar over one feature child.

use std::rc::Rc;

use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, Node, NodeContext, RouteError, Scope,
    Slot,
};

use crate::capabilities::{CONFIG, MEMBER_ID};
use crate::feature::{FeatureBuilder, FeatureTab};

pub const TAB_SLOT: Slot = Slot::new("tab");

const TAB_KEY: &str = "tab";

/// Told when the member asks to sign out.
pub trait LoggedInListener {
    fn did_logout(&self);
}

#[derive(Clone)]
pub struct LoggedInArgs {
    pub member_id: String,
    pub listener: Rc<dyn LoggedInListener>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggedInEvent {
    SelectTab(FeatureTab),
    Logout,
}

pub struct LoggedInController {
    member_id: Rc<String>,
    listener: Rc<dyn LoggedInListener>,
    initial_tab: FeatureTab,
    selected: FeatureTab,
}

impl LoggedInController {
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn selected(&self) -> FeatureTab {
        self.selected
    }

    fn select(
        &mut self,
        cx: &mut NodeContext<'_, LoggedInEvent>,
        tab: FeatureTab,
    ) -> Result<(), RouteError> {
        if tab == self.selected && cx.router().is_occupied(TAB_SLOT) {
            return Ok(());
        }
        cx.router().replace(TAB_SLOT, &FeatureBuilder, tab)?;
        log::debug!("member {}: switched to {tab}", self.member_id);
        self.selected = tab;
        Ok(())
    }
}

impl Controller for LoggedInController {
    type Event = LoggedInEvent;

    fn activate(
        &mut self,
        cx: &mut NodeContext<'_, LoggedInEvent>,
        saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        let restored = saved
            .and_then(|bundle| bundle.get(TAB_KEY))
            .and_then(|tab| tab.parse::<FeatureTab>().ok());
        self.selected = restored.unwrap_or(self.initial_tab);
        cx.router().attach(TAB_SLOT, &FeatureBuilder, self.selected)?;
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut NodeContext<'_, LoggedInEvent>,
        event: LoggedInEvent,
    ) -> Result<(), RouteError> {
        match event {
            LoggedInEvent::SelectTab(tab) => self.select(cx, tab)?,
            LoggedInEvent::Logout => self.listener.did_logout(),
        }
        Ok(())
    }

    /// Any tab other than the dashboard steps back to it.
    fn handle_back_press(
        &mut self,
        cx: &mut NodeContext<'_, LoggedInEvent>,
    ) -> Result<bool, RouteError> {
        if self.selected == FeatureTab::Dashboard {
            return Ok(false);
        }
        self.select(cx, FeatureTab::Dashboard)?;
        Ok(true)
    }

    fn save_state(&self, bundle: &mut Bundle) {
        bundle.put(TAB_KEY, self.selected.as_str());
    }
}

pub struct LoggedInBuilder;

impl Builder for LoggedInBuilder {
    type Args = LoggedInArgs;

    fn kind(&self) -> &'static str {
        "logged_in"
    }

    fn build(&self, parent: &Scope, args: LoggedInArgs) -> Result<Node, BuildError> {
        if args.member_id.trim().is_empty() {
            return Err(BuildError::InvalidArgument {
                node: "logged_in",
                reason: "member id must not be empty".into(),
            });
        }
        let member_id = Rc::new(args.member_id);
        let scope = parent.extend("logged_in");
        let config = scope.require(&CONFIG)?;
        let scope = scope.provide(&MEMBER_ID, Rc::clone(&member_id)).build();
        let surface = surface_for(&scope, "logged_in");
        let controller = LoggedInController {
            member_id,
            listener: args.listener,
            initial_tab: config.initial_tab,
            selected: config.initial_tab,
        };
        Ok(Node::new("logged_in", scope, surface, controller))
    }
}
