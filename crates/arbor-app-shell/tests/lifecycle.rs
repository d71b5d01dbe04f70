use arbor_app_shell::{AppShell, BackOutcome};
use arbor_core::{
    surface_for, BuildError, Builder, Bundle, Controller, Node, NodeContext, RouteError, Scope,
    Slot, TreeError,
};

const OVERLAY: Slot = Slot::new("overlay");

#[derive(Debug)]
enum ScreenEvent {
    Open,
    Visit,
    Reject,
}

/// Counts visits and shows an overlay that a back press closes.
struct Screen {
    visits: u32,
}

impl Controller for Screen {
    type Event = ScreenEvent;

    fn activate(
        &mut self,
        _cx: &mut NodeContext<'_, ScreenEvent>,
        saved: Option<&Bundle>,
    ) -> Result<(), RouteError> {
        if let Some(visits) = saved.and_then(|bundle| bundle.get("visits")) {
            self.visits = visits.parse().unwrap_or_default();
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut NodeContext<'_, ScreenEvent>,
        event: ScreenEvent,
    ) -> Result<(), RouteError> {
        match event {
            ScreenEvent::Open => {
                cx.router().present(OVERLAY, &OverlayBuilder, ())?;
            }
            ScreenEvent::Visit => self.visits += 1,
            ScreenEvent::Reject => {
                return Err(RouteError::Build(BuildError::InvalidArgument {
                    node: "screen",
                    reason: "rejected".into(),
                }));
            }
        }
        Ok(())
    }

    fn handle_back_press(
        &mut self,
        cx: &mut NodeContext<'_, ScreenEvent>,
    ) -> Result<bool, RouteError> {
        Ok(cx.router().detach(OVERLAY))
    }

    fn save_state(&self, bundle: &mut Bundle) {
        bundle.put("visits", self.visits.to_string());
    }
}

struct Overlay;

impl Controller for Overlay {
    type Event = ();
}

#[derive(Clone)]
struct ScreenBuilder;

impl Builder for ScreenBuilder {
    type Args = ();

    fn kind(&self) -> &'static str {
        "screen"
    }

    fn build(&self, parent: &Scope, _args: ()) -> Result<Node, BuildError> {
        let scope = parent.extend("screen").build();
        let surface = surface_for(&scope, "screen");
        Ok(Node::new("screen", scope, surface, Screen { visits: 0 }))
    }
}

struct OverlayBuilder;

impl Builder for OverlayBuilder {
    type Args = ();

    fn kind(&self) -> &'static str {
        "overlay"
    }

    fn build(&self, parent: &Scope, _args: ()) -> Result<Node, BuildError> {
        let scope = parent.extend("overlay").build();
        let surface = surface_for(&scope, "overlay");
        Ok(Node::new("overlay", scope, surface, Overlay))
    }
}

fn visits(shell: &AppShell<ScreenBuilder>) -> Option<u32> {
    shell
        .tree()
        .root()
        .and_then(|root| root.controller::<Screen>())
        .map(|screen| screen.visits)
}

#[test]
fn foreground_launches_once() {
    let mut shell = AppShell::new(ScreenBuilder, (), Scope::root());
    assert!(!shell.is_foreground());

    shell.on_foreground(None).expect("foreground");
    let first = shell.tree().root().map(Node::id);
    shell.on_foreground(None).expect("second foreground");

    assert!(shell.is_foreground());
    assert_eq!(shell.tree().root().map(Node::id), first);
    assert!(!shell.should_update());
}

#[test]
fn update_delivers_events_only_when_requested() {
    let mut shell = AppShell::new(ScreenBuilder, (), Scope::root());
    shell.on_foreground(None).expect("foreground");
    assert_eq!(shell.update().map(|stats| stats.rounds), Ok(0));

    shell.send("", ScreenEvent::Visit).expect("send");
    assert!(shell.should_update());
    let stats = shell.update().expect("update");

    assert_eq!(stats.events_dispatched, 1);
    assert_eq!(visits(&shell), Some(1));
    assert!(!shell.should_update());
}

#[test]
fn background_then_foreground_restores_state() {
    let mut shell = AppShell::new(ScreenBuilder, (), Scope::root());
    shell.on_foreground(None).expect("foreground");
    shell.send("", ScreenEvent::Visit).expect("send");
    shell.send("", ScreenEvent::Visit).expect("send");
    shell.update().expect("update");

    let saved = shell.on_background().expect("saved state");
    assert!(!shell.is_foreground());
    assert!(shell.tree().window().children().is_empty());
    assert!(shell.on_background().is_none());

    shell.on_foreground(Some(saved)).expect("foreground again");
    assert_eq!(visits(&shell), Some(2));
}

#[test]
fn back_falls_through_to_the_platform_when_nothing_consumes_it() {
    let mut shell = AppShell::new(ScreenBuilder, (), Scope::root());
    assert_eq!(shell.back_pressed(), Ok(BackOutcome::PlatformDefault));

    shell.on_foreground(None).expect("foreground");
    shell.send("", ScreenEvent::Open).expect("send");
    shell.update().expect("update");
    assert!(shell.dump().contains("overlay (presented)"));
    assert_eq!(shell.tree().window().children().len(), 1);

    assert_eq!(shell.back_pressed(), Ok(BackOutcome::Consumed));
    assert!(!shell.dump().contains("overlay"));
    assert_eq!(shell.back_pressed(), Ok(BackOutcome::PlatformDefault));
}

#[test]
fn update_hands_controller_errors_to_the_host() {
    let mut shell = AppShell::new(ScreenBuilder, (), Scope::root());
    shell.on_foreground(None).expect("foreground");

    shell.send("", ScreenEvent::Reject).expect("send");
    let result = shell.update();

    assert_eq!(
        result,
        Err(TreeError::Route(RouteError::Build(BuildError::InvalidArgument {
            node: "screen",
            reason: "rejected".into(),
        })))
    );
    assert!(shell.is_foreground());
    shell.send("", ScreenEvent::Visit).expect("send");
    assert_eq!(shell.update().map(|stats| stats.events_dispatched), Ok(1));
    assert_eq!(visits(&shell), Some(1));
}
