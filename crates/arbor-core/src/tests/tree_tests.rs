use std::any::type_name;

use crate::fixtures::*;
use crate::mailbox::Mailbox;
use crate::*;

const TAB: Slot = Slot::new("tab");
const DETAIL: Slot = Slot::new("detail");

fn logging_tree(log: &Log) -> Tree {
    Tree::new(
        Runtime::default(),
        logging_scope(log),
        Box::new(LoggingSurface::new("window", log)),
    )
}

fn count_at(tree: &Tree, path: &str) -> Option<u32> {
    tree.node(path)
        .and_then(|node| node.controller::<Probe>())
        .map(|probe| probe.count)
}

#[test]
fn launch_attaches_the_root_into_the_window() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);

    let id = tree
        .launch(&builder, ProbeArgs::named("root"), None)
        .expect("launch");

    assert!(tree.is_launched());
    assert_eq!(tree.root().map(Node::id), Some(id));
    assert_eq!(tree.window().children(), vec![tree.root().map(Node::surface_id).unwrap_or(0)]);
    assert_eq!(
        tree.launch(&builder, ProbeArgs::named("again"), None),
        Err(TreeError::AlreadyLaunched)
    );
}

#[test]
fn events_are_delivered_on_pump() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    tree.launch(&builder, ProbeArgs::named("root"), None)
        .expect("launch");

    tree.send("", ProbeEvent::Attach(TAB, ProbeArgs::named("a")))
        .expect("send");
    assert!(tree.node("tab").is_none());
    assert!(!tree.is_idle());

    let stats = tree.pump().expect("pump");
    assert_eq!(stats.events_dispatched, 1);
    assert!(tree.is_idle());
    assert_eq!(tree.node("tab").map(Node::kind), Some("probe"));
}

#[test]
fn send_checks_path_and_event_type() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    tree.launch(&builder, ProbeArgs::named("root"), None)
        .expect("launch");

    assert_eq!(
        tree.send("tab/detail", ProbeEvent::Bump),
        Err(TreeError::NoSuchNode {
            path: "tab/detail".into()
        })
    );
    assert_eq!(
        tree.send("", 42u8),
        Err(TreeError::EventTypeMismatch {
            path: String::new(),
            expected: type_name::<ProbeEvent>(),
        })
    );
}

#[test]
fn listener_events_reach_the_parent() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let args = ProbeArgs::named("root").with_child(TAB, ProbeArgs::named("a"));
    tree.launch(&builder, args, None).expect("launch");

    tree.send("tab", ProbeEvent::Tell("hi")).expect("send");
    let stats = tree.pump().expect("pump");

    assert_eq!(stats.events_dispatched, 2);
    assert_eq!(entries(&log).last().map(String::as_str), Some("heard hi at root"));
}

#[test]
fn listener_sends_to_a_gone_node_are_discarded() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let gone: Mailbox<ProbeEvent> = Mailbox::new(999);
    let mut child = ProbeArgs::named("a");
    child.listener = Some(gone.sender());
    drop(gone);
    tree.launch(&builder, ProbeArgs::named("root").with_child(TAB, child), None)
        .expect("launch");

    tree.send("tab", ProbeEvent::Tell("bye")).expect("send");
    let stats = tree.pump().expect("pump");

    assert_eq!(stats.events_dispatched, 1);
    assert!(!entries(&log).iter().any(|entry| entry.starts_with("heard")));
}

#[test]
fn events_queued_for_a_detached_subtree_are_dropped() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let args = ProbeArgs::named("root")
        .with_child(TAB, ProbeArgs::named("a").with_child(DETAIL, ProbeArgs::named("b")));
    tree.launch(&builder, args, None).expect("launch");

    tree.send("tab/detail", ProbeEvent::Tell("late")).expect("send");
    tree.send("", ProbeEvent::Detach(TAB)).expect("send");
    let stats = tree.pump().expect("pump");

    // The root runs first and takes the subtree, queued event and all, away.
    assert_eq!(stats.events_dispatched, 1);
    assert!(tree.node("tab").is_none());
    assert!(!entries(&log).iter().any(|entry| entry.starts_with("heard")));
}

#[test]
fn task_completion_arrives_as_an_event() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    tree.launch(&builder, ProbeArgs::named("root"), None)
        .expect("launch");

    tree.send("", ProbeEvent::Spawn(2)).expect("send");
    tree.pump().expect("pump");

    assert_eq!(entries(&log).last().map(String::as_str), Some("finished root"));
    assert_eq!(tree.runtime().live_tasks(), 0);
}

#[test]
fn detaching_cancels_running_tasks() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let args = ProbeArgs::named("root").with_child(TAB, ProbeArgs::named("a"));
    tree.launch(&builder, args, None).expect("launch");

    tree.send("tab", ProbeEvent::Spawn(10)).expect("send");
    tree.turn().expect("turn");
    assert_eq!(tree.node("tab").map(Node::live_tasks), Some(1));
    assert_eq!(tree.runtime().live_tasks(), 1);

    tree.send("", ProbeEvent::Detach(TAB)).expect("send");
    tree.pump().expect("pump");

    assert_eq!(tree.runtime().live_tasks(), 0);
    assert!(!entries(&log).contains(&"finished a".to_string()));
}

#[test]
fn back_press_asks_the_topmost_child_first() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let args = ProbeArgs::named("root")
        .with_child(TAB, ProbeArgs::named("a"))
        .with_child(DETAIL, ProbeArgs::named("b").consuming_back());
    tree.launch(&builder, args, None).expect("launch");
    log.borrow_mut().clear();

    assert_eq!(tree.handle_back_press(), Ok(true));
    assert_eq!(entries(&log), vec!["back b"]);

    tree.send("", ProbeEvent::Detach(DETAIL)).expect("send");
    tree.pump().expect("pump");
    log.borrow_mut().clear();

    assert_eq!(tree.handle_back_press(), Ok(false));
    assert_eq!(entries(&log), vec!["back a", "back root"]);
}

#[test]
fn back_press_without_a_root_is_not_consumed() {
    let mut tree = Tree::with_memory_window(Runtime::default(), Scope::root());
    assert_eq!(tree.handle_back_press(), Ok(false));
    assert!(tree.shutdown().is_none());
}

#[test]
fn shutdown_saves_state_and_relaunch_restores_it() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    let args = ProbeArgs::named("root").with_child(TAB, ProbeArgs::named("a"));
    tree.launch(&builder, args.clone(), None).expect("launch");
    tree.send("", ProbeEvent::Bump).expect("send");
    tree.send("", ProbeEvent::Bump).expect("send");
    tree.send("tab", ProbeEvent::Bump).expect("send");
    tree.pump().expect("pump");
    log.borrow_mut().clear();

    let saved = tree.shutdown().expect("saved state");

    assert_eq!(saved.bundle().get("count"), Some("2"));
    assert_eq!(saved.at("tab").and_then(|s| s.bundle().get("count")), Some("1"));
    assert!(!tree.is_launched());
    assert!(tree.window().children().is_empty());
    assert_eq!(
        entries(&log),
        vec![
            "deactivate a",
            "remove from root",
            "deactivate root",
            "remove from window",
        ]
    );

    tree.launch(&builder, args, Some(saved)).expect("relaunch");
    assert_eq!(count_at(&tree, ""), Some(2));
    assert_eq!(count_at(&tree, "tab"), Some(1));
}

#[test]
fn pump_stops_at_the_round_bound() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    tree.set_max_rounds(3);
    tree.launch(&builder, ProbeArgs::named("root"), None)
        .expect("launch");

    tree.send("", ProbeEvent::Spawn(20)).expect("send");
    let stats = tree.pump().expect("pump");

    assert_eq!(stats.rounds, 3);
    assert!(!tree.is_idle());
    assert_eq!(tree.runtime().live_tasks(), 1);
}

#[test]
fn dump_lists_slots_and_presentation() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    let mut tree = logging_tree(&log);
    tree.launch(
        &builder,
        ProbeArgs::named("root").with_child(TAB, ProbeArgs::named("a")),
        None,
    )
    .expect("launch");
    tree.send("", ProbeEvent::Present(DETAIL, ProbeArgs::named("b")))
        .expect("send");
    tree.pump().expect("pump");

    let dump = tree.dump();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with('['));
    assert!(lines[1].trim_start().starts_with("tab: ["));
    assert!(lines[2].trim_start().starts_with("detail (presented): ["));
    assert!(lines.iter().all(|line| line.contains("(Active)")));
}

#[test]
fn dropping_the_tree_tears_everything_down() {
    let log = new_log();
    let builder = ProbeBuilder { log: log.clone() };
    {
        let mut tree = logging_tree(&log);
        tree.launch(&builder, ProbeArgs::named("root"), None)
            .expect("launch");
    }
    assert_eq!(
        entries(&log).last().map(String::as_str),
        Some("remove from window")
    );
    assert!(entries(&log).contains(&"deactivate root".to_string()));
}
