mod command;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use arbor_app_shell::{AppShell, BackOutcome};
use arbor_core::{SavedState, Scope, TreeError};
use member_portal::{
    Credentials, FeatureController, FeatureEvent, Fetch, LoggedInController, LoggedInEvent,
    LoggedOutController, LoggedOutEvent, LoginForm, PortalConfig, PortalServices, RootBuilder,
    RootController, SessionState,
};

use command::{Command, HELP};

type Shell = AppShell<RootBuilder>;

fn main() -> ExitCode {
    env_logger::init();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("portal-demo: {err}");
            return ExitCode::from(2);
        }
    };
    log::debug!("starting with {config:?}");

    let services = PortalServices::mock(config);
    let mut shell = AppShell::new(RootBuilder, (), services.scope(&Scope::root()));
    if let Err(err) = shell.on_foreground(None) {
        eprintln!("portal-demo: launch failed: {err}");
        return ExitCode::FAILURE;
    }

    println!("=== Member Portal ===");
    println!("{HELP}");
    println!("{}", status(&shell));

    let mut saved = None;
    let stdin = io::stdin();
    prompt();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("portal-demo: {err}");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            prompt();
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(err) = run(&mut shell, &mut saved, command) {
                    println!("error: {err}");
                }
            }
            Err(err) => println!("{err}"),
        }
        prompt();
    }

    shell.on_background();
    ExitCode::SUCCESS
}

fn prompt() {
    print!("> ");
    // A failed flush only delays the prompt.
    let _ = io::stdout().flush();
}

fn run(shell: &mut Shell, saved: &mut Option<SavedState>, command: Command) -> Result<(), TreeError> {
    match command {
        Command::Login {
            member_id,
            password,
        } => {
            let credentials = Credentials::new(member_id, password);
            shell.send("session", LoggedOutEvent::Submit(credentials))?;
        }
        Command::Tab(tab) => shell.send("session", LoggedInEvent::SelectTab(tab))?,
        Command::Open(title) => shell.send("session/tab", FeatureEvent::OpenDetail(title))?,
        Command::Logout => shell.send("session", LoggedInEvent::Logout)?,
        Command::Back => {
            if shell.back_pressed()? == BackOutcome::PlatformDefault {
                println!("back not handled; the platform would close the app");
            }
        }
        Command::Background => match shell.on_background() {
            Some(state) => {
                *saved = Some(state);
                println!("backgrounded");
                return Ok(());
            }
            None => println!("already in the background"),
        },
        Command::Foreground => shell.on_foreground(saved.take())?,
        Command::Pump => {
            let stats = shell.update()?;
            println!(
                "{} round(s), {} task poll(s), {} event(s)",
                stats.rounds, stats.tasks_polled, stats.events_dispatched
            );
        }
        Command::Dump => {
            print!("{}", shell.dump());
            return Ok(());
        }
        Command::Help => {
            println!("{HELP}");
            return Ok(());
        }
        Command::Quit => return Ok(()),
    }
    let settled = shell.update();
    println!("{}", status(shell));
    settled.map(|_| ())
}

fn status(shell: &Shell) -> String {
    let tree = shell.tree();
    let Some(root) = tree.node("").and_then(|node| node.controller::<RootController>()) else {
        return "[background]".to_string();
    };
    match root.state() {
        SessionState::NoSession => {
            let form = tree
                .node("session")
                .and_then(|node| node.controller::<LoggedOutController>())
                .map(|form| match form.form() {
                    LoginForm::Idle => "ready".to_string(),
                    LoginForm::Submitting => "signing in...".to_string(),
                    LoginForm::Failed(err) => format!("failed: {err}"),
                })
                .unwrap_or_default();
            format!("[signed out] login form {form}")
        }
        SessionState::HasSession(member_id) => {
            let tab = tree
                .node("session")
                .and_then(|node| node.controller::<LoggedInController>())
                .map(|logged_in| logged_in.selected().title())
                .unwrap_or("?");
            let mut line = format!("[{member_id}] {tab}");
            if let Some(feature) = tree
                .node("session/tab")
                .and_then(|node| node.controller::<FeatureController>())
            {
                match feature.member() {
                    Fetch::Ready(member) => line.push_str(&format!(" | {}", member.full_name())),
                    Fetch::Failed(err) => line.push_str(&format!(" | {err}")),
                    Fetch::Loading => line.push_str(" | loading profile"),
                    Fetch::Idle => {}
                }
                if let Some(card) = feature.card().ready() {
                    line.push_str(&format!(" | {} ({})", card.plan_name, card.coverage_type));
                }
            }
            if tree.node("session/tab/detail").is_some() {
                line.push_str(" | detail open");
            }
            line
        }
    }
}
