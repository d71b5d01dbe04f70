use std::str::FromStr;

use member_portal::{FeatureTab, ParseTabError};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  login <member id> <password>   sign in (demo: M123456 demo)
  tab <name>                     dashboard, benefits, claims, providers, member_card, messages
  open <title>                   present a detail over the current tab
  back                           system back press
  logout                         sign out
  background / foreground        save and tear down / relaunch from saved state
  pump                           run pending work
  dump                           print the tree
  help / quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { member_id: String, password: String },
    Tab(FeatureTab),
    Open(String),
    Back,
    Logout,
    Background,
    Foreground,
    Pump,
    Dump,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; try `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Tab(#[from] ParseTabError),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match word {
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(member_id), Some(password), None) => Command::Login {
                        member_id: member_id.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err(CommandError::Usage("login <member id> <password>")),
                }
            }
            "tab" if rest.is_empty() => return Err(CommandError::Usage("tab <name>")),
            "tab" => Command::Tab(rest.parse()?),
            "open" if rest.is_empty() => return Err(CommandError::Usage("open <title>")),
            "open" => Command::Open(rest.to_string()),
            "back" => Command::Back,
            "logout" => Command::Logout,
            "background" | "bg" => Command::Background,
            "foreground" | "fg" => Command::Foreground,
            "pump" => Command::Pump,
            "dump" => Command::Dump,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
