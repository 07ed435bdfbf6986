//! Line commands accepted on stdin.
//!
//! One command per line, first word is the verb. Filter verbs take `-` to clear.

use std::str::FromStr;

use thiserror::Error;

use crate::domain::{Difficulty, Platform, ProblemId, Status};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
  #[error("unknown command `{0}` (try `help`)")]
  Unknown(String),
  #[error("`{0}` needs an argument")]
  MissingArgument(&'static str),
  #[error("invalid {field} `{value}`, expected one of: {expected}")]
  InvalidValue { field: &'static str, value: String, expected: &'static str },
  #[error("`{0}` is not a list position")]
  InvalidPosition(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Replace the search box contents (a keystroke).
  Type(String),
  Enter,
  Focus,
  Blur,
  Escape,
  /// 1-based position in the recent-search list.
  Pick(usize),
  ClearSearch,
  History,
  ClearHistory,
  Difficulty(Option<Difficulty>),
  Platform(Option<Platform>),
  Status(Option<Status>),
  Tag(Option<String>),
  ClearFilters,
  List,
  Tags,
  Stats,
  Delete(ProblemId),
  Refresh,
  Revisions,
  Revise(ProblemId),
  Register { username: String, email: String, password: String },
  Login { username: String, password: String },
  Logout,
  Help,
  Quit,
}

pub const HELP: &str = "\
Search:   type <text> | enter | focus | blur | esc | pick <n> | clear-search
History:  history | clear-history
Filters:  difficulty <EASY|MEDIUM|HARD|-> | platform <LEETCODE|GFG|CODEFORCES|CODECHEF|HACKERRANK|->
          status <SOLVED|ATTEMPTED|TO_REVISE|-> | tag <name|-> | clear
View:     list | tags | stats | refresh
Actions:  delete <id> | revisions | revise <id>
Session:  register <username> <email> <password> | login <username> <password> | logout
          help | quit";

fn optional<T: FromStr<Err = CommandError>>(verb: &'static str, arg: &str) -> Result<Option<T>, CommandError> {
  match arg {
    "" => Err(CommandError::MissingArgument(verb)),
    "-" => Ok(None),
    v => v.parse().map(Some),
  }
}

fn required<'a>(verb: &'static str, arg: &'a str) -> Result<&'a str, CommandError> {
  if arg.is_empty() { Err(CommandError::MissingArgument(verb)) } else { Ok(arg) }
}

impl FromStr for Command {
  type Err = CommandError;

  fn from_str(line: &str) -> Result<Self, Self::Err> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let (verb, rest) = match line.trim_start().split_once(' ') {
      Some((v, r)) => (v, r),
      None => (line.trim_start(), ""),
    };
    // `type` keeps its argument verbatim (spaces are part of the search text).
    if verb == "type" {
      return Ok(Command::Type(rest.to_string()));
    }
    let arg = rest.trim();

    Ok(match verb {
      "enter" => Command::Enter,
      "focus" => Command::Focus,
      "blur" => Command::Blur,
      "esc" => Command::Escape,
      "pick" => {
        let raw = required("pick", arg)?;
        match raw.parse::<usize>() {
          Ok(n) if n >= 1 => Command::Pick(n),
          _ => return Err(CommandError::InvalidPosition(raw.to_string())),
        }
      }
      "clear-search" => Command::ClearSearch,
      "history" => Command::History,
      "clear-history" => Command::ClearHistory,
      "difficulty" => Command::Difficulty(optional("difficulty", arg)?),
      "platform" => Command::Platform(optional("platform", arg)?),
      "status" => Command::Status(optional("status", arg)?),
      "tag" => match required("tag", arg)? {
        "-" => Command::Tag(None),
        t => Command::Tag(Some(t.to_string())),
      },
      "clear" => Command::ClearFilters,
      "list" => Command::List,
      "tags" => Command::Tags,
      "stats" => Command::Stats,
      "delete" => Command::Delete(ProblemId::from(required("delete", arg)?)),
      "refresh" => Command::Refresh,
      "revisions" => Command::Revisions,
      "revise" => Command::Revise(ProblemId::from(required("revise", arg)?)),
      "login" => {
        let (username, password) = arg
          .split_once(char::is_whitespace)
          .ok_or(CommandError::MissingArgument("login"))?;
        Command::Login { username: username.to_string(), password: password.trim().to_string() }
      }
      "register" => {
        let missing = CommandError::MissingArgument("register");
        let (username, rest) = arg.split_once(char::is_whitespace).ok_or(missing.clone())?;
        let (email, password) = rest.trim_start().split_once(char::is_whitespace).ok_or(missing)?;
        Command::Register {
          username: username.to_string(),
          email: email.to_string(),
          password: password.trim().to_string(),
        }
      }
      "logout" => Command::Logout,
      "help" | "?" => Command::Help,
      "quit" | "exit" => Command::Quit,
      other => return Err(CommandError::Unknown(other.to_string())),
    })
  }
}
