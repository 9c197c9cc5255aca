use std::str::FromStr;

use obsnav_navigator::NavCommand;
use obsnav_protocol::Direction;
use obsnav_protocol::SortKey;
use strum::IntoEnumIterator;

/// One line typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Nav(NavCommand),
    Filter(String),
    Sort(SortKey),
    Direction(Direction),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  next | right          next observation (wraps)
  prev | left           previous observation (wraps)
  first | last          jump to either end
  random                jump to a random observation
  reload                start a new session and re-read everything
  filter [TEXT]         set the search filter (empty clears it)
  sort KEY              _id, created, modified, modified-by, tags
  direction asc|desc    sort direction
  export                export every observation matching the filter
  show                  print the current observation
  quit";

fn sort_key_names() -> String {
    SortKey::iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "next" | "n" | "right" => ShellCommand::Nav(NavCommand::Next),
        "prev" | "previous" | "p" | "left" => ShellCommand::Nav(NavCommand::Previous),
        "first" => ShellCommand::Nav(NavCommand::First),
        "last" => ShellCommand::Nav(NavCommand::Last),
        "random" => ShellCommand::Nav(NavCommand::Random),
        "reload" => ShellCommand::Nav(NavCommand::Reload),
        "export" => ShellCommand::Nav(NavCommand::Export),
        "filter" | "search" => ShellCommand::Filter(rest.to_string()),
        "sort" => ShellCommand::Sort(SortKey::from_str(rest).map_err(|_| {
            format!("unknown sort key `{rest}`; expected one of {}", sort_key_names())
        })?),
        "direction" | "dir" => ShellCommand::Direction(
            Direction::from_str(rest)
                .map_err(|_| format!("unknown direction `{rest}`; expected asc or desc"))?,
        ),
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}
