//! Console command parsing

use simcom_core::{ChannelEntry, ChannelId, ComSelector, Frequency, FrequencyError};
use simcom_nav::{Mode, NavError};
use simcom_sim::ComRadio;
use thiserror::Error;

/// Help text printed by `help`
pub const HELP: &str = "\
Simulator:
  com1 <freq> | com2 <freq>       tune the active frequency
  stby1 <freq> | stby2 <freq>     tune the standby frequency
  swap1 | swap2                   exchange active and standby
  select com1|com2|both|none      set the radio switch
  sim on|off                      connect or disconnect the simulator
Voice server:
  connect | disconnect            join or leave the server
  move <id>                       move yourself to a channel
  lock <id> | unlock <id>         make a channel refuse moves
  add <id> <parent> <name>        create a channel (parent 0 for top level)
  remove <id>                     delete a channel and its subtree
Coordinator:
  mode disabled|manual|auto       change mode (off/man/aut also work)
  root <id>|none                  limit the search to a subtree
  untuned <id>|off                fallback channel for unknown frequencies
  tolerance <hundredths>          accept near frequencies
  status | list                   show status or the searched channels
  help | quit";

/// Errors from parsing a console line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word not recognised
    #[error("unknown command {0:?}, try help")]
    UnknownCommand(String),

    /// Required argument absent
    #[error("{command} needs {what}")]
    MissingArgument {
        /// Command being parsed
        command: &'static str,
        /// What was expected
        what: &'static str,
    },

    /// Argument not valid for the command
    #[error("{command}: invalid {what} {value:?}")]
    InvalidArgument {
        /// Command being parsed
        command: &'static str,
        /// What was expected
        what: &'static str,
        /// Offending text
        value: String,
    },

    /// Frequency did not parse
    #[error("invalid frequency: {0}")]
    Frequency(#[from] FrequencyError),

    /// Mode did not parse
    #[error(transparent)]
    Mode(#[from] NavError),
}

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Tune a radio's active frequency
    Tune(ComRadio, Frequency),
    /// Tune a radio's standby frequency
    Standby(ComRadio, Frequency),
    /// Exchange active and standby
    Swap(ComRadio),
    /// Set the radio switch
    Select(ComSelector),
    /// Simulator link up or down
    SimPower(bool),
    /// Join the voice server
    Connect,
    /// Leave the voice server
    Disconnect,
    /// Move yourself to a channel
    Move(ChannelId),
    /// Lock or unlock a channel
    Lock(ChannelId, bool),
    /// Create a channel
    Add(ChannelEntry),
    /// Delete a channel
    Remove(ChannelId),
    /// Change mode
    Mode(Mode),
    /// Change the search root
    Root(Option<ChannelId>),
    /// Change the untuned fallback
    Untuned(Option<ChannelId>),
    /// Change the match tolerance
    Tolerance(u32),
    /// Print status
    Status,
    /// Print the searched channels
    List,
    /// Print help
    Help,
    /// Exit
    Quit,
}

/// Parse one console line
pub fn parse(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(ConsoleError::Empty);
    };
    let command = command.to_ascii_lowercase();
    let arg = words.next();

    let parsed = match command.as_str() {
        "com1" => ConsoleCommand::Tune(ComRadio::Com1, frequency("com1", arg)?),
        "com2" => ConsoleCommand::Tune(ComRadio::Com2, frequency("com2", arg)?),
        "stby1" => ConsoleCommand::Standby(ComRadio::Com1, frequency("stby1", arg)?),
        "stby2" => ConsoleCommand::Standby(ComRadio::Com2, frequency("stby2", arg)?),
        "swap1" => ConsoleCommand::Swap(ComRadio::Com1),
        "swap2" => ConsoleCommand::Swap(ComRadio::Com2),
        "select" => {
            let value = required("select", "a radio", arg)?;
            let selector = match value.to_ascii_lowercase().as_str() {
                "com1" | "1" => ComSelector::Com1,
                "com2" | "2" => ComSelector::Com2,
                "both" => ComSelector::Both,
                "none" => ComSelector::None,
                _ => return Err(invalid("select", "radio", value)),
            };
            ConsoleCommand::Select(selector)
        }
        "sim" => ConsoleCommand::SimPower(switch("sim", arg)?),
        "connect" => ConsoleCommand::Connect,
        "disconnect" => ConsoleCommand::Disconnect,
        "move" => ConsoleCommand::Move(channel("move", arg)?),
        "lock" => ConsoleCommand::Lock(channel("lock", arg)?, true),
        "unlock" => ConsoleCommand::Lock(channel("unlock", arg)?, false),
        "add" => {
            let id = channel("add", arg)?;
            let parent = required("add", "a parent id", words.next())?;
            let parent: u64 = parent
                .parse()
                .map_err(|_| invalid("add", "parent id", parent))?;
            let name = words.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return Err(ConsoleError::MissingArgument {
                    command: "add",
                    what: "a channel name",
                });
            }
            ConsoleCommand::Add(ChannelEntry::new(id.0, name, parent))
        }
        "remove" => ConsoleCommand::Remove(channel("remove", arg)?),
        "mode" => ConsoleCommand::Mode(required("mode", "a mode", arg)?.parse()?),
        // Hotkey keywords
        "off" | "man" | "aut" => ConsoleCommand::Mode(command.parse()?),
        "root" => ConsoleCommand::Root(optional_channel("root", &["none", "all"], arg)?),
        "untuned" => ConsoleCommand::Untuned(optional_channel("untuned", &["off", "none"], arg)?),
        "tolerance" => {
            let value = required("tolerance", "a value in hundredths", arg)?;
            let tolerance = value
                .parse()
                .map_err(|_| invalid("tolerance", "value", value))?;
            ConsoleCommand::Tolerance(tolerance)
        }
        "status" => ConsoleCommand::Status,
        "list" | "ls" => ConsoleCommand::List,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(ConsoleError::UnknownCommand(command)),
    };
    Ok(parsed)
}

fn required<'a>(
    command: &'static str,
    what: &'static str,
    arg: Option<&'a str>,
) -> Result<&'a str, ConsoleError> {
    arg.ok_or(ConsoleError::MissingArgument { command, what })
}

fn invalid(command: &'static str, what: &'static str, value: &str) -> ConsoleError {
    ConsoleError::InvalidArgument {
        command,
        what,
        value: value.to_string(),
    }
}

fn frequency(command: &'static str, arg: Option<&str>) -> Result<Frequency, ConsoleError> {
    Ok(required(command, "a frequency", arg)?.parse()?)
}

fn channel(command: &'static str, arg: Option<&str>) -> Result<ChannelId, ConsoleError> {
    let value = required(command, "a channel id", arg)?;
    match value.parse::<u64>() {
        Ok(id) if id != 0 => Ok(ChannelId(id)),
        _ => Err(invalid(command, "channel id", value)),
    }
}

fn optional_channel(
    command: &'static str,
    unset: &[&str],
    arg: Option<&str>,
) -> Result<Option<ChannelId>, ConsoleError> {
    let value = required(command, "a channel id", arg)?;
    if unset.contains(&value.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    channel(command, Some(value)).map(Some)
}

fn switch(command: &'static str, arg: Option<&str>) -> Result<bool, ConsoleError> {
    let value = required(command, "on or off", arg)?;
    match value.to_ascii_lowercase().as_str() {
        "on" | "up" => Ok(true),
        "off" | "down" => Ok(false),
        _ => Err(invalid(command, "switch", value)),
    }
}
