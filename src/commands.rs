use thiserror::Error;

use crate::state::Layer;

/// A line typed on stdin while the dashboard runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `city <name>`; a bare `city` clears it.
    City(Option<String>),
    District(Option<String>),
    /// Apply the current city/district filter.
    Filter,
    Select(String),
    Deselect,
    Refresh,
    Layer { layer: Layer, visible: bool },
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

fn rest(arg: &str) -> Option<String> {
    let arg = arg.trim();
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}

pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let command = match word.to_lowercase().as_str() {
        "city" => Command::City(rest(arg)),
        "district" => Command::District(rest(arg)),
        "filter" => Command::Filter,
        "select" => Command::Select(rest(arg).ok_or(CommandError::Usage("select <device>"))?),
        "deselect" => Command::Deselect,
        "refresh" => Command::Refresh,
        "layer" => parse_layer(arg)?,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_layer(arg: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "layer <markers|circles|heatmap> <on|off>";

    let mut parts = arg.split_whitespace();
    let layer = match parts.next().map(str::to_lowercase).as_deref() {
        Some("markers") => Layer::Markers,
        Some("circles") => Layer::Circles,
        Some("heatmap") => Layer::Heatmap,
        _ => return Err(CommandError::Usage(USAGE)),
    };
    let visible = match parts.next().map(str::to_lowercase).as_deref() {
        Some("on") | Some("true") => true,
        Some("off") | Some("false") => false,
        _ => return Err(CommandError::Usage(USAGE)),
    };
    Ok(Command::Layer { layer, visible })
}
