//! One command per input line

use crate::error::{CliError, Result};

pub const HELP: &str = "\
commands:
  search <address>       geocode an address and place a marker
  pin on|off             toggle click-to-place
  click <lat> <lon>      click the map (needs pin on)
  select <key>           make a location the radius target
  radius <miles> [key]   draw a radius (defaults to the active location)
  circle <key>           click a location's circle
  delete [key]           delete a location (defaults to the clicked circle)
  clear                  remove everything
  list                   show all locations
  stats                  show POI cache stats
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Click { lat: f64, lon: f64 },
    PinMode(bool),
    Select(String),
    Radius { miles: f64, key: Option<String> },
    Circle(String),
    Delete(Option<String>),
    Clear,
    List,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parse one line; blank lines and `#` comments yield `None`
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "search" => Command::Search(required(rest, "search <address>")?),
            "click" => {
                let mut parts = rest.split_whitespace();
                let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(usage("click <lat> <lon>"));
                };
                Command::Click {
                    lat: number(lat)?,
                    lon: number(lon)?,
                }
            }
            "pin" => match rest.to_ascii_lowercase().as_str() {
                "on" => Command::PinMode(true),
                "off" => Command::PinMode(false),
                _ => return Err(usage("pin on|off")),
            },
            "select" => Command::Select(required(rest, "select <key>")?),
            "radius" => {
                let (miles, key) = match rest.split_once(char::is_whitespace) {
                    Some((miles, key)) => (miles, Some(key.trim().to_string())),
                    None => (rest, None),
                };
                if miles.is_empty() {
                    return Err(usage("radius <miles> [key]"));
                }
                Command::Radius {
                    miles: number(miles)?,
                    key,
                }
            }
            "circle" => Command::Circle(required(rest, "circle <key>")?),
            "delete" => Command::Delete((!rest.is_empty()).then(|| rest.to_string())),
            "clear" => Command::Clear,
            "list" => Command::List,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(CliError::Parse(format!(
                    "unknown command: {other} (try help)"
                )))
            }
        };

        Ok(Some(command))
    }
}

fn required(rest: &str, form: &str) -> Result<String> {
    if rest.is_empty() {
        return Err(usage(form));
    }
    Ok(rest.to_string())
}

fn number(raw: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| CliError::Parse(format!("not a number: {raw}")))
}

fn usage(form: &str) -> CliError {
    CliError::Parse(format!("usage: {form}"))
}
