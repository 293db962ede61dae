//! Line-oriented input source reading from standard input.
//!
//! Each line is one event:
//!
//! ```text
//! down 65        key down, host key code 65 ('A')
//! up 65          key up
//! pointer 10 20  pointer moved (accepted, not forwarded)
//! host hello     text message from the host page
//! ```
//!
//! Malformed lines are logged and skipped.  The task ends at end of input.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::controller::ClientEvent;
use crate::application::input_forwarder::InputEvent;

/// Why an input line could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

fn number<T: std::str::FromStr>(
    arg: Option<&str>,
    command: &'static str,
) -> Result<T, InputParseError> {
    let raw = arg.ok_or(InputParseError::MissingArgument(command))?;
    raw.parse()
        .map_err(|_| InputParseError::InvalidNumber(raw.to_string()))
}

/// Parses one input line into a controller event.
pub fn parse_input_line(line: &str) -> Result<ClientEvent, InputParseError> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let mut args = rest.split_whitespace();
    match command {
        "" => Err(InputParseError::Empty),
        "down" => Ok(ClientEvent::Input(InputEvent::KeyDown(number(args.next(), "down")?))),
        "up" => Ok(ClientEvent::Input(InputEvent::KeyUp(number(args.next(), "up")?))),
        "pointer" => {
            let x = number(args.next(), "pointer")?;
            let y = number(args.next(), "pointer")?;
            Ok(ClientEvent::Input(InputEvent::Pointer { x, y }))
        }
        "host" => Ok(ClientEvent::HostMessage(rest.trim().to_string())),
        other => Err(InputParseError::UnknownCommand(other.to_string())),
    }
}

/// Spawns a task that forwards parsed stdin lines to `events`.
pub fn spawn_stdin_source(events: mpsc::UnboundedSender<ClientEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_input_line(&line) {
                    Ok(event) => {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Err(InputParseError::Empty) => {}
                    Err(e) => warn!("ignoring input line {line:?}: {e}"),
                },
                Ok(None) => {
                    debug!("stdin closed; input source finished");
                    break;
                }
                Err(e) => {
                    warn!("stdin read error: {e}");
                    break;
                }
            }
        }
    })
}
