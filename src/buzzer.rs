//! Buzzer unlock signal
//!
//! The buzzer runs as a separate service reached over its own connection.
//! The admin panel only ever sends it one command, [`UNLOCK_COMMAND`], and
//! only while that connection reports it is open. There is no retry and no
//! acknowledgment.
//!
//! The relay side is modelled by [`Gate`]: the first press after an unlock
//! wins, every later press is ignored until the next unlock.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use crate::constants::buzzer::UNLOCK_COMMAND;

/// A failure reported by the underlying connection while sending
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("buzzer link failed: {0}")]
pub struct LinkError(pub String);

/// The outbound connection to the buzzer service
pub trait BuzzerLink {
    /// Whether the connection is open right now
    fn is_open(&self) -> bool;

    /// Sends a text frame
    ///
    /// # Errors
    ///
    /// Returns a `LinkError` if the connection fails mid-send.
    fn send_text(&self, text: &str) -> Result<(), LinkError>;
}

/// A link that never connects, for setups without a buzzer
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

impl BuzzerLink for Disconnected {
    fn is_open(&self) -> bool {
        false
    }

    fn send_text(&self, _text: &str) -> Result<(), LinkError> {
        Err(LinkError("not connected".to_owned()))
    }
}

/// Outcome of the last unlock attempt, shown to the operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BuzzerStatus {
    /// No unlock has been attempted yet
    #[default]
    Idle,
    /// The command was handed to the connection
    Unlocked,
    /// The connection was not open; the command was dropped
    NotConnected,
    /// The connection failed while sending
    Failed(LinkError),
}

/// Sends the unlock command if the link is open
pub fn unlock<L: BuzzerLink + ?Sized>(link: &L) -> BuzzerStatus {
    if !link.is_open() {
        warn!("buzzer connection is not open, unlock dropped");
        return BuzzerStatus::NotConnected;
    }
    match link.send_text(UNLOCK_COMMAND) {
        Ok(()) => {
            info!("buzzer unlocked");
            BuzzerStatus::Unlocked
        }
        Err(e) => {
            warn!(error = %e, "buzzer unlock failed");
            BuzzerStatus::Failed(e)
        }
    }
}

/// Errors raised by the relay when reading commands
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The text is not a command the relay understands
    #[error("unknown buzzer command {0:?}")]
    UnknownCommand(String),
}

/// Commands accepted by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Re-arm the buzzers
    Unlock,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            UNLOCK_COMMAND => Ok(Self::Unlock),
            other => Err(Error::UnknownCommand(other.to_owned())),
        }
    }
}

/// The winning press, as forwarded to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerPress {
    /// Which button was pressed first
    pub button: String,
}

impl BuzzerPress {
    /// Converts the press to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// First-press-wins lock over the physical buzzers
#[derive(Debug, Clone, Default)]
pub struct Gate {
    winner: Option<String>,
}

impl Gate {
    /// Registers a press
    ///
    /// Returns the press to forward if this is the first one since the last
    /// unlock, `None` otherwise.
    pub fn press(&mut self, button: &str) -> Option<BuzzerPress> {
        if self.winner.is_some() {
            return None;
        }
        self.winner = Some(button.to_owned());
        info!(button, "buzzer pressed");
        Some(BuzzerPress {
            button: button.to_owned(),
        })
    }

    /// Re-arms the buzzers
    pub fn unlock(&mut self) {
        self.winner = None;
    }

    /// Applies a text command received from the admin panel
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCommand` for anything but the unlock command;
    /// the gate is left as it was.
    pub fn handle_command(&mut self, text: &str) -> Result<(), Error> {
        match text.parse::<Command>()? {
            Command::Unlock => self.unlock(),
        }
        Ok(())
    }

    /// The button that won the current round, if any
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Whether presses are currently ignored
    pub fn is_locked(&self) -> bool {
        self.winner.is_some()
    }
}
