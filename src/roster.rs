//! Player roster and score bookkeeping
//!
//! The roster is an insertion-ordered list of players keyed by name. Names
//! are validated and trimmed on the way in; scores change only by signed
//! deltas typed by the operator, which are parsed here as well so that bad
//! input is reported instead of silently dropped.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::roster::MAX_NAME_LENGTH;

/// Errors that can occur when editing the roster
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested name is already in use by another player
    #[error("name already in-use")]
    Used,
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
    /// No player with this name is on the roster
    #[error("no player named {0:?}")]
    Unknown(String),
}

/// Errors that can occur when parsing a point adjustment
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// Nothing was typed
    #[error("no point value entered")]
    Empty,
    /// The input is not a whole number
    #[error("{0:?} is not a whole number")]
    NotANumber(String),
}

/// Whether an adjustment adds or subtracts the typed amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Award the amount
    Add,
    /// Deduct the amount
    Subtract,
}

impl Direction {
    /// Turns a typed amount into the signed delta for this direction
    pub fn apply(self, amount: i64) -> i64 {
        match self {
            Self::Add => amount,
            Self::Subtract => amount.saturating_neg(),
        }
    }
}

/// A signed point adjustment parsed from operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDelta(pub i64);

impl FromStr for PointDelta {
    type Err = DeltaError;

    /// Parses a whole number, allowing surrounding whitespace and a sign
    ///
    /// # Errors
    ///
    /// * `DeltaError::Empty` - the input is blank
    /// * `DeltaError::NotANumber` - anything else that is not an integer,
    ///   including decimals and trailing garbage
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DeltaError::Empty);
        }
        trimmed
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DeltaError::NotANumber(trimmed.to_owned()))
    }
}

/// A participant and their running score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    name: String,
    points: i64,
    joker: bool,
}

impl Player {
    /// Creates a player with no points and their joker available
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: 0,
            joker: true,
        }
    }

    /// The player's unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's stored score, never affected by double points
    pub fn points(&self) -> i64 {
        self.points
    }

    /// Whether the player still holds their joker
    pub fn joker(&self) -> bool {
        self.joker
    }
}

/// Insertion-ordered players, unique by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Player>", into = "Vec<Player>")]
pub struct Roster {
    players: Vec<Player>,
}

impl From<Vec<Player>> for Roster {
    /// Rebuilds a roster from a received list, keeping the first player
    /// for any repeated name
    fn from(list: Vec<Player>) -> Self {
        let mut roster = Self::default();
        for player in list {
            if roster.get(&player.name).is_none() {
                roster.players.push(player);
            }
        }
        roster
    }
}

impl From<Roster> for Vec<Player> {
    fn from(roster: Roster) -> Self {
        roster.players
    }
}

impl Roster {
    /// Adds a new player at the end of the roster
    ///
    /// # Errors
    ///
    /// * `Error::TooLong` - the name exceeds the length limit
    /// * `Error::Empty` - the name is blank after trimming
    /// * `Error::Used` - a player with this name already exists; the roster
    ///   is left unchanged
    pub fn add(&mut self, name: &str) -> Result<&Player, Error> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(Error::TooLong);
        }
        let name = rustrict::trim_whitespace(name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if self.get(name).is_some() {
            return Err(Error::Used);
        }
        self.players.push(Player::new(name));
        Ok(&self.players[self.players.len() - 1])
    }

    /// Removes a player, returning them if they were present
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.name == name)?;
        Some(self.players.remove(index))
    }

    /// Looks up a player by name
    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Player, Error> {
        self.players
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::Unknown(name.to_owned()))
    }

    /// Applies a signed delta to a player's score, returning the new total
    ///
    /// # Errors
    ///
    /// Returns `Error::Unknown` if no player has this name.
    pub fn adjust(&mut self, name: &str, delta: i64) -> Result<i64, Error> {
        let player = self.get_mut(name)?;
        player.points = player.points.saturating_add(delta);
        Ok(player.points)
    }

    /// Flips a player's joker flag, returning the new value
    ///
    /// # Errors
    ///
    /// Returns `Error::Unknown` if no player has this name.
    pub fn toggle_joker(&mut self, name: &str) -> Result<bool, Error> {
        let player = self.get_mut(name)?;
        player.joker = !player.joker;
        Ok(player.joker)
    }

    /// Sets every score back to zero and hands every joker back
    pub fn reset_scores(&mut self) {
        for player in &mut self.players {
            player.points = 0;
            player.joker = true;
        }
    }

    /// The players in insertion order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Returns the number of players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Checks if nobody has joined yet
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn roster_with(names: &[&str]) -> Roster {
        let mut roster = Roster::default();
        for name in names {
            roster.add(name).unwrap();
        }
        roster
    }

    #[test]
    fn test_add_player() {
        let mut roster = Roster::default();
        let player = roster.add("Anna").unwrap();

        assert_eq!(player.name(), "Anna");
        assert_eq!(player.points(), 0);
        assert!(player.joker());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let roster = roster_with(&["Zoe", "Anna", "Ben"]);
        let names = roster.players().iter().map(Player::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Zoe", "Anna", "Ben"]);
    }

    #[test]
    fn test_add_duplicate_is_rejected_and_unchanged() {
        let mut roster = roster_with(&["Anna"]);
        roster.adjust("Anna", 300).unwrap();
        let before = roster.clone();

        assert_eq!(roster.add("Anna"), Err(Error::Used));
        assert_eq!(roster.add("  Anna "), Err(Error::Used));
        assert_eq!(roster, before);
    }

    #[test]
    fn test_add_blank_name() {
        let mut roster = Roster::default();
        assert_eq!(roster.add(""), Err(Error::Empty));
        assert_eq!(roster.add("   "), Err(Error::Empty));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_add_trims_whitespace() {
        let mut roster = Roster::default();
        assert_eq!(roster.add("  Ben  ").unwrap().name(), "Ben");
        assert!(roster.get("Ben").is_some());
    }

    #[test]
    fn test_add_too_long() {
        let mut roster = Roster::default();
        assert_eq!(
            roster.add(&"a".repeat(MAX_NAME_LENGTH + 1)),
            Err(Error::TooLong)
        );
        assert!(roster.add(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_remove_player() {
        let mut roster = roster_with(&["Anna", "Ben"]);

        assert_eq!(
            roster.remove("Anna").map(|p| p.name().to_owned()),
            Some("Anna".to_owned())
        );
        assert_eq!(roster.remove("Anna"), None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_adjust_round_trip() {
        let mut roster = roster_with(&["Anna"]);
        roster.adjust("Anna", 150).unwrap();

        assert_eq!(roster.adjust("Anna", 300), Ok(450));
        assert_eq!(roster.adjust("Anna", -300), Ok(150));
    }

    #[test]
    fn test_adjust_can_go_negative() {
        let mut roster = roster_with(&["Anna"]);
        assert_eq!(roster.adjust("Anna", -200), Ok(-200));
    }

    #[test]
    fn test_adjust_unknown_player() {
        let mut roster = roster_with(&["Anna"]);
        assert_eq!(
            roster.adjust("Ghost", 100),
            Err(Error::Unknown("Ghost".to_owned()))
        );
    }

    #[test]
    fn test_toggle_joker() {
        let mut roster = roster_with(&["Anna"]);
        assert_eq!(roster.toggle_joker("Anna"), Ok(false));
        assert_eq!(roster.toggle_joker("Anna"), Ok(true));
    }

    #[test]
    fn test_reset_scores() {
        let mut roster = roster_with(&["Anna", "Ben"]);
        roster.adjust("Anna", 400).unwrap();
        roster.toggle_joker("Ben").unwrap();

        roster.reset_scores();

        assert!(roster.players().iter().all(|p| p.points() == 0 && p.joker()));
    }

    #[test]
    fn test_parse_delta() {
        assert_eq!("300".parse::<PointDelta>(), Ok(PointDelta(300)));
        assert_eq!(" -50 ".parse::<PointDelta>(), Ok(PointDelta(-50)));
        assert_eq!("+20".parse::<PointDelta>(), Ok(PointDelta(20)));
        assert_eq!("".parse::<PointDelta>(), Err(DeltaError::Empty));
        assert_eq!(
            "abc".parse::<PointDelta>(),
            Err(DeltaError::NotANumber("abc".to_owned()))
        );
        assert_eq!(
            "12.5".parse::<PointDelta>(),
            Err(DeltaError::NotANumber("12.5".to_owned()))
        );
    }

    #[test]
    fn test_direction_apply() {
        assert_eq!(Direction::Add.apply(200), 200);
        assert_eq!(Direction::Subtract.apply(200), -200);
        assert_eq!(Direction::Subtract.apply(-200), 200);
    }

    #[test]
    fn test_roster_wire_format() {
        let roster = roster_with(&["Anna"]);
        let json = serde_json::to_string(&roster).unwrap();
        assert_eq!(json, r#"[{"name":"Anna","points":0,"joker":true}]"#);
    }

    #[test]
    fn test_roster_deserialize_drops_repeated_names() {
        let json = r#"[
            {"name": "Anna", "points": 100, "joker": false},
            {"name": "Anna", "points": 999, "joker": true},
            {"name": "Ben", "points": 0, "joker": true}
        ]"#;
        let roster: Roster = serde_json::from_str(json).unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get("Anna").map(Player::points), Some(100));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Used.to_string(), "name already in-use");
        assert_eq!(Error::Empty.to_string(), "name cannot be empty");
        assert_eq!(Error::TooLong.to_string(), "name is too long");
        assert_eq!(
            DeltaError::NotANumber("x".to_owned()).to_string(),
            r#""x" is not a whole number"#
        );
    }
}
