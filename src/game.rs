//! Game session state and configuration
//!
//! [`GameSession`] is the state both surfaces share: the board, which
//! questions were used, the double points flag, the revealed question and
//! the roster. The admin panel owns the authoritative copy and the board
//! display keeps a replica fed by channel messages; both apply the same
//! transitions through this type.

use std::{collections::HashSet, time::Duration};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as, skip_serializing_none};
use thiserror::Error;

use crate::{
    board::Board,
    catalog::{PointValue, QuestionId, QuestionRecord},
    constants::{
        self,
        board::MAX_COLUMNS,
        timer::{MAX_SECONDS, MIN_SECONDS},
    },
    roster::Roster,
};

/// Errors raised by session transitions and option loading
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The question is not on the current board
    #[error("question {0} is not on the board")]
    UnknownQuestion(QuestionId),
    /// The options source is not valid JSON for the options shape
    #[error("options could not be parsed: {0}")]
    Parse(String),
    /// The options parsed but break a constraint
    #[error("options are invalid: {0}")]
    Invalid(String),
}

/// What the board display does when the countdown reaches zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryAction {
    /// Keep the question on screen with the countdown at zero
    #[default]
    Freeze,
    /// Close the question overlay
    CloseQuestion,
}

/// What revealing an already used question does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatReveal {
    /// Refuse, the tile stays used
    #[default]
    Ignore,
    /// Show it again without counting it twice
    Reshow,
}

type ValidationResult = garde::Result;

/// Validates that a duration falls within the given bounds, in seconds
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Configuration of a game
///
/// Every field has a default, so an empty JSON object is a valid source.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// How many categories to put on the board
    #[garde(range(min = 1, max = MAX_COLUMNS))]
    board_columns: usize,
    /// Length of the question countdown
    #[garde(custom(validate_duration::<MIN_SECONDS, MAX_SECONDS>))]
    #[serde_as(as = "DurationSeconds<u64>")]
    timer: Duration,
    /// What happens when the countdown expires
    #[garde(skip)]
    on_timer_expired: ExpiryAction,
    /// What revealing a used question does
    #[garde(skip)]
    repeat_reveal: RepeatReveal,
    /// Fixed seed for board sampling, random when absent
    #[garde(skip)]
    seed: Option<u64>,
    /// Where the buzzer service listens
    #[garde(length(min = 1, max = constants::buzzer::MAX_URL_LENGTH))]
    buzzer_url: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            board_columns: MAX_COLUMNS,
            timer: Duration::from_secs(constants::timer::DEFAULT_SECONDS),
            on_timer_expired: ExpiryAction::default(),
            repeat_reveal: RepeatReveal::default(),
            seed: None,
            buzzer_url: constants::buzzer::DEFAULT_URL.to_owned(),
        }
    }
}

impl Options {
    /// Parses and validates options from JSON
    ///
    /// # Errors
    ///
    /// * `Error::Parse` - the source does not match the options shape
    /// * `Error::Invalid` - a value is out of bounds
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let options: Self = serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))?;
        options.checked()
    }

    /// Returns the options if every value is within bounds
    ///
    /// The `with_*` builders do not check bounds; surfaces call this when
    /// they open.
    ///
    /// # Errors
    ///
    /// * `Error::Invalid` - a value is out of bounds
    pub fn checked(self) -> Result<Self, Error> {
        self.validate()
            .map_err(|report| Error::Invalid(report.to_string()))?;
        Ok(self)
    }

    /// Sets a fixed seed for board sampling
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets how many categories the board shows
    #[must_use]
    pub fn with_board_columns(mut self, columns: usize) -> Self {
        self.board_columns = columns;
        self
    }

    /// Sets the countdown length
    #[must_use]
    pub fn with_timer(mut self, timer: Duration) -> Self {
        self.timer = timer;
        self
    }

    /// Sets what happens when the countdown expires
    #[must_use]
    pub fn with_expiry(mut self, action: ExpiryAction) -> Self {
        self.on_timer_expired = action;
        self
    }

    /// Sets what revealing a used question does
    #[must_use]
    pub fn with_repeat_reveal(mut self, policy: RepeatReveal) -> Self {
        self.repeat_reveal = policy;
        self
    }

    /// How many categories the board shows
    pub fn board_columns(&self) -> usize {
        self.board_columns
    }

    /// Length of the question countdown
    pub fn timer(&self) -> Duration {
        self.timer
    }

    /// What happens when the countdown expires
    pub fn on_timer_expired(&self) -> ExpiryAction {
        self.on_timer_expired
    }

    /// What revealing a used question does
    pub fn repeat_reveal(&self) -> RepeatReveal {
        self.repeat_reveal
    }

    /// Fixed seed for board sampling, if any
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Where the buzzer service listens
    pub fn buzzer_url(&self) -> &str {
        &self.buzzer_url
    }
}

/// Outcome of revealing a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    /// The question was fresh and is now used
    Revealed(QuestionRecord),
    /// The question was already used and is shown again
    Reshown(QuestionRecord),
    /// The question was already used and nothing changed
    AlreadyUsed,
}

impl Reveal {
    /// The question to put on screen, if any
    pub fn question(&self) -> Option<&QuestionRecord> {
        match self {
            Self::Revealed(q) | Self::Reshown(q) => Some(q),
            Self::AlreadyUsed => None,
        }
    }
}

/// One tile of the board grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    /// The question behind the tile
    pub id: QuestionId,
    /// Points shown on the tile, doubled when double points is on
    pub value: u32,
    /// Whether the question was already revealed
    pub used: bool,
}

/// One category of the board grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    /// Category heading
    pub category: String,
    /// Tiles from cheapest to most expensive
    pub tiles: Vec<Tile>,
}

/// What the board display draws
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "columns", rename_all = "snake_case")]
pub enum Grid {
    /// No category had a complete ladder
    Empty,
    /// The categories left to right
    Columns(Vec<ColumnView>),
}

/// State shared between the admin panel and the board display
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameSession {
    board: Board,
    used: HashSet<QuestionId>,
    shown: usize,
    double_points: bool,
    revealed: Option<QuestionRecord>,
    roster: Roster,
}

impl GameSession {
    /// Starts a session on a freshly generated board
    pub fn new(board: Board) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    /// The board in play
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Identifiers of every question revealed since the last reset
    pub fn used(&self) -> &HashSet<QuestionId> {
        &self.used
    }

    /// Whether a question was already revealed
    pub fn is_used(&self, id: &QuestionId) -> bool {
        self.used.contains(id)
    }

    /// Number of distinct questions revealed since the last reset
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Whether tile values are shown doubled
    pub fn double_points(&self) -> bool {
        self.double_points
    }

    /// The question currently on screen
    pub fn revealed(&self) -> Option<&QuestionRecord> {
        self.revealed.as_ref()
    }

    /// The players in insertion order
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable access to the players
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Replaces the double points flag
    pub fn set_double_points(&mut self, on: bool) {
        self.double_points = on;
    }

    /// Flips the double points flag, returning the new value
    pub fn toggle_double_points(&mut self) -> bool {
        self.double_points = !self.double_points;
        self.double_points
    }

    /// Points displayed for a ladder value; stored scores are never scaled
    pub fn tile_value(&self, value: PointValue) -> u32 {
        if self.double_points {
            value.points() * constants::board::DOUBLE_POINTS_FACTOR
        } else {
            value.points()
        }
    }

    /// Reveals a question from the board
    ///
    /// A fresh question is marked used and counted. A used one is handled
    /// according to `policy` and never counted twice.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownQuestion` if the question is not on the board.
    pub fn reveal(&mut self, id: &QuestionId, policy: RepeatReveal) -> Result<Reveal, Error> {
        let record = self
            .board
            .question(id)
            .cloned()
            .ok_or_else(|| Error::UnknownQuestion(id.clone()))?;

        if self.used.contains(id) {
            return Ok(match policy {
                RepeatReveal::Ignore => Reveal::AlreadyUsed,
                RepeatReveal::Reshow => {
                    self.revealed = Some(record.clone());
                    Reveal::Reshown(record)
                }
            });
        }

        self.show(&record);
        Ok(Reveal::Revealed(record))
    }

    /// Puts a question on screen as announced by the admin panel
    ///
    /// Returns `true` if the question had not been used yet.
    pub fn show(&mut self, record: &QuestionRecord) -> bool {
        self.revealed = Some(record.clone());
        let fresh = self.used.insert(record.id().clone());
        if fresh {
            self.shown += 1;
        }
        fresh
    }

    /// Takes the revealed question off screen
    pub fn close_question(&mut self) {
        self.revealed = None;
    }

    /// Forgets which questions were used
    pub fn clear_used(&mut self) {
        self.used.clear();
        self.shown = 0;
    }

    /// Swaps in another board, forgetting which questions were used
    pub fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.clear_used();
    }

    /// Replaces the players wholesale
    pub fn replace_roster(&mut self, roster: Roster) {
        self.roster = roster;
    }

    /// Zeroes every score and hands every joker back
    pub fn reset_scores(&mut self) {
        self.roster.reset_scores();
    }

    /// Starts over on a new board, keeping the players but not their scores
    pub fn reset(&mut self, board: Board) {
        self.replace_board(board);
        self.close_question();
        self.reset_scores();
    }

    /// Builds the grid the board display draws
    pub fn grid(&self) -> Grid {
        if self.board.is_empty() {
            return Grid::Empty;
        }
        Grid::Columns(
            self.board
                .columns()
                .iter()
                .map(|column| ColumnView {
                    category: column.category().to_owned(),
                    tiles: column
                        .questions()
                        .iter()
                        .map(|q| Tile {
                            id: q.id().clone(),
                            value: self.tile_value(q.points()),
                            used: self.is_used(q.id()),
                        })
                        .collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        board::{generate, rng},
        testing::sample_catalog,
    };

    fn session() -> GameSession {
        GameSession::new(generate(&sample_catalog(), MAX_COLUMNS, &mut rng(Some(1))))
    }

    #[test]
    fn test_options_defaults() {
        let options = Options::from_json("{}").unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.board_columns(), 7);
        assert_eq!(options.timer(), Duration::from_secs(30));
        assert_eq!(options.on_timer_expired(), ExpiryAction::Freeze);
        assert_eq!(options.repeat_reveal(), RepeatReveal::Ignore);
        assert_eq!(options.buzzer_url(), "ws://localhost:8000");
        assert!(options.seed().is_none());
    }

    #[test]
    fn test_options_from_json() {
        let options = Options::from_json(
            r#"{"board_columns": 5, "timer": 45, "on_timer_expired": "close_question", "repeat_reveal": "reshow", "seed": 7}"#,
        )
        .unwrap();
        assert_eq!(
            options,
            Options::default()
                .with_board_columns(5)
                .with_timer(Duration::from_secs(45))
                .with_expiry(ExpiryAction::CloseQuestion)
                .with_repeat_reveal(RepeatReveal::Reshow)
                .with_seed(7)
        );
    }

    #[test]
    fn test_options_validation() {
        assert!(matches!(
            Options::from_json(r#"{"board_columns": 8}"#),
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            Options::from_json(r#"{"timer": 2}"#),
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            Options::from_json(r#"{"buzzer_url": ""}"#),
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            Options::from_json(r#"{"timer": "soon"}"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_built_options_are_checked() {
        for options in [
            Options::default().with_board_columns(0),
            Options::default().with_board_columns(MAX_COLUMNS + 1),
            Options::default().with_timer(Duration::from_millis(500)),
            Options::default().with_timer(Duration::from_secs(MAX_SECONDS + 1)),
        ] {
            assert!(matches!(options.checked(), Err(Error::Invalid(_))));
        }

        let options = Options::default()
            .with_board_columns(3)
            .with_timer(Duration::from_secs(MIN_SECONDS));
        assert_eq!(options.clone().checked(), Ok(options));
    }

    #[test]
    fn test_reveal_marks_used_once() {
        let mut session = session();
        let id = QuestionId::from("science-200");

        let reveal = session.reveal(&id, RepeatReveal::Ignore).unwrap();
        assert_eq!(reveal.question().map(QuestionRecord::id), Some(&id));
        assert!(session.is_used(&id));
        assert_eq!(session.shown(), 1);

        assert_eq!(
            session.reveal(&id, RepeatReveal::Ignore).unwrap(),
            Reveal::AlreadyUsed
        );
        assert_eq!(session.shown(), 1);
    }

    #[test]
    fn test_reshow_does_not_count_twice() {
        let mut session = session();
        let id = QuestionId::from("history-1000");
        session.reveal(&id, RepeatReveal::Reshow).unwrap();
        session.close_question();

        let again = session.reveal(&id, RepeatReveal::Reshow).unwrap();
        assert!(matches!(again, Reveal::Reshown(_)));
        assert_eq!(session.shown(), 1);
        assert_eq!(session.used().len(), 1);
        assert!(session.revealed().is_some());
    }

    #[test]
    fn test_reveal_unknown_question() {
        let mut session = session();
        let id = QuestionId::from("movies-100");
        assert_eq!(
            session.reveal(&id, RepeatReveal::Ignore),
            Err(Error::UnknownQuestion(id))
        );
        assert_eq!(session.shown(), 0);
    }

    #[test]
    fn test_show_same_question_twice() {
        let mut session = GameSession::default();
        let record = QuestionRecord::new("Q1", "Science", PointValue::Hundred, "?", "!");

        assert!(session.show(&record));
        assert!(!session.show(&record));
        assert_eq!(session.used().len(), 1);
        assert_eq!(session.shown(), 1);
    }

    #[test]
    fn test_double_points_is_display_only() {
        let mut session = session();
        session.roster_mut().add("Anna").unwrap();
        session.roster_mut().adjust("Anna", 400).unwrap();

        assert_eq!(session.tile_value(PointValue::SixHundred), 600);
        assert!(session.toggle_double_points());
        assert_eq!(session.tile_value(PointValue::SixHundred), 1200);
        assert!(!session.toggle_double_points());
        assert_eq!(session.tile_value(PointValue::SixHundred), 600);

        assert_eq!(session.roster().get("Anna").map(|p| p.points()), Some(400));
    }

    #[test]
    fn test_grid() {
        let mut session = session();
        session
            .reveal(&QuestionId::from("music-400"), RepeatReveal::Ignore)
            .unwrap();
        session.set_double_points(true);

        let Grid::Columns(columns) = session.grid() else {
            panic!("expected columns");
        };
        assert_eq!(columns.len(), 3);

        let music = columns.iter().find(|c| c.category == "Music").unwrap();
        let values = music.tiles.iter().map(|t| t.value).collect::<Vec<_>>();
        assert_eq!(values, vec![200, 400, 800, 1200, 2000]);
        assert_eq!(
            music.tiles.iter().map(|t| t.used).collect::<Vec<_>>(),
            vec![false, false, true, false, false]
        );

        assert_eq!(GameSession::default().grid(), Grid::Empty);
    }

    #[test]
    fn test_reset_keeps_players() {
        let mut session = session();
        session.roster_mut().add("Anna").unwrap();
        session.roster_mut().adjust("Anna", 200).unwrap();
        session.roster_mut().toggle_joker("Anna").unwrap();
        session
            .reveal(&QuestionId::from("science-100"), RepeatReveal::Ignore)
            .unwrap();

        let board = generate(&sample_catalog(), 2, &mut rng(Some(4)));
        session.reset(board.clone());

        assert_eq!(session.board(), &board);
        assert!(session.used().is_empty());
        assert_eq!(session.shown(), 0);
        assert!(session.revealed().is_none());
        assert_eq!(
            session.roster().players(),
            &[crate::roster::Player::new("Anna")]
        );
    }
}
