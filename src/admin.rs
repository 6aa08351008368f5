//! The admin control panel
//!
//! The admin panel owns the authoritative [`GameSession`]. Every operator
//! action mutates it locally first and then publishes the resulting
//! snapshot on the channel so the board display (and any other admin
//! instance) can follow along.

use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    board,
    buzzer::{self, BuzzerLink, BuzzerStatus},
    catalog::{Catalog, QuestionId},
    channel::{Channel, Message, Receiver},
    game::{self, GameSession, Options, Reveal},
    roster::{self, DeltaError, Direction, Player, PointDelta},
};

/// Errors surfaced to the operator
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// A roster edit was refused
    #[error(transparent)]
    Roster(#[from] roster::Error),
    /// The typed point value could not be read
    #[error(transparent)]
    Delta(#[from] DeltaError),
    /// A session transition was refused
    #[error(transparent)]
    Game(#[from] game::Error),
}

/// The operator's view of the game
pub struct AdminPanel<C: Channel, L: BuzzerLink> {
    channel: C,
    link: L,
    catalog: Rc<Catalog>,
    options: Options,
    rng: fastrand::Rng,
    session: GameSession,
    buzzer: BuzzerStatus,
}

impl<C: Channel, L: BuzzerLink> std::fmt::Debug for AdminPanel<C, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminPanel")
            .field("session", &self.session)
            .field("buzzer", &self.buzzer)
            .finish_non_exhaustive()
    }
}

impl<C: Channel, L: BuzzerLink> AdminPanel<C, L> {
    /// Opens the panel on a freshly generated board
    ///
    /// Nothing is published; call [`AdminPanel::publish_state`] to bring
    /// an already open board display in line.
    ///
    /// # Errors
    ///
    /// Returns `Error::Game` if an option is out of bounds.
    pub fn new(
        catalog: Rc<Catalog>,
        options: Options,
        channel: C,
        link: L,
    ) -> Result<Self, Error> {
        let options = options.checked()?;
        let mut rng = board::rng(options.seed());
        let board = board::generate(&catalog, options.board_columns(), &mut rng);
        info!(columns = board.len(), "admin panel opened");

        Ok(Self {
            channel,
            link,
            catalog,
            options,
            rng,
            session: GameSession::new(board),
            buzzer: BuzzerStatus::default(),
        })
    }

    /// The authoritative game state
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// The options the panel was opened with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Outcome of the last buzzer unlock
    pub fn buzzer_status(&self) -> &BuzzerStatus {
        &self.buzzer
    }

    fn publish(&self, message: &Message) {
        self.channel.publish(message);
    }

    fn publish_players(&self) {
        self.publish(&Message::SetPlayers(self.session.roster().clone()));
    }

    /// Adds a player locally; use [`AdminPanel::send_players`] to announce
    ///
    /// # Errors
    ///
    /// Returns the roster's refusal for blank, overlong or duplicate names.
    pub fn add_player(&mut self, name: &str) -> Result<&Player, Error> {
        let player = self.session.roster_mut().add(name)?;
        info!(name = player.name(), "player added");
        Ok(player)
    }

    /// Removes a player locally, returning them if they were present
    pub fn remove_player(&mut self, name: &str) -> Option<Player> {
        let removed = self.session.roster_mut().remove(name);
        if removed.is_some() {
            info!(name, "player removed");
        }
        removed
    }

    /// Publishes the current roster
    pub fn send_players(&self) {
        self.publish_players();
    }

    /// Adjusts a player's score by an amount typed by the operator
    ///
    /// # Errors
    ///
    /// * `Error::Delta` - the input is not a whole number; nothing changes
    /// * `Error::Roster` - no player has this name
    pub fn adjust_points(
        &mut self,
        name: &str,
        input: &str,
        direction: Direction,
    ) -> Result<i64, Error> {
        let PointDelta(amount) = input.parse::<PointDelta>()?;
        self.apply_delta(name, direction.apply(amount))
    }

    /// Adds a signed delta to a player's score and publishes the roster
    ///
    /// # Errors
    ///
    /// Returns `Error::Roster` if no player has this name.
    pub fn apply_delta(&mut self, name: &str, delta: i64) -> Result<i64, Error> {
        let points = self.session.roster_mut().adjust(name, delta)?;
        info!(name, delta, points, "points adjusted");
        self.publish_players();
        Ok(points)
    }

    /// Flips a player's joker and publishes the roster
    ///
    /// # Errors
    ///
    /// Returns `Error::Roster` if no player has this name.
    pub fn toggle_joker(&mut self, name: &str) -> Result<bool, Error> {
        let joker = self.session.roster_mut().toggle_joker(name)?;
        self.publish_players();
        Ok(joker)
    }

    /// Flips double points and publishes the new flag
    pub fn toggle_double_points(&mut self) -> bool {
        let on = self.session.toggle_double_points();
        info!(on, "double points toggled");
        self.publish(&Message::ToggleDoublePoints(on));
        on
    }

    /// Reveals a question on the board display and starts its countdown
    ///
    /// An already used question is refused or shown again depending on the
    /// configured policy; a refusal publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Game` if the question is not on the board.
    pub fn reveal(&mut self, id: &QuestionId) -> Result<Reveal, Error> {
        let reveal = self.session.reveal(id, self.options.repeat_reveal())?;
        if let Some(question) = reveal.question() {
            info!(%id, shown = self.session.shown(), "question revealed");
            self.publish(&Message::ShowQuestion(question.clone()));
            self.publish(&Message::StartTimer);
        } else {
            info!(%id, "question already used");
        }
        Ok(reveal)
    }

    /// Starts over on a new board with every score zeroed
    pub fn reset(&mut self) {
        let board = board::generate(&self.catalog, self.options.board_columns(), &mut self.rng);
        self.session.reset(board);
        info!(columns = self.session.board().len(), "game reset");

        self.publish(&Message::ResetGame);
        self.publish(&Message::ResetPlayerPoints);
        self.publish(&Message::ResetQuestionCount);
        self.publish(&Message::NewBoardData(self.session.board().clone()));
        self.publish_players();
    }

    /// Publishes the board, roster and double points flag
    ///
    /// A display opened after the admin panel has no way to learn these
    /// otherwise.
    pub fn publish_state(&self) {
        self.publish(&Message::NewBoardData(self.session.board().clone()));
        self.publish_players();
        self.publish(&Message::ToggleDoublePoints(self.session.double_points()));
    }

    /// Asks the buzzer service to re-arm the buzzers
    pub fn unlock_buzzer(&mut self) -> &BuzzerStatus {
        self.buzzer = buzzer::unlock(&self.link);
        &self.buzzer
    }
}

impl<C: Channel, L: BuzzerLink> Receiver for AdminPanel<C, L> {
    /// Follows another admin instance
    fn receive(&mut self, message: &Message) {
        debug!(?message, "admin received");
        match message {
            Message::ResetQuestionCount => self.session.clear_used(),
            Message::ToggleDoublePoints(on) => self.session.set_double_points(*on),
            Message::ResetPlayerPoints => self.session.reset_scores(),
            Message::NewBoardData(board) => self.session.replace_board(board.clone()),
            Message::SetPlayers(roster) => self.session.replace_roster(roster.clone()),
            Message::ShowQuestion(_) | Message::StartTimer | Message::ResetGame => {}
        }
    }
}
