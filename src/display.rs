//! The board display
//!
//! The display is a read-only replica of the admin's [`GameSession`] fed by
//! channel messages, plus presentation state that never leaves it: the
//! question countdown and the audio transport of the revealed question.

use std::{rc::Rc, time::Duration};

use tracing::{debug, info};

use crate::{
    audio::AudioTransport,
    board,
    catalog::{Catalog, QuestionRecord},
    channel::{Message, Receiver},
    game::{self, ExpiryAction, GameSession, Grid, Options},
    timer::{Tick, Timer},
};

/// Called once when the countdown reaches zero, with the question on screen
pub type ExpiryHandler = Box<dyn FnMut(Option<&QuestionRecord>)>;

/// What the audience sees
pub struct BoardDisplay {
    catalog: Rc<Catalog>,
    options: Options,
    rng: fastrand::Rng,
    session: GameSession,
    timer: Timer,
    audio: AudioTransport,
    on_expire: Option<ExpiryHandler>,
}

impl std::fmt::Debug for BoardDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardDisplay")
            .field("session", &self.session)
            .field("timer", &self.timer)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

impl BoardDisplay {
    /// Opens the display on a board of its own
    ///
    /// The board is replaced as soon as the admin panel publishes one.
    ///
    /// # Errors
    ///
    /// Returns `game::Error::Invalid` if an option is out of bounds.
    pub fn new(catalog: Rc<Catalog>, options: Options) -> Result<Self, game::Error> {
        let options = options.checked()?;
        let mut rng = board::rng(options.seed());
        let board = board::generate(&catalog, options.board_columns(), &mut rng);
        let timer = Timer::new(options.timer());

        Ok(Self {
            catalog,
            options,
            rng,
            session: GameSession::new(board),
            timer,
            audio: AudioTransport::default(),
            on_expire: None,
        })
    }

    /// Registers the countdown completion callback
    pub fn set_on_expire(&mut self, handler: impl FnMut(Option<&QuestionRecord>) + 'static) {
        self.on_expire = Some(Box::new(handler));
    }

    /// The replicated game state
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// The question countdown
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Transport state of the revealed question's sound
    pub fn audio(&self) -> &AudioTransport {
        &self.audio
    }

    /// Transport controls for the revealed question's sound
    pub fn audio_mut(&mut self) -> &mut AudioTransport {
        &mut self.audio
    }

    /// The tiles to draw
    pub fn grid(&self) -> Grid {
        self.session.grid()
    }

    /// Takes the question off screen, stopping its countdown and sound
    pub fn close_question(&mut self) {
        self.session.close_question();
        self.timer.reset();
        self.audio.load(None);
    }

    /// Counts the countdown down by one second
    pub fn tick(&mut self) -> Tick {
        let tick = self.timer.tick();
        if tick == Tick::Expired {
            self.expire();
        }
        tick
    }

    /// Feeds elapsed time to the countdown
    ///
    /// Returns `true` if the countdown expired during this call.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let expired = self.timer.advance(elapsed);
        if expired {
            self.expire();
        }
        expired
    }

    fn expire(&mut self) {
        info!(
            question = ?self.session.revealed().map(QuestionRecord::id),
            "countdown expired"
        );
        if let Some(handler) = self.on_expire.as_mut() {
            handler(self.session.revealed());
        }
        match self.options.on_timer_expired() {
            ExpiryAction::Freeze => {}
            ExpiryAction::CloseQuestion => self.close_question(),
        }
    }

    fn show(&mut self, record: &QuestionRecord) {
        self.session.show(record);
        self.audio.load(record.sound());
        if self.timer.restart() == Tick::Expired {
            self.expire();
        }
    }
}

impl Receiver for BoardDisplay {
    fn receive(&mut self, message: &Message) {
        debug!(?message, "display received");
        match message {
            Message::SetPlayers(roster) => self.session.replace_roster(roster.clone()),
            Message::ShowQuestion(record) => self.show(record),
            Message::StartTimer => {
                if self.timer.start() == Some(Tick::Expired) {
                    self.expire();
                }
            }
            Message::ToggleDoublePoints(on) => self.session.set_double_points(*on),
            Message::ResetGame => {
                let board =
                    board::generate(&self.catalog, self.options.board_columns(), &mut self.rng);
                self.session.replace_board(board);
                self.close_question();
            }
            Message::ResetPlayerPoints => self.session.reset_scores(),
            Message::ResetQuestionCount => {
                self.session.clear_used();
                self.close_question();
            }
            Message::NewBoardData(board) => {
                self.session.replace_board(board.clone());
                self.close_question();
            }
        }
    }
}
