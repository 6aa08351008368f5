//! Start screen and surface selection
//!
//! Every window opens on the start screen and picks one surface for the
//! rest of its life: the board display or the admin panel. All windows of
//! one process share a [`Bus`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    admin::{self, AdminPanel},
    audio::IntroJingle,
    buzzer::BuzzerLink,
    catalog::Catalog,
    channel::{Bus, Endpoint, Mounted},
    display::BoardDisplay,
    game::{self, Options},
};

/// Errors raised while choosing a surface
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The window already shows a surface
    #[error("a surface was already chosen")]
    AlreadyChosen,
    /// The board display could not open
    #[error(transparent)]
    Display(#[from] game::Error),
    /// The admin panel could not open
    #[error(transparent)]
    Admin(#[from] admin::Error),
}

/// Which surface a window shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Choosing a surface
    #[default]
    Start,
    /// The audience view
    Board,
    /// The operator view
    Admin,
}

/// One window of the game
#[derive(Debug)]
pub struct App {
    catalog: Rc<Catalog>,
    options: Options,
    bus: Bus,
    page: Page,
}

impl App {
    /// Opens a window on the start screen
    pub fn new(catalog: Rc<Catalog>, options: Options, bus: Bus) -> Self {
        Self {
            catalog,
            options,
            bus,
            page: Page::Start,
        }
    }

    /// The surface currently shown
    pub fn page(&self) -> Page {
        self.page
    }

    /// Switches to the board display
    ///
    /// Returns the mounted display and the jingle to play.
    ///
    /// # Errors
    ///
    /// * `Error::AlreadyChosen` - a surface was already chosen
    /// * `Error::Display` - the options are out of bounds; the window stays
    ///   on the start screen
    pub fn open_board(&mut self) -> Result<(Mounted<BoardDisplay>, IntroJingle), Error> {
        if self.page != Page::Start {
            return Err(Error::AlreadyChosen);
        }
        let display = BoardDisplay::new(Rc::clone(&self.catalog), self.options.clone())?;
        self.page = Page::Board;
        info!("board display opened");

        Ok((
            Mounted::new(display, &self.bus.endpoint()),
            IntroJingle::default(),
        ))
    }

    /// Switches to the admin panel, talking to the buzzer over `link`
    ///
    /// # Errors
    ///
    /// * `Error::AlreadyChosen` - a surface was already chosen
    /// * `Error::Admin` - the options are out of bounds; the window stays
    ///   on the start screen
    pub fn open_admin<L: BuzzerLink + 'static>(
        &mut self,
        link: L,
    ) -> Result<Mounted<AdminPanel<Endpoint, L>>, Error> {
        if self.page != Page::Start {
            return Err(Error::AlreadyChosen);
        }

        let endpoint = self.bus.endpoint();
        let admin = AdminPanel::new(
            Rc::clone(&self.catalog),
            self.options.clone(),
            endpoint.clone(),
            link,
        )?;
        self.page = Page::Admin;
        Ok(Mounted::new(admin, &endpoint))
    }
}
