//! Configuration constants for the quiz board
//!
//! This module contains the fixed limits and defaults used throughout the
//! crate so that the catalog, board, roster and timers agree on a single
//! set of boundaries.

/// Board layout constants
pub mod board {
    /// Point values every eligible category must cover, in display order
    pub const LADDER: [u32; 5] = [100, 200, 400, 600, 1000];
    /// Maximum number of category columns shown on the board
    pub const MAX_COLUMNS: usize = 7;
    /// Multiplier applied to displayed tile values while double points is on
    pub const DOUBLE_POINTS_FACTOR: u32 = 2;
}

/// Question catalog constants
pub mod catalog {
    /// Maximum length of a category name in characters
    pub const MAX_CATEGORY_LENGTH: usize = 100;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 1000;
    /// Maximum length of an answer text in characters
    pub const MAX_ANSWER_LENGTH: usize = 500;
    /// Maximum length of an image or sound reference
    pub const MAX_MEDIA_LENGTH: usize = 500;
}

/// Player roster constants
pub mod roster {
    /// Maximum length of a player name in bytes
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Countdown timer constants
pub mod timer {
    /// Default countdown length in seconds
    pub const DEFAULT_SECONDS: u64 = 30;
    /// Minimum configurable countdown length in seconds
    pub const MIN_SECONDS: u64 = 5;
    /// Maximum configurable countdown length in seconds
    pub const MAX_SECONDS: u64 = 240;
}

/// Audio transport constants
pub mod audio {
    /// Distance covered by a single rewind or forward skip, in seconds
    pub const SKIP_SECONDS: u64 = 5;
    /// Source of the jingle played when the board display opens
    pub const INTRO_JINGLE: &str = "sounds/brainybounce.mp3";
    /// Delay before the intro jingle starts fading, in milliseconds
    pub const INTRO_FADE_DELAY_MS: u64 = 16_000;
    /// Length of the intro jingle fade, in milliseconds
    pub const INTRO_FADE_MS: u64 = 11_000;
    /// Number of volume steps in a fade
    pub const FADE_STEPS: u32 = 20;
}

/// Cross-surface channel constants
pub mod channel {
    /// Name shared by every surface joining the game's broadcast channel
    pub const NAME: &str = "jeopardy";
}

/// Buzzer service constants
pub mod buzzer {
    /// Command sent to the buzzer service to re-arm the buzzers
    pub const UNLOCK_COMMAND: &str = "UNLOCK_BUZZER";
    /// Default address of the buzzer service
    pub const DEFAULT_URL: &str = "ws://localhost:8000";
    /// Maximum length of a configured buzzer service address
    pub const MAX_URL_LENGTH: usize = 200;
}
