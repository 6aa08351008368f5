//! Audio playback state for the board display
//!
//! The crate does not decode or play audio. It keeps the transport state a
//! media element needs (source, position, play/pause) and answers the
//! operator's transport buttons; the embedder mirrors it onto a real player
//! and reports time updates back.

use std::time::Duration;

use serde::Serialize;
use serde_with::{DurationSecondsWithFrac, serde_as, skip_serializing_none};

use crate::constants::audio::{
    FADE_STEPS, INTRO_FADE_DELAY_MS, INTRO_FADE_MS, INTRO_JINGLE, SKIP_SECONDS,
};

/// Transport state of the revealed question's sound
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioTransport {
    source: Option<String>,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    position: Duration,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    duration: Option<Duration>,
    playing: bool,
}

impl AudioTransport {
    const SKIP: Duration = Duration::from_secs(SKIP_SECONDS);

    /// Loads a new source, or clears it, rewinding and pausing
    pub fn load(&mut self, source: Option<&str>) {
        *self = Self {
            source: source.map(ToOwned::to_owned),
            ..Self::default()
        };
    }

    /// The loaded media, if any
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Current playback position
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Length of the media, once the player has reported it
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Whether the media is playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Flips between playing and paused, returning the new playing flag
    pub fn toggle_play(&mut self) -> bool {
        if self.source.is_some() {
            self.playing = !self.playing;
        }
        self.playing
    }

    /// Pauses without moving the position
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Jumps back to the beginning and toggles playback
    pub fn restart(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.position = Duration::ZERO;
        self.toggle_play();
    }

    /// Moves to `position`, clamped to the media length when known
    pub fn seek(&mut self, position: Duration) {
        if self.source.is_none() {
            return;
        }
        self.position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
    }

    /// Skips back five seconds, stopping at the beginning
    pub fn rewind(&mut self) {
        self.seek(self.position.saturating_sub(Self::SKIP));
    }

    /// Skips ahead five seconds, stopping at the end
    pub fn forward(&mut self) {
        self.seek(self.position.saturating_add(Self::SKIP));
    }

    /// Records the position reported by the player
    pub fn time_update(&mut self, position: Duration) {
        self.seek(position);
    }

    /// Records the media length once its metadata has loaded
    pub fn set_duration(&mut self, duration: Duration) {
        if self.source.is_none() {
            return;
        }
        self.duration = Some(duration);
        self.position = self.position.min(duration);
    }

    /// The player reached the end of the media
    pub fn ended(&mut self) {
        self.playing = false;
    }

    /// Pauses and rewinds, keeping the source loaded
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = Duration::ZERO;
    }
}

/// One volume change of a fade-out
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadeStep {
    /// Offset from the start of the fade
    pub at: Duration,
    /// Volume to apply, between 0 and 1
    pub volume: f32,
}

/// A linear fade to silence in equal steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeOut {
    duration: Duration,
    steps: u32,
}

impl FadeOut {
    /// Creates a fade lasting `duration` split into `steps` volume changes
    pub fn new(duration: Duration, steps: u32) -> Self {
        Self {
            duration,
            steps: steps.max(1),
        }
    }

    /// How long the fade lasts
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The volume changes, ending at silence when the fade completes
    pub fn steps(&self) -> Vec<FadeStep> {
        (1..=self.steps)
            .map(|i| FadeStep {
                at: self.duration * i / self.steps,
                volume: 1.0 - i as f32 / self.steps as f32,
            })
            .collect()
    }
}

/// The jingle played when the board display opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroJingle {
    /// Media to play
    pub source: String,
    /// How long it plays at full volume
    pub fade_delay: Duration,
    /// How it fades out afterwards
    pub fade: FadeOut,
}

impl Default for IntroJingle {
    fn default() -> Self {
        Self {
            source: INTRO_JINGLE.to_owned(),
            fade_delay: Duration::from_millis(INTRO_FADE_DELAY_MS),
            fade: FadeOut::new(Duration::from_millis(INTRO_FADE_MS), FADE_STEPS),
        }
    }
}

impl IntroJingle {
    /// Volume changes measured from the moment playback starts
    pub fn schedule(&self) -> Vec<FadeStep> {
        self.fade
            .steps()
            .into_iter()
            .map(|step| FadeStep {
                at: self.fade_delay + step.at,
                ..step
            })
            .collect()
    }

    /// When playback should be paused and rewound
    pub fn stop_at(&self) -> Duration {
        self.fade_delay + self.fade.duration()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn loaded() -> AudioTransport {
        let mut audio = AudioTransport::default();
        audio.load(Some("sounds/q1.mp3"));
        audio.set_duration(Duration::from_secs(20));
        audio
    }

    #[test]
    fn test_controls_without_source_do_nothing() {
        let mut audio = AudioTransport::default();
        assert!(!audio.toggle_play());
        audio.forward();
        audio.restart();
        audio.set_duration(Duration::from_secs(3));
        assert_eq!(audio, AudioTransport::default());
    }

    #[test]
    fn test_skip_is_clamped() {
        let mut audio = loaded();
        audio.rewind();
        assert_eq!(audio.position(), Duration::ZERO);

        audio.seek(Duration::from_secs(17));
        audio.forward();
        assert_eq!(audio.position(), Duration::from_secs(20));

        audio.rewind();
        assert_eq!(audio.position(), Duration::from_secs(15));
    }

    #[test]
    fn test_seek_before_metadata() {
        let mut audio = AudioTransport::default();
        audio.load(Some("sounds/q1.mp3"));
        audio.seek(Duration::from_secs(50));
        assert_eq!(audio.position(), Duration::from_secs(50));

        audio.set_duration(Duration::from_secs(30));
        assert_eq!(audio.position(), Duration::from_secs(30));
    }

    #[test]
    fn test_restart_and_ended() {
        let mut audio = loaded();
        audio.toggle_play();
        audio.time_update(Duration::from_secs(8));

        audio.restart();
        assert_eq!(audio.position(), Duration::ZERO);
        assert!(!audio.is_playing());

        audio.restart();
        assert!(audio.is_playing());

        audio.ended();
        assert!(!audio.is_playing());
    }

    #[test]
    fn test_stop_keeps_source() {
        let mut audio = loaded();
        audio.toggle_play();
        audio.seek(Duration::from_secs(4));
        audio.stop();

        assert_eq!(audio.source(), Some("sounds/q1.mp3"));
        assert_eq!(audio.position(), Duration::ZERO);
        assert!(!audio.is_playing());
    }

    #[test]
    fn test_load_resets_transport() {
        let mut audio = loaded();
        audio.toggle_play();
        audio.load(None);
        assert_eq!(audio, AudioTransport::default());
    }

    #[test]
    fn test_fade_steps() {
        let fade = FadeOut::new(Duration::from_secs(10), 4);
        let steps = fade.steps();

        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].at, Duration::from_millis(2500));
        assert!((steps[0].volume - 0.75).abs() < f32::EPSILON);
        assert_eq!(steps[3].at, Duration::from_secs(10));
        assert!(steps[3].volume.abs() < f32::EPSILON);
    }

    #[test]
    fn test_intro_jingle_schedule() {
        let jingle = IntroJingle::default();
        let schedule = jingle.schedule();

        assert_eq!(jingle.source, "sounds/brainybounce.mp3");
        assert_eq!(schedule.len(), 20);
        assert_eq!(schedule[0].at, Duration::from_millis(16_550));
        assert_eq!(schedule[19].at, Duration::from_secs(27));
        assert_eq!(jingle.stop_at(), Duration::from_secs(27));
        assert!(schedule.windows(2).all(|w| w[0].volume > w[1].volume));
    }
}
