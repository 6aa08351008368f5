//! Cross-surface synchronization channel
//!
//! Surfaces never share memory; they exchange full snapshots of the game
//! state over a named publish/subscribe channel. This module defines the
//! message envelope, the [`Channel`] seam the surfaces are written
//! against, and [`Bus`], an in-process implementation with broadcast
//! channel semantics:
//!
//! * a publisher never receives its own messages,
//! * subscribers that join late see nothing that was published before,
//! * messages published from inside a handler are queued and delivered
//!   after the current one, in publish order.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::VecDeque,
    rc::{Rc, Weak},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::{board::Board, catalog::QuestionRecord, constants, roster::Roster};

/// Messages exchanged between the admin panel and the board display
///
/// Serialized as `{"type": "...", "payload": ...}`; variants without a
/// payload omit the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Replace the roster
    SetPlayers(Roster),
    /// Reveal a question, mark it used and start the countdown
    ShowQuestion(QuestionRecord),
    /// Start the countdown for the revealed question
    StartTimer,
    /// Replace the double points flag
    ToggleDoublePoints(bool),
    /// Regenerate the board and clear all question state
    ResetGame,
    /// Zero every score and hand every joker back
    ResetPlayerPoints,
    /// Clear the used question set and the shown count
    ResetQuestionCount,
    /// Replace the board and clear the used question set
    NewBoardData(Board),
}

impl Message {
    /// Converts the message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }

    /// Parses a message received as JSON
    ///
    /// # Errors
    ///
    /// Returns the serializer error for unknown message types or payloads
    /// that break the board or record invariants.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A message handler registered on a channel
pub type Handler = Box<dyn FnMut(&Message)>;

/// Publish/subscribe access to the game's channel
///
/// Surfaces take a `Channel` instead of reaching for a global so tests can
/// wire them to an in-memory [`Bus`].
pub trait Channel {
    /// Sends a message to every other subscriber
    fn publish(&self, message: &Message);

    /// Registers a handler until the returned guard is dropped
    fn subscribe(&self, handler: Handler) -> Subscription;
}

/// Keeps a handler registered for as long as it is alive
#[must_use = "dropping a subscription unsubscribes its handler"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a guard that runs `cancel` when released
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the handler immediately
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Identifies one participant of the bus
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct EndpointId(Uuid);

impl EndpointId {
    /// Creates a new random endpoint ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    key: u64,
    endpoint: EndpointId,
    handler: Rc<RefCell<Handler>>,
}

#[derive(Default)]
struct BusState {
    subscribers: Vec<Subscriber>,
    queue: VecDeque<(EndpointId, Message)>,
    delivering: bool,
    next_key: u64,
}

impl BusState {
    fn is_subscribed(&self, key: u64) -> bool {
        self.subscribers.iter().any(|s| s.key == key)
    }
}

/// Marks a delivery loop in progress; the bus accepts a new loop once
/// this is dropped, also when a handler panics
struct Delivering<'a>(&'a Bus);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.state.try_borrow_mut() {
            state.delivering = false;
            if std::thread::panicking() {
                state.queue.clear();
            }
        }
    }
}

/// An in-process broadcast bus
///
/// Cloning a `Bus` yields another handle to the same bus. Each participant
/// talks to it through its own [`Endpoint`].
#[derive(Clone)]
pub struct Bus {
    name: Rc<str>,
    state: Rc<RefCell<BusState>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl Bus {
    /// Creates the game's bus under its well-known name
    pub fn new() -> Self {
        Self::named(constants::channel::NAME)
    }

    /// Creates a bus under a custom name
    pub fn named(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            state: Rc::default(),
        }
    }

    /// The name every participant joined
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens a new participant on this bus
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            id: EndpointId::new(),
            bus: self.clone(),
        }
    }

    /// Returns the number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    fn enqueue(&self, from: EndpointId, message: &Message) {
        {
            let mut state = self.state.borrow_mut();
            state.queue.push_back((from, message.clone()));
            if state.delivering {
                return;
            }
            state.delivering = true;
        }
        let _delivering = Delivering(self);

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                match state.queue.pop_front() {
                    Some((from, message)) => {
                        let targets = state
                            .subscribers
                            .iter()
                            .filter(|s| s.endpoint != from)
                            .map(|s| (s.key, Rc::clone(&s.handler)))
                            .collect_vec();
                        Some((message, targets))
                    }
                    None => None,
                }
            };

            let Some((message, targets)) = next else {
                break;
            };

            trace!(bus = %self.name, receivers = targets.len(), ?message, "delivering");

            for (key, handler) in targets {
                if !self.state.borrow().is_subscribed(key) {
                    continue;
                }
                (&mut *handler.borrow_mut())(&message);
            }
        }
    }

    fn register(&self, endpoint: EndpointId, handler: Handler) -> Subscription {
        let key = {
            let mut state = self.state.borrow_mut();
            let key = state.next_key;
            state.next_key += 1;
            state.subscribers.push(Subscriber {
                key,
                endpoint,
                handler: Rc::new(RefCell::new(handler)),
            });
            key
        };

        let state: Weak<RefCell<BusState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().subscribers.retain(|s| s.key != key);
            }
        })
    }
}

/// One participant's handle on a [`Bus`]
///
/// Clones share the same identity, so a surface may keep one clone for
/// publishing and subscribe with another without hearing its own messages.
#[derive(Clone, Debug)]
pub struct Endpoint {
    id: EndpointId,
    bus: Bus,
}

impl Endpoint {
    /// This participant's identity
    pub fn id(&self) -> EndpointId {
        self.id
    }
}

impl Channel for Endpoint {
    fn publish(&self, message: &Message) {
        self.bus.enqueue(self.id, message);
    }

    fn subscribe(&self, handler: Handler) -> Subscription {
        self.bus.register(self.id, handler)
    }
}

/// A surface that reacts to channel messages
pub trait Receiver {
    /// Applies a message published by another participant
    fn receive(&mut self, message: &Message);
}

/// A surface subscribed to a channel for as long as it stays mounted
///
/// Dropping the `Mounted` value unsubscribes the surface.
pub struct Mounted<S> {
    surface: Rc<RefCell<S>>,
    _subscription: Subscription,
}

impl<S: Receiver + 'static> Mounted<S> {
    /// Subscribes `surface` to `channel`
    pub fn new<C: Channel + ?Sized>(surface: S, channel: &C) -> Self {
        let surface = Rc::new(RefCell::new(surface));
        let weak = Rc::downgrade(&surface);

        let subscription = channel.subscribe(Box::new(move |message: &Message| {
            let Some(surface) = weak.upgrade() else {
                return;
            };
            match surface.try_borrow_mut() {
                Ok(mut surface) => surface.receive(message),
                Err(_) => warn!(?message, "surface busy, message dropped"),
            }
        }));

        Self {
            surface,
            _subscription: subscription,
        }
    }
}

impl<S> Mounted<S> {
    /// Immutably borrows the surface
    ///
    /// # Panics
    ///
    /// Panics if the surface is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    /// Mutably borrows the surface
    ///
    /// # Panics
    ///
    /// Panics if the surface is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Mounted<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mounted")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        catalog::{PointValue, QuestionRecord},
        roster::Player,
        testing::record,
    };

    fn question() -> QuestionRecord {
        QuestionRecord::new("Q1", "Science", PointValue::Hundred, "What?", "That")
    }

    #[test]
    fn test_message_envelope_with_payload() {
        let json = Message::ToggleDoublePoints(true).to_json();
        assert_eq!(json, r#"{"type":"TOGGLE_DOUBLE_POINTS","payload":true}"#);

        let json = Message::SetPlayers(Roster::from(vec![Player::new("Anna")])).to_json();
        assert_eq!(
            json,
            r#"{"type":"SET_PLAYERS","payload":[{"name":"Anna","points":0,"joker":true}]}"#
        );
    }

    #[test]
    fn test_message_envelope_without_payload() {
        assert_eq!(Message::StartTimer.to_json(), r#"{"type":"START_TIMER"}"#);
        assert_eq!(
            Message::from_json(r#"{"type":"RESET_GAME"}"#).unwrap(),
            Message::ResetGame
        );
    }

    #[test]
    fn test_message_from_json() {
        let message = Message::from_json(
            r#"{"type":"SHOW_QUESTION","payload":{"id":"Q1","category":"Science","points":100,"question":"What?","answer":"That"}}"#,
        )
        .unwrap();
        assert_eq!(message, Message::ShowQuestion(question()));

        assert!(Message::from_json(r#"{"type":"SELF_DESTRUCT"}"#).is_err());
    }

    #[test]
    fn test_publisher_does_not_hear_itself() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let board = bus.endpoint();

        let (admin_log, _admin_sub) = record(&admin);
        let (board_log, _board_sub) = record(&board);

        admin.publish(&Message::StartTimer);

        assert!(admin_log.borrow().is_empty());
        assert_eq!(*board_log.borrow(), vec![Message::StartTimer]);
    }

    #[test]
    fn test_clones_share_identity() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let (log, _sub) = record(&admin.clone());

        admin.publish(&Message::ResetGame);

        assert!(log.borrow().is_empty());
        assert_eq!(admin.clone().id(), admin.id());
    }

    #[test]
    fn test_every_other_endpoint_receives() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let (first, _a) = record(&bus.endpoint());
        let (second, _b) = record(&bus.endpoint());

        admin.publish(&Message::ResetPlayerPoints);

        assert_eq!(first.borrow().len(), 1);
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        admin.publish(&Message::ResetGame);

        let (log, _sub) = record(&bus.endpoint());
        assert!(log.borrow().is_empty());

        admin.publish(&Message::StartTimer);
        assert_eq!(*log.borrow(), vec![Message::StartTimer]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let (log, sub) = record(&bus.endpoint());
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        admin.publish(&Message::ResetGame);

        assert_eq!(bus.subscriber_count(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let bus = Bus::new();
        let (_log, sub) = record(&bus.endpoint());
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_from_handler_is_queued_in_order() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let relay = bus.endpoint();
        let (log, _sub) = record(&bus.endpoint());

        let relay_out = relay.clone();
        let _relay_sub = relay.subscribe(Box::new(move |message: &Message| {
            if *message == Message::ResetGame {
                relay_out.publish(&Message::ResetQuestionCount);
            }
        }));

        admin.publish(&Message::ResetGame);
        admin.publish(&Message::StartTimer);

        assert_eq!(
            *log.borrow(),
            vec![
                Message::ResetGame,
                Message::ResetQuestionCount,
                Message::StartTimer
            ]
        );
    }

    #[test]
    fn test_delivery_survives_panicking_handler() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let _faulty = bus.endpoint().subscribe(Box::new(|message: &Message| {
            assert_ne!(message, &Message::ResetGame, "handler failed");
        }));
        let (log, _sub) = record(&bus.endpoint());

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            admin.publish(&Message::ResetGame);
        }));
        assert!(outcome.is_err());

        admin.publish(&Message::StartTimer);
        assert_eq!(*log.borrow(), vec![Message::StartTimer]);
    }

    #[test]
    fn test_bus_name() {
        assert_eq!(Bus::new().name(), "jeopardy");
        assert_eq!(Bus::named("other").name(), "other");
    }

    struct Counter(usize);

    impl Receiver for Counter {
        fn receive(&mut self, _message: &Message) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_mounted_surface_receives_until_dropped() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let mounted = Mounted::new(Counter(0), &bus.endpoint());

        admin.publish(&Message::StartTimer);
        assert_eq!(mounted.borrow().0, 1);

        drop(mounted);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_busy_surface_drops_message() {
        let bus = Bus::new();
        let admin = bus.endpoint();
        let mounted = Mounted::new(Counter(0), &bus.endpoint());

        {
            let _held = mounted.borrow_mut();
            admin.publish(&Message::StartTimer);
        }

        assert_eq!(mounted.borrow().0, 0);
    }
}
