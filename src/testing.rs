//! Shared fixtures for unit tests

use std::{cell::RefCell, rc::Rc};

use crate::{
    buzzer::{BuzzerLink, LinkError},
    catalog::{Catalog, PointValue, QuestionRecord},
    channel::{Channel, Message, Subscription},
};

/// Five questions covering the whole ladder for one category
pub fn full_category(category: &str, prefix: &str) -> Vec<QuestionRecord> {
    PointValue::LADDER
        .into_iter()
        .map(|value| {
            QuestionRecord::new(
                format!("{prefix}-{}", value.points()),
                category,
                value,
                format!("{category} for {}", value.points()),
                format!("Answer {}", value.points()),
            )
        })
        .collect()
}

/// Three complete categories and one ("Movies") missing its 600 question
pub fn sample_catalog() -> Catalog {
    let mut records = full_category("Science", "science");
    records.extend(full_category("History", "history"));
    records.extend(
        full_category("Movies", "movies")
            .into_iter()
            .filter(|q| q.points() != PointValue::SixHundred),
    );
    records.extend(full_category("Music", "music"));
    Catalog::from_records(records).catalog
}

/// `eligible` complete categories plus one incomplete category
pub fn wide_catalog(eligible: usize) -> Catalog {
    let mut records = (0..eligible)
        .flat_map(|i| full_category(&format!("Category {i}"), &format!("c{i}")))
        .collect::<Vec<_>>();
    records.extend(full_category("Broken", "broken").into_iter().skip(1));
    Catalog::from_records(records).catalog
}

/// Records every message published on a channel
pub fn record(channel: &impl Channel) -> (Rc<RefCell<Vec<Message>>>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let subscription = channel.subscribe(Box::new(move |message: &Message| {
        sink.borrow_mut().push(message.clone());
    }));
    (log, subscription)
}

/// A buzzer link that records what it was asked to send
#[derive(Default, Clone)]
pub struct FakeLink {
    pub open: bool,
    pub fail: bool,
    pub sent: Rc<RefCell<Vec<String>>>,
}

impl FakeLink {
    pub fn open() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }
}

impl BuzzerLink for FakeLink {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send_text(&self, text: &str) -> Result<(), LinkError> {
        if self.fail {
            return Err(LinkError("socket closed mid-send".to_owned()));
        }
        self.sent.borrow_mut().push(text.to_owned());
        Ok(())
    }
}
