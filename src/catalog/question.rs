//! Question records and their point ladder
//!
//! A question record is the immutable unit of the catalog. Records are
//! validated at the boundary with `garde` so that everything reaching the
//! board generator is known to be well formed.

use enum_map::Enum;
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::constants::catalog::{
    MAX_ANSWER_LENGTH, MAX_CATEGORY_LENGTH, MAX_MEDIA_LENGTH, MAX_QUESTION_LENGTH,
};

/// One rung of the fixed point ladder
///
/// Declaration order is ladder order, so sorting by `PointValue` sorts a
/// column from the cheapest to the most expensive question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum PointValue {
    /// 100 points
    Hundred,
    /// 200 points
    TwoHundred,
    /// 400 points
    FourHundred,
    /// 600 points
    SixHundred,
    /// 1000 points
    Thousand,
}

impl PointValue {
    /// Every ladder value, cheapest first
    pub const LADDER: [PointValue; 5] = [
        Self::Hundred,
        Self::TwoHundred,
        Self::FourHundred,
        Self::SixHundred,
        Self::Thousand,
    ];

    /// Returns the number of points this rung is worth
    pub fn points(self) -> u32 {
        match self {
            Self::Hundred => 100,
            Self::TwoHundred => 200,
            Self::FourHundred => 400,
            Self::SixHundred => 600,
            Self::Thousand => 1000,
        }
    }
}

/// A point total that is not part of the ladder
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0} is not a value on the point ladder")]
pub struct NotOnLadder(pub u32);

impl TryFrom<u32> for PointValue {
    type Error = NotOnLadder;

    fn try_from(points: u32) -> Result<Self, Self::Error> {
        Self::LADDER
            .into_iter()
            .find(|value| value.points() == points)
            .ok_or(NotOnLadder(points))
    }
}

impl From<PointValue> for u32 {
    fn from(value: PointValue) -> Self {
        value.points()
    }
}

/// Identifiers may be authored as strings or as plain numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// A unique identifier for a question within the catalog
///
/// Numeric identifiers in the catalog are normalized to their decimal
/// string form so that `7` and `"7"` name the same question.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(from = "RawId", into = "String")]
pub struct QuestionId(String);

impl QuestionId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<RawId> for QuestionId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}

fn validate_id(id: &QuestionId, _ctx: &()) -> garde::Result {
    if id.as_str().trim().is_empty() {
        Err(garde::Error::new("identifier cannot be blank"))
    } else {
        Ok(())
    }
}

/// A single catalog question
///
/// Records are never edited after loading; the board, the channel and both
/// surfaces pass clones of them around.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionRecord {
    #[garde(custom(validate_id))]
    id: QuestionId,
    #[garde(length(chars, min = 1, max = MAX_CATEGORY_LENGTH))]
    category: String,
    #[garde(skip)]
    points: PointValue,
    #[garde(length(chars, min = 1, max = MAX_QUESTION_LENGTH))]
    question: String,
    #[garde(length(chars, max = MAX_ANSWER_LENGTH))]
    answer: String,
    #[garde(length(min = 1, max = MAX_MEDIA_LENGTH))]
    image: Option<String>,
    #[garde(length(min = 1, max = MAX_MEDIA_LENGTH))]
    sound: Option<String>,
}

impl QuestionRecord {
    /// Creates a text-only question
    pub fn new(
        id: impl Into<QuestionId>,
        category: impl Into<String>,
        points: PointValue,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            points,
            question: question.into(),
            answer: answer.into(),
            image: None,
            sound: None,
        }
    }

    /// Attaches an image reference
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Attaches a sound reference
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// The question's identifier
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// The category this question belongs to
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The ladder value of this question
    pub fn points(&self) -> PointValue {
        self.points
    }

    /// The question text shown on the board
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The answer, shown only on the admin panel
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Optional image reference
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Optional sound reference
    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref()
    }
}
