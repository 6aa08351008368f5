//! Board generation
//!
//! A board is a row of category columns, each holding exactly one question
//! per ladder value. Boards are generated wholesale from the catalog with a
//! seeded random sample of the eligible categories and are never edited in
//! place afterwards.

use std::collections::HashMap;

use enum_map::EnumMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::{Catalog, PointValue, QuestionId, QuestionRecord},
    constants::board::MAX_COLUMNS,
};

/// Errors raised when a board received from elsewhere breaks its invariants
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// A column does not hold exactly one question per ladder value
    #[error("column {category:?} does not follow the point ladder")]
    Ladder {
        /// The offending column's category
        category: String,
    },
    /// A question sits in a column of another category
    #[error("question {id} does not belong to column {category:?}")]
    ForeignQuestion {
        /// The offending column's category
        category: String,
        /// The misplaced question
        id: QuestionId,
    },
    /// Two columns share a category
    #[error("category {0:?} appears more than once")]
    DuplicateCategory(String),
    /// The board is wider than the display allows
    #[error("board has {0} columns, at most {max} are allowed", max = MAX_COLUMNS)]
    TooWide(usize),
}

/// Serialization helper for `CategoryColumn`
#[derive(Deserialize)]
struct CategoryColumnSerde {
    category: String,
    questions: Vec<QuestionRecord>,
}

/// One category and its five questions, cheapest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CategoryColumnSerde")]
pub struct CategoryColumn {
    category: String,
    questions: Vec<QuestionRecord>,
}

impl TryFrom<CategoryColumnSerde> for CategoryColumn {
    type Error = Error;

    fn try_from(serde: CategoryColumnSerde) -> Result<Self, Self::Error> {
        let CategoryColumnSerde {
            category,
            questions,
        } = serde;

        if let Some(foreign) = questions.iter().find(|q| q.category() != category) {
            return Err(Error::ForeignQuestion {
                id: foreign.id().clone(),
                category,
            });
        }

        if !questions.iter().map(QuestionRecord::points).eq(PointValue::LADDER) {
            return Err(Error::Ladder { category });
        }

        Ok(Self {
            category,
            questions,
        })
    }
}

impl CategoryColumn {
    /// The column's category name
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The column's questions in ladder order
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }
}

/// The full grid of category columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CategoryColumn>", into = "Vec<CategoryColumn>")]
pub struct Board {
    columns: Vec<CategoryColumn>,
}

impl TryFrom<Vec<CategoryColumn>> for Board {
    type Error = Error;

    fn try_from(columns: Vec<CategoryColumn>) -> Result<Self, Self::Error> {
        if columns.len() > MAX_COLUMNS {
            return Err(Error::TooWide(columns.len()));
        }
        if let Some(duplicate) = columns.iter().map(CategoryColumn::category).duplicates().next() {
            return Err(Error::DuplicateCategory(duplicate.to_owned()));
        }
        Ok(Self { columns })
    }
}

impl From<Board> for Vec<CategoryColumn> {
    fn from(board: Board) -> Self {
        board.columns
    }
}

impl Board {
    /// The board's columns, left to right
    pub fn columns(&self) -> &[CategoryColumn] {
        &self.columns
    }

    /// Returns the number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Checks if no category was available for this board
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over every question on the board, column by column
    pub fn questions(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.columns.iter().flat_map(|c| c.questions.iter())
    }

    /// Looks up a question on the board by identifier
    pub fn question(&self, id: &QuestionId) -> Option<&QuestionRecord> {
        self.questions().find(|q| q.id() == id)
    }
}

/// Creates the random source used for board sampling
///
/// A fixed seed makes every generated board reproducible; without one the
/// generator is seeded from the environment.
pub fn rng(seed: Option<u64>) -> fastrand::Rng {
    seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
}

/// Generates a board from the catalog
///
/// Categories are grouped in the order they first appear in the catalog and
/// only the first record per ladder value is kept. Categories missing any
/// ladder value are not eligible. The eligible categories are shuffled and
/// the first `min(columns, eligible, MAX_COLUMNS)` are kept.
///
/// An empty board is a valid outcome when nothing is eligible.
pub fn generate(catalog: &Catalog, columns: usize, rng: &mut fastrand::Rng) -> Board {
    let mut ladders: HashMap<&str, EnumMap<PointValue, Option<&QuestionRecord>>> = HashMap::new();

    for record in catalog.questions() {
        let slot = &mut ladders.entry(record.category()).or_default()[record.points()];
        if slot.is_none() {
            *slot = Some(record);
        }
    }

    let mut eligible = catalog
        .questions()
        .iter()
        .map(QuestionRecord::category)
        .unique()
        .filter_map(|category| {
            let ladder = ladders.get(category)?;
            let questions = PointValue::LADDER
                .iter()
                .map(|value| ladder[*value].cloned())
                .collect::<Option<Vec<_>>>()?;
            Some(CategoryColumn {
                category: category.to_owned(),
                questions,
            })
        })
        .collect_vec();

    rng.shuffle(&mut eligible);
    eligible.truncate(columns.min(MAX_COLUMNS));

    Board { columns: eligible }
}
