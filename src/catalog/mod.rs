//! The static question catalog
//!
//! The catalog is the read-only input of the game. It is loaded once from a
//! JSON array of question records. Records that fail to parse or validate
//! are skipped and reported back to the caller instead of aborting the load,
//! so a single typo in a hand-authored catalog never takes the board down.

pub mod question;

use std::collections::HashSet;

use garde::Validate;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub use question::{PointValue, QuestionId, QuestionRecord};

/// Why a catalog entry was skipped
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The entry does not have the shape of a question record
    #[error("malformed record: {0}")]
    Malformed(String),
    /// The entry parsed but broke a field constraint
    #[error("invalid record: {0}")]
    Invalid(String),
    /// An earlier entry already used this identifier
    #[error("duplicate identifier {0}")]
    DuplicateId(QuestionId),
}

/// A skipped catalog entry and its position in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Zero-based position of the entry in the source array
    pub index: usize,
    /// What was wrong with it
    pub reason: RejectReason,
}

/// Errors that prevent a catalog from loading at all
#[derive(Error, Debug)]
pub enum Error {
    /// The source is not a JSON array
    #[error("catalog must be a JSON array of question records")]
    Parse(#[from] serde_json::Error),
}

/// The result of loading a catalog: the accepted records and the skipped ones
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    /// Catalog built from every accepted record
    pub catalog: Catalog,
    /// Entries that were skipped, in source order
    pub rejected: Vec<Rejection>,
}

/// An ordered, validated collection of question records
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: Vec<QuestionRecord>,
}

impl Catalog {
    /// Builds a catalog from already parsed records
    ///
    /// Records are validated and de-duplicated by identifier; the first
    /// record with a given identifier wins.
    pub fn from_records<I: IntoIterator<Item = QuestionRecord>>(records: I) -> Loaded {
        Self::collect(records.into_iter().map(Ok))
    }

    /// Parses a catalog from its JSON source
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the source is not a JSON array. Individual
    /// bad entries do not fail the load; they are listed in
    /// [`Loaded::rejected`].
    pub fn from_json(json: &str) -> Result<Loaded, Error> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;

        Ok(Self::collect(entries.into_iter().map(|entry| {
            serde_json::from_value::<QuestionRecord>(entry)
                .map_err(|e| RejectReason::Malformed(e.to_string()))
        })))
    }

    fn collect<I>(entries: I) -> Loaded
    where
        I: Iterator<Item = Result<QuestionRecord, RejectReason>>,
    {
        let mut seen = HashSet::new();
        let mut questions = Vec::new();
        let mut rejected = Vec::new();

        for (index, entry) in entries.enumerate() {
            let accepted = entry.and_then(|record| {
                record
                    .validate()
                    .map_err(|report| RejectReason::Invalid(report.to_string()))?;
                if seen.insert(record.id().clone()) {
                    Ok(record)
                } else {
                    Err(RejectReason::DuplicateId(record.id().clone()))
                }
            });

            match accepted {
                Ok(record) => questions.push(record),
                Err(reason) => {
                    warn!(index, %reason, "skipping catalog record");
                    rejected.push(Rejection { index, reason });
                }
            }
        }

        Loaded {
            catalog: Self { questions },
            rejected,
        }
    }

    /// All records, in catalog order
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Looks up a record by identifier
    pub fn get(&self, id: &QuestionId) -> Option<&QuestionRecord> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Returns the number of records in the catalog
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks if the catalog has no records
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
