use crate::domain::project::ProjectId;
use crate::error::{Result, WorkflowError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row in a workflow action file.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Create a project (`name`, `customer`, `city`).
    Create,
    /// Upload `value` as the artifact for `field`, then optionally advance.
    Upload,
    /// Record `value` as text under `field`, then optionally advance.
    Set,
    /// Set the total quote to `amount`.
    Quote,
    /// Record a payment of `amount` under `field`.
    Pay,
    /// Advance without any field writes.
    Advance,
}

/// A workflow action parsed from CSV.
///
/// Columns other than `type` are optional; which ones an action needs is
/// validated when it is applied, not while parsing.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ActionRecord {
    pub r#type: ActionType,
    #[serde(default)]
    pub project: Option<ProjectId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub sub: Option<u8>,
    #[serde(default)]
    pub stage: Option<u8>,
}

/// Reads workflow actions from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<ActionRecord>` lazily, so large
/// replay files stream without loading into memory. Whitespace is trimmed
/// and short rows are padded.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    /// Creates a new `ActionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes actions.
    pub fn actions(self) -> impl Iterator<Item = Result<ActionRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WorkflowError::from))
    }
}
