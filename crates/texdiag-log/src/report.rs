use crate::record::{MessageCategory, MessageDetail, MessageRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engines whose logs are byte-oriented rather than UTF-8.
pub const NON_UNICODE_ENGINES: &[&str] = &["TeX", "eTeX", "pdfTeX"];

/// The `This is <engine>, Version <version>` banner on the first log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineBanner {
    pub engine: String,
    pub version: String,
}

impl EngineBanner {
    /// `false` for engines that write 8-bit text, whose logs usually need a
    /// Latin-1 style decoding instead of UTF-8.
    pub fn is_unicode(&self) -> bool {
        !NON_UNICODE_ENGINES.contains(&self.engine.as_str())
    }
}

/// Per-category record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub errors: usize,
    pub warnings: usize,
    pub badboxes: usize,
    pub info: usize,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Errors: {}, Warnings: {}, Badboxes: {}",
            self.errors, self.warnings, self.badboxes
        )
    }
}

/// Closed records routed by category.
///
/// Every record lives in exactly one collection, the one matching
/// [`MessageRecord::category`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) engine: Option<EngineBanner>,
    errors: Vec<MessageRecord>,
    warnings: Vec<MessageRecord>,
    badboxes: Vec<MessageRecord>,
    info: Vec<MessageRecord>,
}

impl ScanReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: MessageRecord) {
        let bucket = match record.category() {
            MessageCategory::Error => &mut self.errors,
            MessageCategory::Warning => &mut self.warnings,
            MessageCategory::BadBox => &mut self.badboxes,
            MessageCategory::Info => &mut self.info,
        };
        bucket.push(record);
    }

    /// The engine banner, if one was seen.
    pub fn engine(&self) -> Option<&EngineBanner> {
        self.engine.as_ref()
    }

    /// Error records, in source order.
    pub fn errors(&self) -> &[MessageRecord] {
        &self.errors
    }

    /// Warning records, in source order.
    pub fn warnings(&self) -> &[MessageRecord] {
        &self.warnings
    }

    /// Bad-box records, in source order.
    pub fn badboxes(&self) -> &[MessageRecord] {
        &self.badboxes
    }

    /// Info records, in source order.
    pub fn info(&self) -> &[MessageRecord] {
        &self.info
    }

    /// The collection for `category`.
    pub fn records(&self, category: MessageCategory) -> &[MessageRecord] {
        match category {
            MessageCategory::Error => &self.errors,
            MessageCategory::Warning => &self.warnings,
            MessageCategory::BadBox => &self.badboxes,
            MessageCategory::Info => &self.info,
        }
    }

    /// Warnings about undefined citations and references.
    pub fn missing_references(&self) -> impl Iterator<Item = &MessageRecord> {
        self.warnings
            .iter()
            .filter(|record| matches!(record.detail(), MessageDetail::MissingReference { .. }))
    }

    /// All records across categories, ordered by their opening line.
    pub fn in_source_order(&self) -> Vec<&MessageRecord> {
        let mut all: Vec<&MessageRecord> = MessageCategory::ALL
            .iter()
            .flat_map(|category| self.records(*category))
            .collect();
        all.sort_by_key(|record| record.first_line());
        all
    }

    /// Counts per category.
    pub fn tally(&self) -> Tally {
        Tally {
            errors: self.errors.len(),
            warnings: self.warnings.len(),
            badboxes: self.badboxes.len(),
            info: self.info.len(),
        }
    }

    /// Number of records across all categories.
    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.badboxes.len() + self.info.len()
    }

    /// `true` when no record was closed.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for ScanReport {
    /// Renders `Errors: E, Warnings: W, Badboxes: B`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tally())
    }
}
