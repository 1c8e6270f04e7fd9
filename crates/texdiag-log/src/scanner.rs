use crate::error::Result;
use crate::record::{MessageCategory, MessageDetail, MessageRecord};
use crate::report::ScanReport;
use crate::rules::{self, Continuation, StartRule};
use serde::{Deserialize, Serialize};
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;

/// What to do with non-blank lines that start no message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Keep each such line as a single-line [`MessageCategory::Info`] record.
    #[default]
    Collect,
    /// Discard them. `... Info:` lines from packages are still recorded.
    Drop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
}

struct OpenMessage {
    record: MessageRecord,
    continuation: Continuation,
}

/// A line-by-line classifier for TeX logs.
///
/// `LogScanner` recognizes the first line of each error, bad box or warning,
/// accumulates the lines that belong to it, and moves the closed
/// [`MessageRecord`] into its [`ScanReport`]. Input can be fed as lines
/// ([`process_line`](Self::process_line), [`process`](Self::process)), as raw
/// chunks ([`update`](Self::update)), or from a reader.
///
/// Repeated calls accumulate into the same report; use [`reset`](Self::reset)
/// to start over.
pub struct LogScanner {
    config: ScannerConfig,
    report: ScanReport,
    open: Option<OpenMessage>,
    buffer: String,
    line_count: usize,
    warned_fallback: bool,
}

impl Default for LogScanner {
    /// Creates a scanner with the default configuration.
    fn default() -> Self {
        Self::new()
    }
}

impl LogScanner {
    /// Creates a new, empty `LogScanner`.
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    /// Creates an empty `LogScanner` with the given configuration.
    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            config,
            report: ScanReport::new(),
            open: None,
            buffer: String::new(),
            line_count: 0,
            warned_fallback: false,
        }
    }

    /// The configuration this scanner was built with.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Classifies one line.
    ///
    /// A single trailing `\r\n`, `\n` or `\r` is stripped; everything else is
    /// kept verbatim.
    pub fn process_line(&mut self, line: &str) {
        let line = strip_terminator(line);
        self.line_count += 1;
        if self.report.engine.is_none() {
            self.detect_banner(line);
        }

        let start = rules::match_start(line);

        if let Some(open) = self.open.as_mut() {
            let continues = match open.continuation {
                Continuation::UntilBlank => start.is_none() && !rules::is_blank(line),
                Continuation::SelfClosing => false,
            };
            if continues {
                open.record.push_line(line);
                return;
            }
            if let Some(rule) = start {
                log::debug!(
                    "line {}: {} start closes open {}",
                    self.line_count,
                    rule.category,
                    open.record.category()
                );
            }
            self.close_open();
            if start.is_none() {
                return;
            }
        }

        match start {
            Some(rule) => self.open_message(rule, line),
            None if rules::is_blank(line) => {}
            None => self.handle_unmatched(line),
        }
    }

    /// Processes every line in order, then [`finalize`](Self::finalize)s.
    ///
    /// The iterator is consumed lazily.
    pub fn process<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.process_line(line.as_ref());
        }
        self.finalize();
    }

    /// Processes a whole log held in memory.
    pub fn process_str(&mut self, text: &str) {
        self.process(text.split_inclusive('\n'));
    }

    /// Reads lines from `reader` and processes them, then finalizes.
    ///
    /// Each line is decoded as UTF-8. A line that is not valid UTF-8 is
    /// decoded as Windows-1252 instead, which covers the Latin-1 text 8-bit
    /// engines write, so no byte is lost or replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if reading fails. The scanner
    /// is finalized first, so every line read up to that point, including the
    /// message that was still open, stays in the report.
    pub fn process_reader<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut bytes = Vec::new();
        loop {
            bytes.clear();
            match reader.read_until(b'\n', &mut bytes) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    self.finalize();
                    return Err(err.into());
                }
            }
            let line = self.decode_line(&bytes);
            self.process_line(&line);
        }
        self.finalize();
        Ok(())
    }

    /// Appends a chunk of raw log text and processes every completed line.
    ///
    /// A trailing partial line is buffered until a later chunk completes it
    /// or [`finalize`](Self::finalize) flushes it.
    ///
    /// # Arguments
    ///
    /// * `chunk` - A slice of the log content, split at any point.
    ///
    /// # Returns
    ///
    /// The number of records closed while processing this chunk.
    pub fn update(&mut self, chunk: &str) -> usize {
        let before = self.report.total();
        self.buffer.push_str(chunk);

        let Some(last_nl) = self.buffer.rfind('\n') else {
            return 0;
        };
        let complete: String = self.buffer.drain(..=last_nl).collect();
        for line in complete.split_inclusive('\n') {
            self.process_line(line);
        }

        self.report.total() - before
    }

    /// Closes the open message, if any, as if the input ended here.
    ///
    /// Any partial line buffered by [`update`](Self::update) is processed
    /// first. Calling this again has no further effect.
    pub fn finalize(&mut self) {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.process_line(&rest);
        }
        self.close_open();
    }

    /// Finalizes and returns the report.
    pub fn finish(mut self) -> ScanReport {
        self.finalize();
        self.report
    }

    /// One-shot parsing of a whole log.
    ///
    /// # Arguments
    ///
    /// * `input` - The full content of the log file.
    ///
    /// # Returns
    ///
    /// The finished [`ScanReport`].
    pub fn parse(mut self, input: &str) -> ScanReport {
        self.process_str(input);
        self.report
    }

    /// Drops all state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    /// `true` when no message is being accumulated.
    pub fn is_idle(&self) -> bool {
        self.open.is_none()
    }

    /// Category of the message being accumulated.
    pub fn open_category(&self) -> Option<MessageCategory> {
        self.open.as_ref().map(|open| open.record.category())
    }

    /// Number of lines seen in this session.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// The records closed so far.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Closed error records.
    pub fn errors(&self) -> &[MessageRecord] {
        self.report.errors()
    }

    /// Closed warning records.
    pub fn warnings(&self) -> &[MessageRecord] {
        self.report.warnings()
    }

    /// Closed bad-box records.
    pub fn badboxes(&self) -> &[MessageRecord] {
        self.report.badboxes()
    }

    /// Closed info records.
    pub fn info(&self) -> &[MessageRecord] {
        self.report.info()
    }

    fn decode_line<'a>(&mut self, bytes: &'a [u8]) -> Cow<'a, str> {
        if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
            return text;
        }
        if !self.warned_fallback {
            log::warn!(
                "line {} is not valid UTF-8; decoding as Windows-1252",
                self.line_count + 1
            );
            self.warned_fallback = true;
        }
        WINDOWS_1252.decode_without_bom_handling(bytes).0
    }

    fn open_message(&mut self, rule: &StartRule, line: &str) {
        let record = MessageRecord::open(rule.category, self.line_count, line, rule.detail(line));
        self.open = Some(OpenMessage {
            record,
            continuation: rule.continuation,
        });
        if rule.continuation == Continuation::SelfClosing {
            self.close_open();
        }
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.report.push(open.record);
        }
    }

    fn handle_unmatched(&mut self, line: &str) {
        let detail = match rules::info_detail(line) {
            Some(detail) => detail,
            None if self.config.unmatched == UnmatchedPolicy::Collect => {
                MessageDetail::Unstructured
            }
            None => return,
        };
        self.report.push(MessageRecord::open(
            MessageCategory::Info,
            self.line_count,
            line,
            detail,
        ));
    }

    fn detect_banner(&mut self, line: &str) {
        if let Some(banner) = rules::parse_banner(line) {
            if !banner.is_unicode() {
                log::warn!(
                    "{} writes 8-bit logs; lines that are not UTF-8 are read as Windows-1252",
                    banner.engine
                );
            }
            self.report.engine = Some(banner);
        }
    }
}

impl fmt::Display for LogScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)
    }
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}
