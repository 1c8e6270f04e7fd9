use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

static INPUT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"on input line (\d+)\.").expect("input line pattern is valid"));

/// Field names understood by [`MessageRecord::field`].
pub const FIELD_NAMES: &[&str] = &[
    "message",
    "type",
    "package",
    "class",
    "component",
    "extra",
    "key",
    "page",
    "line",
    "direction",
    "by",
    "lines",
];

/// Closed classification of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCategory {
    Error,
    Warning,
    BadBox,
    /// Catch-all for lines that are not part of a tracked diagnostic.
    Info,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 4] = [
        MessageCategory::Error,
        MessageCategory::Warning,
        MessageCategory::BadBox,
        MessageCategory::Info,
    ];

    /// The category name, e.g. `BadBox`.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageCategory::Error => "Error",
            MessageCategory::Warning => "Warning",
            MessageCategory::BadBox => "BadBox",
            MessageCategory::Info => "Info",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The component that generated a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Emitter {
    /// The engine or the format itself, e.g. `LaTeX`, `pdfTeX`, or `LaTeX Font`.
    Engine {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        component: Option<String>,
    },
    Package { name: String },
    Class { name: String },
}

impl Emitter {
    /// The `type` label: the engine name, `Package` or `Class`.
    pub fn label(&self) -> &str {
        match self {
            Emitter::Engine { name, .. } => name,
            Emitter::Package { .. } => "Package",
            Emitter::Class { .. } => "Class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    Citation,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fullness {
    Overfull,
    Underfull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxDirection {
    Horizontal,
    Vertical,
}

impl BoxDirection {
    /// `h` or `v`, as in `\hbox`/`\vbox`.
    pub fn as_char(self) -> char {
        match self {
            BoxDirection::Horizontal => 'h',
            BoxDirection::Vertical => 'v',
        }
    }
}

/// Structured fields parsed from the line that opened a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum MessageDetail {
    /// A bare `! <message>` error raised by the engine.
    EngineError { message: String },
    /// `<X>TeX|Package|Class [name] Error|Warning|Info[ (extra)]: <message>`.
    Generated {
        emitter: Emitter,
        #[serde(skip_serializing_if = "Option::is_none")]
        extra: Option<String>,
        message: String,
    },
    /// An undefined citation or cross reference.
    MissingReference {
        reference: ReferenceKind,
        key: String,
        page: u32,
        input_line: u32,
    },
    BadBox {
        fullness: Fullness,
        direction: BoxDirection,
        /// Badness (`10000`) or excess (`12.3pt`).
        #[serde(skip_serializing_if = "Option::is_none")]
        by: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lines: Option<(u32, u32)>,
        during_output: bool,
    },
    Unstructured,
}

/// One classified diagnostic unit.
///
/// Records are built by the [`LogScanner`](crate::LogScanner) and can only be
/// read once they reach a [`ScanReport`](crate::ScanReport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    category: MessageCategory,
    first_line: usize,
    detail: MessageDetail,
    lines: Vec<String>,
}

impl MessageRecord {
    pub(crate) fn open(
        category: MessageCategory,
        first_line: usize,
        line: &str,
        detail: MessageDetail,
    ) -> Self {
        Self {
            category,
            first_line,
            detail,
            lines: vec![line.to_string()],
        }
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// The category this record was routed by.
    pub fn category(&self) -> MessageCategory {
        self.category
    }

    /// 1-based position of the opening line within the scanner session.
    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Structured fields of the opening line.
    pub fn detail(&self) -> &MessageDetail {
        &self.detail
    }

    /// The captured raw lines, opening line first. Never empty.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Source line number from an `l.<n> ...` context line, as printed by TeX
    /// after an error.
    pub fn source_line(&self) -> Option<u32> {
        self.line_reference().map(|(line, _)| line)
    }

    /// The source text TeX echoed after `l.<n>`, if any.
    pub fn source_excerpt(&self) -> Option<&str> {
        self.line_reference()
            .and_then(|(_, excerpt)| (!excerpt.is_empty()).then_some(excerpt))
    }

    fn line_reference(&self) -> Option<(u32, &str)> {
        self.lines.iter().skip(1).find_map(|text| {
            let number_part = text.strip_prefix("l.")?;
            let digits = number_part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(number_part.len());
            let line = number_part[..digits].parse::<u32>().ok()?;
            Some((line, number_part[digits..].trim()))
        })
    }

    /// The number from the first `on input line <n>.` phrase in the record.
    pub fn input_line(&self) -> Option<u32> {
        if let MessageDetail::MissingReference { input_line, .. } = self.detail {
            return Some(input_line);
        }
        self.lines.iter().find_map(|text| {
            INPUT_LINE_RE
                .captures(text)
                .and_then(|caps| caps[1].parse().ok())
        })
    }

    /// Looks up a named field; see [`FIELD_NAMES`].
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match (name, &self.detail) {
            ("message", MessageDetail::EngineError { message })
            | ("message", MessageDetail::Generated { message, .. }) => {
                Some(Cow::Borrowed(message.as_str()))
            }
            ("message", MessageDetail::MissingReference { .. }) => {
                let opening = self.lines[0].as_str();
                let message = opening.split_once(": ").map_or(opening, |(_, rest)| rest);
                Some(Cow::Borrowed(message))
            }
            ("message", _) => Some(Cow::Borrowed(self.lines[0].trim())),

            ("type", MessageDetail::Generated { emitter, .. }) => {
                Some(Cow::Borrowed(emitter.label()))
            }
            ("type", MessageDetail::MissingReference { reference, .. }) => {
                Some(Cow::Owned(format!("Missing {:?}", reference)))
            }
            ("type", MessageDetail::BadBox { fullness, .. }) => Some(Cow::Borrowed(match fullness {
                Fullness::Overfull => "Over",
                Fullness::Underfull => "Under",
            })),

            ("package", MessageDetail::Generated { emitter: Emitter::Package { name }, .. })
            | ("class", MessageDetail::Generated { emitter: Emitter::Class { name }, .. }) => {
                Some(Cow::Borrowed(name.as_str()))
            }
            (
                "component",
                MessageDetail::Generated {
                    emitter: Emitter::Engine { component: Some(component), .. },
                    ..
                },
            ) => Some(Cow::Borrowed(component.as_str())),
            ("extra", MessageDetail::Generated { extra: Some(extra), .. }) => {
                Some(Cow::Borrowed(extra.as_str()))
            }

            ("key", MessageDetail::MissingReference { key, .. }) => Some(Cow::Borrowed(key.as_str())),
            ("page", MessageDetail::MissingReference { page, .. }) => Some(Cow::Owned(page.to_string())),
            ("line", MessageDetail::MissingReference { input_line, .. }) => {
                Some(Cow::Owned(input_line.to_string()))
            }

            ("direction", MessageDetail::BadBox { direction, .. }) => {
                Some(Cow::Owned(direction.as_char().to_string()))
            }
            ("by", MessageDetail::BadBox { by: Some(by), .. }) => Some(Cow::Borrowed(by.as_str())),
            ("lines", MessageDetail::BadBox { lines: Some((start, end)), .. }) => {
                Some(Cow::Owned(format!("{}--{}", start, end)))
            }
            _ => None,
        }
    }

    /// Every field present on this record, in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        FIELD_NAMES
            .iter()
            .filter_map(|name| self.field(name).map(|value| (*name, value)))
            .collect()
    }
}

impl fmt::Display for MessageRecord {
    /// Reproduces the captured lines verbatim, joined by `\n`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_record(lines: &[&str]) -> MessageRecord {
        let mut record = MessageRecord::open(
            MessageCategory::Error,
            1,
            lines[0],
            MessageDetail::EngineError {
                message: lines[0].trim_start_matches("! ").to_string(),
            },
        );
        for line in &lines[1..] {
            record.push_line(line);
        }
        record
    }

    #[test]
    fn test_display_is_verbatim() {
        let record = error_record(&["! Missing $ inserted.", "<inserted text> ", "                $"]);
        assert_eq!(
            record.to_string(),
            "! Missing $ inserted.\n<inserted text> \n                $"
        );
    }

    #[test]
    fn test_source_line_reference() {
        let record = error_record(&["! Undefined control sequence.", "l.6 \\dtae", "{December 2004}"]);
        assert_eq!(record.source_line(), Some(6));
        assert_eq!(record.source_excerpt(), Some("\\dtae"));
    }

    #[test]
    fn test_source_line_ignores_opening_line() {
        let record = error_record(&["! l.5 looks like a reference"]);
        assert_eq!(record.source_line(), None);
    }

    #[test]
    fn test_input_line_from_continuation() {
        let mut record = MessageRecord::open(
            MessageCategory::Warning,
            3,
            "Package hyperref Warning: Token not allowed in a PDF string",
            MessageDetail::Unstructured,
        );
        record.push_line("(hyperref)                on input line 45.");
        assert_eq!(record.input_line(), Some(45));
        assert_eq!(record.first_line(), 3);
    }

    #[test]
    fn test_fields_for_badbox() {
        let record = MessageRecord::open(
            MessageCategory::BadBox,
            1,
            "Overfull \\hbox (1.0pt too wide) in paragraph at lines 1--2",
            MessageDetail::BadBox {
                fullness: Fullness::Overfull,
                direction: BoxDirection::Horizontal,
                by: Some("1.0pt".into()),
                lines: Some((1, 2)),
                during_output: false,
            },
        );
        let fields = record.fields();
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["message", "type", "direction", "by", "lines"]);
        assert_eq!(record.field("type").as_deref(), Some("Over"));
        assert_eq!(record.field("lines").as_deref(), Some("1--2"));
        assert_eq!(record.field("package"), None);
    }
}
