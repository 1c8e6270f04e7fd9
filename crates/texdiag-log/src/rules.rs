//! Message-start patterns and continuation rules.
//!
//! The rules are evaluated in the order of [`START_RULES`]: an error start
//! beats a bad-box report, which beats a warning. The order is part of the
//! contract, because a line matching several patterns must always open the
//! same kind of message.

use crate::record::{
    BoxDirection, Emitter, Fullness, MessageCategory, MessageDetail, ReferenceKind,
};
use crate::report::EngineBanner;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in log pattern is valid")
}

static TYPED_ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^! ((?:\w*)TeX|Package|Class)(?: (\w+))? [eE]rror(?: \(([\\]?\w+)\))?: (.*)")
});
static TYPED_WARNING_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^((?:\w*)TeX|Package|Class)(?: (\w+))? [wW]arning(?: \(([\\]?\w+)\))?: (.*)")
});
static TYPED_INFO_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^((?:\w*)TeX|Package|Class)(?: (\w+))? [iI]nfo(?: \(([\\]?\w+)\))?: (.*)")
});
static WARNING_TOKEN_RE: Lazy<Regex> = Lazy::new(|| compile(r"\bWarning:"));
static MISSING_REF_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^LaTeX Warning: (Citation|Reference) `([^']+)' on page (\d+) undefined on input line (\d+)\.")
});

static BADBOX_RE: Lazy<Regex> = Lazy::new(|| compile(r"^(Over|Under)full \\([hv])box \("));
static BADBOX_BY_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"\((?:badness (\d+)|(\d+(?:\.\d+)?pt) too \w+)\)"));
static BADBOX_LINES_RE: Lazy<Regex> = Lazy::new(|| compile(r"at lines (\d+)--(\d+)"));
static BADBOX_LINE_RE: Lazy<Regex> = Lazy::new(|| compile(r"at line (\d+)"));
static BADBOX_OUTPUT_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"has occurred while \\output is active"));

static BANNER_RE: Lazy<Regex> = Lazy::new(|| compile(r"^This is (\w+), Version ([\w.-]+)"));

/// Decides which lines after the opening line belong to an open message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Every following line up to a blank line or the next message start.
    UntilBlank,
    /// The opening line is the whole message.
    SelfClosing,
}

/// One entry of the ordered start-pattern table.
pub struct StartRule {
    pub category: MessageCategory,
    pub continuation: Continuation,
    matches: fn(&str) -> bool,
    detail: fn(&str) -> MessageDetail,
}

impl StartRule {
    /// `true` if `line` opens a message of this rule.
    pub fn matches(&self, line: &str) -> bool {
        (self.matches)(line)
    }

    /// Structured fields for an opening line.
    pub fn detail(&self, line: &str) -> MessageDetail {
        (self.detail)(line)
    }
}

impl std::fmt::Debug for StartRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartRule")
            .field("category", &self.category)
            .field("continuation", &self.continuation)
            .finish()
    }
}

pub static START_RULES: [StartRule; 3] = [
    StartRule {
        category: MessageCategory::Error,
        continuation: Continuation::UntilBlank,
        matches: is_error_start,
        detail: error_detail,
    },
    StartRule {
        category: MessageCategory::BadBox,
        continuation: Continuation::SelfClosing,
        matches: is_badbox_start,
        detail: badbox_detail,
    },
    StartRule {
        category: MessageCategory::Warning,
        continuation: Continuation::UntilBlank,
        matches: is_warning_start,
        detail: warning_detail,
    },
];

/// Returns the highest-priority rule whose start pattern matches `line`.
pub fn match_start(line: &str) -> Option<&'static StartRule> {
    START_RULES.iter().find(|rule| rule.matches(line))
}

/// A blank line is empty or whitespace only.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_error_start(line: &str) -> bool {
    line.starts_with('!')
}

fn is_badbox_start(line: &str) -> bool {
    BADBOX_RE.is_match(line)
}

fn is_warning_start(line: &str) -> bool {
    TYPED_WARNING_RE.is_match(line) || WARNING_TOKEN_RE.is_match(line)
}

/// Builds the emitter from the `(type, name)` groups shared by the
/// error, warning and info patterns.
fn emitter(caps: &Captures<'_>) -> Emitter {
    let name = caps.get(2).map(|m| m.as_str().to_string());
    match (&caps[1], name) {
        ("Package", Some(name)) => Emitter::Package { name },
        ("Class", Some(name)) => Emitter::Class { name },
        (kind, component) => Emitter::Engine {
            name: kind.to_string(),
            component,
        },
    }
}

fn generated(caps: &Captures<'_>) -> MessageDetail {
    MessageDetail::Generated {
        emitter: emitter(caps),
        extra: caps.get(3).map(|m| m.as_str().to_string()),
        message: caps[4].to_string(),
    }
}

fn error_detail(line: &str) -> MessageDetail {
    match TYPED_ERROR_RE.captures(line) {
        Some(caps) => generated(&caps),
        None => MessageDetail::EngineError {
            message: line.strip_prefix('!').unwrap_or(line).trim().to_string(),
        },
    }
}

fn warning_detail(line: &str) -> MessageDetail {
    if let Some(detail) = missing_reference(line) {
        return detail;
    }
    match TYPED_WARNING_RE.captures(line) {
        Some(caps) => generated(&caps),
        None => MessageDetail::Unstructured,
    }
}

fn missing_reference(line: &str) -> Option<MessageDetail> {
    let caps = MISSING_REF_RE.captures(line)?;
    let reference = match &caps[1] {
        "Citation" => ReferenceKind::Citation,
        _ => ReferenceKind::Reference,
    };
    Some(MessageDetail::MissingReference {
        reference,
        key: caps[2].to_string(),
        page: caps[3].parse().ok()?,
        input_line: caps[4].parse().ok()?,
    })
}

fn badbox_detail(line: &str) -> MessageDetail {
    let (fullness, direction) = match BADBOX_RE.captures(line) {
        Some(caps) => (
            if &caps[1] == "Over" {
                Fullness::Overfull
            } else {
                Fullness::Underfull
            },
            if &caps[2] == "h" {
                BoxDirection::Horizontal
            } else {
                BoxDirection::Vertical
            },
        ),
        None => return MessageDetail::Unstructured,
    };

    let by = BADBOX_BY_RE
        .captures(line)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string());

    let lines = if let Some(caps) = BADBOX_LINES_RE.captures(line) {
        caps[1].parse().ok().zip(caps[2].parse().ok())
    } else {
        BADBOX_LINE_RE
            .captures(line)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .map(|single| (single, single))
    };

    MessageDetail::BadBox {
        fullness,
        direction,
        by,
        lines,
        during_output: BADBOX_OUTPUT_RE.is_match(line),
    }
}

/// Detail for a line that matched no start rule.
///
/// Returns `None` for ordinary compilation output; `... Info: ...` lines
/// generated by the format, a package or a class get structured detail.
pub fn info_detail(line: &str) -> Option<MessageDetail> {
    TYPED_INFO_RE.captures(line).map(|caps| generated(&caps))
}

/// Recognizes the `This is <engine>, Version <version>` banner.
pub fn parse_banner(line: &str) -> Option<EngineBanner> {
    let caps = BANNER_RE.captures(line)?;
    Some(EngineBanner {
        engine: caps[1].to_string(),
        version: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(line: &str) -> Option<MessageCategory> {
        match_start(line).map(|rule| rule.category)
    }

    #[test]
    fn test_priority_order() {
        // Starts with `!` and mentions a warning: the error rule wins.
        assert_eq!(
            category("! Package foo Warning: odd but still an error"),
            Some(MessageCategory::Error)
        );
        assert_eq!(
            category("Underfull \\hbox (badness 10000) in paragraph at lines 1--2"),
            Some(MessageCategory::BadBox)
        );
        assert_eq!(
            category("LaTeX Font Warning: Some font shapes were not available"),
            Some(MessageCategory::Warning)
        );
        assert_eq!(category("(./main.aux)"), None);
    }

    #[test]
    fn test_badbox_requires_box_report() {
        assert_eq!(category("Overfull rule"), None);
        assert_eq!(category("Overfull \\vbox (3.0pt too high) has occurred while \\output is active []"), Some(MessageCategory::BadBox));
    }

    #[test]
    fn test_warning_token_anywhere() {
        assert_eq!(category("*** Warning: something odd"), Some(MessageCategory::Warning));
        assert_eq!(warning_detail("*** Warning: something odd"), MessageDetail::Unstructured);
        assert_eq!(category("no warnings here"), None);
    }

    #[test]
    fn test_badbox_detail_without_location() {
        let detail = badbox_detail("Underfull \\hbox (badness 1000) ");
        assert_eq!(
            detail,
            MessageDetail::BadBox {
                fullness: Fullness::Underfull,
                direction: BoxDirection::Horizontal,
                by: Some("1000".into()),
                lines: None,
                during_output: false,
            }
        );
    }

    #[test]
    fn test_info_detail() {
        let detail = info_detail("Package hyperref Info: Link coloring OFF on input line 12.");
        assert_eq!(
            detail,
            Some(MessageDetail::Generated {
                emitter: Emitter::Package {
                    name: "hyperref".into()
                },
                extra: None,
                message: "Link coloring OFF on input line 12.".into(),
            })
        );
        assert_eq!(info_detail("Document Class: article 2023/05/17 v1.4n"), None);
    }

    #[test]
    fn test_banner() {
        let banner =
            parse_banner("This is pdfTeX, Version 3.141592653-2.6-1.40.25 (TeX Live 2023) (preloaded format=pdflatex)")
                .expect("banner");
        assert_eq!(banner.engine, "pdfTeX");
        assert_eq!(banner.version, "3.141592653-2.6-1.40.25");
        assert!(!banner.is_unicode());

        let banner = parse_banner("This is LuaHBTeX, Version 1.17.0 (TeX Live 2023)").expect("banner");
        assert!(banner.is_unicode());
        assert!(parse_banner("entering extended mode").is_none());
    }
}
