//! # texdiag log classifier
//!
//! Line-by-line classifier for TeX engine build logs (`*.log`).
//!
//! ## Overview
//!
//! TeX logs interleave errors, warnings, bad-box reports and package
//! chatter with ordinary compilation output. Messages span a variable number
//! of lines and nothing marks where one ends. This crate scans the log one
//! line at a time and groups lines into [`MessageRecord`]s:
//!
//! - **Errors**: lines starting with `!`, continued up to the next blank line
//! - **Bad boxes**: `Overfull`/`Underfull` box reports, one line each
//! - **Warnings**: `LaTeX Warning:`, `Package <name> Warning:` and friends,
//!   continued up to the next blank line
//! - **Info**: everything else, one line per record
//!
//! A line that starts a new message always closes the one being accumulated,
//! even if it could have been a continuation line.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  process_line()   ┌────────────┐   close    ┌────────────┐
//! │  log lines   │ ────────────────► │ LogScanner │ ─────────► │ ScanReport │
//! │  or chunks   │     update()      │ (1 open    │            │ errors     │
//! └──────────────┘                   │  message)  │            │ warnings   │
//!                                    └────────────┘            │ badboxes   │
//!                                          │ finalize()        │ info       │
//!                                          └─────────────────► └────────────┘
//! ```
//!
//! The start patterns live in [`rules`], in priority order.
//!
//! ## Examples
//!
//! ### One-shot Parsing
//!
//! ```
//! use texdiag_log::LogScanner;
//!
//! let log = "! Undefined control sequence.\nl.6 \\dtae\n{December 2004}\n\n";
//! let report = LogScanner::new().parse(log);
//!
//! assert_eq!(report.errors().len(), 1);
//! assert_eq!(report.errors()[0].source_line(), Some(6));
//! assert_eq!(report.to_string(), "Errors: 1, Warnings: 0, Badboxes: 0");
//! ```
//!
//! ### Streaming/Incremental Parsing
//!
//! ```
//! use texdiag_log::LogScanner;
//!
//! let mut scanner = LogScanner::new();
//! scanner.update("Overfull \\hbox (12.3pt too wide) in para");
//! let closed = scanner.update("graph at lines 10--12\n");
//! assert_eq!(closed, 1);
//!
//! let report = scanner.finish();
//! assert_eq!(report.badboxes().len(), 1);
//! ```
//!
//! ### Exporting to JSON
//!
//! ```no_run
//! use texdiag_log::LogScanner;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let mut scanner = LogScanner::new();
//! scanner.process_reader(BufReader::new(File::open("main.log")?))?;
//! let json = serde_json::to_string_pretty(scanner.report())?;
//! std::fs::write("report.json", json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod filter;
/// Message records and their structured detail.
pub mod record;
pub mod report;
pub mod rules;
/// The line classifier.
pub mod scanner;


pub use error::{Error, Result};
pub use filter::{FilterConfig, FilterSpec, MessageFilter};
pub use record::{MessageCategory, MessageDetail, MessageRecord};
pub use report::{EngineBanner, ScanReport, Tally};
pub use scanner::{LogScanner, ScannerConfig, UnmatchedPolicy};

/// Version of the JSON report layout.
///
/// - MAJOR: Breaking changes to record structure
/// - MINOR: New optional fields or detail kinds
/// - PATCH: Classification fixes with no layout change
pub const SCHEMA_VERSION: &str = "1.0.0";
