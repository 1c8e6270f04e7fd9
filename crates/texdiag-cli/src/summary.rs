use std::io::{self, Write};
use texdiag_log::{FilterConfig, MessageFilter, MessageRecord, ScanReport};

fn caption(out: &mut impl Write, title: &str, banner: bool) -> io::Result<()> {
    if banner {
        let rule = "=".repeat(title.chars().count() + 8);
        writeln!(out, "{}", rule)?;
        writeln!(out, "    {}", title)?;
        writeln!(out, "{}", rule)
    } else {
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", "-".repeat(title.chars().count()))
    }
}

/// Prints one section and returns how many records the filter ignored.
fn print_section(
    out: &mut impl Write,
    records: &[MessageRecord],
    label: &str,
    filter: &MessageFilter,
) -> io::Result<usize> {
    if records.is_empty() {
        writeln!(out, "None found.")?;
        return Ok(0);
    }

    let total = records.len();
    let mut ignored = 0;
    for (idx, record) in records.iter().enumerate() {
        if filter.is_ignored(record) {
            ignored += 1;
            continue;
        }
        let kind = record.field("type").unwrap_or_default();
        writeln!(out, "{} {}/{} (Type {})", label, idx + 1, total, kind)?;
        writeln!(out, "{}", record.field("message").unwrap_or_default())?;
        for (name, value) in record.fields() {
            if name != "type" && name != "message" {
                writeln!(out, "{}: {}", name, value)?;
            }
        }
        writeln!(out)?;
    }
    Ok(ignored)
}

/// Writes the human-readable report for `title`.
pub fn write_summary(
    out: &mut impl Write,
    title: &str,
    report: &ScanReport,
    filters: &FilterConfig,
) -> io::Result<()> {
    caption(out, title, true)?;
    writeln!(out)?;
    caption(out, "Summary", false)?;
    writeln!(out, "{}", report)?;
    writeln!(out)?;

    caption(out, "Warnings", false)?;
    let ignored = print_section(out, report.warnings(), "Warning", &filters.warnings)?;
    writeln!(out, "{} Warnings were ignored.", ignored)?;
    writeln!(out)?;

    caption(out, "Errors", false)?;
    let ignored = print_section(out, report.errors(), "Error", &filters.errors)?;
    writeln!(out, "{} Errors were ignored.", ignored)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use texdiag_log::LogScanner;

    fn render(log: &str, filters: &FilterConfig) -> String {
        let report = LogScanner::new().parse(log);
        let mut out = Vec::new();
        write_summary(&mut out, "main.log", &report, filters).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_report() {
        let text = render("", &FilterConfig::builtin());
        assert_eq!(
            text,
            "\
================
    main.log
================

Summary
-------
Errors: 0, Warnings: 0, Badboxes: 0

Warnings
--------
None found.
0 Warnings were ignored.

Errors
------
None found.
0 Errors were ignored.

"
        );
    }

    #[test]
    fn test_sections_with_filter() {
        let log = "\
Package hyperref Warning: Draft mode on.

Package rerunfilecheck Warning: File `main.out' has changed.

! Package babel Error: Unknown option `latin'.
";
        let text = render(log, &FilterConfig::builtin());
        assert!(text.contains("Errors: 1, Warnings: 2, Badboxes: 0"));
        assert!(text.contains("Warning 1/2 (Type Package)\nDraft mode on.\npackage: hyperref\n\n"));
        assert!(!text.contains("rerunfilecheck"));
        assert!(text.contains("1 Warnings were ignored."));
        assert!(text.contains("Error 1/1 (Type Package)\nUnknown option `latin'.\npackage: babel\n"));
        assert!(text.contains("0 Errors were ignored."));
    }

    #[test]
    fn test_disabled_filter_keeps_everything() {
        let log = "Package rerunfilecheck Warning: File `main.out' has changed.\n";
        let text = render(log, &FilterConfig::disabled());
        assert!(text.contains("Warning 1/1 (Type Package)"));
        assert!(text.contains("0 Warnings were ignored."));
    }
}
