use texdiag_log::LogScanner;
use texdiag_log::record::{MessageCategory, MessageDetail};

#[test]
fn test_simple_structure() {
    let input = "(./main.tex\nLaTeX Warning: Reference `X' on page 1 undefined on input line 10.\n\n)";
    let report = LogScanner::new().parse(input);

    let order: Vec<MessageCategory> = report
        .in_source_order()
        .iter()
        .map(|r| r.category())
        .collect();
    assert_eq!(
        order,
        vec![MessageCategory::Info, MessageCategory::Warning, MessageCategory::Info]
    );
    assert!(matches!(
        report.warnings()[0].detail(),
        MessageDetail::MissingReference { .. }
    ));
}

#[test]
fn test_error_line_ref() {
    let input = "! Undefined control sequence.\nl.100 \\foo";
    let report = LogScanner::new().parse(input);

    assert_eq!(report.errors().len(), 1);
    let err = &report.errors()[0];
    assert_eq!(err.field("message").as_deref(), Some("Undefined control sequence."));
    assert_eq!(err.source_line(), Some(100));
    assert_eq!(err.source_excerpt(), Some("\\foo"));
    assert_eq!(err.to_string(), input);
}

#[test]
fn test_streaming_update() {
    let mut scanner = LogScanner::new();

    // Chunk 1: partial warning line
    assert_eq!(scanner.update("Package natbib Warn"), 0);
    assert!(scanner.is_idle());

    // Chunk 2: the line completes and a continuation starts
    assert_eq!(scanner.update("ing: Citation `x' undefined\n(natbib)      "), 0);
    assert_eq!(scanner.open_category(), Some(MessageCategory::Warning));

    // Chunk 3: the continuation completes, an error start closes the warning
    assert_eq!(scanner.update("on input line 3.\n! Missing } inserted.\n"), 1);
    assert_eq!(scanner.warnings()[0].lines().len(), 2);
    assert_eq!(scanner.warnings()[0].input_line(), Some(3));

    // Finish
    let report = scanner.finish();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.to_string(), "Errors: 1, Warnings: 1, Badboxes: 0");
}

#[test]
fn test_wrapped_warning_is_one_record() {
    // TeX wraps log lines at 79 characters.
    let input = "\
LaTeX Warning: Reference `sec:a-very-long-label-name-that-forces-wrapping' on pa
ge 12 undefined on input line 345.

";
    let report = LogScanner::new().parse(input);
    assert_eq!(report.warnings().len(), 1);
    let warning = &report.warnings()[0];
    assert_eq!(warning.lines().len(), 2);
    assert_eq!(warning.input_line(), Some(345));
    // Wrapping defeats the missing-reference layout.
    assert!(matches!(warning.detail(), MessageDetail::Generated { .. }));
}
