#![no_main]
use libfuzzer_sys::fuzz_target;
use texdiag_log::LogScanner;

fuzz_target!(|data: &[u8]| {
    // The reader path must never panic, whatever the bytes.
    let mut from_reader = LogScanner::new();
    from_reader
        .process_reader(data)
        .expect("reading from a byte slice cannot fail");

    // On text input, the reader, one-shot and chunked paths give the same report.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let parsed = LogScanner::new().parse(text);

    let mut chunked = LogScanner::new();
    for piece in text.split_inclusive(|c: char| c == '!' || c == '\n' || c == '\r') {
        chunked.update(piece);
    }
    let chunked = chunked.finish();

    assert_eq!(from_reader.report(), &parsed);
    assert_eq!(parsed, chunked);
});
