use crate::models::ocr_result::FilteredLine;
use regex::Regex;
use std::sync::OnceLock;

/// Characters kept by the filter: the basic Russian alphabet а-я / А-Я.
/// `ё` and `Ё` lie outside both ranges and are stripped.
pub const ALPHABET_PATTERN: &str = "а-яА-Я";

fn non_alphabet() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("[^{}]", ALPHABET_PATTERN)).expect("alphabet pattern is a valid regex")
    })
}

/// Strip every character outside the alphabet and uppercase the rest
pub fn clean_line(line: &str) -> String {
    non_alphabet().replace_all(line, "").to_uppercase()
}

/// Turn raw recognized text into numbered, cleaned lines
///
/// Lines that are empty before cleaning are dropped; lines that become
/// empty only after cleaning are kept. Indices are 1-based and contiguous
/// over the kept lines.
pub fn filter_text(raw: &str) -> Vec<FilteredLine> {
    raw.split('\n')
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| FilteredLine::new(i + 1, clean_line(line)))
        .collect()
}
