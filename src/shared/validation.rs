use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating block labels
    /// A block is a single uppercase letter
    /// - Valid: "A", "B", "Z"
    /// - Invalid: "", "a", "AB", "1", " A"
    pub static ref BLOCK_REGEX: Regex = Regex::new(r"^[A-Z]$").unwrap();
}

/// Normalize a stored block label.
///
/// Whitespace is trimmed; anything that is not a valid block label collapses
/// to `None` so that scoping comparisons never match on empty values.
pub fn normalize_block(block: Option<&str>) -> Option<String> {
    let trimmed = block?.trim();
    if BLOCK_REGEX.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
