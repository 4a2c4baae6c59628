//! Whitespace normalization utilities.
//!
//! Uses Unicode's definition of whitespace, so tabs, newlines and
//! non-breaking spaces all count as separators.
//!
//! ```rust
//! use canonical::collapse_whitespace;
//!
//! let normalized = collapse_whitespace("  pho   bo  ");
//! assert_eq!(normalized, "pho bo");
//! ```

/// Collapses repeated whitespace into single ASCII spaces and trims the edges.
///
/// Returns an empty string for empty or whitespace-only input.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("com\t\tga\r\nxoi mo"), "com ga xoi mo");
/// assert_eq!(collapse_whitespace("bun\u{00A0}cha"), "bun cha");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
