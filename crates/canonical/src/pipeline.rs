use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::CanonicalizeConfig;
use crate::error::CanonicalError;
use crate::whitespace::collapse_whitespace;

/// Normalizes `input` with the default configuration.
///
/// ```rust
/// assert_eq!(canonical::normalize("Phở Bò!"), "pho bo");
/// ```
pub fn normalize(input: &str) -> String {
    normalize_text(input, &CanonicalizeConfig::default())
}

/// Folds free text into its canonical matching form.
///
/// The output only contains ASCII lowercase letters, ASCII digits and
/// whitespace, so feeding it back in returns it unchanged.
pub fn normalize_text(input: &str, cfg: &CanonicalizeConfig) -> String {
    let mut folded = String::with_capacity(input.len());

    if cfg.strip_diacritics {
        // NFD splits "ở" into 'o' + combining marks so the marks can be dropped.
        for ch in input.nfd() {
            if ch.is_mark() {
                continue;
            }
            push_folded(ch, cfg, &mut folded);
        }
    } else {
        for ch in input.chars() {
            push_folded(ch, cfg, &mut folded);
        }
    }

    if cfg.collapse_whitespace {
        collapse_whitespace(&folded)
    } else {
        let trimmed = folded.trim();
        if trimmed.len() == folded.len() {
            folded
        } else {
            trimmed.to_string()
        }
    }
}

/// Builds a non-empty canonical key for catalog entries.
pub fn canonical_key(input: &str, cfg: &CanonicalizeConfig) -> Result<String, CanonicalError> {
    cfg.validate()?;
    let key = normalize_text(input, cfg);
    if key.is_empty() {
        return Err(CanonicalError::EmptyKey(input.to_string()));
    }
    Ok(key)
}

fn push_folded(ch: char, cfg: &CanonicalizeConfig, out: &mut String) {
    let ch = if cfg.fold_stroked_letters {
        fold_stroked(ch)
    } else {
        ch
    };

    if cfg.lowercase {
        // Lowercasing can expand one char into several (e.g. 'İ' -> "i\u{307}").
        for lower in ch.to_lowercase() {
            push_filtered(lower, out);
        }
    } else {
        push_filtered(ch, out);
    }
}

#[inline]
fn push_filtered(ch: char, out: &mut String) {
    if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() {
        out.push(ch);
    } else {
        out.push(' ');
    }
}

/// Letters with a stroke have no canonical decomposition, so NFD leaves them alone.
fn fold_stroked(ch: char) -> char {
    match ch {
        'đ' | 'ð' => 'd',
        'Đ' | 'Ð' => 'D',
        'ł' => 'l',
        'Ł' => 'L',
        'ø' => 'o',
        'Ø' => 'O',
        'ħ' => 'h',
        'Ħ' => 'H',
        other => other,
    }
}
