//! Category slugs.
//!
//! A slug is the lowercase, dash-separated form of a category name used in
//! URLs:
//! - `Python` → `python`
//! - `Other Frameworks` → `other-frameworks`
//! - `C++ & Rust!` → `c-rust`
//!
//! Names made only of punctuation produce an empty slug, which callers must
//! reject since it can't address anything.

/// Derive the slug for a category name.
pub fn category_slug(name: &str) -> String {
    ::slug::slugify(name)
}

/// True if `s` is already in slug form: non-empty, lowercase ASCII letters,
/// digits and single interior dashes.
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
