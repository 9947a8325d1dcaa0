//! URL-safe identifiers derived from titles and names.

/// Turn a human-readable title into a slug.
///
/// The input is trimmed and lowercased, anything that is not an ASCII letter,
/// digit, whitespace, `-` or `_` is dropped, and every run of whitespace,
/// hyphens or underscores becomes a single `-`.
///
/// Never fails; an input with nothing usable in it yields an empty string.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    slug
}
