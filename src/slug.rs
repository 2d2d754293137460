/// slugify
///
/// Derives the URL-safe identifier for a display name: trim, lowercase, turn each
/// space into a hyphen, then drop everything that is not an ASCII letter, digit or hyphen.
///
/// Total and idempotent. Uniqueness is the store's concern, not this function's.
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}
