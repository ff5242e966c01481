use std::sync::OnceLock;

use regex::Regex;

/// Collapses every internal whitespace run to a single space, trims the ends,
/// and caps the result at `max_chars` characters. Caps count characters, not
/// bytes, so a multibyte name is never split mid-scalar.
pub fn clean(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    collapsed.chars().take(max_chars).collect()
}

/// Shape check only: something before the `@`, something after it, and a dot
/// in the domain part. Deliverability is the relay recipient's problem.
pub fn email_shape_ok(email: &str) -> bool {
    email_pattern().is_match(email)
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape pattern must compile")
    })
}
