use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Matches JS encodeURIComponent: everything except ASCII alphanumerics and
// -_.!~*'() is escaped, so mail clients decode the prefilled draft the way a
// browser would have produced it.
const MAILTO_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds the manual-routing fallback link with a prefilled subject and body.
pub fn mailto_url(recipient: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        recipient,
        utf8_percent_encode(subject, MAILTO_COMPONENT),
        utf8_percent_encode(body, MAILTO_COMPONENT),
    )
}
