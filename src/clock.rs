use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// RFC 3339 UTC timestamp used for decision stamps and relay envelopes.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("utc timestamp must format as rfc3339")
}
