use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Format an OffsetDateTime as RFC 3339 for consistent timestamp storage.
pub fn format_rfc3339(dt: OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

pub fn parse_rfc3339(timestamp: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(timestamp, &Rfc3339).ok()
}

/// A record expires once `now` has passed its expiry. Unparseable timestamps
/// are treated as expired (fail closed).
pub fn is_expired(timestamp: &str, now: OffsetDateTime) -> bool {
    match parse_rfc3339(timestamp) {
        Some(expires) => now > expires,
        None => true,
    }
}
