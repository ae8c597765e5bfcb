use outreach_proto::constants::DATE_NOT_AVAILABLE;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Parse a stored creation stamp. Accepts RFC 3339 timestamps, bare
/// `YYYY-MM-DD` dates, and epoch milliseconds.
pub fn parse_date_created(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(odt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(odt.to_offset(UtcOffset::UTC).date());
    }

    if let Ok(d) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(d);
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok())
        .map(|odt| odt.date())
}

/// Render the "Date Created" cell: `M/D/YYYY` for a valid stamp, `N/A`
/// otherwise. Never consults the current time.
pub fn format_date_created(raw: Option<&str>) -> String {
    let fmt = format_description!("[month padding:none]/[day padding:none]/[year]");
    raw.and_then(parse_date_created)
        .and_then(|d| d.format(fmt).ok())
        .unwrap_or_else(|| DATE_NOT_AVAILABLE.to_string())
}

/// The current time as the store expects a creation stamp.
pub fn now_rfc3339() -> String {
    #[allow(clippy::disallowed_methods)]
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
