//! Paging cursors for time-windowed activity feeds.
//!
//! A polling session starts by exchanging a timestamp for a paging token at
//! `activities/pagingtoken.json`. From then on every page carries the cursor
//! for the next one in its envelope; the paging-token endpoint is not called
//! again for the same session.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone};

use super::envelope::ApiEnvelope;
use super::error::{ApiError, Result};

/// Path of the paging-token endpoint, relative to the REST base.
pub const PAGING_TOKEN_PATH: &str = "activities/pagingtoken.json";

/// Wire format for `sinceDatetime`, e.g. `2016-04-07T10:00-0800`.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M%z";

/// Naive layouts accepted for a start timestamp, tried in order.
const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts accepted for a start timestamp (midnight is assumed).
const NAIVE_DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Layouts that carry their own offset.
const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M%z", "%Y-%m-%d %H:%M%z", "%Y-%m-%dT%H:%M:%S%z"];

/// An opaque continuation token anchored at a start timestamp.
#[derive(Clone, PartialEq, Eq)]
pub struct PagingCursor(String);

impl PagingCursor {
    /// Wrap a token returned by the API.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, as sent in the `nextPageToken` query parameter.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PagingCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PagingCursor").field(&self.0).finish()
    }
}

impl fmt::Display for PagingCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a user-supplied timestamp to the `sinceDatetime` wire format.
///
/// Naive timestamps are interpreted in the local timezone.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the timestamp cannot be parsed.
pub fn normalize_since(input: &str) -> Result<String> {
    normalize_since_in(input, &Local)
}

/// Normalize a timestamp, interpreting naive values in `tz`.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the timestamp cannot be parsed or does
/// not exist in `tz`.
pub fn normalize_since_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<String> {
    parse_since(input, tz).map(|dt| dt.format(WIRE_FORMAT).to_string())
}

fn parse_since<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ApiError::InvalidInput(
            "start date-time cannot be empty".to_string(),
        ));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(input, layout) {
            return Ok(dt);
        }
    }

    let naive = NAIVE_DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(input, layout).ok())
        .or_else(|| {
            NAIVE_DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(input, layout).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            ApiError::InvalidInput(format!("couldn't parse date-time '{}'", input))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| {
            let offset = dt.offset().fix();
            dt.with_timezone(&offset)
        })
        .ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "date-time '{}' does not exist in the local timezone",
                input
            ))
        })
}

/// Build the relative path that requests a paging token for `since`.
///
/// # Errors
///
/// Returns `ApiError::InvalidInput` if the timestamp cannot be parsed.
pub fn paging_token_path(since: &str) -> Result<String> {
    let normalized = normalize_since(since)?;
    Ok(format!(
        "{}?sinceDatetime={}",
        PAGING_TOKEN_PATH,
        urlencoding::encode(&normalized)
    ))
}

/// Extract the cursor from a paging-token response.
///
/// # Errors
///
/// Returns `ApiError::Api` if the API rejected the request and
/// `ApiError::InvalidResponse` if no token was returned.
pub fn cursor_from_envelope<T>(envelope: ApiEnvelope<T>) -> Result<PagingCursor> {
    envelope
        .into_result()?
        .next_page_token
        .filter(|token| !token.is_empty())
        .map(PagingCursor::new)
        .ok_or_else(|| ApiError::InvalidResponse("response has no nextPageToken".to_string()))
}

/// Carries the continuation cursor from page to page.
#[derive(Debug, Clone)]
pub struct Pager {
    cursor: PagingCursor,
    exhausted: bool,
}

impl Pager {
    /// Start a session from a cursor obtained from the paging-token endpoint.
    pub fn new(cursor: PagingCursor) -> Self {
        Self {
            cursor,
            exhausted: false,
        }
    }

    /// The cursor to send with the next listing call.
    pub fn cursor(&self) -> &PagingCursor {
        &self.cursor
    }

    /// Whether the last page reported no further results.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Move to the cursor returned in a page's envelope.
    ///
    /// Returns `true` if another page should be requested. When the server
    /// omits `moreResults`, a fresh token is taken to mean there is more.
    pub fn advance<T>(&mut self, page: &ApiEnvelope<T>) -> bool {
        let next = page.next_page_token.as_deref().filter(|t| !t.is_empty());

        if let Some(token) = next {
            self.cursor = PagingCursor::new(token);
        }

        let more = match page.more_results {
            Some(more) => more && next.is_some(),
            None => next.is_some(),
        };
        self.exhausted = !more;
        more
    }
}
