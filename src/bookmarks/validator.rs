//! Field-level checks for create and update requests.
//!
//! Every check stops at the first violation; callers get exactly one error.

use serde_json::Value as JsonValue;
use url::Url;

use crate::error::{BookmarkError, BookmarkResult};
use crate::model::{BookmarkDraft, CreateBookmark, UpdateBookmark};

pub const MIN_RATING: i64 = 0;
pub const MAX_RATING: i64 = 5;

const WEB_SCHEMES: &[&str] = &["http", "https"];

/// Validates a create request and normalizes it into a draft ready for the store.
///
/// Required fields are checked in the order title, url, rating. The rating
/// range check runs only once all of them are present, followed by the url check.
pub fn validate_create(input: CreateBookmark) -> BookmarkResult<BookmarkDraft> {
    let title = required_text("title", input.title)?;
    let url = required_text("url", input.url)?;
    let raw_rating = match input.rating {
        Some(value) if !is_blank(&value) => value,
        _ => return Err(BookmarkError::MissingField("rating")),
    };

    let rating = parse_rating(&raw_rating)?;
    validate_url(&url)?;

    Ok(BookmarkDraft {
        title,
        url,
        description: input.description,
        rating,
    })
}

/// Applies the rating and url checks to whichever fields the update names.
///
/// Absent fields are neither required nor checked. An explicitly empty title is
/// rejected since a stored title can never be empty.
pub fn validate_update(input: &UpdateBookmark) -> BookmarkResult<()> {
    if let Some(title) = &input.title {
        if title.is_empty() {
            return Err(BookmarkError::MissingField("title"));
        }
    }
    if let Some(rating) = &input.rating {
        parse_rating(rating)?;
    }
    if let Some(url) = &input.url {
        validate_url(url)?;
    }
    Ok(())
}

/// Coerces a rating to an integer in `[MIN_RATING, MAX_RATING]`.
///
/// Accepts JSON integers, floats without a fractional part and numeric strings.
pub fn parse_rating(value: &JsonValue) -> BookmarkResult<i64> {
    let invalid = || BookmarkError::InvalidRating(rating_repr(value));

    let number = match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
    .ok_or_else(invalid)?;

    if !(MIN_RATING..=MAX_RATING).contains(&number) {
        return Err(invalid());
    }
    Ok(number)
}

/// Accepts absolute `http`/`https` URIs with a host.
pub fn validate_url(raw: &str) -> BookmarkResult<()> {
    if is_web_uri(raw) {
        Ok(())
    } else {
        Err(BookmarkError::InvalidUrl(raw.to_string()))
    }
}

fn is_web_uri(raw: &str) -> bool {
    if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    // The url crate repairs inputs like "http:/host"; insist on the authority marker.
    let Some((scheme, rest)) = raw.split_once(':') else {
        return false;
    };
    if !WEB_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) || !rest.starts_with("//") {
        return false;
    }

    match Url::parse(raw) {
        Ok(parsed) => parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

fn required_text(field: &'static str, value: Option<String>) -> BookmarkResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BookmarkError::MissingField(field)),
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

fn whole_number(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn rating_repr(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
