use std::borrow::Cow;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use validator::{ValidationError, ValidationErrors};

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

pub fn single_error(field: &'static str, code: &'static str, msg: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, new_validation_error(code, msg));
    errors
}

pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

pub fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    validate_http_url(url)?;
    let path = url.split(['?', '#']).next().unwrap_or_default().to_lowercase();
    let is_image = [".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp"]
        .iter()
        .any(|ext| path.ends_with(ext));
    if !is_image {
        return Err(new_validation_error("invalid_image_url", "Logo must be a valid image URL"));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(new_validation_error("slug_empty", "Title must contain at least one letter or digit"));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(new_validation_error("slug_invalid_chars", "Slug must contain only lowercase letters, digits, or hyphens"));
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(new_validation_error("slug_hyphens", "Slug must not have leading, trailing or repeated hyphens"));
    }
    Ok(())
}

/// Rejects empty entries and entries longer than `max` characters.
pub fn check_entries(items: &[String], max: usize, msg: &'static str) -> Result<(), ValidationError> {
    if items.iter().any(|item| item.is_empty() || item.chars().count() > max) {
        return Err(new_validation_error("invalid_entry_length", msg));
    }
    Ok(())
}

/// Trims every entry, drops blanks and keeps the first occurrence of duplicates.
pub fn tidy_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

pub fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Whole calendar months between two dates, never negative.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let months = (end.year() - start.year()) as i64 * 12 + end.month() as i64 - start.month() as i64;
    months.max(0)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human span used by project and experience projections.
pub fn describe_span(start: NaiveDate, end: NaiveDate) -> String {
    let days = (end - start).num_days().abs();
    if days < 30 {
        return plural(days, "day");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    let years = days / 365;
    let months = (days % 365) / 30;
    if months == 0 {
        plural(years, "year")
    } else {
        format!("{} {}", plural(years, "year"), plural(months, "month"))
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let minutes = (to - from).num_minutes() as f64;
    (minutes / 60.0 * 100.0).round() / 100.0
}
