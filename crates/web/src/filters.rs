//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

const MAX_STARS: usize = 5;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a 0-5 rating as filled and empty stars, rounded to the nearest
/// whole star.
///
/// Usage in templates: `{{ listing.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&rating.to_string()))
}

/// "1 night", "3 nights".
///
/// Usage in templates: `{{ quote.nights|nights }}`
#[askama::filter_fn]
pub fn nights(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let count = count.to_string();
    Ok(if count == "1" {
        "1 night".to_string()
    } else {
        format!("{count} nights")
    })
}

fn star_string(rating: &str) -> String {
    let filled = rating
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .map_or(0, |r| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            // Clamped to 0..=5 before the cast
            let n = r.round().clamp(0.0, 5.0) as usize;
            n
        });

    let mut out = "★".repeat(filled);
    out.push_str(&"☆".repeat(MAX_STARS - filled));
    out
}
