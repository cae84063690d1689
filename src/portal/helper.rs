//! Helper functions for reading e-st portal HTML and chart values.
//!
//! This module provides utility functions for:
//! - Building CSS selectors with typed errors
//! - Checking for elements and reading their attributes
//! - Parsing locale-formatted decimal numbers

use crate::error::ExtractionError;
use scraper::{Html, Selector};

/// Creates a CSS selector from a string.
///
/// Selectors used by this crate are compile-time constants, so a parse failure
/// is reported as a malformed payload rather than panicking.
pub fn html_selector(selector: &str) -> Result<Selector, ExtractionError> {
    match Selector::parse(selector) {
        Ok(s) => Ok(s),
        Err(e) => Err(ExtractionError::malformed_payload(format!(
            "failed to parse selector '{}': {}",
            selector, e
        ))),
    }
}

/// Returns the first selector in `selectors` that matches anything in `document`.
///
/// Invalid selectors are skipped.
pub fn first_match<'a>(document: &Html, selectors: &[&'a str]) -> Option<&'a str> {
    selectors.iter().copied().find(|selector| {
        html_selector(selector)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false)
    })
}

/// True when `selector` matches at least one element.
pub fn has_element(document: &Html, selector: &str) -> bool {
    first_match(document, &[selector]).is_some()
}

/// Reads `attribute` from the first element matching `selector`.
///
/// # Returns
///
/// * `Ok(None)` - no element matches
/// * `Ok(Some(None))` - the element exists without the attribute
/// * `Ok(Some(Some(value)))` - the attribute value
pub fn attribute_of(
    document: &Html,
    selector: &str,
    attribute: &str,
) -> Result<Option<Option<String>>, ExtractionError> {
    let selector = html_selector(selector)?;
    Ok(document
        .select(&selector)
        .next()
        .map(|element| element.value().attr(attribute).map(str::to_string)))
}

/// Collects the `value` attribute of every element matching `selector`.
pub fn values_of(document: &Html, selector: &str) -> Result<Vec<String>, ExtractionError> {
    let selector = html_selector(selector)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("value"))
        .map(|value| value.trim().to_string())
        .collect())
}

/// Lower-cased visible text of the whole document, for keyword checks.
pub fn document_text(document: &Html) -> String {
    document.root_element().text().collect::<String>().to_lowercase()
}

/// Parses a decimal number the way the portal renders it.
///
/// Accepts `.` or `,` as the decimal separator, spaces (including
/// non-breaking ones) as thousands separators and a leading minus.
///
/// # Example
///
/// ```no_run
/// assert_eq!(parse_decimal("1 234,5"), Some(1234.5));
/// assert_eq!(parse_decimal("0.9"), Some(0.9));
/// ```
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
