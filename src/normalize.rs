//! Title normalization.
//!
//! Every downstream component keys on the normalized form, so absent input is
//! mapped to [`UNKNOWN_PRODUCT`] here instead of being carried as `None`.

use crate::constants::UNKNOWN_PRODUCT;

/// Canonicalizes a raw title: trimmed and lower-cased.
///
/// `None` and the `nan` marker left behind by tabular exports normalize to
/// [`UNKNOWN_PRODUCT`]. Empty and whitespace-only strings are treated as
/// absent too, so they share that one cache key instead of an empty one.
pub fn normalize_title(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_PRODUCT.to_string();
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return UNKNOWN_PRODUCT.to_string();
    }

    trimmed.to_lowercase()
}
