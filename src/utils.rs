//! # Utility Functions Module
//!
//! This module provides utility functions that improve code readability
//! and reduce boilerplate across the application.

/// Converts a vector of string-like items to Vec<String>.
///
/// This utility function accepts any iterable of items that can be converted
/// to String, eliminating repetitive `.to_string()` calls when building
/// subprocess argument vectors.
///
/// # Example
/// ```rust
/// use imgpress::utils::to_string_vec;
///
/// let quality = 16;
/// let args = to_string_vec(["--end-usage=q", &format!("--cq-level={}", quality)]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}
