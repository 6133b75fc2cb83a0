use serde::Serialize;

/// A successfully extracted product listing.
///
/// `title` is non-empty, `price` is positive and `images` holds at least one
/// absolute URL with no duplicates, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductResult {
    pub title: String,
    pub price: u64,
    pub images: Vec<String>,
}
