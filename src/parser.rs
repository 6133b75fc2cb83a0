//! Field extraction from a fetched product page.
//!
//! Each field is located by an ordered chain of strategies; the first one that
//! produces a usable value wins.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::SiteConfig;
use crate::error::{AppError, ExtractionError, Result};
use crate::product::ProductResult;

/// A rupee sign immediately followed by digits, e.g. `₹499`. The digits are
/// capture group 1.
///
/// Used both on selector text and, as a last resort, on the raw markup.
pub const PRICE_PATTERN: &str = r"₹(\d+)";

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(PRICE_PATTERN).expect("Failed to compile price pattern")
});

mod selectors {
    use super::*;

    fn parse(css: &str) -> Selector {
        Selector::parse(css).expect("Failed to parse selector")
    }

    pub static TITLE_TEST_ID: Lazy<Selector> =
        Lazy::new(|| parse(r#"h1[data-testid="product-title"]"#));
    pub static TITLE_CLASS: Lazy<Selector> = Lazy::new(|| parse("h1.product-title"));
    pub static TITLE_HEADING: Lazy<Selector> =
        Lazy::new(|| parse(r#"h1[class*="title"], h1[class*="Title"]"#));
    pub static DOCUMENT_TITLE: Lazy<Selector> = Lazy::new(|| parse("title"));

    pub static PRICE_CONTAINER: Lazy<Selector> = Lazy::new(|| parse(".pdp-price"));
    pub static PRICE_TEST_ID: Lazy<Selector> =
        Lazy::new(|| parse(r#"span[data-testid="price"]"#));
    pub static PRICE_OBFUSCATED: Lazy<Selector> = Lazy::new(|| parse("span.CxNYUP"));
    pub static PRICE_HEADING: Lazy<Selector> = Lazy::new(|| parse("h4"));

    pub static IMAGE: Lazy<Selector> = Lazy::new(|| parse("img"));
}

type TitleStrategy = fn(&ProductParser, &Html) -> Option<String>;

const TITLE_STRATEGIES: &[(&str, TitleStrategy)] = &[
    ("test-id", title_by_test_id),
    ("class", title_by_class),
    ("heading", title_by_heading),
    ("document-title", ProductParser::document_title),
];

fn title_by_test_id(_: &ProductParser, document: &Html) -> Option<String> {
    first_text(document, &selectors::TITLE_TEST_ID)
}

fn title_by_class(_: &ProductParser, document: &Html) -> Option<String> {
    first_text(document, &selectors::TITLE_CLASS)
}

fn title_by_heading(_: &ProductParser, document: &Html) -> Option<String> {
    first_text(document, &selectors::TITLE_HEADING)
}

static PRICE_SELECTORS: [(&str, &Lazy<Selector>); 4] = [
    ("container", &selectors::PRICE_CONTAINER),
    ("test-id", &selectors::PRICE_TEST_ID),
    ("obfuscated-class", &selectors::PRICE_OBFUSCATED),
    ("heading", &selectors::PRICE_HEADING),
];

const PLACEHOLDER_MARKER: &str = "placeholder";

/// Reads title, price and images out of product page markup for one site.
#[derive(Debug, Clone)]
pub struct ProductParser {
    site: SiteConfig,
    title_suffix: Regex,
}

impl ProductParser {
    pub fn new(site: SiteConfig) -> Result<Self> {
        let pattern = format!(r"(?i)\s*[-|–]\s*{}\s*$", regex::escape(&site.name));
        let title_suffix = Regex::new(&pattern)
            .map_err(|e| AppError::ConfigError(format!("Invalid site name pattern: {}", e)))?;

        Ok(ProductParser { site, title_suffix })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Runs every field chain over `html` and applies the completeness gates.
    ///
    /// A missing title fails with `TitleOrPriceNotFound`; a missing price with
    /// a known title fails with `PriceNotFound`.
    pub fn parse(&self, html: &str) -> std::result::Result<ProductResult, ExtractionError> {
        let document = Html::parse_document(html);

        let title = self.title(&document);
        let price = self.price(&document, html);

        let (title, price) = match (title, price) {
            (Some(title), Some(price)) => (title, price),
            (Some(_), None) => return Err(ExtractionError::PriceNotFound),
            (None, _) => return Err(ExtractionError::TitleOrPriceNotFound),
        };

        let images = self.images(&document);
        if images.is_empty() {
            return Err(ExtractionError::NoImagesFound);
        }

        Ok(ProductResult { title, price, images })
    }

    pub fn title(&self, document: &Html) -> Option<String> {
        TITLE_STRATEGIES.iter().find_map(|(name, strategy)| {
            let title = strategy(self, document).map(|t| collapse_whitespace(&t))?;
            if title.is_empty() {
                return None;
            }
            debug!(strategy = name, "title found");
            Some(title)
        })
    }

    fn document_title(&self, document: &Html) -> Option<String> {
        let raw = first_text(document, &selectors::DOCUMENT_TITLE)?;
        let stripped = self.title_suffix.replace(raw.trim(), "");
        let stripped = stripped.trim();
        (!stripped.is_empty()).then(|| stripped.to_string())
    }

    /// Tries each price selector in turn, then the whole raw markup.
    pub fn price(&self, document: &Html, raw_html: &str) -> Option<u64> {
        let from_selectors = PRICE_SELECTORS.iter().find_map(|(name, selector)| {
            let text: String = document
                .select(selector)
                .map(|element| element_text(&element))
                .collect();
            let price = parse_price(&text)?;
            debug!(strategy = name, price, "price found");
            Some(price)
        });

        from_selectors.or_else(|| {
            let price = parse_price(raw_html)?;
            debug!(price, "price found by scanning raw markup");
            Some(price)
        })
    }

    /// Collects image URLs that belong to the site, absolute and deduplicated.
    pub fn images(&self, document: &Html) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for element in document.select(&selectors::IMAGE) {
            let attrs = element.value();
            let src = attrs
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| attrs.attr("data-src"))
                .map(str::trim)
                .filter(|s| !s.is_empty());

            let Some(src) = src else {
                continue;
            };

            if !src.contains(&self.site.image_marker) || src.contains(PLACEHOLDER_MARKER) {
                continue;
            }

            let url = normalize_image_url(src);
            if seen.insert(url.clone()) {
                images.push(url);
            }
        }

        debug!(count = images.len(), "images collected");
        images
    }
}

/// First currency-prefixed integer in `text`. Zero and values that do not fit
/// a `u64` count as no price.
pub fn parse_price(text: &str) -> Option<u64> {
    let digits = PRICE_RE.captures(text)?.get(1)?.as_str();
    digits.parse::<u64>().ok().filter(|price| *price > 0)
}

/// Turns `//host/path` into `https://host/path`; anything else is returned
/// unchanged.
pub fn normalize_image_url(src: &str) -> String {
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => src.to_string(),
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| element_text(&element).trim().to_string())
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProductParser {
        ProductParser::new(SiteConfig::default()).unwrap()
    }

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{}</head><body>{}</body></html>", head, body)
    }

    const IMAGES: &str = r#"
        <img src="https://images.meesho.com/images/products/1/a.jpg">
        <img src="https://images.meesho.com/images/products/1/b.jpg">
    "#;

    #[test]
    fn title_prefers_test_id_over_other_strategies() {
        let html = page(
            "<title>Fallback - Meesho</title>",
            r#"<h1 class="product-title">By class</h1>
               <h1 data-testid="product-title">  Cotton
                  Saree  </h1>"#,
        );
        let doc = Html::parse_document(&html);

        assert_eq!(parser().title(&doc).as_deref(), Some("Cotton Saree"));
    }

    #[test]
    fn title_falls_through_empty_matches() {
        let html = page(
            "",
            r#"<h1 data-testid="product-title">   </h1>
               <h1 class="sc-ProductTitle-x">Silk Kurta</h1>"#,
        );
        let doc = Html::parse_document(&html);

        assert_eq!(parser().title(&doc).as_deref(), Some("Silk Kurta"));
    }

    #[test]
    fn document_title_has_site_suffix_stripped() {
        let html = page("<title>Printed Dupatta | MEESHO </title>", "");
        let doc = Html::parse_document(&html);

        assert_eq!(parser().title(&doc).as_deref(), Some("Printed Dupatta"));
    }

    #[test]
    fn title_that_is_only_the_site_name_is_absent() {
        let html = page("<title> - Meesho</title>", "");
        let doc = Html::parse_document(&html);

        assert_eq!(parser().title(&doc), None);
    }

    #[test]
    fn price_pattern_requires_adjacent_digits() {
        assert_eq!(parse_price("Only ₹499 today"), Some(499));
        assert_eq!(parse_price("₹ 499"), None);
        assert_eq!(parse_price("Rs. 499"), None);
        assert_eq!(parse_price("₹0"), None);
    }

    #[test]
    fn price_from_selector_beats_earlier_markup() {
        let html = page(
            "",
            r#"<p>was ₹999</p><span data-testid="price">₹349</span>"#,
        );
        let doc = Html::parse_document(&html);

        assert_eq!(parser().price(&doc, &html), Some(349));
    }

    #[test]
    fn price_selectors_without_currency_are_skipped() {
        let html = page(
            "",
            r#"<div class="pdp-price">Free delivery</div><h4>₹215</h4>"#,
        );
        let doc = Html::parse_document(&html);

        assert_eq!(parser().price(&doc, &html), Some(215));
    }

    #[test]
    fn price_falls_back_to_raw_markup() {
        let html = page(
            r#"<script>window.__STATE__ = {"label":"₹499"}</script>"#,
            "<p>No price here</p>",
        );
        let doc = Html::parse_document(&html);

        assert_eq!(parser().price(&doc, &html), Some(499));
    }

    #[test]
    fn images_are_filtered_normalized_and_deduplicated() {
        let html = page(
            "",
            r#"
            <img src="//images.meesho.com/p/1.jpg">
            <img src="https://images.meesho.com/p/1.jpg">
            <img src="https://cdn.other.com/p/2.jpg">
            <img src="https://images.meesho.com/placeholder.png">
            <img data-src="https://images.meesho.com/p/3.jpg">
            <img src="" data-src="//images.meesho.com/p/4.jpg">
            <img>
            "#,
        );
        let doc = Html::parse_document(&html);

        assert_eq!(
            parser().images(&doc),
            vec![
                "https://images.meesho.com/p/1.jpg",
                "https://images.meesho.com/p/3.jpg",
                "https://images.meesho.com/p/4.jpg",
            ]
        );
    }

    #[test]
    fn full_page_parses() {
        let html = page(
            "<title>Cotton Saree - Meesho</title>",
            &format!(r#"<span class="CxNYUP">₹799</span>{}"#, IMAGES),
        );

        let product = parser().parse(&html).unwrap();

        assert_eq!(product.title, "Cotton Saree");
        assert_eq!(product.price, 799);
        assert_eq!(product.images.len(), 2);
    }

    #[test]
    fn missing_price_with_title_is_price_not_found() {
        let html = page("", &format!(r#"<h1 class="product-title">Saree</h1>{}"#, IMAGES));

        assert_eq!(parser().parse(&html), Err(ExtractionError::PriceNotFound));
    }

    #[test]
    fn missing_title_is_title_or_price_not_found() {
        let html = page("", &format!("<h4>₹100</h4>{}", IMAGES));

        assert_eq!(parser().parse(&html), Err(ExtractionError::TitleOrPriceNotFound));
    }

    #[test]
    fn no_qualifying_images_fails_even_with_title_and_price() {
        let html = page(
            "<title>Saree - Meesho</title>",
            r#"<h4>₹100</h4><img src="https://cdn.other.com/x.jpg">"#,
        );

        assert_eq!(parser().parse(&html), Err(ExtractionError::NoImagesFound));
    }

    #[test]
    fn parsing_is_repeatable() {
        let html = page(
            "<title>Saree - Meesho</title>",
            &format!("<h4>₹100</h4>{}", IMAGES),
        );
        let parser = parser();

        assert_eq!(parser.parse(&html), parser.parse(&html));
    }
}
