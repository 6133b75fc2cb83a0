use serde::Serialize;

use crate::error::{AppError, Result};

pub const DEFAULT_MARGIN_PERCENT: u32 = 20;
pub const MAX_MARGIN_PERCENT: u32 = 200;
/// Most images bundled into a single share.
pub const MAX_SHARED_IMAGES: usize = 5;

/// Resale markup as a whole percentage, `0..=200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin(u32);

impl Margin {
    pub fn new(percent: u32) -> Result<Self> {
        if percent > MAX_MARGIN_PERCENT {
            return Err(AppError::InvalidQuote(format!(
                "Margin must be between 0 and {}%",
                MAX_MARGIN_PERCENT
            )));
        }
        Ok(Margin(percent))
    }

    pub fn percent(self) -> u32 {
        self.0
    }

    /// `price * percent / 100`, halves rounded up.
    pub fn amount_on(self, price: u64) -> u64 {
        let amount = (u128::from(price) * u128::from(self.0) + 50) / 100;
        u64::try_from(amount).unwrap_or(u64::MAX)
    }
}

impl Default for Margin {
    fn default() -> Self {
        Margin(DEFAULT_MARGIN_PERCENT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub url: String,
    pub file_name: String,
}

/// Everything the storefront needs to relist a product at a markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub price: u64,
    pub margin_percent: u32,
    pub margin_amount: u64,
    pub selling_price: u64,
    pub share_text: String,
    pub share_images: Vec<String>,
    pub downloads: Vec<Download>,
}

pub fn quote(price: u64, margin: Margin, images: &[String]) -> Result<Quote> {
    if price == 0 {
        return Err(AppError::InvalidQuote("Price must be a positive number".to_string()));
    }

    let margin_amount = margin.amount_on(price);
    let selling_price = price
        .checked_add(margin_amount)
        .ok_or_else(|| AppError::InvalidQuote("Price is too large".to_string()))?;

    let downloads = images
        .iter()
        .enumerate()
        .map(|(i, url)| Download {
            url: url.clone(),
            file_name: download_name(i),
        })
        .collect();

    Ok(Quote {
        price,
        margin_percent: margin.percent(),
        margin_amount,
        selling_price,
        share_text: share_text(selling_price),
        share_images: share_images(images).to_vec(),
        downloads,
    })
}

pub fn share_text(selling_price: u64) -> String {
    format!("Price: ₹{}", selling_price)
}

pub fn share_images(images: &[String]) -> &[String] {
    &images[..images.len().min(MAX_SHARED_IMAGES)]
}

/// File name for the `index`th downloaded image, counting from zero.
pub fn download_name(index: usize) -> String {
    format!("meesho-product-{}.jpg", index + 1)
}
