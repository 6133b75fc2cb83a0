use serde::Deserialize;

#[derive(Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub price: u64,
    #[serde(default)]
    pub margin_percent: Option<u32>,
    #[serde(default)]
    pub images: Vec<String>,
}
