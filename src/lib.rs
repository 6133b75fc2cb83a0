pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod pricing;
pub mod product;

use std::sync::Arc;
use config::Config;
use error::Result;
use extractor::Extractor;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractor: Extractor,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let extractor = Extractor::new(&config)?;
        Ok(AppState {
            config: Arc::new(config),
            extractor,
        })
    }
}
