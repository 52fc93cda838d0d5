//! Extract structured recipes from untrusted links, videos and images,
//! and render them as chat messages, markdown documents or Cooklang.

pub mod cache;
pub mod config;
pub mod error;
pub mod html;
pub mod model;
pub mod net;
pub mod oracle;
pub mod pipeline;
pub mod render;
pub mod storage;
pub mod subtitles;
pub mod validate;
pub mod video;

pub use cache::RecipeCache;
pub use config::AppConfig;
pub use error::ExtractError;
pub use model::{Recipe, VideoMetadata};
pub use pipeline::RecipeExtractor;
pub use render::OutputFormat;

use oracle::GeminiOracle;

/// Build an extractor from configuration, wired to the default oracle.
pub fn build_extractor(config: &AppConfig) -> Result<RecipeExtractor, ExtractError> {
    let oracle = GeminiOracle::new(&config.gemini)?;
    Ok(RecipeExtractor::new(config, Box::new(oracle)))
}

/// One-shot extraction: load configuration and extract a recipe from a URL.
pub async fn extract_recipe(url: &str) -> Result<Recipe, ExtractError> {
    let config = AppConfig::load()?;
    let extractor = build_extractor(&config)?;
    extractor.extract_from_url(url).await
}

/// One-shot import: extract from a URL and render in the requested format.
pub async fn import_recipe(url: &str, format: OutputFormat) -> Result<String, ExtractError> {
    let recipe = extract_recipe(url).await?;
    Ok(format.render(&recipe))
}
