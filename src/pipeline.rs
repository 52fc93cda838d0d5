//! The extraction pipeline: tiered source strategies and the fallback
//! driver that walks them.
//!
//! A URL is served by up to three strategies, tried in order of source
//! quality: the full video, the platform metadata, and finally the webpage
//! text. A strategy that fails for environmental reasons (network, missing
//! tool, nothing downloadable) hands over to the next tier; anything that
//! points at bad input or bad output stops the request.

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use tempfile::TempDir;

use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::html::{extract_page_text, extract_schema_recipe};
use crate::model::{Recipe, VideoMetadata};
use crate::net::{PageFetcher, UrlGuard};
use crate::oracle::{
    build_media_prompt, build_metadata_prompt, build_video_prompt, build_webpage_prompt,
    parse_oracle_response, MediaPart, RecipeOracle,
};
use crate::validate::validate_recipe;
use crate::video::{Platform, VideoTool};

/// Minimum characters of usable page text before the webpage tier asks
/// the model anything.
pub const MIN_CONTENT_LENGTH: usize = 100;
/// Page text cap for the webpage tier.
pub const MAX_WEBPAGE_TEXT: usize = 6000;
/// Page text cap when a URL merely accompanies a media file.
pub const MAX_CONTEXT_TEXT: usize = 4000;

/// State shared across strategies for one extraction request.
///
/// The video probe runs at most once; its result is kept here so the
/// metadata tier never repeats it.
struct ExtractionContext {
    url: String,
    platform: Option<Platform>,
    metadata: Option<VideoMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    VideoDownload,
    MetadataOnly,
    Webpage,
}

impl Strategy {
    const ALL: [Strategy; 3] = [
        Strategy::VideoDownload,
        Strategy::MetadataOnly,
        Strategy::Webpage,
    ];

    fn name(self) -> &'static str {
        match self {
            Strategy::VideoDownload => "video-download",
            Strategy::MetadataOnly => "metadata-only",
            Strategy::Webpage => "webpage",
        }
    }

    fn applicable(self, ctx: &ExtractionContext) -> bool {
        match self {
            Strategy::VideoDownload => ctx.platform.is_some(),
            Strategy::MetadataOnly => ctx
                .metadata
                .as_ref()
                .is_some_and(|m| m.has_text_content()),
            Strategy::Webpage => true,
        }
    }
}

/// Turns URLs and media files into validated [`Recipe`]s.
pub struct RecipeExtractor {
    guard: UrlGuard,
    fetcher: PageFetcher,
    video: VideoTool,
    oracle: Box<dyn RecipeOracle>,
    prompt: String,
    page_timeout: Duration,
}

impl RecipeExtractor {
    pub fn new(config: &AppConfig, oracle: Box<dyn RecipeOracle>) -> Self {
        let page_timeout = Duration::from_secs(config.fetch.page_timeout_secs);
        let guard = UrlGuard::new();
        Self {
            fetcher: PageFetcher::new(guard.clone(), Some(page_timeout)),
            guard,
            video: VideoTool::new(
                Duration::from_secs(config.fetch.metadata_timeout_secs),
                Duration::from_secs(config.fetch.download_timeout_secs),
            ),
            oracle,
            prompt: config.prompts.extraction.clone(),
            page_timeout,
        }
    }

    /// Replace the URL validator, e.g. to allow a test server on loopback.
    pub fn with_guard(mut self, guard: UrlGuard) -> Self {
        self.fetcher = PageFetcher::new(guard.clone(), Some(self.page_timeout));
        self.guard = guard;
        self
    }

    /// Extract a recipe from a URL, walking the strategy tiers until one
    /// produces a validated recipe.
    pub async fn extract_from_url(&self, url: &str) -> Result<Recipe, ExtractError> {
        self.guard.check(url)?;

        let mut ctx = ExtractionContext {
            url: url.to_string(),
            platform: Platform::detect(url),
            metadata: None,
        };
        match ctx.platform {
            Some(platform) => info!("extracting from {platform} video: {url}"),
            None => info!("extracting from webpage: {url}"),
        }

        let mut last_soft = None;
        for strategy in Strategy::ALL {
            if !strategy.applicable(&ctx) {
                debug!("skipping {}: not applicable", strategy.name());
                continue;
            }

            match self.run_strategy(strategy, &mut ctx).await {
                Ok(recipe) => {
                    validate_recipe(&recipe)?;
                    info!("recipe extracted via {}: {}", strategy.name(), recipe.title);
                    return Ok(recipe);
                }
                Err(e) if e.is_soft() => {
                    warn!("{} failed: {e}", strategy.name());
                    last_soft = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_soft.unwrap_or_else(|| {
            ExtractError::NoContent("no extraction source succeeded".to_string())
        }))
    }

    /// Extract a recipe from a local media file (photo or video), with an
    /// optional URL providing extra page context.
    pub async fn extract_from_media(
        &self,
        path: &Path,
        source_url: Option<&str>,
    ) -> Result<Recipe, ExtractError> {
        info!("extracting from media file: {}", path.display());
        let media = MediaPart::from_file(path).await?;
        self.extract_from_media_part(media, source_url).await
    }

    /// Extract a recipe from in-memory media bytes.
    ///
    /// The media is the primary source, so a context URL that fails
    /// validation is dropped rather than failing the request.
    pub async fn extract_from_media_part(
        &self,
        media: MediaPart,
        source_url: Option<&str>,
    ) -> Result<Recipe, ExtractError> {
        let source_url = source_url.filter(|url| match self.guard.check(url) {
            Ok(_) => true,
            Err(e) => {
                warn!("ignoring context URL: {e}");
                false
            }
        });

        let mut page_text = None;
        if let Some(url) = source_url {
            page_text = self.context_text(url).await;
        }

        let prompt = build_media_prompt(&self.prompt, source_url, page_text.as_deref());
        let response = self.oracle.extract(&prompt, Some(&media)).await?;

        let mut recipe = parse_oracle_response(&response, source_url)?;
        recipe.source_platform = source_url
            .and_then(Platform::detect)
            .map(|p| p.as_str().to_string());
        validate_recipe(&recipe)?;
        Ok(recipe)
    }

    async fn run_strategy(
        &self,
        strategy: Strategy,
        ctx: &mut ExtractionContext,
    ) -> Result<Recipe, ExtractError> {
        match strategy {
            Strategy::VideoDownload => self.extract_via_video(ctx).await,
            Strategy::MetadataOnly => self.extract_via_metadata(ctx).await,
            Strategy::Webpage => self.extract_via_webpage(ctx).await,
        }
    }

    /// Tier 1: download the video and send it to the model together with
    /// whatever metadata the platform offers.
    async fn extract_via_video(
        &self,
        ctx: &mut ExtractionContext,
    ) -> Result<Recipe, ExtractError> {
        let temp = TempDir::new()?;

        // Probe before downloading; the result outlives this tier so the
        // metadata fallback can reuse it.
        let metadata = self.video.probe(&ctx.url, ctx.platform, temp.path()).await;
        ctx.metadata = Some(metadata);

        let video_path = self
            .video
            .download(&ctx.url, &temp.path().join("video.mp4"))
            .await?;
        let media = MediaPart::from_file(&video_path).await?;
        info!("sending video ({} KB) to the model", media.data.len() / 1024);

        let prompt = build_video_prompt(&self.prompt, ctx.metadata.as_ref(), Some(&ctx.url));
        let response = self.oracle.extract(&prompt, Some(&media)).await?;

        let mut recipe = parse_oracle_response(&response, Some(&ctx.url))?;
        recipe.source_platform = ctx.platform.map(|p| p.as_str().to_string());
        recipe.creator = ctx.metadata.as_ref().and_then(|m| m.uploader.clone());
        Ok(recipe)
    }

    /// Tier 2: no video, just the probed title, description, captions and
    /// tags as text.
    async fn extract_via_metadata(
        &self,
        ctx: &ExtractionContext,
    ) -> Result<Recipe, ExtractError> {
        let metadata = ctx
            .metadata
            .as_ref()
            .ok_or_else(|| ExtractError::NoContent("no video metadata available".to_string()))?;

        info!("extracting from metadata only: {}", ctx.url);
        let prompt = build_metadata_prompt(&self.prompt, metadata, &ctx.url);
        let response = self.oracle.extract(&prompt, None).await?;

        let mut recipe = parse_oracle_response(&response, Some(&ctx.url))?;
        recipe.source_platform = ctx.platform.map(|p| p.as_str().to_string());
        recipe.creator = metadata.uploader.clone();
        Ok(recipe)
    }

    /// Tier 3: fetch the page, prefer embedded structured data, otherwise
    /// hand the visible text to the model.
    async fn extract_via_webpage(&self, ctx: &ExtractionContext) -> Result<Recipe, ExtractError> {
        let html = self.fetcher.fetch(&ctx.url).await?;
        self.webpage_recipe(&html, &ctx.url).await
    }

    async fn webpage_recipe(&self, html: &str, url: &str) -> Result<Recipe, ExtractError> {
        if let Some(recipe) = extract_schema_recipe(html, url) {
            info!("structured recipe data found, skipping model call");
            return Ok(recipe);
        }

        let text = extract_page_text(html, MAX_WEBPAGE_TEXT);
        let chars = text.chars().count();
        if chars < MIN_CONTENT_LENGTH {
            return Err(ExtractError::InsufficientContent(chars));
        }

        debug!("no structured data, sending {chars} characters of page text to the model");
        let prompt = build_webpage_prompt(&self.prompt, url, &text);
        let response = self.oracle.extract(&prompt, None).await?;

        let mut recipe = parse_oracle_response(&response, Some(url))?;
        recipe.source_platform = Some("web".to_string());
        Ok(recipe)
    }

    /// Best-effort page text for a URL that accompanies a media file.
    /// Failures are logged and swallowed.
    async fn context_text(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(html) => {
                let text = extract_page_text(&html, MAX_CONTEXT_TEXT);
                if text.chars().count() >= MIN_CONTENT_LENGTH {
                    Some(text)
                } else {
                    None
                }
            }
            Err(e) => {
                debug!("context fetch for {url} failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const RECIPE_JSON: &str =
        r#"{"title": "Stub Soup", "ingredients": ["1 stub"], "instructions": ["stir"]}"#;

    struct StubOracle {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    impl StubOracle {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RecipeOracle for Arc<StubOracle> {
        fn name(&self) -> &str {
            "stub"
        }

        async fn extract(
            &self,
            prompt: &str,
            _media: Option<&MediaPart>,
        ) -> Result<String, ExtractError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    fn test_extractor(oracle: Arc<StubOracle>) -> RecipeExtractor {
        RecipeExtractor::new(&AppConfig::default(), Box::new(oracle))
    }

    #[tokio::test]
    async fn test_schema_markup_short_circuits_model() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let html = r#"<html><head><script type="application/ld+json">
            {"@type": "Recipe", "name": "Flammkuchen",
             "recipeIngredient": ["200g flour", "100ml cream"],
             "recipeInstructions": "Roll out the dough. Bake hot."}
        </script></head><body></body></html>"#;

        let recipe = extractor
            .webpage_recipe(html, "https://example.com/flammkuchen")
            .await
            .unwrap();
        assert_eq!(recipe.title, "Flammkuchen");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_plain_page_goes_to_model() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let body = "This page describes a lovely recipe in plain prose. ".repeat(10);
        let html = format!("<html><body><p>{body}</p></body></html>");

        let recipe = extractor
            .webpage_recipe(&html, "https://example.com/prose")
            .await
            .unwrap();
        assert_eq!(recipe.title, "Stub Soup");
        assert_eq!(recipe.source_platform.as_deref(), Some("web"));
        assert_eq!(stub.calls(), 1);
        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].contains("--- Webpage Content ---"));
    }

    #[tokio::test]
    async fn test_thin_page_is_insufficient() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let err = extractor
            .webpage_recipe("<html><body><p>hi</p></body></html>", "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InsufficientContent(n) if n < MIN_CONTENT_LENGTH));
        assert!(!err.is_soft());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_garbage_model_output_is_hard_error() {
        let stub = StubOracle::new("I am sorry, I cannot find a recipe here.");
        let extractor = test_extractor(stub.clone());

        let body = "Step one: chop the onions very finely indeed. ".repeat(10);
        let html = format!("<html><body><p>{body}</p></body></html>");

        let err = extractor
            .webpage_recipe(&html, "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidModelOutput(_)));
        assert!(!err.is_soft());
    }

    #[tokio::test]
    async fn test_unsafe_url_rejected_before_any_network() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        for url in [
            "file:///etc/passwd",
            "http://localhost:8080/recipe",
            "http://169.254.169.254/latest/meta-data/",
        ] {
            let err = extractor.extract_from_url(url).await.unwrap_err();
            assert!(matches!(err, ExtractError::UnsafeUrl(_)), "{url}");
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_metadata_tier_reuses_probe_result() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let url = "https://www.youtube.com/watch?v=abc123";
        let ctx = ExtractionContext {
            url: url.to_string(),
            platform: Platform::detect(url),
            metadata: Some(VideoMetadata {
                title: Some("Best Pasta Ever".to_string()),
                description: Some("Today we cook pasta with guanciale.".to_string()),
                uploader: Some("ChefMax".to_string()),
                ..Default::default()
            }),
        };

        let recipe = extractor.extract_via_metadata(&ctx).await.unwrap();
        assert_eq!(recipe.creator.as_deref(), Some("ChefMax"));
        assert_eq!(recipe.source_platform.as_deref(), Some("youtube"));

        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].contains("NOTE: Video could not be downloaded."));
        assert!(prompts[0].contains("Best Pasta Ever"));
    }

    #[tokio::test]
    async fn test_media_extraction_validates_result() {
        let stub = StubOracle::new(r#"{"title": "Just a title"}"#);
        let extractor = test_extractor(stub.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dish.jpg");
        tokio::fs::write(&path, b"not really a jpeg").await.unwrap();

        let err = extractor.extract_from_media(&path, None).await.unwrap_err();
        assert!(matches!(err, ExtractError::IncompleteRecipe(_)));
    }

    #[tokio::test]
    async fn test_media_extraction_success() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dish.png");
        tokio::fs::write(&path, b"fake png").await.unwrap();

        let recipe = extractor.extract_from_media(&path, None).await.unwrap();
        assert_eq!(recipe.title, "Stub Soup");
        assert!(recipe.source_url.is_none());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_media_context_url_dropped_when_unsafe() {
        let stub = StubOracle::new(RECIPE_JSON);
        let extractor = test_extractor(stub.clone());

        let media = MediaPart {
            mime_type: "image/jpeg".to_string(),
            data: b"fake jpeg".to_vec(),
        };
        let recipe = extractor
            .extract_from_media_part(media, Some("http://localhost/page"))
            .await
            .unwrap();

        // The bad URL is neither attributed nor forwarded to the model
        assert!(recipe.source_url.is_none());
        let prompts = stub.prompts.lock().unwrap();
        assert!(!prompts[0].contains("localhost"));
    }

    #[test]
    fn test_strategy_applicability() {
        let mut ctx = ExtractionContext {
            url: "https://example.com/recipe".to_string(),
            platform: None,
            metadata: None,
        };
        assert!(!Strategy::VideoDownload.applicable(&ctx));
        assert!(!Strategy::MetadataOnly.applicable(&ctx));
        assert!(Strategy::Webpage.applicable(&ctx));

        ctx.platform = Platform::detect("https://www.tiktok.com/@chef/video/1");
        assert!(Strategy::VideoDownload.applicable(&ctx));

        // probe ran but found nothing usable
        ctx.metadata = Some(VideoMetadata::default());
        assert!(!Strategy::MetadataOnly.applicable(&ctx));

        ctx.metadata = Some(VideoMetadata {
            description: Some("recipe in the description".to_string()),
            ..Default::default()
        });
        assert!(Strategy::MetadataOnly.applicable(&ctx));
    }
}
