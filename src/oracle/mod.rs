//! Model-backed extraction: prompt assembly, the oracle trait, and
//! response parsing.

mod gemini;
mod prompt;

pub use gemini::GeminiOracle;
pub use prompt::{
    build_media_prompt, build_metadata_prompt, build_video_prompt, build_webpage_prompt,
    EXTRACTION_PROMPT,
};

use async_trait::async_trait;
use log::error;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ExtractError;
use crate::model::{Recipe, UNKNOWN_TITLE};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

/// A media attachment (video or image) sent along with the prompt.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaPart {
    /// Load a media file, deriving the MIME type from its extension.
    pub async fn from_file(path: &Path) -> Result<Self, ExtractError> {
        let data = tokio::fs::read(path).await?;
        Ok(Self {
            mime_type: guess_mime(path).to_string(),
            data,
        })
    }
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Unified interface to the extraction model.
#[async_trait]
pub trait RecipeOracle: Send + Sync {
    /// Oracle name for logs (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a prompt (and optionally one media attachment) and return the
    /// raw model text.
    async fn extract(&self, prompt: &str, media: Option<&MediaPart>)
        -> Result<String, ExtractError>;
}

/// Mirror of the JSON object the extraction prompt asks for.
#[derive(Debug, Deserialize)]
struct OracleRecipe {
    title: Option<String>,
    servings: Option<String>,
    prep_time: Option<String>,
    cook_time: Option<String>,
    total_time: Option<String>,
    /// Older prompt revisions used a bare "time" key
    time: Option<String>,
    difficulty: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    notes: Vec<String>,
}

/// Parse the model's answer into a [`Recipe`].
///
/// Markdown code fences around the JSON are tolerated and stripped. Anything
/// that still fails to parse is an invalid-output error, never a panic.
pub fn parse_oracle_response(
    response_text: &str,
    source_url: Option<&str>,
) -> Result<Recipe, ExtractError> {
    let mut text = response_text.trim();

    if text.contains("```") {
        if let Some(caps) = FENCE_RE.captures(text) {
            text = caps.get(1).map_or(text, |m| m.as_str());
        }
    }

    let data: OracleRecipe = serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(500).collect();
        error!("could not parse model JSON: {preview}");
        ExtractError::InvalidModelOutput(format!("model did not return valid JSON: {e}"))
    })?;

    Ok(Recipe {
        title: data.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        servings: data.servings,
        prep_time: data.prep_time,
        cook_time: data.cook_time,
        total_time: data.total_time.or(data.time),
        difficulty: data.difficulty,
        tags: data.tags,
        ingredients: data.ingredients,
        instructions: data.instructions,
        equipment: data.equipment,
        notes: data.notes,
        source_url: source_url.map(String::from),
        source_platform: None,
        creator: None,
    })
}
