use crate::model::VideoMetadata;

/// The default prompt used for recipe extraction.
///
/// It instructs the model to read every provided source, resolve conflicts
/// by source priority, and answer with a single JSON object.
///
/// The prompt is loaded from `prompt.txt` at compile time using the
/// `include_str!` macro, making it easy to edit without dealing with
/// Rust string syntax.
pub const EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// At most this many tags are forwarded as extraction context.
const MAX_PROMPT_TAGS: usize = 10;

fn separator() -> String {
    "=".repeat(60)
}

/// The numbered source sections shared by the video and metadata-only
/// prompts, ordered by extraction priority.
fn source_sections(metadata: &VideoMetadata) -> String {
    let mut out = String::new();

    if let Some(subtitles) = &metadata.subtitles {
        out.push_str(&format!(
            "\n\n### 1. SUBTITLES/CAPTIONS (highest priority for quantities!):\n{subtitles}"
        ));
    }
    if let Some(description) = &metadata.description {
        out.push_str(&format!("\n\n### 2. VIDEO DESCRIPTION:\n{description}"));
    }
    if let Some(title) = &metadata.title {
        out.push_str(&format!("\n\n### 3. VIDEO TITLE: {title}"));
    }
    if let Some(uploader) = &metadata.uploader {
        out.push_str(&format!("\n### 4. CREATOR: {uploader}"));
    }
    if !metadata.tags.is_empty() {
        let tags: Vec<&str> = metadata
            .tags
            .iter()
            .take(MAX_PROMPT_TAGS)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("\n### 5. TAGS: {}", tags.join(", ")));
    }

    out
}

/// Prompt for analyzing a downloaded video together with its metadata.
pub fn build_video_prompt(
    base: &str,
    metadata: Option<&VideoMetadata>,
    source_url: Option<&str>,
) -> String {
    let sep = separator();
    let mut prompt = format!("{base}\n\n{sep}\nAVAILABLE SOURCES:\n{sep}");

    if let Some(metadata) = metadata {
        prompt.push_str(&source_sections(metadata));
    }
    if let Some(url) = source_url {
        prompt.push_str(&format!("\n\n### SOURCE URL: {url}"));
    }

    prompt.push_str(&format!(
        "\n\n{sep}\nNow analyze the video together with the sources above."
    ));
    prompt
}

/// Prompt for metadata-only extraction, used when the video itself could
/// not be downloaded.
pub fn build_metadata_prompt(base: &str, metadata: &VideoMetadata, source_url: &str) -> String {
    let sep = separator();
    let mut prompt = format!(
        "{base}\n\n{sep}\nAVAILABLE SOURCES (no video available, text only):\n{sep}"
    );

    prompt.push_str(&source_sections(metadata));
    prompt.push_str(&format!("\n\n### SOURCE URL: {source_url}"));
    prompt.push_str(&format!(
        "\n\n{sep}\nNOTE: Video could not be downloaded. Extract the recipe from the text sources above."
    ));
    prompt
}

/// Prompt for extracting from stripped webpage text.
pub fn build_webpage_prompt(base: &str, url: &str, page_text: &str) -> String {
    format!("{base}\n\nSource URL: {url}\n\n--- Webpage Content ---\n{page_text}")
}

/// Prompt for a local media file, optionally with its source page as a
/// text side channel.
pub fn build_media_prompt(
    base: &str,
    source_url: Option<&str>,
    page_text: Option<&str>,
) -> String {
    let mut prompt = base.to_string();

    if let Some(url) = source_url {
        prompt.push_str(&format!("\n\nSource URL: {url}"));
        if let Some(text) = page_text {
            prompt.push_str(&format!("\n\n--- Webpage Content ---\n{text}"));
        }
    }

    prompt
}
