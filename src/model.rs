use serde::{Deserialize, Serialize};

/// Prefix that marks an ingredient line as a sub-recipe group header,
/// e.g. "## For the dough".
pub const GROUP_HEADER_PREFIX: &str = "## ";

/// Placeholder title used when a source carries no title at all.
/// The validator treats it the same as a missing title.
pub const UNKNOWN_TITLE: &str = "Unknown Recipe";

/// A structured recipe as produced by the extraction pipeline.
///
/// Times and servings are free-form, unit-annotated strings ("1h 30min",
/// "4 servings") rather than machine numerics; sources mix units freely
/// and the renderers pass them through verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub servings: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    /// Ordered ingredient lines; entries starting with
    /// [`GROUP_HEADER_PREFIX`] delimit sub-recipe sections.
    pub ingredients: Vec<String>,
    /// Ordered imperative steps; execution order is meaningful.
    pub instructions: Vec<String>,
    pub equipment: Vec<String>,
    pub notes: Vec<String>,
    pub source_url: Option<String>,
    pub source_platform: Option<String>,
    pub creator: Option<String>,
}

impl Recipe {
    /// True for ingredient lines that mark a group boundary instead of
    /// an actual ingredient.
    pub fn is_group_header(line: &str) -> bool {
        line.starts_with(GROUP_HEADER_PREFIX)
    }

    /// The header text without its sentinel prefix.
    pub fn group_header_text(line: &str) -> &str {
        line.strip_prefix(GROUP_HEADER_PREFIX).unwrap_or(line)
    }

    /// Ingredient lines that are not group headers.
    pub fn ingredient_lines(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .map(String::as_str)
            .filter(|line| !Self::is_group_header(line))
    }
}

/// Metadata gathered from a video platform before (or instead of) the
/// media itself.
///
/// Assembled from two independent probes (one for metadata, one for
/// captions), so every field tolerates absence.
#[derive(Debug, Clone, Default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub uploader: Option<String>,
    /// Duration in seconds, when the platform reports one.
    pub duration: Option<u64>,
    pub tags: Vec<String>,
    /// Caption text already run through the subtitle cleaner.
    pub subtitles: Option<String>,
    pub platform: Option<String>,
}

impl VideoMetadata {
    /// Whether enough textual signal exists to attempt extraction
    /// without the media file.
    pub fn has_text_content(&self) -> bool {
        self.description.is_some() || self.subtitles.is_some() || self.title.is_some()
    }
}
