//! Output renderers for extracted recipes.
//!
//! Each renderer is a pure function from [`Recipe`] to a string; none of
//! them mutate the recipe, so the same extraction can be rendered into
//! every format.

pub mod chat;
pub mod cooklang;
pub mod markdown;

pub use chat::render_chat;
pub use cooklang::render_cooklang;
pub use markdown::render_markdown;

use std::str::FromStr;

use crate::model::Recipe;

/// The formats a recipe can be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Messenger-style text with Telegram Markdown V1 escaping.
    #[default]
    Chat,
    /// Markdown document for note archives.
    Markdown,
    /// Cooklang `.cook` source.
    Cooklang,
}

impl OutputFormat {
    pub fn render(self, recipe: &Recipe) -> String {
        match self {
            OutputFormat::Chat => render_chat(recipe),
            OutputFormat::Markdown => render_markdown(recipe),
            OutputFormat::Cooklang => render_cooklang(recipe),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(OutputFormat::Chat),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "cooklang" | "cook" => Ok(OutputFormat::Cooklang),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("chat".parse::<OutputFormat>().unwrap(), OutputFormat::Chat);
        assert_eq!("MD".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("cook".parse::<OutputFormat>().unwrap(), OutputFormat::Cooklang);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
