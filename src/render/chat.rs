//! Messenger-oriented rendering with Telegram Markdown V1 escaping.

use crate::model::Recipe;

/// Hashtag cap; chat messages stay compact.
const MAX_TAGS: usize = 8;

/// Escape the Telegram Markdown V1 control characters: `\ * _ ` [`.
/// The backslash must go first or the escapes themselves get escaped.
pub fn escape_markdown(text: &str) -> String {
    let mut out = text.replace('\\', "\\\\");
    for ch in ['*', '_', '`', '['] {
        out = out.replace(ch, &format!("\\{ch}"));
    }
    out
}

fn difficulty_emoji(difficulty: &str) -> &'static str {
    match difficulty.to_lowercase().as_str() {
        "easy" => "\u{1F7E2}",
        "medium" => "\u{1F7E1}",
        "hard" => "\u{1F534}",
        _ => "",
    }
}

/// Render a recipe as a chat message.
///
/// Every user-controlled string goes through [`escape_markdown`]; URLs are
/// only ever placed inside the link target, which Markdown V1 does not
/// interpret.
pub fn render_chat(recipe: &Recipe) -> String {
    let mut lines = vec![format!("*{}*", escape_markdown(&recipe.title)), String::new()];

    let mut meta = Vec::new();
    if let Some(time) = recipe.total_time.as_ref().or(recipe.cook_time.as_ref()) {
        meta.push(format!("\u{23F1} {}", escape_markdown(time)));
    }
    if let Some(servings) = &recipe.servings {
        meta.push(format!("\u{1F465} {}", escape_markdown(servings)));
    }
    if let Some(difficulty) = &recipe.difficulty {
        meta.push(format!(
            "{} {}",
            difficulty_emoji(difficulty),
            escape_markdown(difficulty)
        ));
    }
    if !meta.is_empty() {
        lines.push(meta.join(" | "));
    }

    if !recipe.tags.is_empty() {
        let tags = recipe
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|tag| format!("#{}", escape_markdown(&tag.replace(' ', "_"))))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("\u{1F3F7} {tags}"));
    }

    lines.push(String::new());
    lines.push("\u{1F4CB} *Ingredients:*".to_string());
    for ingredient in &recipe.ingredients {
        if Recipe::is_group_header(ingredient) {
            lines.push(format!(
                "\n*{}*",
                escape_markdown(Recipe::group_header_text(ingredient))
            ));
        } else {
            lines.push(format!("\u{2022} {}", escape_markdown(ingredient)));
        }
    }

    lines.push(String::new());
    lines.push("\u{1F468}\u{200D}\u{1F373} *Instructions:*".to_string());
    for (i, step) in recipe.instructions.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, escape_markdown(step)));
    }

    if !recipe.equipment.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "\u{1F373} *Equipment:* {}",
            escape_markdown(&recipe.equipment.join(", "))
        ));
    }

    if !recipe.notes.is_empty() {
        lines.push(String::new());
        lines.push("\u{1F4A1} *Tips:*".to_string());
        for note in &recipe.notes {
            lines.push(format!("\u{2022} {}", escape_markdown(note)));
        }
    }

    if let Some(url) = &recipe.source_url {
        lines.push(String::new());
        let creator = match &recipe.creator {
            Some(creator) => escape_markdown(creator),
            None => "Source".to_string(),
        };
        lines.push(format!("\u{1F517} [{creator}]({url})"));
    }

    lines.join("\n")
}
