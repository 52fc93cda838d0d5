//! Markdown rendering for note archives.
//!
//! The document intentionally has no title heading; the archive derives
//! the file name from the recipe title, so a heading would duplicate it.

use url::Url;

use crate::model::Recipe;

const MAX_TAGS: usize = 10;

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| url.to_string())
}

/// Render a recipe as a Markdown document.
pub fn render_markdown(recipe: &Recipe) -> String {
    let mut lines = Vec::new();

    if let Some(url) = &recipe.source_url {
        let source_text = recipe.creator.clone().unwrap_or_else(|| host_of(url));
        lines.push(format!("**Source:** [{source_text}]({url})"));
    }
    if let Some(servings) = &recipe.servings {
        lines.push(format!("**Servings:** {servings}"));
    }

    let mut times = Vec::new();
    if let Some(prep) = &recipe.prep_time {
        times.push(format!("Prep: {prep}"));
    }
    if let Some(cook) = &recipe.cook_time {
        times.push(format!("Cook: {cook}"));
    }
    if let Some(total) = &recipe.total_time {
        times.push(format!("Total: {total}"));
    }
    if !times.is_empty() {
        lines.push(format!("**Time:** {}", times.join(" | ")));
    }

    if let Some(difficulty) = &recipe.difficulty {
        lines.push(format!("**Difficulty:** {difficulty}"));
    }

    if !recipe.tags.is_empty() {
        let tags = recipe
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|tag| format!("#{}", tag.replace(' ', "-")))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("**Tags:** {tags}"));
    }

    lines.push(String::new());

    lines.push("## Ingredients".to_string());
    lines.push(String::new());
    for ingredient in &recipe.ingredients {
        if Recipe::is_group_header(ingredient) {
            lines.push(format!("\n### {}", Recipe::group_header_text(ingredient)));
            lines.push(String::new());
        } else {
            lines.push(format!("- {ingredient}"));
        }
    }
    lines.push(String::new());

    lines.push("## Instructions".to_string());
    lines.push(String::new());
    for (i, step) in recipe.instructions.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, step));
    }
    lines.push(String::new());

    if !recipe.equipment.is_empty() {
        lines.push("## Equipment".to_string());
        lines.push(String::new());
        for item in &recipe.equipment {
            lines.push(format!("- {item}"));
        }
        lines.push(String::new());
    }

    if !recipe.notes.is_empty() {
        lines.push("## Tips".to_string());
        lines.push(String::new());
        for note in &recipe.notes {
            lines.push(format!("- {note}"));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
